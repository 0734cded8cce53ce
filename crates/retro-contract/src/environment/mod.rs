//! The environment channel: commands, payloads, frontend services and the
//! session gate every call passes through.

pub mod call;
pub mod client;
pub mod command;
pub mod gate;
pub mod interfaces;
pub mod payload;

pub use call::{Environment, EnvironmentCall, FramebufferRequest};
pub use client::EnvironmentClient;
pub use command::{
    CommandDecodeError, CommandTier, EnvironmentCommand, EXPERIMENTAL, PRIVATE,
    RETIRED_COMMAND_IDS,
};
pub use gate::{CallPhase, CommandWindow, EnvironmentGate, Registrations};
pub use interfaces::{
    AudioCallback, CameraBufferCaps, CameraControl, CameraRequest, CameraSink, FallbackLog,
    LedInterface, LocationInterface, LogInterface, MidiInterface, PerfCounter, PerfInterface,
    Position, RumbleEffect, RumbleInterface, SensorAction, SensorId, SensorInterface,
    SimdFeatures, CORE_LOG_TARGET,
};
pub use payload::{
    ControllerDescription, ControllerInfo, CoreOptionsVersion, InputDescriptor, Language, LogLevel,
    Message, MessageExt, MessageInterfaceVersion, MessageTarget, MessageType, SubsystemInfo,
    SubsystemMemoryInfo, SubsystemRomInfo, Variable,
};
