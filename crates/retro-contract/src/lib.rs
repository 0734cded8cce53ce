//! Typed core/frontend interface contract.
//!
//! A [`Session`] binds a [`Core`] to a [`Frontend`], enforces the lifecycle
//! order, gates every environment command by its call window and audits each
//! frame. Violations are recorded in [`SessionDiagnostics`] and, by default,
//! kept from reaching the other side.

/// Interface version, session configuration and fixed capabilities.
pub mod api;
pub use api::{Capabilities, SessionConfig, ViolationPolicy, API_VERSION};

/// Video geometry, timing, pixel formats and regions.
pub mod av;
pub use av::{
    AvEnableFlags, GameGeometry, PixelFormat, Region, Rotation, SystemAvInfo, SystemTiming,
};

/// The core-side trait and content descriptions.
pub mod core;
pub use crate::core::{Core, GameInfo, ProcAddress, SystemInfo};

/// Input device classes and per-class identifiers.
pub mod device;
pub use device::{
    DeviceCapabilities, DeviceType, JoypadButton, JoypadButtons, Key, KeyModifiers,
    KeyboardEvent, LightgunMeaning, DEVICE_MASK, JOYPAD_MASK,
};

/// Session diagnostics counters.
pub mod diag;
pub use diag::SessionDiagnostics;

/// Disk-control protocol and image list.
pub mod disk;
pub use disk::{DiskControl, DiskControlHandle, DiskControlVersion, DiskImage, DiskImageList};

/// Environment commands, typed calls and the call gate.
pub mod environment;
pub use environment::{
    CallPhase, Environment, EnvironmentCall, EnvironmentClient, EnvironmentCommand,
    EnvironmentGate, Registrations,
};

/// Per-frame callbacks and audit.
pub mod frame;
pub use frame::{
    AudioMode, FrameAudit, FrameCallbacks, FrameContext, FramebufferAccess, Frontend,
    SoftwareFramebuffer, VideoFrame,
};

/// Hardware rendering negotiation.
pub mod hw_render;
pub use hw_render::{
    ContextLease, HwContext, HwContextType, HwRenderContextNegotiation, HwRenderError,
    HwRenderInterface, HwRenderInterfaceKind, HwRenderRequest,
};

/// Lifecycle states and the session.
pub mod lifecycle;
pub use lifecycle::{CoreHook, LifecycleCall, LifecycleState, Session, SessionError};

/// Memory types and memory maps.
pub mod memory;
pub use memory::{MemoryDescriptor, MemoryDescriptorFlags, MemoryMap, MemoryMapError, MemoryType};

/// Core options.
pub mod options;
pub use options::{
    CoreOptionDefinition, CoreOptionDisplay, CoreOptionValue, CoreOptionsIntl, LegacyVariable,
    OptionStore, OptionsError, CORE_OPTION_VALUES_MAX,
};

/// Save-state quirks and size bookkeeping.
pub mod serialization;
pub use serialization::{SaveStateBudget, SerializationQuirks};

/// Virtual file system interface.
pub mod vfs;
pub use vfs::{Vfs, VfsError, VfsFile, VfsInterface, VfsPath, VfsVersion};

/// Contract violation taxonomy.
pub mod violation;
pub use violation::{ContractViolation, ViolationClass};

#[cfg(test)]
use env_logger as _;
#[cfg(test)]
use proptest as _;
#[cfg(feature = "serde")]
use serde as _;
