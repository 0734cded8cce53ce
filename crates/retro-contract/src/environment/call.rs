//! Typed environment calls.
//!
//! Each variant carries the payload of one [`EnvironmentCommand`]. Query
//! payloads are `&mut` slots the frontend fills in; the frontend's boolean
//! answer says whether it recognized and honored the command.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::av::{AvEnableFlags, GameGeometry, PixelFormat, Rotation, SystemAvInfo};
use crate::device::DeviceCapabilities;
use crate::disk::DiskControlVersion;
use crate::environment::command::EnvironmentCommand;
use crate::environment::interfaces::{
    AudioCallback, CameraRequest, LedInterface, LocationInterface, LogInterface, MidiInterface,
    PerfInterface, RumbleInterface, SensorInterface,
};
use crate::environment::payload::{
    ControllerInfo, CoreOptionsVersion, InputDescriptor, Language, Message, MessageExt,
    MessageInterfaceVersion, SubsystemInfo, Variable,
};
use crate::frame::{FramebufferAccess, SoftwareFramebuffer};
use crate::hw_render::{HwContextType, HwRenderContextNegotiation, HwRenderInterface, HwRenderRequest};
use crate::memory::MemoryMap;
use crate::options::{CoreOptionDefinition, CoreOptionDisplay, CoreOptionsIntl, LegacyVariable};
use crate::serialization::SerializationQuirks;
use crate::vfs::VfsInterfaceRequest;

/// Request to borrow a frontend framebuffer (`GET_CURRENT_SOFTWARE_FRAMEBUFFER`).
///
/// The frontend calls `render` at most once with a buffer of at least
/// `width` x `height` pixels; the buffer is only valid inside that call.
pub struct FramebufferRequest<'a> {
    /// Width the core will render.
    pub width: u32,
    /// Height the core will render.
    pub height: u32,
    /// Access the core needs.
    pub access: FramebufferAccess,
    /// Core-side renderer.
    pub render: &'a mut dyn FnMut(&mut SoftwareFramebuffer<'_>),
}

impl fmt::Debug for FramebufferRequest<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FramebufferRequest")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("access", &self.access)
            .finish_non_exhaustive()
    }
}

/// One environment command with its payload.
#[allow(missing_docs)]
pub enum EnvironmentCall<'a> {
    SetRotation(Rotation),
    GetOverscan(&'a mut bool),
    GetCanDupe(&'a mut bool),
    SetMessage(&'a Message),
    Shutdown,
    SetPerformanceLevel(u32),
    GetSystemDirectory(&'a mut Option<PathBuf>),
    SetPixelFormat(PixelFormat),
    SetInputDescriptors(&'a [InputDescriptor]),
    SetKeyboardCallback,
    SetDiskControlInterface,
    SetHwRender(&'a HwRenderRequest),
    GetVariable(&'a mut Variable),
    SetVariables(&'a [LegacyVariable]),
    GetVariableUpdate(&'a mut bool),
    SetSupportNoGame(bool),
    GetLibretroPath(&'a mut Option<PathBuf>),
    /// Reference frame time in microseconds.
    SetFrameTimeCallback { reference_usec: i64 },
    SetAudioCallback(Arc<dyn AudioCallback>),
    GetRumbleInterface(&'a mut Option<Arc<dyn RumbleInterface>>),
    GetInputDeviceCapabilities(&'a mut DeviceCapabilities),
    GetSensorInterface(&'a mut Option<Arc<dyn SensorInterface>>),
    GetCameraInterface(&'a mut CameraRequest),
    GetLogInterface(&'a mut Option<Arc<dyn LogInterface>>),
    GetPerfInterface(&'a mut Option<Arc<dyn PerfInterface>>),
    GetLocationInterface(&'a mut Option<Arc<dyn LocationInterface>>),
    GetCoreAssetsDirectory(&'a mut Option<PathBuf>),
    GetSaveDirectory(&'a mut Option<PathBuf>),
    SetSystemAvInfo(&'a SystemAvInfo),
    SetProcAddressCallback,
    SetSubsystemInfo(&'a [SubsystemInfo]),
    SetControllerInfo(&'a [ControllerInfo]),
    SetMemoryMaps(&'a MemoryMap),
    SetGeometry(&'a GameGeometry),
    GetUsername(&'a mut Option<String>),
    GetLanguage(&'a mut Language),
    GetCurrentSoftwareFramebuffer(FramebufferRequest<'a>),
    GetHwRenderInterface(&'a mut Option<HwRenderInterface>),
    SetSupportAchievements(bool),
    SetHwRenderContextNegotiationInterface(&'a HwRenderContextNegotiation),
    /// The frontend clears the quirks it cannot honor.
    SetSerializationQuirks(&'a mut SerializationQuirks),
    SetHwSharedContext,
    GetVfsInterface(&'a mut VfsInterfaceRequest),
    GetLedInterface(&'a mut Option<Arc<dyn LedInterface>>),
    GetAudioVideoEnable(&'a mut AvEnableFlags),
    GetMidiInterface(&'a mut Option<Arc<dyn MidiInterface>>),
    GetFastForwarding(&'a mut bool),
    GetTargetRefreshRate(&'a mut f32),
    /// Answered by the return value alone.
    GetInputBitmasks,
    GetCoreOptionsVersion(&'a mut CoreOptionsVersion),
    SetCoreOptions(&'a [CoreOptionDefinition]),
    SetCoreOptionsIntl(&'a CoreOptionsIntl),
    SetCoreOptionsDisplay(&'a CoreOptionDisplay),
    GetPreferredHwRender(&'a mut HwContextType),
    GetDiskControlInterfaceVersion(&'a mut DiskControlVersion),
    SetDiskControlExtInterface,
    GetMessageInterfaceVersion(&'a mut MessageInterfaceVersion),
    SetMessageExt(&'a MessageExt),
    GetInputMaxUsers(&'a mut u32),
}

impl EnvironmentCall<'_> {
    /// Command this call issues.
    #[must_use]
    pub const fn command(&self) -> EnvironmentCommand {
        use EnvironmentCommand as C;
        match self {
            Self::SetRotation(_) => C::SetRotation,
            Self::GetOverscan(_) => C::GetOverscan,
            Self::GetCanDupe(_) => C::GetCanDupe,
            Self::SetMessage(_) => C::SetMessage,
            Self::Shutdown => C::Shutdown,
            Self::SetPerformanceLevel(_) => C::SetPerformanceLevel,
            Self::GetSystemDirectory(_) => C::GetSystemDirectory,
            Self::SetPixelFormat(_) => C::SetPixelFormat,
            Self::SetInputDescriptors(_) => C::SetInputDescriptors,
            Self::SetKeyboardCallback => C::SetKeyboardCallback,
            Self::SetDiskControlInterface => C::SetDiskControlInterface,
            Self::SetHwRender(_) => C::SetHwRender,
            Self::GetVariable(_) => C::GetVariable,
            Self::SetVariables(_) => C::SetVariables,
            Self::GetVariableUpdate(_) => C::GetVariableUpdate,
            Self::SetSupportNoGame(_) => C::SetSupportNoGame,
            Self::GetLibretroPath(_) => C::GetLibretroPath,
            Self::SetFrameTimeCallback { .. } => C::SetFrameTimeCallback,
            Self::SetAudioCallback(_) => C::SetAudioCallback,
            Self::GetRumbleInterface(_) => C::GetRumbleInterface,
            Self::GetInputDeviceCapabilities(_) => C::GetInputDeviceCapabilities,
            Self::GetSensorInterface(_) => C::GetSensorInterface,
            Self::GetCameraInterface(_) => C::GetCameraInterface,
            Self::GetLogInterface(_) => C::GetLogInterface,
            Self::GetPerfInterface(_) => C::GetPerfInterface,
            Self::GetLocationInterface(_) => C::GetLocationInterface,
            Self::GetCoreAssetsDirectory(_) => C::GetCoreAssetsDirectory,
            Self::GetSaveDirectory(_) => C::GetSaveDirectory,
            Self::SetSystemAvInfo(_) => C::SetSystemAvInfo,
            Self::SetProcAddressCallback => C::SetProcAddressCallback,
            Self::SetSubsystemInfo(_) => C::SetSubsystemInfo,
            Self::SetControllerInfo(_) => C::SetControllerInfo,
            Self::SetMemoryMaps(_) => C::SetMemoryMaps,
            Self::SetGeometry(_) => C::SetGeometry,
            Self::GetUsername(_) => C::GetUsername,
            Self::GetLanguage(_) => C::GetLanguage,
            Self::GetCurrentSoftwareFramebuffer(_) => C::GetCurrentSoftwareFramebuffer,
            Self::GetHwRenderInterface(_) => C::GetHwRenderInterface,
            Self::SetSupportAchievements(_) => C::SetSupportAchievements,
            Self::SetHwRenderContextNegotiationInterface(_) => {
                C::SetHwRenderContextNegotiationInterface
            }
            Self::SetSerializationQuirks(_) => C::SetSerializationQuirks,
            Self::SetHwSharedContext => C::SetHwSharedContext,
            Self::GetVfsInterface(_) => C::GetVfsInterface,
            Self::GetLedInterface(_) => C::GetLedInterface,
            Self::GetAudioVideoEnable(_) => C::GetAudioVideoEnable,
            Self::GetMidiInterface(_) => C::GetMidiInterface,
            Self::GetFastForwarding(_) => C::GetFastForwarding,
            Self::GetTargetRefreshRate(_) => C::GetTargetRefreshRate,
            Self::GetInputBitmasks => C::GetInputBitmasks,
            Self::GetCoreOptionsVersion(_) => C::GetCoreOptionsVersion,
            Self::SetCoreOptions(_) => C::SetCoreOptions,
            Self::SetCoreOptionsIntl(_) => C::SetCoreOptionsIntl,
            Self::SetCoreOptionsDisplay(_) => C::SetCoreOptionsDisplay,
            Self::GetPreferredHwRender(_) => C::GetPreferredHwRender,
            Self::GetDiskControlInterfaceVersion(_) => C::GetDiskControlInterfaceVersion,
            Self::SetDiskControlExtInterface => C::SetDiskControlExtInterface,
            Self::GetMessageInterfaceVersion(_) => C::GetMessageInterfaceVersion,
            Self::SetMessageExt(_) => C::SetMessageExt,
            Self::GetInputMaxUsers(_) => C::GetInputMaxUsers,
        }
    }
}

impl fmt::Debug for EnvironmentCall<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EnvironmentCall")
            .field(&self.command().name())
            .finish()
    }
}

/// Frontend side of the environment channel.
pub trait Environment {
    /// Handles one command; returns `false` when it is unknown or refused.
    fn environment(&mut self, call: EnvironmentCall<'_>) -> bool;
}

#[cfg(test)]
mod tests {
    use super::EnvironmentCall;
    use crate::environment::command::EnvironmentCommand;

    #[test]
    fn calls_name_their_command() {
        let mut dupe = false;
        assert_eq!(
            EnvironmentCall::GetCanDupe(&mut dupe).command(),
            EnvironmentCommand::GetCanDupe
        );
        assert_eq!(
            EnvironmentCall::SetFrameTimeCallback {
                reference_usec: 16_666
            }
            .command()
            .raw(),
            21
        );
        assert_eq!(
            format!("{:?}", EnvironmentCall::GetInputBitmasks),
            "EnvironmentCall(\"GET_INPUT_BITMASKS\")"
        );
    }
}
