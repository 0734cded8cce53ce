//! Core-side handle for issuing environment calls.

use std::path::PathBuf;
use std::sync::Arc;

use crate::av::{AvEnableFlags, GameGeometry, PixelFormat, Rotation, SystemAvInfo};
use crate::device::DeviceCapabilities;
use crate::disk::DiskControlVersion;
use crate::environment::call::{Environment, EnvironmentCall, FramebufferRequest};
use crate::environment::gate::{CallPhase, EnvironmentGate, Settlement};
use crate::environment::interfaces::{
    AudioCallback, CameraBufferCaps, CameraControl, CameraRequest, CameraSink, FallbackLog,
    LedInterface, LocationInterface, LogInterface, MidiInterface, PerfInterface, RumbleInterface,
    SensorInterface,
};
use crate::environment::payload::{
    ControllerInfo, CoreOptionsVersion, InputDescriptor, Language, MessageExt,
    MessageInterfaceVersion, SubsystemInfo, Variable,
};
use crate::frame::{FramebufferAccess, SoftwareFramebuffer};
use crate::hw_render::{HwContextType, HwRenderContextNegotiation, HwRenderInterface, HwRenderRequest};
use crate::memory::MemoryMap;
use crate::options::{CoreOptionDefinition, CoreOptionDisplay, CoreOptionsIntl, LegacyVariable};
use crate::serialization::SerializationQuirks;
use crate::vfs::{VfsInterface, VfsInterfaceRequest, VfsVersion};

/// Environment access for one core entry point.
///
/// Calls pass through the session gate first; a call refused there never
/// reaches the frontend and reads as `false`.
pub struct EnvironmentClient<'a> {
    frontend: &'a mut dyn Environment,
    gate: &'a mut EnvironmentGate,
    phase: CallPhase,
}

impl std::fmt::Debug for EnvironmentClient<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvironmentClient")
            .field("phase", &self.phase)
            .finish_non_exhaustive()
    }
}

impl<'a> EnvironmentClient<'a> {
    pub(crate) fn new(
        frontend: &'a mut dyn Environment,
        gate: &'a mut EnvironmentGate,
        phase: CallPhase,
    ) -> Self {
        Self {
            frontend,
            gate,
            phase,
        }
    }

    /// Entry point this client was issued for.
    #[must_use]
    pub const fn phase(&self) -> CallPhase {
        self.phase
    }

    /// Issues a raw call; returns the frontend's answer.
    pub fn call(&mut self, call: EnvironmentCall<'_>) -> bool {
        if !self.gate.admit(&call, self.phase) {
            return false;
        }
        let command = call.command();
        let settlement = Settlement::capture(&call);
        let accepted = match call {
            EnvironmentCall::GetCanDupe(slot) => {
                let accepted = self.frontend.environment(EnvironmentCall::GetCanDupe(&mut *slot));
                self.gate.registrations_mut().can_dupe = accepted && *slot;
                accepted
            }
            EnvironmentCall::GetInputBitmasks => {
                let accepted = self.frontend.environment(EnvironmentCall::GetInputBitmasks);
                self.gate.registrations_mut().input_bitmasks = accepted;
                accepted
            }
            EnvironmentCall::SetSerializationQuirks(slot) => {
                let accepted = self
                    .frontend
                    .environment(EnvironmentCall::SetSerializationQuirks(&mut *slot));
                if accepted {
                    self.gate.registrations_mut().quirks = Some(*slot);
                }
                accepted
            }
            EnvironmentCall::GetDiskControlInterfaceVersion(slot) => {
                let accepted = self
                    .frontend
                    .environment(EnvironmentCall::GetDiskControlInterfaceVersion(&mut *slot));
                if accepted {
                    self.gate.registrations_mut().frontend_disk_version = *slot;
                }
                accepted
            }
            EnvironmentCall::GetVfsInterface(slot) => {
                let accepted = self
                    .frontend
                    .environment(EnvironmentCall::GetVfsInterface(&mut *slot));
                if accepted {
                    self.gate.registrations_mut().vfs_version =
                        slot.interface.as_ref().map(VfsInterface::version);
                }
                accepted
            }
            other => self.frontend.environment(other),
        };
        match settlement {
            Some(settlement) if accepted => self.gate.settle(settlement),
            _ if !accepted => log::debug!("frontend declined {command}"),
            _ => {}
        }
        accepted
    }

    fn answer<T>(
        &mut self,
        mut value: T,
        make: impl for<'b> FnOnce(&'b mut T) -> EnvironmentCall<'b>,
    ) -> Option<T> {
        self.call(make(&mut value)).then_some(value)
    }

    fn slot<T>(
        &mut self,
        make: impl for<'b> FnOnce(&'b mut Option<T>) -> EnvironmentCall<'b>,
    ) -> Option<T> {
        let mut value = None;
        if self.call(make(&mut value)) {
            value
        } else {
            None
        }
    }

    /// `SET_ROTATION`.
    pub fn set_rotation(&mut self, rotation: Rotation) -> bool {
        self.call(EnvironmentCall::SetRotation(rotation))
    }

    /// `GET_OVERSCAN`; `false` when unanswered.
    pub fn overscan(&mut self) -> bool {
        self.answer(false, |slot| EnvironmentCall::GetOverscan(slot))
            .unwrap_or(false)
    }

    /// `GET_CAN_DUPE`; `false` when unanswered.
    pub fn can_dupe(&mut self) -> bool {
        self.answer(false, |slot| EnvironmentCall::GetCanDupe(slot))
            .unwrap_or(false)
    }

    /// Shows `msg` for `frames` frames with `SET_MESSAGE`.
    pub fn set_message(&mut self, msg: impl Into<String>, frames: u32) -> bool {
        let message = crate::environment::payload::Message {
            msg: msg.into(),
            frames,
        };
        self.call(EnvironmentCall::SetMessage(&message))
    }

    /// Shows `message` with `SET_MESSAGE_EXT`, or as a basic message when
    /// the frontend only implements message interface version 0.
    pub fn message(&mut self, message: &MessageExt) -> bool {
        if self.message_interface_version() >= MessageInterfaceVersion::V1 {
            self.call(EnvironmentCall::SetMessageExt(message))
        } else {
            let basic = message.to_basic();
            self.call(EnvironmentCall::SetMessage(&basic))
        }
    }

    /// `SHUTDOWN`.
    pub fn shutdown(&mut self) -> bool {
        self.call(EnvironmentCall::Shutdown)
    }

    /// `SET_PERFORMANCE_LEVEL`.
    pub fn set_performance_level(&mut self, level: u32) -> bool {
        self.call(EnvironmentCall::SetPerformanceLevel(level))
    }

    /// `GET_SYSTEM_DIRECTORY`.
    pub fn system_directory(&mut self) -> Option<PathBuf> {
        self.slot(|slot| EnvironmentCall::GetSystemDirectory(slot))
    }

    /// `GET_SAVE_DIRECTORY`.
    pub fn save_directory(&mut self) -> Option<PathBuf> {
        self.slot(|slot| EnvironmentCall::GetSaveDirectory(slot))
    }

    /// `GET_CORE_ASSETS_DIRECTORY`.
    pub fn core_assets_directory(&mut self) -> Option<PathBuf> {
        self.slot(|slot| EnvironmentCall::GetCoreAssetsDirectory(slot))
    }

    /// `GET_LIBRETRO_PATH`.
    pub fn libretro_path(&mut self) -> Option<PathBuf> {
        self.slot(|slot| EnvironmentCall::GetLibretroPath(slot))
    }

    /// `SET_PIXEL_FORMAT`; on `false` the previous format stays in effect.
    pub fn set_pixel_format(&mut self, format: PixelFormat) -> bool {
        self.call(EnvironmentCall::SetPixelFormat(format))
    }

    /// `SET_INPUT_DESCRIPTORS`.
    pub fn set_input_descriptors(&mut self, descriptors: &[InputDescriptor]) -> bool {
        self.call(EnvironmentCall::SetInputDescriptors(descriptors))
    }

    /// `SET_KEYBOARD_CALLBACK`; keyboard events reach the core's hook once
    /// this is accepted.
    pub fn register_keyboard(&mut self) -> bool {
        self.call(EnvironmentCall::SetKeyboardCallback)
    }

    /// Registers the core's disk-control hook.
    ///
    /// Uses `SET_DISK_CONTROL_EXT_INTERFACE` when the frontend reports
    /// version 1 and `SET_DISK_CONTROL_INTERFACE` otherwise. Returns the
    /// version that was registered.
    pub fn register_disk_control(&mut self) -> Option<DiskControlVersion> {
        if self.disk_control_interface_version() >= DiskControlVersion::V1
            && self.call(EnvironmentCall::SetDiskControlExtInterface)
        {
            return Some(DiskControlVersion::V1);
        }
        self.call(EnvironmentCall::SetDiskControlInterface)
            .then_some(DiskControlVersion::V0)
    }

    /// `SET_HW_RENDER`.
    pub fn set_hw_render(&mut self, request: &HwRenderRequest) -> bool {
        self.call(EnvironmentCall::SetHwRender(request))
    }

    /// `GET_VARIABLE`; `None` when the key is unknown or unanswered.
    pub fn variable(&mut self, key: &str) -> Option<String> {
        let mut variable = Variable::new(key);
        if self.call(EnvironmentCall::GetVariable(&mut variable)) {
            variable.value
        } else {
            None
        }
    }

    /// `GET_VARIABLE_UPDATE`; `false` when unanswered.
    pub fn variable_updated(&mut self) -> bool {
        self.answer(false, |slot| EnvironmentCall::GetVariableUpdate(slot))
            .unwrap_or(false)
    }

    /// `GET_CORE_OPTIONS_VERSION`; legacy when unanswered.
    pub fn core_options_version(&mut self) -> CoreOptionsVersion {
        self.answer(CoreOptionsVersion::Legacy, |slot| EnvironmentCall::GetCoreOptionsVersion(slot))
            .unwrap_or_default()
    }

    /// Announces options in the richest form the frontend supports.
    ///
    /// Falls back to the legacy `SET_VARIABLES` strings below options
    /// version 1.
    pub fn announce_options(&mut self, definitions: &[CoreOptionDefinition]) -> bool {
        if self.core_options_version() >= CoreOptionsVersion::V1 {
            return self.call(EnvironmentCall::SetCoreOptions(definitions));
        }
        self.announce_legacy(definitions)
    }

    /// Announces translated options.
    ///
    /// Tries `SET_CORE_OPTIONS_INTL`, then the US set with
    /// `SET_CORE_OPTIONS`, then legacy strings.
    pub fn announce_options_intl(&mut self, intl: &CoreOptionsIntl) -> bool {
        if self.core_options_version() >= CoreOptionsVersion::V1 {
            return self.call(EnvironmentCall::SetCoreOptionsIntl(intl))
                || self.call(EnvironmentCall::SetCoreOptions(&intl.us));
        }
        self.announce_legacy(&intl.us)
    }

    fn announce_legacy(&mut self, definitions: &[CoreOptionDefinition]) -> bool {
        let variables: Vec<LegacyVariable> = definitions
            .iter()
            .map(LegacyVariable::from_definition)
            .collect();
        self.call(EnvironmentCall::SetVariables(&variables))
    }

    /// `SET_CORE_OPTIONS_DISPLAY`.
    pub fn set_option_visible(&mut self, key: impl Into<String>, visible: bool) -> bool {
        let display = CoreOptionDisplay {
            key: key.into(),
            visible,
        };
        self.call(EnvironmentCall::SetCoreOptionsDisplay(&display))
    }

    /// `SET_SUPPORT_NO_GAME`.
    pub fn set_support_no_game(&mut self, supported: bool) -> bool {
        self.call(EnvironmentCall::SetSupportNoGame(supported))
    }

    /// `SET_FRAME_TIME_CALLBACK` with the nominal frame time in microseconds.
    pub fn register_frame_time(&mut self, reference_usec: i64) -> bool {
        self.call(EnvironmentCall::SetFrameTimeCallback { reference_usec })
    }

    /// `SET_AUDIO_CALLBACK`.
    pub fn register_audio_callback(&mut self, callback: Arc<dyn AudioCallback>) -> bool {
        self.call(EnvironmentCall::SetAudioCallback(callback))
    }

    /// `GET_RUMBLE_INTERFACE`.
    pub fn rumble(&mut self) -> Option<Arc<dyn RumbleInterface>> {
        self.slot(|slot| EnvironmentCall::GetRumbleInterface(slot))
    }

    /// `GET_SENSOR_INTERFACE`.
    pub fn sensors(&mut self) -> Option<Arc<dyn SensorInterface>> {
        self.slot(|slot| EnvironmentCall::GetSensorInterface(slot))
    }

    /// `GET_LOG_INTERFACE`, or [`FallbackLog`] when the frontend has none.
    pub fn log_interface(&mut self) -> Arc<dyn LogInterface> {
        self.slot(|slot| EnvironmentCall::GetLogInterface(slot))
            .unwrap_or_else(|| Arc::new(FallbackLog))
    }

    /// `GET_PERF_INTERFACE`.
    pub fn perf(&mut self) -> Option<Arc<dyn PerfInterface>> {
        self.slot(|slot| EnvironmentCall::GetPerfInterface(slot))
    }

    /// `GET_LOCATION_INTERFACE`.
    pub fn location(&mut self) -> Option<Arc<dyn LocationInterface>> {
        self.slot(|slot| EnvironmentCall::GetLocationInterface(slot))
    }

    /// `GET_LED_INTERFACE`.
    pub fn led(&mut self) -> Option<Arc<dyn LedInterface>> {
        self.slot(|slot| EnvironmentCall::GetLedInterface(slot))
    }

    /// `GET_MIDI_INTERFACE`.
    pub fn midi(&mut self) -> Option<Arc<dyn MidiInterface>> {
        self.slot(|slot| EnvironmentCall::GetMidiInterface(slot))
    }

    /// `GET_CAMERA_INTERFACE`; returns the frontend's controls when granted.
    pub fn camera(
        &mut self,
        caps: CameraBufferCaps,
        width: u32,
        height: u32,
        sink: Arc<dyn CameraSink>,
    ) -> Option<Arc<dyn CameraControl>> {
        let mut request = CameraRequest {
            caps,
            width,
            height,
            sink,
            control: None,
        };
        if self.call(EnvironmentCall::GetCameraInterface(&mut request)) {
            request.control
        } else {
            None
        }
    }

    /// `GET_INPUT_DEVICE_CAPABILITIES`; empty when unanswered.
    pub fn input_device_capabilities(&mut self) -> DeviceCapabilities {
        self.answer(
            DeviceCapabilities::empty(),
            |slot| EnvironmentCall::GetInputDeviceCapabilities(slot),
        )
        .unwrap_or_default()
    }

    /// `SET_SYSTEM_AV_INFO`.
    pub fn set_system_av_info(&mut self, info: &SystemAvInfo) -> bool {
        self.call(EnvironmentCall::SetSystemAvInfo(info))
    }

    /// `SET_GEOMETRY`; the maximum size must stay as announced.
    pub fn set_geometry(&mut self, geometry: &GameGeometry) -> bool {
        self.call(EnvironmentCall::SetGeometry(geometry))
    }

    /// `SET_PROC_ADDRESS_CALLBACK`.
    pub fn register_proc_address(&mut self) -> bool {
        self.call(EnvironmentCall::SetProcAddressCallback)
    }

    /// `SET_SUBSYSTEM_INFO`.
    pub fn set_subsystem_info(&mut self, subsystems: &[SubsystemInfo]) -> bool {
        self.call(EnvironmentCall::SetSubsystemInfo(subsystems))
    }

    /// `SET_CONTROLLER_INFO`, one entry per port.
    pub fn set_controller_info(&mut self, ports: &[ControllerInfo]) -> bool {
        self.call(EnvironmentCall::SetControllerInfo(ports))
    }

    /// `SET_MEMORY_MAPS`.
    pub fn set_memory_maps(&mut self, map: &MemoryMap) -> bool {
        self.call(EnvironmentCall::SetMemoryMaps(map))
    }

    /// `GET_USERNAME`.
    pub fn username(&mut self) -> Option<String> {
        self.slot(|slot| EnvironmentCall::GetUsername(slot))
    }

    /// `GET_LANGUAGE`; English when unanswered.
    pub fn language(&mut self) -> Language {
        self.answer(Language::English, |slot| EnvironmentCall::GetLanguage(slot))
            .unwrap_or_default()
    }

    /// Renders into a frontend-owned buffer with
    /// `GET_CURRENT_SOFTWARE_FRAMEBUFFER`.
    ///
    /// Returns `true` when `render` ran; the frame may then be presented as
    /// [`VideoFrame::Framebuffer`](crate::frame::VideoFrame::Framebuffer).
    /// On `false` the core renders into its own memory instead.
    pub fn with_software_framebuffer(
        &mut self,
        width: u32,
        height: u32,
        access: FramebufferAccess,
        render: impl FnOnce(&mut SoftwareFramebuffer<'_>),
    ) -> bool {
        let mut render = Some(render);
        let mut lent = false;
        let mut body = |buffer: &mut SoftwareFramebuffer<'_>| {
            if let Some(render) = render.take() {
                lent = true;
                render(buffer);
            }
        };
        let accepted = self.call(EnvironmentCall::GetCurrentSoftwareFramebuffer(
            FramebufferRequest {
                width,
                height,
                access,
                render: &mut body,
            },
        ));
        if accepted && lent {
            self.gate.frame_mut().framebuffer_lent = true;
        }
        accepted && lent
    }

    /// `GET_HW_RENDER_INTERFACE`.
    pub fn hw_render_interface(&mut self) -> Option<HwRenderInterface> {
        self.slot(|slot| EnvironmentCall::GetHwRenderInterface(slot))
    }

    /// `SET_SUPPORT_ACHIEVEMENTS`.
    pub fn set_support_achievements(&mut self, supported: bool) -> bool {
        self.call(EnvironmentCall::SetSupportAchievements(supported))
    }

    /// `SET_HW_RENDER_CONTEXT_NEGOTIATION_INTERFACE`.
    pub fn set_hw_render_context_negotiation(
        &mut self,
        negotiation: &HwRenderContextNegotiation,
    ) -> bool {
        self.call(EnvironmentCall::SetHwRenderContextNegotiationInterface(
            negotiation,
        ))
    }

    /// `SET_SERIALIZATION_QUIRKS`; returns the quirks the frontend kept.
    pub fn set_serialization_quirks(
        &mut self,
        quirks: SerializationQuirks,
    ) -> Option<SerializationQuirks> {
        self.answer(quirks, |slot| EnvironmentCall::SetSerializationQuirks(slot))
    }

    /// `SET_HW_SHARED_CONTEXT`.
    pub fn set_hw_shared_context(&mut self) -> bool {
        self.call(EnvironmentCall::SetHwSharedContext)
    }

    /// `GET_VFS_INTERFACE` for at least `required`.
    pub fn vfs(&mut self, required: VfsVersion) -> Option<VfsInterface> {
        let mut request = VfsInterfaceRequest::new(required);
        if !self.call(EnvironmentCall::GetVfsInterface(&mut request)) {
            return None;
        }
        request
            .interface
            .filter(|interface| interface.version() >= required)
    }

    /// `GET_AUDIO_VIDEO_ENABLE`; both outputs enabled when unanswered.
    pub fn audio_video_enable(&mut self) -> AvEnableFlags {
        self.answer(AvEnableFlags::default(), |slot| EnvironmentCall::GetAudioVideoEnable(slot))
            .unwrap_or_default()
    }

    /// `GET_FASTFORWARDING`; `false` when unanswered.
    pub fn fast_forwarding(&mut self) -> bool {
        self.answer(false, |slot| EnvironmentCall::GetFastForwarding(slot))
            .unwrap_or(false)
    }

    /// `GET_TARGET_REFRESH_RATE`.
    pub fn target_refresh_rate(&mut self) -> Option<f32> {
        self.answer(0.0, |slot| EnvironmentCall::GetTargetRefreshRate(slot))
    }

    /// `GET_INPUT_BITMASKS`; when accepted, joypad reads use one query.
    pub fn input_bitmasks(&mut self) -> bool {
        self.call(EnvironmentCall::GetInputBitmasks)
    }

    /// `GET_PREFERRED_HW_RENDER`.
    pub fn preferred_hw_render(&mut self) -> Option<HwContextType> {
        self.answer(HwContextType::None, |slot| EnvironmentCall::GetPreferredHwRender(slot))
    }

    /// `GET_DISK_CONTROL_INTERFACE_VERSION`; version 0 when unanswered.
    pub fn disk_control_interface_version(&mut self) -> DiskControlVersion {
        self.answer(
            DiskControlVersion::V0,
            |slot| EnvironmentCall::GetDiskControlInterfaceVersion(slot),
        )
        .unwrap_or_default()
    }

    /// `GET_MESSAGE_INTERFACE_VERSION`; version 0 when unanswered.
    pub fn message_interface_version(&mut self) -> MessageInterfaceVersion {
        self.answer(
            MessageInterfaceVersion::V0,
            |slot| EnvironmentCall::GetMessageInterfaceVersion(slot),
        )
        .unwrap_or_default()
    }

    /// `GET_INPUT_MAX_USERS`.
    pub fn input_max_users(&mut self) -> Option<u32> {
        self.answer(0, |slot| EnvironmentCall::GetInputMaxUsers(slot))
    }
}
