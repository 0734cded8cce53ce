//! Session-side bookkeeping for environment and frame calls.
//!
//! Every environment command a core issues passes through the gate: the
//! call window is checked against the lifecycle phase, payload rules are
//! checked against what was announced earlier, and accepted SET commands are
//! recorded as registrations the session consults later.

use std::fmt;

use crate::api::{Capabilities, ViolationPolicy};
use crate::av::{GameGeometry, PixelFormat, SystemAvInfo};
use crate::diag::SessionDiagnostics;
use crate::disk::DiskControlVersion;
use crate::environment::call::EnvironmentCall;
use crate::environment::command::EnvironmentCommand;
use crate::environment::payload::{ControllerInfo, SubsystemInfo};
use crate::frame::{AudioMode, FrameAudit};
use crate::hw_render::HwRenderRequest;
use crate::memory::MemoryMap;
use crate::options::validate_definitions;
use crate::serialization::SerializationQuirks;
use crate::vfs::VfsVersion;
use crate::ContractViolation;

/// Core entry point an environment call was issued from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum CallPhase {
    /// Inside `set_environment`.
    SetEnvironment,
    /// Inside `init`.
    Init,
    /// Inside `load_game` or `load_game_special`.
    LoadGame,
    /// Inside `run`.
    Run,
    /// Any other entry point.
    Other,
}

impl fmt::Display for CallPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::SetEnvironment => "set_environment",
            Self::Init => "init",
            Self::LoadGame => "load_game",
            Self::Run => "run",
            Self::Other => "other",
        })
    }
}

/// Phases in which a command may be issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum CommandWindow {
    /// Only inside `set_environment`.
    SetEnvironment,
    /// Inside `init` or content load, before the frame loop.
    ContentLoad,
    /// Only inside `run`.
    Frame,
    /// First announcement inside `set_environment`, later ones anywhere.
    OptionsAnnouncement,
    /// No restriction.
    Anytime,
}

impl CommandWindow {
    /// Window of `command`.
    #[must_use]
    pub const fn of(command: EnvironmentCommand) -> Self {
        use EnvironmentCommand as C;
        match command {
            C::SetSupportNoGame
            | C::SetProcAddressCallback
            | C::SetSubsystemInfo
            | C::SetControllerInfo
            | C::GetVfsInterface => Self::SetEnvironment,
            C::SetPixelFormat
            | C::SetHwRender
            | C::GetCameraInterface
            | C::SetMemoryMaps
            | C::SetSerializationQuirks => Self::ContentLoad,
            C::SetSystemAvInfo
            | C::SetGeometry
            | C::GetInputDeviceCapabilities
            | C::GetCurrentSoftwareFramebuffer => Self::Frame,
            C::SetVariables | C::SetCoreOptions | C::SetCoreOptionsIntl => {
                Self::OptionsAnnouncement
            }
            _ => Self::Anytime,
        }
    }

    /// Returns `true` when a command in this window may run in `phase`.
    ///
    /// `first_announcement` is `true` while no option set was accepted yet.
    #[must_use]
    pub const fn admits(self, phase: CallPhase, first_announcement: bool) -> bool {
        match self {
            Self::SetEnvironment => matches!(phase, CallPhase::SetEnvironment),
            Self::ContentLoad => matches!(phase, CallPhase::Init | CallPhase::LoadGame),
            Self::Frame => matches!(phase, CallPhase::Run),
            Self::OptionsAnnouncement => {
                !first_announcement || matches!(phase, CallPhase::SetEnvironment)
            }
            Self::Anytime => true,
        }
    }
}

/// What the core registered and negotiated so far.
#[derive(Debug, Clone, Default)]
pub struct Registrations {
    /// `SET_SUPPORT_NO_GAME(true)` was accepted.
    pub support_no_game: bool,
    /// `SET_SUPPORT_ACHIEVEMENTS(true)` was accepted.
    pub support_achievements: bool,
    /// Subsystems from `SET_SUBSYSTEM_INFO`.
    pub subsystems: Vec<SubsystemInfo>,
    /// Per-port controller types from `SET_CONTROLLER_INFO`.
    pub controllers: Vec<ControllerInfo>,
    /// `SET_PROC_ADDRESS_CALLBACK` was accepted.
    pub proc_address: bool,
    /// Option count fixed by the first accepted announcement.
    pub option_count: Option<usize>,
    /// Revision of the granted VFS interface.
    pub vfs_version: Option<VfsVersion>,
    /// Frontend answered `GET_CAN_DUPE` with `true`.
    pub can_dupe: bool,
    /// Frontend accepted `GET_INPUT_BITMASKS`.
    pub input_bitmasks: bool,
    /// Quirks left after frontend negotiation.
    pub quirks: Option<SerializationQuirks>,
    /// `SET_KEYBOARD_CALLBACK` was accepted.
    pub keyboard: bool,
    /// Disk-control interface the core registered.
    pub disk_control: Option<DiskControlVersion>,
    /// Disk-control version the frontend reported.
    pub frontend_disk_version: DiskControlVersion,
    /// Reference frame time from `SET_FRAME_TIME_CALLBACK`.
    pub frame_time_reference: Option<i64>,
    /// `SET_AUDIO_CALLBACK` was accepted.
    pub audio_callback: bool,
    /// Accepted `SET_HW_RENDER` request.
    pub hw_render: Option<HwRenderRequest>,
    /// `SET_HW_SHARED_CONTEXT` was accepted.
    pub shared_context: bool,
    /// Pixel format in effect.
    pub pixel_format: PixelFormat,
    /// Accepted memory map.
    pub memory_map: Option<MemoryMap>,
    /// AV info in effect for the loaded content.
    pub av_info: Option<SystemAvInfo>,
}

/// Accepted SET payload to record once the frontend answered `true`.
#[derive(Debug, Clone)]
pub(crate) enum Settlement {
    SupportNoGame(bool),
    SupportAchievements(bool),
    Subsystems(Vec<SubsystemInfo>),
    Controllers(Vec<ControllerInfo>),
    ProcAddress,
    Options(usize),
    Keyboard,
    DiskControl(DiskControlVersion),
    FrameTime(i64),
    AudioCallback,
    HwRender(HwRenderRequest),
    SharedContext,
    PixelFormat(PixelFormat),
    MemoryMap(MemoryMap),
    SystemAvInfo(SystemAvInfo),
    Geometry(GameGeometry),
}

impl Settlement {
    /// Captures what an accepted `call` will register.
    pub(crate) fn capture(call: &EnvironmentCall<'_>) -> Option<Self> {
        use EnvironmentCall as E;
        Some(match call {
            E::SetSupportNoGame(value) => Self::SupportNoGame(*value),
            E::SetSupportAchievements(value) => Self::SupportAchievements(*value),
            E::SetSubsystemInfo(list) => Self::Subsystems(list.to_vec()),
            E::SetControllerInfo(list) => Self::Controllers(list.to_vec()),
            E::SetProcAddressCallback => Self::ProcAddress,
            E::SetVariables(list) => Self::Options(list.len()),
            E::SetCoreOptions(list) => Self::Options(list.len()),
            E::SetCoreOptionsIntl(intl) => Self::Options(intl.us.len()),
            E::SetKeyboardCallback => Self::Keyboard,
            E::SetDiskControlInterface => Self::DiskControl(DiskControlVersion::V0),
            E::SetDiskControlExtInterface => Self::DiskControl(DiskControlVersion::V1),
            E::SetFrameTimeCallback { reference_usec } => Self::FrameTime(*reference_usec),
            E::SetAudioCallback(_) => Self::AudioCallback,
            E::SetHwRender(request) => Self::HwRender(**request),
            E::SetHwSharedContext => Self::SharedContext,
            E::SetPixelFormat(format) => Self::PixelFormat(*format),
            E::SetMemoryMaps(map) => Self::MemoryMap((*map).clone()),
            E::SetSystemAvInfo(info) => Self::SystemAvInfo(**info),
            E::SetGeometry(geometry) => Self::Geometry(**geometry),
            _ => return None,
        })
    }
}

/// Environment call gate and frame auditor for one session.
#[derive(Debug, Clone, Default)]
pub struct EnvironmentGate {
    policy: ViolationPolicy,
    diagnostics: SessionDiagnostics,
    registrations: Registrations,
    before_content: Option<Registrations>,
    audio_mode: Option<AudioMode>,
    frame: FrameAudit,
}

impl EnvironmentGate {
    /// Fresh gate enforcing `policy`.
    #[must_use]
    pub fn new(policy: ViolationPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    /// Policy in effect.
    #[must_use]
    pub const fn policy(&self) -> ViolationPolicy {
        self.policy
    }

    /// Violation counters.
    #[must_use]
    pub const fn diagnostics(&self) -> &SessionDiagnostics {
        &self.diagnostics
    }

    /// Registrations so far.
    #[must_use]
    pub const fn registrations(&self) -> &Registrations {
        &self.registrations
    }

    /// Audio mode fixed by the first sample output.
    #[must_use]
    pub const fn audio_mode(&self) -> Option<AudioMode> {
        self.audio_mode
    }

    /// Records a violation and logs it.
    pub fn record(&mut self, violation: &ContractViolation) {
        match self.policy {
            ViolationPolicy::Warn => log::warn!("contract violation: {violation}"),
            ViolationPolicy::Reject => log::debug!("contract violation: {violation}"),
        }
        self.diagnostics.record_violation(violation);
    }

    /// Records a violation and returns `true` when the offending call should
    /// still go through.
    pub fn report(&mut self, violation: &ContractViolation) -> bool {
        self.record(violation);
        self.policy == ViolationPolicy::Warn
    }

    /// Decides whether `call`, issued from `phase`, reaches the frontend.
    pub fn admit(&mut self, call: &EnvironmentCall<'_>, phase: CallPhase) -> bool {
        self.diagnostics.record_environment_call();
        match self.check(call, phase) {
            Ok(()) => true,
            Err(violation) => {
                let forward = self.report(&violation);
                if !forward {
                    self.diagnostics.record_environment_rejected();
                }
                forward
            }
        }
    }

    fn check(&self, call: &EnvironmentCall<'_>, phase: CallPhase) -> Result<(), ContractViolation> {
        let command = call.command();
        let first_announcement = self.registrations.option_count.is_none();
        if !CommandWindow::of(command).admits(phase, first_announcement) {
            return Err(ContractViolation::CommandOutsideWindow { command, phase });
        }
        match call {
            EnvironmentCall::SetVariables(variables) => {
                for variable in *variables {
                    variable.parse()?;
                }
                self.check_option_count(variables.len())
            }
            EnvironmentCall::SetCoreOptions(definitions) => {
                validate_definitions(definitions)?;
                self.check_option_count(definitions.len())
            }
            EnvironmentCall::SetCoreOptionsIntl(intl) => {
                validate_definitions(&intl.us)?;
                self.check_option_count(intl.us.len())
            }
            EnvironmentCall::SetGeometry(geometry) => match &self.registrations.av_info {
                Some(current) if !current.geometry.same_max(geometry) => {
                    Err(ContractViolation::GeometryMaxChanged {
                        max_width: current.geometry.max_width,
                        max_height: current.geometry.max_height,
                        requested_width: geometry.max_width,
                        requested_height: geometry.max_height,
                    })
                }
                _ => Ok(()),
            },
            EnvironmentCall::SetSubsystemInfo(subsystems) => {
                for subsystem in *subsystems {
                    if !subsystem.has_valid_ident() {
                        return Err(ContractViolation::InvalidSubsystemIdent {
                            ident: subsystem.ident.clone(),
                        });
                    }
                    for memory in subsystem.standard_memory() {
                        log::warn!(
                            "subsystem {} maps {} save data to standard memory type {}",
                            subsystem.ident,
                            memory.extension,
                            memory.memory_type.raw()
                        );
                    }
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn check_option_count(&self, actual: usize) -> Result<(), ContractViolation> {
        match self.registrations.option_count {
            Some(expected) if expected != actual => {
                Err(ContractViolation::OptionCountChanged { expected, actual })
            }
            _ => Ok(()),
        }
    }

    pub(crate) fn registrations_mut(&mut self) -> &mut Registrations {
        &mut self.registrations
    }

    pub(crate) fn settle(&mut self, settlement: Settlement) {
        let registrations = &mut self.registrations;
        match settlement {
            Settlement::SupportNoGame(value) => registrations.support_no_game = value,
            Settlement::SupportAchievements(value) => registrations.support_achievements = value,
            Settlement::Subsystems(list) => registrations.subsystems = list,
            Settlement::Controllers(list) => registrations.controllers = list,
            Settlement::ProcAddress => registrations.proc_address = true,
            Settlement::Options(count) => {
                registrations.option_count.get_or_insert(count);
            }
            Settlement::Keyboard => registrations.keyboard = true,
            Settlement::DiskControl(version) => registrations.disk_control = Some(version),
            Settlement::FrameTime(reference) => {
                registrations.frame_time_reference = Some(reference);
            }
            Settlement::AudioCallback => registrations.audio_callback = true,
            Settlement::HwRender(request) => registrations.hw_render = Some(request),
            Settlement::SharedContext => registrations.shared_context = true,
            Settlement::PixelFormat(format) => registrations.pixel_format = format,
            Settlement::MemoryMap(map) => registrations.memory_map = Some(map),
            Settlement::SystemAvInfo(info) => registrations.av_info = Some(info),
            Settlement::Geometry(geometry) => {
                if let Some(info) = &mut registrations.av_info {
                    info.geometry.base_width = geometry.base_width;
                    info.geometry.base_height = geometry.base_height;
                    info.geometry.aspect_ratio = geometry.aspect_ratio;
                }
            }
        }
    }

    /// Freezes the one-time announcements made during `set_environment`.
    pub(crate) fn capabilities(&self) -> Capabilities {
        let registrations = &self.registrations;
        Capabilities {
            support_no_game: registrations.support_no_game,
            support_achievements: registrations.support_achievements,
            subsystems: registrations.subsystems.clone(),
            controllers: registrations.controllers.clone(),
            proc_address: registrations.proc_address,
            option_count: registrations.option_count,
            vfs_version: registrations.vfs_version,
        }
    }

    /// Remembers the registrations that outlive content, before `load_game`.
    pub(crate) fn begin_content(&mut self) {
        self.before_content = Some(self.registrations.clone());
    }

    pub(crate) fn content_loaded(&mut self, info: SystemAvInfo) {
        self.registrations.av_info = Some(info);
    }

    /// Drops whatever a failed `load_game` registered.
    pub(crate) fn content_failed(&mut self) {
        self.restore_before_content();
    }

    /// Drops every registration tied to the unloaded content.
    pub(crate) fn content_unloaded(&mut self) {
        self.restore_before_content();
        self.registrations.av_info = None;
    }

    fn restore_before_content(&mut self) {
        if let Some(saved) = self.before_content.take() {
            let option_count = self.registrations.option_count.or(saved.option_count);
            self.registrations = saved;
            self.registrations.option_count = option_count;
        }
    }

    pub(crate) fn begin_frame(&mut self) {
        self.frame = FrameAudit::default();
    }

    /// Closes the frame audit and returns every violation seen in the frame.
    pub(crate) fn end_frame(&mut self, audit_frame: bool) -> Vec<ContractViolation> {
        self.diagnostics.record_frame();
        let mut frame = std::mem::take(&mut self.frame);
        if audit_frame {
            if frame.input_polls == 0 {
                let violation = ContractViolation::MissingInputPoll;
                self.record(&violation);
                frame.violations.push(violation);
            }
            if frame.video_frames != 1 {
                let violation = ContractViolation::VideoRefreshCount {
                    count: frame.video_frames,
                };
                self.record(&violation);
                frame.violations.push(violation);
            }
        }
        frame.violations
    }

    pub(crate) fn frame_mut(&mut self) -> &mut FrameAudit {
        &mut self.frame
    }

    /// Records a violation raised inside a frame; returns `true` when the
    /// offending output should still reach the frontend.
    pub(crate) fn report_frame(&mut self, violation: ContractViolation) -> bool {
        let forward = self.report(&violation);
        self.frame.violations.push(violation);
        forward
    }

    /// Fixes or checks the session audio mode.
    pub(crate) fn audio_output(&mut self, mode: AudioMode) -> bool {
        match self.audio_mode {
            None => {
                self.audio_mode = Some(mode);
                true
            }
            Some(established) if established == mode => true,
            Some(established) => {
                self.report_frame(ContractViolation::MixedAudioModes { established })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CallPhase, CommandWindow, EnvironmentGate, Settlement};
    use crate::api::ViolationPolicy;
    use crate::av::{GameGeometry, SystemAvInfo};
    use crate::environment::call::EnvironmentCall;
    use crate::environment::command::EnvironmentCommand;
    use crate::hw_render::{HwContextType, HwRenderRequest};
    use crate::options::{CoreOptionDefinition, CoreOptionValue};
    use crate::serialization::SerializationQuirks;
    use crate::ContractViolation;
    use rstest::rstest;

    #[rstest]
    #[case(EnvironmentCommand::SetSupportNoGame, CallPhase::SetEnvironment, true)]
    #[case(EnvironmentCommand::SetSupportNoGame, CallPhase::Init, false)]
    #[case(EnvironmentCommand::GetVfsInterface, CallPhase::LoadGame, false)]
    #[case(EnvironmentCommand::SetPixelFormat, CallPhase::LoadGame, true)]
    #[case(EnvironmentCommand::SetPixelFormat, CallPhase::Init, true)]
    #[case(EnvironmentCommand::SetPixelFormat, CallPhase::Run, false)]
    #[case(EnvironmentCommand::SetMemoryMaps, CallPhase::SetEnvironment, false)]
    #[case(EnvironmentCommand::SetGeometry, CallPhase::Run, true)]
    #[case(EnvironmentCommand::SetGeometry, CallPhase::LoadGame, false)]
    #[case(EnvironmentCommand::GetCurrentSoftwareFramebuffer, CallPhase::Other, false)]
    #[case(EnvironmentCommand::GetVariable, CallPhase::Run, true)]
    #[case(EnvironmentCommand::SetMessage, CallPhase::Other, true)]
    #[case(EnvironmentCommand::SetSerializationQuirks, CallPhase::Init, true)]
    #[case(EnvironmentCommand::SetSerializationQuirks, CallPhase::LoadGame, true)]
    #[case(EnvironmentCommand::SetSerializationQuirks, CallPhase::Run, false)]
    fn windows_follow_command_table(
        #[case] command: EnvironmentCommand,
        #[case] phase: CallPhase,
        #[case] admitted: bool,
    ) {
        assert_eq!(CommandWindow::of(command).admits(phase, true), admitted);
    }

    #[test]
    fn option_reannouncement_is_allowed_outside_set_environment() {
        let window = CommandWindow::of(EnvironmentCommand::SetCoreOptions);
        assert!(!window.admits(CallPhase::Run, true));
        assert!(window.admits(CallPhase::Run, false));
    }

    fn definitions(count: usize) -> Vec<CoreOptionDefinition> {
        (0..count)
            .map(|n| CoreOptionDefinition {
                key: format!("core_option_{n}"),
                desc: "Option".to_owned(),
                info: None,
                values: vec![CoreOptionValue::new("on"), CoreOptionValue::new("off")],
                default_value: None,
            })
            .collect()
    }

    #[rstest]
    #[case(ViolationPolicy::Reject, false)]
    #[case(ViolationPolicy::Warn, true)]
    fn count_change_follows_policy(#[case] policy: ViolationPolicy, #[case] forwarded: bool) {
        let mut gate = EnvironmentGate::new(policy);
        gate.registrations_mut().option_count = Some(3);
        let four = definitions(4);
        assert_eq!(
            gate.admit(&EnvironmentCall::SetCoreOptions(&four), CallPhase::Run),
            forwarded
        );
        assert_eq!(gate.diagnostics().options_violations, 1);
        assert_eq!(
            gate.diagnostics().last_violation,
            Some(ContractViolation::OptionCountChanged {
                expected: 3,
                actual: 4
            })
        );
        let three = definitions(3);
        assert!(gate.admit(&EnvironmentCall::SetCoreOptions(&three), CallPhase::Run));
    }

    #[test]
    fn geometry_may_not_touch_max_size() {
        let mut gate = EnvironmentGate::new(ViolationPolicy::Reject);
        let geometry = GameGeometry {
            base_width: 256,
            base_height: 224,
            max_width: 512,
            max_height: 448,
            aspect_ratio: 4.0 / 3.0,
        };
        gate.content_loaded(SystemAvInfo {
            geometry,
            ..SystemAvInfo::default()
        });
        let smaller = GameGeometry {
            base_width: 256,
            base_height: 240,
            ..geometry
        };
        assert!(gate.admit(&EnvironmentCall::SetGeometry(&smaller), CallPhase::Run));

        let larger = GameGeometry {
            max_width: 1024,
            ..geometry
        };
        assert!(!gate.admit(&EnvironmentCall::SetGeometry(&larger), CallPhase::Run));
        assert_eq!(gate.diagnostics().environment_rejected, 1);
    }

    #[test]
    fn accepted_geometry_keeps_the_max_size() {
        let mut gate = EnvironmentGate::new(ViolationPolicy::Warn);
        let geometry = GameGeometry {
            base_width: 256,
            base_height: 224,
            max_width: 512,
            max_height: 478,
            aspect_ratio: 4.0 / 3.0,
        };
        gate.content_loaded(SystemAvInfo {
            geometry,
            ..SystemAvInfo::default()
        });
        gate.settle(Settlement::Geometry(GameGeometry {
            base_width: 320,
            base_height: 240,
            max_width: 1024,
            max_height: 1024,
            aspect_ratio: 16.0 / 9.0,
        }));

        let settled = gate.registrations().av_info.map(|info| info.geometry);
        assert_eq!(
            settled,
            Some(GameGeometry {
                base_width: 320,
                base_height: 240,
                max_width: 512,
                max_height: 478,
                aspect_ratio: 16.0 / 9.0,
            })
        );
    }

    #[test]
    fn failed_or_unloaded_content_drops_its_registrations() {
        let mut gate = EnvironmentGate::new(ViolationPolicy::Reject);
        gate.settle(Settlement::Options(2));
        gate.settle(Settlement::Keyboard);

        gate.begin_content();
        gate.settle(Settlement::HwRender(HwRenderRequest {
            context_type: HwContextType::OpenGlCore,
            ..HwRenderRequest::default()
        }));
        gate.registrations_mut().quirks = Some(SerializationQuirks::CORE_VARIABLE_SIZE);
        gate.content_failed();
        assert!(gate.registrations().hw_render.is_none());
        assert!(gate.registrations().quirks.is_none());
        assert!(gate.registrations().keyboard);
        assert_eq!(gate.registrations().option_count, Some(2));

        gate.begin_content();
        gate.settle(Settlement::FrameTime(16_667));
        gate.content_loaded(SystemAvInfo::default());
        gate.content_unloaded();
        assert!(gate.registrations().frame_time_reference.is_none());
        assert!(gate.registrations().av_info.is_none());
        assert!(gate.registrations().keyboard);
    }
}
