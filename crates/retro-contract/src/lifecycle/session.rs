//! The session: the only way a frontend calls into a core.

use thiserror::Error;

use crate::api::{Capabilities, SessionConfig, ViolationPolicy, API_VERSION};
use crate::av::{Region, SystemAvInfo};
use crate::core::{Core, GameInfo, ProcAddress, SystemInfo};
use crate::device::{DeviceType, KeyboardEvent};
use crate::diag::SessionDiagnostics;
use crate::disk::DiskControlHandle;
use crate::environment::{CallPhase, EnvironmentClient, EnvironmentGate, Registrations};
use crate::frame::{FrameContext, Frontend};
use crate::lifecycle::{CoreHook, LifecycleCall, LifecycleState};
use crate::memory::MemoryType;
use crate::serialization::SaveStateBudget;
use crate::ContractViolation;

/// Errors from session calls.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// Core was built against another interface version.
    #[error("core reports interface version {found}, expected {expected}")]
    IncompatibleApiVersion {
        /// Version this library implements.
        expected: u32,
        /// Version the core reported.
        found: u32,
    },
    /// Call broke the contract and was not forwarded.
    #[error(transparent)]
    Violation(#[from] ContractViolation),
    /// Core answered `false`.
    #[error("core refused {0}")]
    Rejected(LifecycleCall),
}

/// A core and a frontend bound together under the lifecycle contract.
///
/// Every call checks the lifecycle state first; calls the state does not
/// permit are recorded and never reach the core.
pub struct Session<C: Core, F: Frontend> {
    core: C,
    frontend: F,
    config: SessionConfig,
    state: LifecycleState,
    gate: EnvironmentGate,
    capabilities: Capabilities,
    budget: Option<SaveStateBudget>,
}

impl<C: Core, F: Frontend> std::fmt::Debug for Session<C, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state)
            .field("config", &self.config)
            .field("capabilities", &self.capabilities)
            .finish_non_exhaustive()
    }
}

impl<C: Core, F: Frontend> Session<C, F> {
    /// Binds `core` to `frontend` and hands over the environment.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::IncompatibleApiVersion`] when the core reports
    /// an interface version other than [`API_VERSION`]; `set_environment` is
    /// not called in that case.
    pub fn new(mut core: C, mut frontend: F, config: SessionConfig) -> Result<Self, SessionError> {
        let found = core.api_version();
        if found != API_VERSION {
            return Err(SessionError::IncompatibleApiVersion {
                expected: API_VERSION,
                found,
            });
        }
        let mut gate = EnvironmentGate::new(config.violation_policy);
        {
            let mut env = EnvironmentClient::new(&mut frontend, &mut gate, CallPhase::SetEnvironment);
            core.set_environment(&mut env);
        }
        let capabilities = gate.capabilities();
        let info = core.system_info();
        log::info!(
            "attached core {} {}",
            info.library_name,
            info.library_version
        );
        Ok(Self {
            core,
            frontend,
            config,
            state: LifecycleState::EnvironmentSet,
            gate,
            capabilities,
            budget: None,
        })
    }

    fn enter(&mut self, call: LifecycleCall) -> Result<(), SessionError> {
        if self.state.permits(call) {
            return Ok(());
        }
        self.refuse(ContractViolation::OutOfOrder {
            call,
            state: self.state,
        })
    }

    fn refuse(&mut self, violation: ContractViolation) -> Result<(), SessionError> {
        self.gate.record(&violation);
        Err(SessionError::Violation(violation))
    }

    fn require_hook(&mut self, hook: CoreHook, registered: bool) -> Result<(), SessionError> {
        self.enter(LifecycleCall::Hook(hook))?;
        if registered {
            Ok(())
        } else {
            self.refuse(ContractViolation::HookNotRegistered { hook })
        }
    }

    /// Initializes the core.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Violation`] unless the environment was just set.
    pub fn init(&mut self) -> Result<(), SessionError> {
        self.enter(LifecycleCall::Init)?;
        let mut env = EnvironmentClient::new(&mut self.frontend, &mut self.gate, CallPhase::Init);
        self.core.init(&mut env);
        self.state = self.state.after(LifecycleCall::Init);
        Ok(())
    }

    /// Loads content; `None` starts a core that announced no-game support.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Violation`] when called out of order or with
    /// `None` for a core without no-game support, and
    /// [`SessionError::Rejected`] when the core fails to load.
    pub fn load_game(&mut self, game: Option<&GameInfo>) -> Result<(), SessionError> {
        self.enter(LifecycleCall::LoadGame)?;
        if game.is_none() && !self.capabilities.support_no_game {
            return self.refuse(ContractViolation::ContentRequired);
        }
        self.gate.begin_content();
        let loaded = {
            let mut env =
                EnvironmentClient::new(&mut self.frontend, &mut self.gate, CallPhase::LoadGame);
            self.core.load_game(game, &mut env)
        };
        self.finish_load(LifecycleCall::LoadGame, loaded)
    }

    /// Loads several pieces of content as subsystem `game_type`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Violation`] when called out of order, for a
    /// type the core never announced, or with a content count that differs
    /// from the subsystem's ROM list; [`SessionError::Rejected`] when the
    /// core fails to load.
    pub fn load_game_special(
        &mut self,
        game_type: u32,
        games: &[GameInfo],
    ) -> Result<(), SessionError> {
        self.enter(LifecycleCall::LoadGameSpecial)?;
        let Some(subsystem) = self.capabilities.subsystem(game_type) else {
            return self.refuse(ContractViolation::UnknownSubsystem { game_type });
        };
        let expected = subsystem.roms.len();
        if expected != games.len() {
            return self.refuse(ContractViolation::SubsystemContentMismatch {
                game_type,
                expected,
                actual: games.len(),
            });
        }
        self.gate.begin_content();
        let loaded = {
            let mut env =
                EnvironmentClient::new(&mut self.frontend, &mut self.gate, CallPhase::LoadGame);
            self.core.load_game_special(game_type, games, &mut env)
        };
        self.finish_load(LifecycleCall::LoadGameSpecial, loaded)
    }

    fn finish_load(&mut self, call: LifecycleCall, loaded: bool) -> Result<(), SessionError> {
        if !loaded {
            log::info!("core failed to load content");
            self.gate.content_failed();
            return Err(SessionError::Rejected(call));
        }
        let info = self.core.system_av_info();
        let geometry = info.geometry;
        if !geometry.fits(geometry.base_width, geometry.base_height) {
            log::warn!(
                "base geometry {}x{} exceeds maximum {}x{}",
                geometry.base_width,
                geometry.base_height,
                geometry.max_width,
                geometry.max_height
            );
        }
        self.gate.content_loaded(info);
        let registrations = self.gate.registrations();
        if registrations.audio_callback && registrations.frame_time_reference.is_none() {
            log::warn!("audio callback registered without a frame-time callback");
        }
        let quirks = registrations.quirks.unwrap_or_default();
        self.budget = Some(SaveStateBudget::new(quirks));
        self.state = self.state.after(call);
        Ok(())
    }

    /// AV parameters of the loaded content.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Violation`] without loaded content.
    pub fn system_av_info(&mut self) -> Result<SystemAvInfo, SessionError> {
        self.enter(LifecycleCall::SystemAvInfo)?;
        Ok(self.core.system_av_info())
    }

    /// Runs one frame.
    ///
    /// When the core registered a frame-time callback it first receives the
    /// reference frame time.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Violation`] without loaded content, and under
    /// [`ViolationPolicy::Reject`] for the first frame rule the core broke.
    pub fn run(&mut self) -> Result<(), SessionError> {
        self.run_frame(None)
    }

    /// Runs one frame, reporting `usec` since the previous one to the
    /// frame-time callback.
    ///
    /// # Errors
    ///
    /// Same as [`Session::run`].
    pub fn run_timed(&mut self, usec: i64) -> Result<(), SessionError> {
        self.run_frame(Some(usec))
    }

    fn run_frame(&mut self, usec: Option<i64>) -> Result<(), SessionError> {
        self.enter(LifecycleCall::Run)?;
        if let Some(reference) = self.gate.registrations().frame_time_reference {
            self.core.frame_time(usec.unwrap_or(reference));
        }
        self.gate.begin_frame();
        {
            let mut frame = FrameContext::new(&mut self.frontend, &mut self.gate);
            self.core.run(&mut frame);
        }
        let violations = self.gate.end_frame(self.config.audit_frames);
        self.state = self.state.after(LifecycleCall::Run);
        match violations.into_iter().next() {
            Some(violation) if self.config.violation_policy == ViolationPolicy::Reject => {
                Err(SessionError::Violation(violation))
            }
            _ => Ok(()),
        }
    }

    /// Soft-resets the core.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Violation`] without loaded content.
    pub fn reset(&mut self) -> Result<(), SessionError> {
        self.enter(LifecycleCall::Reset)?;
        let mut env = EnvironmentClient::new(&mut self.frontend, &mut self.gate, CallPhase::Other);
        self.core.reset(&mut env);
        Ok(())
    }

    /// Save-state budget carrying the quirks registered so far.
    fn budget(&mut self) -> &mut SaveStateBudget {
        let quirks = self.gate.registrations().quirks.unwrap_or_default();
        let budget = self.budget.get_or_insert_with(|| SaveStateBudget::new(quirks));
        budget.renegotiate(quirks);
        budget
    }

    fn observe_size(&mut self) -> Result<usize, SessionError> {
        let size = self.core.serialize_size();
        if let Err(violation) = self.budget().observe_size(size) {
            if !self.gate.report(&violation) {
                return Err(SessionError::Violation(violation));
            }
        }
        Ok(size)
    }

    /// Bytes needed for a save state.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Violation`] without loaded content, or under
    /// [`ViolationPolicy::Reject`] when the size grew without a
    /// variable-size quirk.
    pub fn serialize_size(&mut self) -> Result<usize, SessionError> {
        self.enter(LifecycleCall::SerializeSize)?;
        self.observe_size()
    }

    /// Captures a save state into `buffer`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Violation`] without loaded content or when
    /// `buffer` is shorter than the current state size, and
    /// [`SessionError::Rejected`] when the core fails.
    pub fn serialize(&mut self, buffer: &mut [u8]) -> Result<(), SessionError> {
        self.enter(LifecycleCall::Serialize)?;
        let required = self.observe_size()?;
        if buffer.len() < required {
            return self.refuse(ContractViolation::SaveStateBufferTooSmall {
                required,
                provided: buffer.len(),
            });
        }
        let succeeded = self.core.serialize(buffer);
        if self.budget().record_serialize(succeeded) {
            log::debug!("serialize failed before the core finished initializing");
        }
        if succeeded {
            Ok(())
        } else {
            Err(SessionError::Rejected(LifecycleCall::Serialize))
        }
    }

    /// Restores a save state.
    ///
    /// A failure the negotiated quirks do not excuse marks the session
    /// state as suspect.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Violation`] without loaded content and
    /// [`SessionError::Rejected`] when the core fails.
    pub fn unserialize(&mut self, buffer: &[u8]) -> Result<(), SessionError> {
        self.enter(LifecycleCall::Unserialize)?;
        let succeeded = self.core.unserialize(buffer);
        self.budget().record_unserialize(succeeded);
        if succeeded {
            Ok(())
        } else {
            if self.state_suspect() {
                log::warn!("save state failed to load; emulation state may be corrupt");
            }
            Err(SessionError::Rejected(LifecycleCall::Unserialize))
        }
    }

    /// Returns `true` after a save-state load failed without the quirks
    /// excusing it.
    #[must_use]
    pub fn state_suspect(&self) -> bool {
        self.budget.as_ref().is_some_and(SaveStateBudget::is_suspect)
    }

    /// Clears all cheats.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Violation`] without loaded content.
    pub fn cheat_reset(&mut self) -> Result<(), SessionError> {
        self.enter(LifecycleCall::CheatReset)?;
        self.core.cheat_reset();
        Ok(())
    }

    /// Applies cheat `index`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Violation`] without loaded content.
    pub fn cheat_set(&mut self, index: u32, enabled: bool, code: &str) -> Result<(), SessionError> {
        self.enter(LifecycleCall::CheatSet)?;
        self.core.cheat_set(index, enabled, code);
        Ok(())
    }

    /// Video standard of the loaded content.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Violation`] without loaded content.
    pub fn region(&mut self) -> Result<Region, SessionError> {
        self.enter(LifecycleCall::Region)?;
        Ok(self.core.region())
    }

    /// Core memory region `id`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Violation`] without loaded content.
    pub fn memory(&mut self, id: MemoryType) -> Result<Option<&mut [u8]>, SessionError> {
        self.enter(LifecycleCall::MemoryData)?;
        Ok(self.core.memory(id))
    }

    /// Assigns `device` to `port`.
    ///
    /// A device the core did not announce for the port is logged and still
    /// passed on.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Violation`] outside `init`..`deinit`.
    pub fn set_controller_port_device(
        &mut self,
        port: u32,
        device: DeviceType,
    ) -> Result<(), SessionError> {
        self.enter(LifecycleCall::ControllerPortDevice)?;
        let announced = self.capabilities.controllers.get(port as usize);
        if let Some(info) = announced {
            let known = device == DeviceType::NONE
                || info.types.iter().any(|description| description.id == device);
            if !known {
                log::warn!(
                    "device {} was not announced for port {port}",
                    device.raw()
                );
            }
        }
        let mut env = EnvironmentClient::new(&mut self.frontend, &mut self.gate, CallPhase::Other);
        self.core.set_controller_port_device(port, device, &mut env);
        Ok(())
    }

    /// Forwards a keyboard event.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Violation`] unless the core registered the
    /// keyboard callback.
    pub fn keyboard_event(&mut self, event: KeyboardEvent) -> Result<(), SessionError> {
        let registered = self.gate.registrations().keyboard;
        self.require_hook(CoreHook::Keyboard, registered)?;
        self.core.keyboard_event(event);
        Ok(())
    }

    /// Disk control of the core.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Violation`] unless the core registered a
    /// disk-control interface and exposes it.
    pub fn disk_control(&mut self) -> Result<DiskControlHandle<'_>, SessionError> {
        let registered = self.gate.registrations().disk_control;
        self.require_hook(CoreHook::DiskControl, registered.is_some())?;
        let version = registered.unwrap_or_default();
        match self.core.disk_control() {
            Some(control) => Ok(DiskControlHandle::new(control, &mut self.gate, version)),
            None => {
                let violation = ContractViolation::HookNotRegistered {
                    hook: CoreHook::DiskControl,
                };
                self.gate.record(&violation);
                Err(SessionError::Violation(violation))
            }
        }
    }

    /// Resolves an extension symbol.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Violation`] unless the core registered the
    /// proc-address callback during `set_environment`.
    pub fn proc_address(&mut self, symbol: &str) -> Result<Option<ProcAddress>, SessionError> {
        let registered = self.capabilities.proc_address;
        self.require_hook(CoreHook::ProcAddress, registered)?;
        Ok(self.core.proc_address(symbol))
    }

    /// Tells the core its hardware context was (re)created.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Violation`] unless `SET_HW_RENDER` was
    /// accepted.
    pub fn hw_context_reset(&mut self) -> Result<(), SessionError> {
        let registered = self.gate.registrations().hw_render.is_some();
        self.require_hook(CoreHook::HwContext, registered)?;
        let mut env = EnvironmentClient::new(&mut self.frontend, &mut self.gate, CallPhase::Other);
        self.core.hw_context_reset(&mut env);
        Ok(())
    }

    /// Tells the core its hardware context is about to go away.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Violation`] unless `SET_HW_RENDER` was
    /// accepted.
    pub fn hw_context_destroy(&mut self) -> Result<(), SessionError> {
        let registered = self.gate.registrations().hw_render.is_some();
        self.require_hook(CoreHook::HwContext, registered)?;
        self.core.hw_context_destroy();
        Ok(())
    }

    /// Unloads content.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Violation`] without loaded content.
    pub fn unload_game(&mut self) -> Result<(), SessionError> {
        self.enter(LifecycleCall::UnloadGame)?;
        {
            let mut env =
                EnvironmentClient::new(&mut self.frontend, &mut self.gate, CallPhase::Other);
            self.core.unload_game(&mut env);
        }
        self.gate.content_unloaded();
        self.budget = None;
        self.state = self.state.after(LifecycleCall::UnloadGame);
        Ok(())
    }

    /// Tears the core down; every later call is a violation.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Violation`] while content is loaded or
    /// before `init`.
    pub fn deinit(&mut self) -> Result<(), SessionError> {
        self.enter(LifecycleCall::Deinit)?;
        self.core.deinit();
        self.state = self.state.after(LifecycleCall::Deinit);
        Ok(())
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> LifecycleState {
        self.state
    }

    /// Session configuration.
    #[must_use]
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Announcements fixed during `set_environment`.
    #[must_use]
    pub const fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    /// Everything the core registered so far.
    #[must_use]
    pub const fn registrations(&self) -> &Registrations {
        self.gate.registrations()
    }

    /// Violation and call counters.
    #[must_use]
    pub const fn diagnostics(&self) -> &SessionDiagnostics {
        self.gate.diagnostics()
    }

    /// Static description of the core; legal in every state.
    #[must_use]
    pub fn system_info(&self) -> SystemInfo {
        self.core.system_info()
    }

    /// The core, read-only.
    #[must_use]
    pub const fn core(&self) -> &C {
        &self.core
    }

    /// The frontend.
    #[must_use]
    pub const fn frontend(&self) -> &F {
        &self.frontend
    }

    /// The frontend, mutably; frontend state is not part of the contract.
    pub fn frontend_mut(&mut self) -> &mut F {
        &mut self.frontend
    }

    /// Dismantles the session.
    pub fn into_parts(self) -> (C, F) {
        (self.core, self.frontend)
    }
}
