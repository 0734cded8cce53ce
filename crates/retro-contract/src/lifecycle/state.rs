//! Core lifecycle states and the entry points each state permits.

use std::fmt;

/// Lifecycle state of a core as driven by a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum LifecycleState {
    /// Core constructed, environment not yet handed over.
    #[default]
    Uninitialized,
    /// `set_environment` ran; capabilities are fixed.
    EnvironmentSet,
    /// `init` ran; content may be loaded.
    Initialized,
    /// Content loaded, no frame run yet.
    ContentLoaded,
    /// At least one frame ran on the loaded content.
    Running,
    /// Content unloaded; new content may be loaded or the core deinitialized.
    ContentUnloaded,
    /// `deinit` ran; nothing else is permitted.
    Deinitialized,
}

impl LifecycleState {
    /// Returns `true` while content is loaded.
    #[must_use]
    pub const fn has_content(self) -> bool {
        matches!(self, Self::ContentLoaded | Self::Running)
    }

    /// Returns `true` between `init` and `deinit`.
    #[must_use]
    pub const fn is_initialized(self) -> bool {
        matches!(
            self,
            Self::Initialized | Self::ContentLoaded | Self::Running | Self::ContentUnloaded
        )
    }

    /// Returns `true` when `call` may be issued in this state.
    #[must_use]
    pub const fn permits(self, call: LifecycleCall) -> bool {
        match call {
            LifecycleCall::SetEnvironment => matches!(self, Self::Uninitialized),
            LifecycleCall::Init => matches!(self, Self::EnvironmentSet),
            LifecycleCall::LoadGame | LifecycleCall::LoadGameSpecial => {
                matches!(self, Self::Initialized | Self::ContentUnloaded)
            }
            LifecycleCall::SystemAvInfo
            | LifecycleCall::Run
            | LifecycleCall::Reset
            | LifecycleCall::SerializeSize
            | LifecycleCall::Serialize
            | LifecycleCall::Unserialize
            | LifecycleCall::CheatReset
            | LifecycleCall::CheatSet
            | LifecycleCall::Region
            | LifecycleCall::MemoryData
            | LifecycleCall::UnloadGame => self.has_content(),
            LifecycleCall::ControllerPortDevice | LifecycleCall::Hook(_) => self.is_initialized(),
            LifecycleCall::Deinit => matches!(self, Self::Initialized | Self::ContentUnloaded),
        }
    }

    /// State after `call` completed successfully.
    #[must_use]
    pub const fn after(self, call: LifecycleCall) -> Self {
        match call {
            LifecycleCall::SetEnvironment => Self::EnvironmentSet,
            LifecycleCall::Init => Self::Initialized,
            LifecycleCall::LoadGame | LifecycleCall::LoadGameSpecial => Self::ContentLoaded,
            LifecycleCall::Run => Self::Running,
            LifecycleCall::UnloadGame => Self::ContentUnloaded,
            LifecycleCall::Deinit => Self::Deinitialized,
            _ => self,
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Uninitialized => "uninitialized",
            Self::EnvironmentSet => "environment set",
            Self::Initialized => "initialized",
            Self::ContentLoaded => "content loaded",
            Self::Running => "running",
            Self::ContentUnloaded => "content unloaded",
            Self::Deinitialized => "deinitialized",
        })
    }
}

/// Core entry points a session issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum LifecycleCall {
    /// Environment hand-over.
    SetEnvironment,
    /// One-time initialization.
    Init,
    /// Ordinary content load.
    LoadGame,
    /// Subsystem content load.
    LoadGameSpecial,
    /// AV info query.
    SystemAvInfo,
    /// One frame.
    Run,
    /// Soft reset.
    Reset,
    /// Save-state size query.
    SerializeSize,
    /// Save-state capture.
    Serialize,
    /// Save-state restore.
    Unserialize,
    /// Clear all cheats.
    CheatReset,
    /// Apply one cheat.
    CheatSet,
    /// Region query.
    Region,
    /// Core memory region access.
    MemoryData,
    /// Controller assignment for a port.
    ControllerPortDevice,
    /// Registered hook dispatch.
    Hook(CoreHook),
    /// Content unload.
    UnloadGame,
    /// Final teardown.
    Deinit,
}

impl fmt::Display for LifecycleCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SetEnvironment => f.write_str("set_environment"),
            Self::Init => f.write_str("init"),
            Self::LoadGame => f.write_str("load_game"),
            Self::LoadGameSpecial => f.write_str("load_game_special"),
            Self::SystemAvInfo => f.write_str("system_av_info"),
            Self::Run => f.write_str("run"),
            Self::Reset => f.write_str("reset"),
            Self::SerializeSize => f.write_str("serialize_size"),
            Self::Serialize => f.write_str("serialize"),
            Self::Unserialize => f.write_str("unserialize"),
            Self::CheatReset => f.write_str("cheat_reset"),
            Self::CheatSet => f.write_str("cheat_set"),
            Self::Region => f.write_str("region"),
            Self::MemoryData => f.write_str("memory"),
            Self::ControllerPortDevice => f.write_str("set_controller_port_device"),
            Self::Hook(hook) => write!(f, "{hook} hook"),
            Self::UnloadGame => f.write_str("unload_game"),
            Self::Deinit => f.write_str("deinit"),
        }
    }
}

/// Core-side callbacks that exist only after the matching SET command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum CoreHook {
    /// `SET_KEYBOARD_CALLBACK`.
    Keyboard,
    /// `SET_FRAME_TIME_CALLBACK`.
    FrameTime,
    /// `SET_DISK_CONTROL_INTERFACE` or its extended form.
    DiskControl,
    /// `SET_HW_RENDER` context reset/destroy.
    HwContext,
    /// `SET_PROC_ADDRESS_CALLBACK`.
    ProcAddress,
}

impl fmt::Display for CoreHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Keyboard => "keyboard",
            Self::FrameTime => "frame time",
            Self::DiskControl => "disk control",
            Self::HwContext => "hardware context",
            Self::ProcAddress => "proc address",
        })
    }
}
