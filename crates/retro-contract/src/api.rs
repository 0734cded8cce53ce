//! Public session-facing API: interface version, configuration and the
//! capabilities a core fixes during `set_environment`.

use crate::environment::{ControllerInfo, SubsystemInfo};
use crate::vfs::VfsVersion;

/// Interface version a core must report to be loaded.
pub const API_VERSION: u32 = 1;

/// What a session does with a contract violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum ViolationPolicy {
    /// Record the violation and keep the offending call from the other side.
    #[default]
    Reject,
    /// Record and log the violation, then let the call through.
    Warn,
}

/// Top-level configuration for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct SessionConfig {
    /// Handling of contract violations.
    pub violation_policy: ViolationPolicy,
    /// Checks input polling and the video refresh count after every frame.
    pub audit_frames: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            violation_policy: ViolationPolicy::Reject,
            audit_frames: true,
        }
    }
}

impl SessionConfig {
    /// Config that logs violations instead of refusing calls.
    #[must_use]
    pub const fn permissive() -> Self {
        Self {
            violation_policy: ViolationPolicy::Warn,
            audit_frames: true,
        }
    }
}

/// One-time announcements captured when `set_environment` returns.
///
/// Later attempts to change them are refused by the call windows, so the
/// value stays valid for the whole session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Capabilities {
    /// Core runs without content.
    pub support_no_game: bool,
    /// Core supports achievements.
    pub support_achievements: bool,
    /// Announced subsystem content types.
    pub subsystems: Vec<SubsystemInfo>,
    /// Announced controller types per port.
    pub controllers: Vec<ControllerInfo>,
    /// Core resolves extension symbols.
    pub proc_address: bool,
    /// Option count fixed by the first announcement.
    pub option_count: Option<usize>,
    /// Granted VFS revision.
    pub vfs_version: Option<VfsVersion>,
}

impl Capabilities {
    /// Subsystem announced with `game_type`.
    #[must_use]
    pub fn subsystem(&self, game_type: u32) -> Option<&SubsystemInfo> {
        self.subsystems
            .iter()
            .find(|subsystem| subsystem.id == game_type)
    }
}
