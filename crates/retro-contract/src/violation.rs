use thiserror::Error;

use crate::environment::{CallPhase, EnvironmentCommand};
use crate::frame::AudioMode;
use crate::lifecycle::{CoreHook, LifecycleCall, LifecycleState};
use crate::options::OptionsError;

/// Violation classes used for diagnostics aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum ViolationClass {
    /// Entry point called out of lifecycle order.
    Lifecycle,
    /// Environment command issued outside its window or with bad data.
    Environment,
    /// Core option announcements broke the re-announcement rules.
    Options,
    /// Per-frame callback rules broken inside `run`.
    Frame,
    /// Save-state size or buffer rules broken.
    Serialization,
    /// Disk-control protocol misuse.
    Disk,
}

/// Contract violations detected by a [`crate::Session`].
///
/// None of these can be produced by a core and frontend that follow the
/// contract; under [`crate::ViolationPolicy::Reject`] the offending call does
/// not reach the other side.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractViolation {
    /// Entry point not permitted in the current lifecycle state.
    #[error("{call} is not permitted while {state}")]
    OutOfOrder {
        /// Rejected entry point.
        call: LifecycleCall,
        /// State at the time of the call.
        state: LifecycleState,
    },
    /// `load_game(None)` without the core announcing no-game support.
    #[error("content is required: core did not announce no-game support")]
    ContentRequired,
    /// `load_game_special` with a type the core never announced.
    #[error("subsystem type {game_type} was not announced")]
    UnknownSubsystem {
        /// Requested subsystem type.
        game_type: u32,
    },
    /// `load_game_special` with the wrong number of content entries.
    #[error("subsystem type {game_type} takes {expected} content entries, got {actual}")]
    SubsystemContentMismatch {
        /// Requested subsystem type.
        game_type: u32,
        /// Entries announced for the subsystem.
        expected: usize,
        /// Entries supplied.
        actual: usize,
    },
    /// Announced subsystem identifier is not lowercase ASCII letters.
    #[error("subsystem identifier {ident:?} must be [a-z]+")]
    InvalidSubsystemIdent {
        /// Offending identifier.
        ident: String,
    },
    /// Frontend routed a hook the core never registered.
    #[error("{hook} hook was not registered by the core")]
    HookNotRegistered {
        /// Unregistered hook.
        hook: CoreHook,
    },
    /// Environment command issued outside its call window.
    #[error("{command} is not permitted during {phase}")]
    CommandOutsideWindow {
        /// Offending command.
        command: EnvironmentCommand,
        /// Lifecycle phase the command was issued from.
        phase: CallPhase,
    },
    /// `SET_GEOMETRY` tried to change the maximum frame size.
    #[error("geometry change altered max size {max_width}x{max_height} to {requested_width}x{requested_height}")]
    GeometryMaxChanged {
        /// Current maximum width.
        max_width: u32,
        /// Current maximum height.
        max_height: u32,
        /// Requested maximum width.
        requested_width: u32,
        /// Requested maximum height.
        requested_height: u32,
    },
    /// Options re-announced with a different option count.
    #[error("core options re-announced with {actual} options, first announcement had {expected}")]
    OptionCountChanged {
        /// Count from the first announcement.
        expected: usize,
        /// Count in this announcement.
        actual: usize,
    },
    /// Option definitions failed validation.
    #[error("invalid core option definitions: {0}")]
    InvalidOptions(#[from] OptionsError),
    /// `run` returned without polling input.
    #[error("frame finished without polling input")]
    MissingInputPoll,
    /// `run` did not present exactly one video frame.
    #[error("frame presented {count} video frames, expected exactly one")]
    VideoRefreshCount {
        /// Frames presented during the run.
        count: u32,
    },
    /// Duplicate frame without the frontend allowing dupes.
    #[error("frame duplication used without GET_CAN_DUPE support")]
    DupeWithoutSupport,
    /// Frame presented from a software framebuffer that was never lent.
    #[error("framebuffer frame presented without a lent software framebuffer")]
    FramebufferNotLent,
    /// Single-sample and batch audio mixed within one session.
    #[error("audio output mixed sample modes after committing to {established}")]
    MixedAudioModes {
        /// Mode used first in the session.
        established: AudioMode,
    },
    /// Reported save-state size grew without a variable-size quirk.
    #[error("save state size grew from {previous} to {current} bytes")]
    SaveStateGrew {
        /// Previous largest size.
        previous: usize,
        /// Newly reported size.
        current: usize,
    },
    /// Save-state buffer smaller than the reported size.
    #[error("save state buffer holds {provided} bytes, core needs {required}")]
    SaveStateBufferTooSmall {
        /// Size reported by the core.
        required: usize,
        /// Size of the supplied buffer.
        provided: usize,
    },
    /// Extended disk-control call on a core that only registered version 0.
    #[error("disk control call {operation} needs the extended interface")]
    DiskInterfaceVersion {
        /// Rejected operation name.
        operation: &'static str,
    },
    /// Image selected while the virtual tray was closed.
    #[error("disk image {index} selected while the tray was closed")]
    DiskSwapWithTrayClosed {
        /// Requested image.
        index: u32,
    },
}

impl ContractViolation {
    /// Returns the diagnostics class for this violation.
    #[must_use]
    pub const fn class(&self) -> ViolationClass {
        match self {
            Self::OutOfOrder { .. }
            | Self::ContentRequired
            | Self::UnknownSubsystem { .. }
            | Self::SubsystemContentMismatch { .. }
            | Self::HookNotRegistered { .. } => ViolationClass::Lifecycle,
            Self::InvalidSubsystemIdent { .. }
            | Self::CommandOutsideWindow { .. }
            | Self::GeometryMaxChanged { .. } => ViolationClass::Environment,
            Self::OptionCountChanged { .. } | Self::InvalidOptions(_) => ViolationClass::Options,
            Self::MissingInputPoll
            | Self::VideoRefreshCount { .. }
            | Self::DupeWithoutSupport
            | Self::FramebufferNotLent
            | Self::MixedAudioModes { .. } => ViolationClass::Frame,
            Self::SaveStateGrew { .. } | Self::SaveStateBufferTooSmall { .. } => {
                ViolationClass::Serialization
            }
            Self::DiskInterfaceVersion { .. } | Self::DiskSwapWithTrayClosed { .. } => {
                ViolationClass::Disk
            }
        }
    }

    /// Violations that come from the frontend driving the session, not from
    /// the core.
    #[must_use]
    pub const fn is_frontend_fault(&self) -> bool {
        matches!(
            self,
            Self::OutOfOrder { .. }
                | Self::ContentRequired
                | Self::UnknownSubsystem { .. }
                | Self::SubsystemContentMismatch { .. }
                | Self::HookNotRegistered { .. }
                | Self::SaveStateBufferTooSmall { .. }
                | Self::DiskInterfaceVersion { .. }
                | Self::DiskSwapWithTrayClosed { .. }
        )
    }
}
