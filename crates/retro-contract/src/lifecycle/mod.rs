//! Core lifecycle: states, entry points and the session enforcing them.

pub mod session;
pub mod state;

pub use session::{Session, SessionError};
pub use state::{CoreHook, LifecycleCall, LifecycleState};
