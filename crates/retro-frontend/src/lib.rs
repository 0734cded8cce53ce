//! Reference frontend for the retro-contract core interface.
//!
//! [`HostFrontend`] answers every environment command from a
//! [`FrontendConfig`], keeps what the core registers and records each
//! frame's output. [`run_conformance`] drives a core through the full
//! lifecycle on that host and reports which contract checks it passes.

/// Host configuration and validation.
pub mod config;
pub use config::{ConfigError, FrontendConfig, MAX_PORTS};

/// Conformance checks over a whole core lifecycle.
pub mod conformance;
pub use conformance::{
    run_conformance, CheckOutcome, CheckResult, ConformanceReport, ConformanceSummary,
};

/// The reference frontend.
pub mod host;
pub use host::{
    HostFrontend, HostLeds, HostLog, HostPerf, HostRegistrations, HostRumble, PresentedFrame,
};

/// Input state answered to `input_state` queries.
pub mod input;
pub use input::{InputTable, MouseState, PortState};

/// Directory-backed virtual file system.
pub mod vfs;
pub use vfs::HostVfs;

#[cfg(test)]
use env_logger as _;
#[cfg(test)]
use proptest as _;
#[cfg(test)]
use serde_json as _;
#[cfg(test)]
use tempfile as _;
