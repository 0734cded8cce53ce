//! Session diagnostics: saturating counters per violation class.

use crate::{ContractViolation, ViolationClass};

/// Counters a session keeps about contract conformance.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionDiagnostics {
    /// Most recent violation, if any.
    pub last_violation: Option<ContractViolation>,
    /// Saturating counter for lifecycle-class violations.
    pub lifecycle_violations: u32,
    /// Saturating counter for environment-class violations.
    pub environment_violations: u32,
    /// Saturating counter for options-class violations.
    pub options_violations: u32,
    /// Saturating counter for frame-class violations.
    pub frame_violations: u32,
    /// Saturating counter for serialization-class violations.
    pub serialization_violations: u32,
    /// Saturating counter for disk-class violations.
    pub disk_violations: u32,
    /// Saturating counter for completed `run` calls.
    pub frames_run: u32,
    /// Saturating counter for environment calls issued by the core.
    pub environment_calls: u32,
    /// Saturating counter for environment calls refused before the frontend.
    pub environment_rejected: u32,
}

impl SessionDiagnostics {
    /// Creates zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a violation, updating the last violation and its class counter.
    pub fn record_violation(&mut self, violation: &ContractViolation) {
        self.last_violation = Some(violation.clone());
        let counter = match violation.class() {
            ViolationClass::Lifecycle => &mut self.lifecycle_violations,
            ViolationClass::Environment => &mut self.environment_violations,
            ViolationClass::Options => &mut self.options_violations,
            ViolationClass::Frame => &mut self.frame_violations,
            ViolationClass::Serialization => &mut self.serialization_violations,
            ViolationClass::Disk => &mut self.disk_violations,
        };
        *counter = counter.saturating_add(1);
    }

    /// Total violations across every class, saturating.
    #[must_use]
    pub const fn total_violations(&self) -> u32 {
        self.lifecycle_violations
            .saturating_add(self.environment_violations)
            .saturating_add(self.options_violations)
            .saturating_add(self.frame_violations)
            .saturating_add(self.serialization_violations)
            .saturating_add(self.disk_violations)
    }

    /// Increments the environment call counter.
    #[allow(clippy::missing_const_for_fn)]
    pub fn record_environment_call(&mut self) {
        self.environment_calls = self.environment_calls.saturating_add(1);
    }

    /// Increments the refused environment call counter.
    #[allow(clippy::missing_const_for_fn)]
    pub fn record_environment_rejected(&mut self) {
        self.environment_rejected = self.environment_rejected.saturating_add(1);
    }

    /// Increments the frame counter.
    #[allow(clippy::missing_const_for_fn)]
    pub fn record_frame(&mut self) {
        self.frames_run = self.frames_run.saturating_add(1);
    }

    /// Resets every counter.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
