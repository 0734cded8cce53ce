//! Conformance run: drives a core through the whole lifecycle on a
//! [`HostFrontend`] and reports which contract checks it passes.
//!
//! ## Checks
//!
//! 1. `attach`: the core reports the expected interface version.
//! 2. `lifecycle`: init, load, run, unload and deinit all succeed in order.
//! 3. `frames`: every frame polls input and presents exactly one video frame.
//! 4. `environment`: no command was issued outside its window and the
//!    option announcements were well formed.
//! 5. `save_state_size`: the reported state size never grows without the
//!    variable-size quirk.
//! 6. `determinism`: frames replayed from a save state produce the same
//!    video and audio.
//! 7. `no_game`: a core announcing no-game support runs without content.
//! 8. `disk_tray`: the disk image only changes while the tray is open.

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

use retro_contract::{Core, GameInfo, Session, SessionConfig, SessionError};

use crate::config::{ConfigError, FrontendConfig};
use crate::host::HostFrontend;

/// Outcome of one check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    /// Contract held.
    Passed,
    /// Contract broken, with what went wrong.
    Failed(String),
    /// Not applicable to this core, with why.
    Skipped(String),
}

/// One named check and its outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    /// Short check name.
    pub name: &'static str,
    /// What happened.
    pub outcome: CheckOutcome,
}

impl CheckResult {
    fn new(name: &'static str, outcome: CheckOutcome) -> Self {
        Self { name, outcome }
    }

    /// Returns true if the check passed.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.outcome == CheckOutcome::Passed
    }
}

impl fmt::Display for CheckResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            CheckOutcome::Passed => write!(f, "PASS {}", self.name),
            CheckOutcome::Failed(reason) => write!(f, "FAIL {}: {reason}", self.name),
            CheckOutcome::Skipped(reason) => write!(f, "SKIP {}: {reason}", self.name),
        }
    }
}

/// Result of a full conformance run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConformanceReport {
    /// Library name and version of the core under test.
    pub core: String,
    /// Results in check order.
    pub checks: Vec<CheckResult>,
}

impl ConformanceReport {
    /// Returns true if no check failed.
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.checks
            .iter()
            .all(|check| !matches!(check.outcome, CheckOutcome::Failed(_)))
    }

    /// Outcome of the check called `name`.
    #[must_use]
    pub fn outcome(&self, name: &str) -> Option<&CheckOutcome> {
        self.checks
            .iter()
            .find(|check| check.name == name)
            .map(|check| &check.outcome)
    }

    /// Returns counts for summary reporting.
    #[must_use]
    pub fn summary(&self) -> ConformanceSummary {
        let count = |wanted: fn(&CheckOutcome) -> bool| {
            self.checks
                .iter()
                .filter(|check| wanted(&check.outcome))
                .count()
        };
        ConformanceSummary {
            passed: count(|outcome| *outcome == CheckOutcome::Passed),
            failed: count(|outcome| matches!(outcome, CheckOutcome::Failed(_))),
            skipped: count(|outcome| matches!(outcome, CheckOutcome::Skipped(_))),
            total: self.checks.len(),
        }
    }
}

impl fmt::Display for ConformanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.core)?;
        for check in &self.checks {
            writeln!(f, "  {check}")?;
        }
        write!(f, "{}", self.summary())
    }
}

/// Summary counts for conformance reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConformanceSummary {
    /// Checks that passed.
    pub passed: usize,
    /// Checks that failed.
    pub failed: usize,
    /// Checks that did not apply.
    pub skipped: usize,
    /// Total number of checks.
    pub total: usize,
}

impl fmt::Display for ConformanceSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} passed, {} failed", self.passed, self.failed)?;
        if self.skipped > 0 {
            write!(f, ", {} skipped", self.skipped)?;
        }
        Ok(())
    }
}

/// Frames replayed from a save state by the determinism check.
const REPLAY_FRAMES: u32 = 4;

/// Runs every check against cores built by `make_core`.
///
/// Each check gets a fresh core and host so one failure cannot leak into
/// the next. `frames` is the number of frames run per check, at least one.
///
/// # Errors
///
/// Returns [`ConfigError`] when `frontend` does not validate.
pub fn run_conformance<C, F>(
    mut make_core: F,
    frontend: &FrontendConfig,
    content: Option<&GameInfo>,
    frames: u32,
) -> Result<ConformanceReport, ConfigError>
where
    C: Core,
    F: FnMut() -> C,
{
    frontend.validate()?;
    let frames = frames.max(1);
    let mut harness = Harness {
        make_core: &mut make_core,
        frontend,
        content,
        frames,
    };

    let (core, attach) = harness.check_attach();
    let mut checks = vec![attach];
    if checks[0].passed() {
        checks.push(settle("lifecycle", harness.check_lifecycle()));
        checks.push(settle("frames", harness.check_frames()));
        checks.push(settle("environment", harness.check_environment()));
        checks.push(settle("save_state_size", harness.check_save_state_size()));
        checks.push(settle("determinism", harness.check_determinism()));
        checks.push(settle("no_game", harness.check_no_game()));
        checks.push(settle("disk_tray", harness.check_disk_tray()));
    }

    for check in &checks {
        match check.outcome {
            CheckOutcome::Failed(_) => log::warn!("{check}"),
            _ => log::info!("{check}"),
        }
    }
    let report = ConformanceReport { core, checks };
    log::info!("{}: {}", report.core, report.summary());
    Ok(report)
}

struct Harness<'a, F> {
    make_core: &'a mut F,
    frontend: &'a FrontendConfig,
    content: Option<&'a GameInfo>,
    frames: u32,
}

type HostSession<C> = Session<C, HostFrontend>;

/// A session error ends the check as a failure.
fn settle(name: &'static str, outcome: Result<CheckOutcome, SessionError>) -> CheckResult {
    CheckResult::new(
        name,
        outcome.unwrap_or_else(|err| CheckOutcome::Failed(err.to_string())),
    )
}

fn failed_count(count: u32, what: &str) -> CheckOutcome {
    if count == 0 {
        CheckOutcome::Passed
    } else {
        CheckOutcome::Failed(format!("{count} {what} violation(s)"))
    }
}

impl<C, F> Harness<'_, F>
where
    C: Core,
    F: FnMut() -> C,
{
    fn attach(&mut self) -> Result<HostSession<C>, SessionError> {
        self.attach_with(SessionConfig::default())
    }

    fn attach_with(&mut self, config: SessionConfig) -> Result<HostSession<C>, SessionError> {
        let host = HostFrontend::new(self.frontend.clone());
        Session::new((self.make_core)(), host, config)
    }

    /// Attached, initialized session with content loaded.
    fn started(&mut self) -> Result<HostSession<C>, SessionError> {
        self.started_with(SessionConfig::default())
    }

    fn started_with(&mut self, config: SessionConfig) -> Result<HostSession<C>, SessionError> {
        let mut session = self.attach_with(config)?;
        session.init()?;
        session.load_game(self.content)?;
        let info = session.system_av_info()?;
        session.frontend_mut().set_av_info(info);
        Ok(session)
    }

    /// Started session after the configured number of frames.
    fn ran(&mut self) -> Result<HostSession<C>, SessionError> {
        let mut session = self.started()?;
        for _ in 0..self.frames {
            session.run()?;
        }
        Ok(session)
    }

    fn check_attach(&mut self) -> (String, CheckResult) {
        match self.attach() {
            Ok(session) => {
                let info = session.system_info();
                let core = format!("{} {}", info.library_name, info.library_version);
                (core, CheckResult::new("attach", CheckOutcome::Passed))
            }
            Err(err) => (
                String::from("unknown core"),
                CheckResult::new("attach", CheckOutcome::Failed(err.to_string())),
            ),
        }
    }

    fn check_lifecycle(&mut self) -> Result<CheckOutcome, SessionError> {
        let mut session = self.ran()?;
        session.unload_game()?;
        session.deinit()?;
        Ok(failed_count(
            session.diagnostics().lifecycle_violations,
            "lifecycle",
        ))
    }

    fn check_frames(&mut self) -> Result<CheckOutcome, SessionError> {
        let session = self.ran()?;
        let violations = session.diagnostics().frame_violations;
        let presented = session.frontend().frames_presented();
        if violations == 0 && presented != u64::from(self.frames) {
            return Ok(CheckOutcome::Failed(format!(
                "{presented} video frame(s) in {} run(s)",
                self.frames
            )));
        }
        Ok(failed_count(violations, "frame"))
    }

    fn check_environment(&mut self) -> Result<CheckOutcome, SessionError> {
        let mut session = self.ran()?;
        session.reset()?;
        session.run()?;
        let diagnostics = session.diagnostics();
        let violations = diagnostics
            .environment_violations
            .saturating_add(diagnostics.options_violations);
        Ok(match (violations, &diagnostics.last_violation) {
            (0, _) => CheckOutcome::Passed,
            (count, Some(last)) => {
                CheckOutcome::Failed(format!("{count} violation(s), last: {last}"))
            }
            (count, None) => CheckOutcome::Failed(format!("{count} violation(s)")),
        })
    }

    fn check_save_state_size(&mut self) -> Result<CheckOutcome, SessionError> {
        let mut session = self.started()?;
        let mut largest = session.serialize_size()?;
        if largest == 0 {
            return Ok(CheckOutcome::Skipped(String::from("no save states")));
        }
        for _ in 0..self.frames {
            session.run()?;
            largest = largest.max(session.serialize_size()?);
        }
        if session.diagnostics().serialization_violations == 0 {
            Ok(CheckOutcome::Passed)
        } else {
            Ok(CheckOutcome::Failed(format!("size grew to {largest} bytes")))
        }
    }

    fn check_determinism(&mut self) -> Result<CheckOutcome, SessionError> {
        let mut session = self.ran()?;
        let size = session.serialize_size()?;
        if size == 0 {
            return Ok(CheckOutcome::Skipped(String::from("no save states")));
        }
        let mut state = vec![0; size];
        session.serialize(&mut state)?;
        let first = replay_digest(&mut session)?;
        session.unserialize(&state)?;
        let second = replay_digest(&mut session)?;
        if first == second {
            Ok(CheckOutcome::Passed)
        } else {
            Ok(CheckOutcome::Failed(String::from(
                "replay from a save state produced different output",
            )))
        }
    }

    fn check_no_game(&mut self) -> Result<CheckOutcome, SessionError> {
        let mut session = self.attach()?;
        if !session.capabilities().support_no_game {
            return Ok(CheckOutcome::Skipped(String::from("content required")));
        }
        session.init()?;
        session.load_game(None)?;
        session.run()?;
        session.unload_game()?;
        Ok(CheckOutcome::Passed)
    }

    fn check_disk_tray(&mut self) -> Result<CheckOutcome, SessionError> {
        // Closed-tray selection must reach the core to see whether it refuses.
        let mut session = self.started_with(SessionConfig::permissive())?;
        if session.registrations().disk_control.is_none() {
            return Ok(CheckOutcome::Skipped(String::from("no disk control")));
        }
        let mut disks = session.disk_control()?;
        let images = disks.num_images();
        if images == 0 {
            return Ok(CheckOutcome::Skipped(String::from("no disk images")));
        }
        let target = (disks.image_index() + 1) % images;
        if disks.eject_state() && !disks.set_eject_state(false) {
            return Ok(CheckOutcome::Failed(String::from("tray did not close")));
        }
        if images > 1 && disks.set_image_index(target) {
            return Ok(CheckOutcome::Failed(String::from(
                "image changed while the tray was closed",
            )));
        }
        let swapped = disks.set_eject_state(true)
            && disks.set_image_index(target)
            && disks.set_eject_state(false);
        if !swapped || disks.image_index() != target {
            return Ok(CheckOutcome::Failed(String::from(
                "eject, select and insert did not swap the image",
            )));
        }
        Ok(failed_count(session.diagnostics().disk_violations, "disk"))
    }
}

/// Runs [`REPLAY_FRAMES`] frames and hashes the video and audio they produce.
fn replay_digest<C: Core>(session: &mut HostSession<C>) -> Result<u64, SessionError> {
    let mut hasher = DefaultHasher::new();
    session.frontend_mut().drain_audio();
    for _ in 0..REPLAY_FRAMES {
        session.run()?;
        let host = session.frontend_mut();
        host.last_frame().hash(&mut hasher);
        host.video().hash(&mut hasher);
        host.drain_audio().hash(&mut hasher);
    }
    Ok(hasher.finish())
}
