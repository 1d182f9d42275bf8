//! Orchestrator (§4.10): drives parse → filter-selection → validate →
//! legal-combinations → build → enrich end to end, owning the run's
//! cancellation token and surfacing errors. Composes every other component
//! by direct method call; no component holds a back-reference to this one
//! (SPEC_FULL.md §9's disallowed `s_mainController` pattern).

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use crate::combinator::{block_combination, legal_combinations};
use crate::builder::build_schedules;
use crate::config::RunConfig;
use crate::enrich::enrich_schedules;
use crate::error::RunError;
use crate::logging::{LogSink, NullLogSink};
use crate::model::{Course, CourseArena, CourseSelection, InformativeSchedule};
use crate::parser::parse_course_db;
use crate::selection::{BlockWindow, BLOCK_COURSE_RAW_ID, filter_selection, synthesize_block_course};
use crate::validator::{CancellationToken, ValidationReport, run_validation_with_timeout};

/// The run state machine of §4.10. `Ready`/`Failed` are terminal for the
/// run that reached them; a fresh [`Orchestrator::run`] call starts a new
/// traversal from `Idle` regardless of a prior run's resting state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
  Idle,
  Parsing,
  Validating,
  Building,
  Enriching,
  Ready,
  Failed,
}

impl RunState {
  fn to_u8(self) -> u8 {
    match self {
      RunState::Idle => 0,
      RunState::Parsing => 1,
      RunState::Validating => 2,
      RunState::Building => 3,
      RunState::Enriching => 4,
      RunState::Ready => 5,
      RunState::Failed => 6,
    }
  }

  fn from_u8(v: u8) -> Self {
    match v {
      1 => RunState::Parsing,
      2 => RunState::Validating,
      3 => RunState::Building,
      4 => RunState::Enriching,
      5 => RunState::Ready,
      6 => RunState::Failed,
      _ => RunState::Idle,
    }
  }
}

/// Everything a successful run hands back to its caller: the enriched
/// schedules plus the validator's conflict report, which rides alongside a
/// successful result rather than aborting it (§7's `conflict_detected`).
#[derive(Debug, Clone, Default)]
pub struct RunOutcome {
  pub schedules: Vec<InformativeSchedule>,
  pub conflicts: ValidationReport,
}

/// Drives one generation pipeline. Holds only the run's fixed tunables and
/// an injected log sink; never a static back-reference to anything it
/// composes.
pub struct Orchestrator {
  config: RunConfig,
  log: Arc<dyn LogSink>,
  state: AtomicU8,
}

impl Orchestrator {
  pub fn new(config: RunConfig, log: Arc<dyn LogSink>) -> Self {
    Self {
      config,
      log,
      state: AtomicU8::new(RunState::Idle.to_u8()),
    }
  }

  pub fn state(&self) -> RunState {
    RunState::from_u8(self.state.load(Ordering::SeqCst))
  }

  fn set_state(&self, state: RunState) {
    self.state.store(state.to_u8(), Ordering::SeqCst);
  }

  /// Runs one full generation pass per §4.10's state machine. Every stage
  /// boundary consults `token`; once cancellation is observed, the run
  /// discards partial work and returns [`RunError::Cancelled`].
  pub fn run(
    &self,
    course_db_text: &str,
    selected_ids: &HashSet<String>,
    blocks: &[BlockWindow],
    token: &CancellationToken,
  ) -> Result<RunOutcome, RunError> {
    self.set_state(RunState::Parsing);
    if token.is_cancelled() {
      self.set_state(RunState::Failed);
      return Err(RunError::Cancelled);
    }

    let parse_outcome = parse_course_db(course_db_text);
    for warning in &parse_outcome.errors {
      self.log.warn(&warning.to_string());
    }
    if parse_outcome.courses.is_empty() {
      self.set_state(RunState::Failed);
      return Err(RunError::NoCoursesParsed(parse_outcome.errors));
    }

    if token.is_cancelled() {
      self.set_state(RunState::Failed);
      return Err(RunError::Cancelled);
    }

    let selection = filter_selection(&parse_outcome.courses, selected_ids, self.config.selection_cap).map_err(|e| {
      self.set_state(RunState::Failed);
      RunError::SelectionInvalid(e)
    })?;
    for warning in &selection.warnings {
      self.log.warn(&warning.to_string());
    }

    let block_course = if blocks.is_empty() {
      None
    } else {
      Some(synthesize_block_course(blocks).map_err(|e| {
        self.set_state(RunState::Failed);
        RunError::BlockTimeInvalid(e)
      })?)
    };

    if token.is_cancelled() {
      self.set_state(RunState::Failed);
      return Err(RunError::Cancelled);
    }

    self.set_state(RunState::Validating);
    let mut courses = selection.courses;
    if let Some(block_course) = &block_course {
      courses.push(block_course.clone());
    }

    let report = match run_validation_with_timeout(courses.clone(), &self.config, token, self.log.as_ref()) {
      Ok(report) => report,
      Err(err) => {
        self.set_state(RunState::Failed);
        return Err(err);
      }
    };
    if !report.conflicts.is_empty() {
      self.log.warn(&format!("course validator found {} conflict(s)", report.conflicts.len()));
    }

    if token.is_cancelled() {
      self.set_state(RunState::Failed);
      return Err(RunError::Cancelled);
    }

    self.set_state(RunState::Building);
    let options = legal_options_per_course(&courses);
    if token.is_cancelled() {
      self.set_state(RunState::Failed);
      return Err(RunError::Cancelled);
    }
    let arena = CourseArena::new(courses);
    let raw_schedules = build_schedules(&options, &arena, token);
    if token.is_cancelled() {
      self.set_state(RunState::Failed);
      return Err(RunError::Cancelled);
    }

    self.set_state(RunState::Enriching);
    let schedules = enrich_schedules(&raw_schedules, &arena, &self.config);
    if schedules.is_empty() {
      self.log.info("generation run produced zero schedules");
    }

    self.set_state(RunState::Ready);
    Ok(RunOutcome { schedules, conflicts: report })
  }
}

impl Default for Orchestrator {
  fn default() -> Self {
    Self::new(RunConfig::default(), Arc::new(NullLogSink))
  }
}

/// Builds the per-course legal-combination lists in course order, special-
/// casing the synthetic block course (if present) which never runs through
/// the mandatory-lecture iteration of §4.6.
fn legal_options_per_course(courses: &[Course]) -> Vec<Vec<CourseSelection>> {
  courses
    .iter()
    .enumerate()
    .filter_map(|(idx, course)| {
      if course.raw_id == BLOCK_COURSE_RAW_ID {
        block_combination(idx, course).map(|combo| vec![combo])
      } else {
        Some(legal_combinations(course, idx))
      }
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn db_two_courses() -> String {
    [
      "Algorithms",
      "00001",
      "Dr. A",
      "L S,1,09:00,10:00,101,1",
      "$$$$",
      "Databases",
      "00002",
      "Dr. B",
      "L S,1,10:00,11:00,101,2",
      "$$$$",
    ]
    .join("\n")
  }

  fn ids(raw: &[&str]) -> HashSet<String> {
    raw.iter().map(|s| s.to_string()).collect()
  }

  #[test]
  fn runs_end_to_end_to_ready() {
    let orch = Orchestrator::new(RunConfig::default(), Arc::new(NullLogSink));
    let token = CancellationToken::new();
    let outcome = orch
      .run(&db_two_courses(), &ids(&["00001", "00002"]), &[], &token)
      .unwrap();
    assert_eq!(outcome.schedules.len(), 1);
    assert_eq!(orch.state(), RunState::Ready);
  }

  #[test]
  fn empty_db_fails_with_no_courses_parsed() {
    let orch = Orchestrator::default();
    let token = CancellationToken::new();
    let err = orch.run("", &ids(&["00001"]), &[], &token).unwrap_err();
    assert!(matches!(err, RunError::NoCoursesParsed(_)));
    assert_eq!(orch.state(), RunState::Failed);
  }

  #[test]
  fn pre_cancelled_token_aborts_immediately() {
    let orch = Orchestrator::default();
    let token = CancellationToken::new();
    token.cancel();
    let err = orch.run(&db_two_courses(), &ids(&["00001"]), &[], &token).unwrap_err();
    assert!(matches!(err, RunError::Cancelled));
  }

  #[test]
  fn block_time_interacts_with_the_real_course_set() {
    let db = [
      "Algorithms",
      "00001",
      "Dr. A",
      "L S,7,10:00,12:00,101,1",
      "$$$$",
    ]
    .join("\n");
    let orch = Orchestrator::default();
    let token = CancellationToken::new();
    let blocks = vec![BlockWindow {
      weekday: 7,
      start: 540,
      end: 660,
    }];
    let outcome = orch.run(&db, &ids(&["00001"]), &blocks, &token).unwrap();
    assert!(outcome.schedules.is_empty());
  }
}
