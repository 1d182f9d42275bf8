//! Course-Validator (§4.5): detects rooms double-booked across the entire
//! course set, independent of which combination a student eventually
//! picks. Runs on a worker thread distinct from the caller, checks a
//! cancellation flag at every course and session boundary, and is bounded
//! by a timeout the orchestrator enforces.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crossbeam_channel::{Receiver, bounded};

use crate::config::RunConfig;
use crate::error::RunError;
use crate::logging::LogSink;
use crate::model::{Course, Weekday};

/// A sticky, shared cancellation flag consulted at every documented
/// cancellation point (§5). Cloning shares the same underlying flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
  pub fn new() -> Self {
    Self(Arc::new(AtomicBool::new(false)))
  }

  pub fn cancel(&self) {
    self.0.store(true, Ordering::SeqCst);
  }

  pub fn is_cancelled(&self) -> bool {
    self.0.load(Ordering::SeqCst)
  }
}

/// The validator's output: every detected room conflict, as a
/// human-readable message in the exact form §4.5 specifies.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ValidationReport {
  pub conflicts: Vec<String>,
}

/// Events the validator's worker thread sends back to the orchestrator,
/// re-expressing the source's Qt signal/slot pattern as a typed channel
/// (SPEC_FULL.md §9).
#[derive(Debug)]
pub enum WorkerEvent {
  Progress(usize),
  Result(ValidationReport),
  Error(String),
  Finished,
}

struct BucketedSession<'a> {
  course_raw_id: &'a str,
  weekday: Weekday,
  start: u16,
  end: u16,
}

/// The synchronous bucket-and-scan algorithm (§4.5), checked for
/// cancellation between courses and between sessions. Returns `None` iff
/// cancellation was observed partway through.
fn validate_courses_sync(courses: &[Course], token: &CancellationToken) -> Option<ValidationReport> {
  let mut conflicts = Vec::new();
  // (building, room) -> weekday -> sessions seen so far, in insertion order.
  let mut rooms: HashMap<(String, String), HashMap<Weekday, Vec<BucketedSession>>> = HashMap::new();

  for course in courses {
    if token.is_cancelled() {
      return None;
    }
    let all_groups = course
      .lecture_groups
      .iter()
      .chain(course.tutorial_groups.iter())
      .chain(course.lab_groups.iter())
      .chain(course.block_groups.iter());

    for group in all_groups {
      for session in &group.sessions {
        if token.is_cancelled() {
          return None;
        }
        let key = (session.building.clone(), session.room.clone());
        let by_weekday = rooms.entry(key.clone()).or_default();
        let bucket = by_weekday.entry(session.weekday).or_default();

        for existing in bucket.iter() {
          if crate::time::overlap(
            existing.weekday,
            existing.start,
            existing.end,
            session.weekday,
            session.start,
            session.end,
          ) {
            conflicts.push(format!(
              "Course {} overlaps with {} in {}-{} on day {} ({}-{} vs {}-{})",
              course.raw_id,
              existing.course_raw_id,
              key.0,
              key.1,
              session.weekday,
              crate::time::minutes_to_hhmm(session.start),
              crate::time::minutes_to_hhmm(session.end),
              crate::time::minutes_to_hhmm(existing.start),
              crate::time::minutes_to_hhmm(existing.end),
            ));
          }
        }

        bucket.push(BucketedSession {
          course_raw_id: &course.raw_id,
          weekday: session.weekday,
          start: session.start,
          end: session.end,
        });
      }
    }
  }

  Some(ValidationReport { conflicts })
}

/// Spawns the validator on its own worker thread and returns a receiver of
/// [`WorkerEvent`]s, reading until `Finished`. The thread never panics
/// across its boundary: any internal error is converted to `Error` before
/// `Finished` is sent.
pub fn spawn_validator(courses: Vec<Course>, token: CancellationToken) -> Receiver<WorkerEvent> {
  let (tx, rx) = bounded(4);
  std::thread::spawn(move || {
    let _ = tx.send(WorkerEvent::Progress(0));
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
      validate_courses_sync(&courses, &token)
    }));
    match result {
      Ok(Some(report)) => {
        let _ = tx.send(WorkerEvent::Result(report));
      }
      Ok(None) => {
        // cancelled; no report is sent, matching §4.5's "returns promptly
        // without producing a report".
      }
      Err(_) => {
        let _ = tx.send(WorkerEvent::Error(
          "course validator encountered an internal error".to_string(),
        ));
      }
    }
    let _ = tx.send(WorkerEvent::Finished);
  });
  rx
}

/// Runs the validator with the timeout formula of §4.5: on expiry the
/// token is cancelled and a single `system` error is surfaced; the caller
/// must not run build/enrich afterward.
pub fn run_validation_with_timeout(
  courses: Vec<Course>,
  config: &RunConfig,
  token: &CancellationToken,
  log: &dyn LogSink,
) -> Result<ValidationReport, RunError> {
  let timeout = config.validator_timeout(courses.len());
  let rx = spawn_validator(courses, token.clone());
  let deadline = std::time::Instant::now() + timeout;

  let mut report = None;
  loop {
    let remaining = deadline.saturating_duration_since(std::time::Instant::now());
    if remaining == Duration::ZERO {
      token.cancel();
      log.error("course validator timed out, cancelling");
      return Err(RunError::Timeout(timeout));
    }
    match rx.recv_timeout(remaining) {
      Ok(WorkerEvent::Progress(n)) => {
        log.info(&format!("course validator: checked {n} courses"));
      }
      Ok(WorkerEvent::Result(r)) => report = Some(r),
      Ok(WorkerEvent::Error(message)) => {
        log.error(&message);
        report = Some(ValidationReport::default());
      }
      Ok(WorkerEvent::Finished) => break,
      Err(_) => {
        token.cancel();
        log.error("course validator timed out, cancelling");
        return Err(RunError::Timeout(timeout));
      }
    }
  }

  if token.is_cancelled() {
    return Err(RunError::Cancelled);
  }
  Ok(report.unwrap_or_default())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::logging::NullLogSink;
  use crate::model::{Group, GroupKind, Session};

  fn course(raw_id: &str, weekday: Weekday, start: u16, end: u16, building: &str, room: &str) -> Course {
    Course {
      numeric_id: 0,
      raw_id: raw_id.into(),
      name: raw_id.into(),
      teacher: "T".into(),
      lecture_groups: vec![Group {
        kind: GroupKind::Lecture,
        sessions: vec![Session {
          weekday,
          start,
          end,
          building: building.into(),
          room: room.into(),
        }],
      }],
      tutorial_groups: vec![],
      lab_groups: vec![],
      block_groups: vec![],
    }
  }

  #[test]
  fn detects_a_room_conflict() {
    let courses = vec![
      course("00001", 1, 540, 600, "101", "5"),
      course("00002", 1, 560, 620, "101", "5"),
    ];
    let token = CancellationToken::new();
    let report = validate_courses_sync(&courses, &token).unwrap();
    assert_eq!(report.conflicts.len(), 1);
    assert!(report.conflicts[0].contains("00002 overlaps with 00001"));
  }

  #[test]
  fn different_rooms_never_conflict() {
    let courses = vec![
      course("00001", 1, 540, 600, "101", "5"),
      course("00002", 1, 540, 600, "101", "6"),
    ];
    let token = CancellationToken::new();
    let report = validate_courses_sync(&courses, &token).unwrap();
    assert!(report.conflicts.is_empty());
  }

  #[test]
  fn touching_sessions_do_not_conflict() {
    let courses = vec![
      course("00001", 1, 540, 600, "101", "5"),
      course("00002", 1, 600, 660, "101", "5"),
    ];
    let token = CancellationToken::new();
    let report = validate_courses_sync(&courses, &token).unwrap();
    assert!(report.conflicts.is_empty());
  }

  #[test]
  fn cancellation_before_any_course_yields_none() {
    let courses = vec![course("00001", 1, 540, 600, "101", "5")];
    let token = CancellationToken::new();
    token.cancel();
    assert!(validate_courses_sync(&courses, &token).is_none());
  }

  #[test]
  fn end_to_end_run_completes_via_the_channel() {
    let courses = vec![course("00001", 1, 540, 600, "101", "5")];
    let config = RunConfig::default();
    let token = CancellationToken::new();
    let log = NullLogSink;
    let report = run_validation_with_timeout(courses, &config, &token, &log).unwrap();
    assert!(report.conflicts.is_empty());
  }
}
