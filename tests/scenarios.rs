//! End-to-end integration tests: the eight concrete scenarios (§8) and a
//! handful of the ten testable properties, driven entirely through
//! [`Orchestrator::run`] and the filter/sort engine rather than any single
//! module's internals.

use std::collections::HashSet;
use std::sync::Arc;

use campus_scheduler_core::filter::{FilterCriteria, SortKey, Sorter, run_sql_predicate};
use campus_scheduler_core::logging::NullLogSink;
use campus_scheduler_core::selection::BlockWindow;
use campus_scheduler_core::validator::CancellationToken;
use campus_scheduler_core::{Orchestrator, RunConfig, RunError};

fn ids(raw: &[&str]) -> HashSet<String> {
  raw.iter().map(|s| s.to_string()).collect()
}

fn course_record(name: &str, raw_id: &str, teacher: &str, group_lines: &[&str]) -> String {
  let mut out = format!("{name}\n{raw_id}\n{teacher}\n");
  for line in group_lines {
    out.push_str(line);
    out.push('\n');
  }
  out.push_str("$$$$\n");
  out
}

fn run(db: &str, selected: &[&str]) -> campus_scheduler_core::RunOutcome {
  let orchestrator = Orchestrator::new(RunConfig::default(), Arc::new(NullLogSink));
  let token = CancellationToken::new();
  orchestrator.run(db, &ids(selected), &[], &token).unwrap()
}

#[test]
fn e1_trivial_pass() {
  let db = [
    course_record("A", "00001", "T1", &["L S,1,09:00,10:00,101,1"]),
    course_record("B", "00002", "T2", &["L S,1,10:00,11:00,101,2"]),
  ]
  .concat();
  let outcome = run(&db, &["00001", "00002"]);
  assert_eq!(outcome.schedules.len(), 1);
  let s = &outcome.schedules[0];
  assert_eq!(s.amount_days, 1);
  assert_eq!(s.amount_gaps, 0);
  assert_eq!(s.gaps_time_minutes, 0);
  assert_eq!(s.avg_start_minutes, 540);
  assert_eq!(s.avg_end_minutes, 660);
}

#[test]
fn e2_touching_is_not_overlap() {
  let db = [
    course_record("A", "00001", "T1", &["L S,2,09:00,10:00,101,1"]),
    course_record("B", "00002", "T2", &["L S,2,10:00,11:00,101,2"]),
  ]
  .concat();
  let outcome = run(&db, &["00001", "00002"]);
  assert_eq!(outcome.schedules.len(), 1);
  assert_eq!(outcome.schedules[0].amount_gaps, 0);
}

#[test]
fn e3_strict_overlap_prunes() {
  let db = [
    course_record("A", "00001", "T1", &["L S,3,09:00,11:00,101,1"]),
    course_record("B", "00002", "T2", &["L S,3,10:00,12:00,101,2"]),
  ]
  .concat();
  let outcome = run(&db, &["00001", "00002"]);
  assert!(outcome.schedules.is_empty());
}

#[test]
fn e4_lab_and_tutorial_are_optional() {
  let db = course_record(
    "A",
    "00001",
    "T1",
    &["L S,4,08:00,09:00,101,1", "M S,4,10:00,11:00,101,1"],
  );
  let outcome = run(&db, &["00001"]);
  assert_eq!(outcome.schedules.len(), 1);
  let s = &outcome.schedules[0];
  assert_eq!(s.amount_gaps, 1);
  assert_eq!(s.gaps_time_minutes, 60);
}

fn e5_db() -> String {
  course_record(
    "A",
    "00001",
    "T1",
    &[
      "L S,5,08:00,09:00,101,1",
      "L S,5,10:00,11:00,101,2",
      "T S,5,12:00,13:00,101,3",
      "M S,5,13:00,14:00,101,4",
    ],
  )
}

#[test]
fn e5_multiple_combinations() {
  let outcome = run(&e5_db(), &["00001"]);
  assert_eq!(outcome.schedules.len(), 2);
  assert!(outcome.schedules.iter().all(|s| s.amount_days == 1));
}

#[test]
fn e6_block_time_prunes_and_never_appears_in_buckets() {
  let db = course_record("A", "00001", "T1", &["L S,7,10:00,12:00,101,1"]);
  let orchestrator = Orchestrator::new(RunConfig::default(), Arc::new(NullLogSink));
  let token = CancellationToken::new();
  let blocks = vec![BlockWindow {
    weekday: 7,
    start: 540,
    end: 660,
  }];
  let outcome = orchestrator.run(&db, &ids(&["00001"]), &blocks, &token).unwrap();
  assert!(outcome.schedules.is_empty());
}

#[test]
fn e7_filter_threshold_keeps_only_the_later_start() {
  let outcome = run(&e5_db(), &["00001"]);
  assert_eq!(outcome.schedules.len(), 2);
  let criteria = FilterCriteria::builder().avg_day_start(540u32).build();
  let kept = criteria.apply(&outcome.schedules);
  assert_eq!(kept.len(), 1);
  let kept_schedule = outcome.schedules.iter().find(|s| s.index == kept[0]).unwrap();
  let first_item = kept_schedule.active_days().next().unwrap().first().unwrap();
  assert_eq!(first_item.start, 600);
}

#[test]
fn e8_sql_rejection_regardless_of_database_state() {
  let outcome = run(&e5_db(), &["00001"]);
  let err = run_sql_predicate(
    &outcome.schedules,
    "SELECT schedule_index FROM schedule; DROP TABLE schedule",
    &[],
  )
  .unwrap_err();
  assert!(matches!(err, RunError::QueryInvalid(_)));
}

#[test]
fn property_determinism_same_inputs_same_indices() {
  let db = e5_db();
  let first = run(&db, &["00001"]);
  let second = run(&db, &["00001"]);
  assert_eq!(first.schedules, second.schedules);
}

#[test]
fn property_indices_are_unique_and_contiguous() {
  let outcome = run(&e5_db(), &["00001"]);
  let mut indices: Vec<usize> = outcome.schedules.iter().map(|s| s.index).collect();
  indices.sort_unstable();
  assert_eq!(indices, (1..=outcome.schedules.len()).collect::<Vec<_>>());
}

#[test]
fn property_sort_idempotence_and_direction_flip_roundtrips() {
  let mut schedules = run(&e5_db(), &["00001"]).schedules;
  let mut sorter = Sorter::new();

  sorter.sort(&mut schedules, SortKey::AvgStart, true);
  let once = schedules.clone();
  sorter.sort(&mut schedules, SortKey::AvgStart, true);
  assert_eq!(schedules, once, "same key and direction twice is a no-op");

  sorter.sort(&mut schedules, SortKey::AvgStart, false);
  sorter.sort(&mut schedules, SortKey::AvgStart, true);
  assert_eq!(schedules, once, "flipping direction twice restores order");
}
