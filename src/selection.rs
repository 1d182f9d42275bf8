//! Selection-Filter (§4.3): narrows a parsed course set to the user's
//! chosen `raw_id`s. Block-Time Synthesizer (§4.4): turns user-declared
//! unavailable windows into a synthetic course that participates in
//! conflict checks but never appears in a rendered calendar.

use std::collections::HashSet;

use crate::model::{Course, ErrorCategory, Group, GroupKind, Session, ValidationError, Weekday};

pub const SELECTION_CAP: usize = 7;

/// `raw_id` stamped on the synthetic block-time course so downstream stages
/// can recognize it without a dedicated marker field.
pub const BLOCK_COURSE_RAW_ID: &str = "BLOCK";

/// The result of filtering a course set down to a user's selection.
pub struct SelectionOutcome {
  pub courses: Vec<Course>,
  pub warnings: Vec<ValidationError>,
}

/// Narrows `courses` to those whose `raw_id` is in `selected_ids`.
///
/// `selected_ids` is deduplicated by virtue of being a `HashSet`. More than
/// `selection_cap` distinct ids (§10.3's `RunConfig::selection_cap`,
/// [`SELECTION_CAP`] by default), or a selection that matches nothing,
/// invalidates the whole selection (`selection_invalid`, §7). An id with no
/// matching course is a non-fatal warning, not an abort (§4.3 resolution in
/// SPEC_FULL.md).
pub fn filter_selection(
  courses: &[Course],
  selected_ids: &HashSet<String>,
  selection_cap: usize,
) -> Result<SelectionOutcome, ValidationError> {
  if selected_ids.is_empty() {
    return Err(ValidationError::new(
      ErrorCategory::System,
      "selection is empty",
    ));
  }
  if selected_ids.len() > selection_cap {
    return Err(ValidationError::new(
      ErrorCategory::System,
      format!(
        "selection has {} ids, exceeding the cap of {selection_cap}",
        selected_ids.len()
      ),
    ));
  }

  let mut warnings = Vec::new();
  let matched: Vec<Course> = courses
    .iter()
    .filter(|c| selected_ids.contains(&c.raw_id))
    .cloned()
    .collect();

  let matched_ids: HashSet<&str> = matched.iter().map(|c| c.raw_id.as_str()).collect();
  for id in selected_ids {
    if !matched_ids.contains(id.as_str()) {
      warnings.push(ValidationError::new(
        ErrorCategory::System,
        format!("selected id {id} matched no parsed course"),
      ));
    }
  }

  if matched.is_empty() {
    return Err(ValidationError::new(
      ErrorCategory::System,
      "no selected id matched a parsed course",
    ));
  }

  Ok(SelectionOutcome {
    courses: matched,
    warnings,
  })
}

/// One user-declared unavailable window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockWindow {
  pub weekday: Weekday,
  pub start: u16,
  pub end: u16,
}

/// Builds the synthetic block-time course from a list of windows.
///
/// Windows must individually satisfy `start < end`, and no two windows may
/// overlap on the same weekday; the conflicting pair is named in the error.
pub fn synthesize_block_course(windows: &[BlockWindow]) -> Result<Course, ValidationError> {
  for w in windows {
    if w.start >= w.end {
      return Err(ValidationError::new(
        ErrorCategory::BadTime,
        format!(
          "block window on day {} has start {} >= end {}",
          w.weekday, w.start, w.end
        ),
      ));
    }
  }

  for i in 0..windows.len() {
    for j in (i + 1)..windows.len() {
      let a = windows[i];
      let b = windows[j];
      if crate::time::overlap(a.weekday, a.start, a.end, b.weekday, b.start, b.end) {
        return Err(ValidationError::new(
          ErrorCategory::Overlap,
          format!(
            "block window {} ({}-{}) overlaps block window {} ({}-{}) on day {}",
            i, a.start, a.end, j, b.start, b.end, a.weekday
          ),
        ));
      }
    }
  }

  let sessions: Vec<Session> = windows
    .iter()
    .map(|w| Session {
      weekday: w.weekday,
      start: w.start,
      end: w.end,
      building: String::new(),
      room: String::new(),
    })
    .collect();

  Ok(Course {
    numeric_id: 0,
    raw_id: BLOCK_COURSE_RAW_ID.into(),
    name: "Blocked time".into(),
    teacher: String::new(),
    lecture_groups: Vec::new(),
    tutorial_groups: Vec::new(),
    lab_groups: Vec::new(),
    block_groups: vec![Group {
      kind: GroupKind::Block,
      sessions,
    }],
  })
}
