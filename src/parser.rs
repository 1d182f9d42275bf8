//! The DB-Parser: turns the line-oriented course-DB text format (§6) into a
//! deduplicated collection of [`Course`] records, collecting diagnostics for
//! anything malformed along the way instead of aborting.

use std::collections::HashSet;

use crate::model::{Course, ErrorCategory, Group, GroupKind, Session, ValidationError};
use crate::time::to_minutes;

const RECORD_DELIMITER: &str = "$$$$";

/// Everything a parse run produces: the courses that survived validation,
/// plus every diagnostic collected along the way.
#[derive(Debug, Default)]
pub struct ParseOutcome {
  pub courses: Vec<Course>,
  pub errors: Vec<ValidationError>,
}

/// Parses a course-DB text blob per §4.2/§6.
pub fn parse_course_db(input: &str) -> ParseOutcome {
  let mut outcome = ParseOutcome::default();
  let mut seen_ids: HashSet<String> = HashSet::new();

  for record_lines in split_records(input) {
    if record_lines.is_empty() {
      continue;
    }
    match parse_record(&record_lines, &mut outcome.errors) {
      Some(course) => {
        if !seen_ids.insert(course.raw_id.clone()) {
          outcome.errors.push(ValidationError::new(
            ErrorCategory::System,
            format!("duplicate course id {}, record dropped", course.raw_id),
          ));
          continue;
        }
        outcome.courses.push(course);
      }
      None => continue,
    }
  }

  outcome
}

/// Splits input text into `$$$$`-delimited chunks of lines, dropping the
/// delimiter lines themselves.
fn split_records(input: &str) -> Vec<Vec<&str>> {
  let mut records = Vec::new();
  let mut current = Vec::new();
  for line in input.lines() {
    if line.trim_end() == RECORD_DELIMITER {
      records.push(std::mem::take(&mut current));
    } else {
      current.push(line);
    }
  }
  if !current.is_empty() {
    records.push(current);
  }
  records
}

fn parse_record(lines: &[&str], errors: &mut Vec<ValidationError>) -> Option<Course> {
  if lines.len() < 3 {
    errors.push(ValidationError::new(
      ErrorCategory::System,
      "record has fewer than 3 header lines, dropped",
    ));
    return None;
  }

  let name = lines[0].trim().to_string();
  let raw_id = lines[1].trim().to_string();
  let teacher = lines[2].trim().to_string();

  if raw_id.len() != 5 || !raw_id.bytes().all(|b| b.is_ascii_digit()) {
    errors.push(ValidationError::new(
      ErrorCategory::System,
      format!("course id '{raw_id}' is not 5 decimal digits, record dropped"),
    ));
    return None;
  }
  let numeric_id: u32 = match raw_id.parse() {
    Ok(v) => v,
    Err(_) => {
      errors.push(ValidationError::new(
        ErrorCategory::System,
        format!("course id '{raw_id}' does not fit a u32, record dropped"),
      ));
      return None;
    }
  };

  let mut lecture_groups = Vec::new();
  let mut tutorial_groups = Vec::new();
  let mut lab_groups = Vec::new();
  let mut block_groups = Vec::new();

  for line in &lines[3..] {
    if line.trim().is_empty() {
      continue;
    }
    match parse_group_line(line, errors) {
      Ok(Some(group)) => match group.kind {
        GroupKind::Lecture => lecture_groups.push(group),
        GroupKind::Tutorial => tutorial_groups.push(group),
        GroupKind::Lab => lab_groups.push(group),
        GroupKind::Block => block_groups.push(group),
      },
      Ok(None) => {
        // every session in the line was malformed; the group is discarded.
      }
      Err(()) => {
        errors.push(ValidationError::new(
          ErrorCategory::System,
          format!("course {raw_id}: unknown group-line prefix, course dropped"),
        ));
        return None;
      }
    }
  }

  if lecture_groups.is_empty() {
    errors.push(ValidationError::new(
      ErrorCategory::System,
      format!("course {raw_id}: zero lecture groups after parsing, course dropped"),
    ));
    return None;
  }
  if lecture_groups.is_empty() && tutorial_groups.is_empty() && lab_groups.is_empty() && block_groups.is_empty() {
    errors.push(ValidationError::new(
      ErrorCategory::System,
      format!("course {raw_id}: zero groups of any kind, course dropped"),
    ));
    return None;
  }

  Some(Course {
    numeric_id,
    raw_id,
    name,
    teacher,
    lecture_groups,
    tutorial_groups,
    lab_groups,
    block_groups,
  })
}

/// Parses one group line. `Ok(Some(group))` on success, `Ok(None)` if every
/// session descriptor in the line was malformed (the group is discarded but
/// the course is not), `Err(())` on an unrecognized kind prefix (the whole
/// course is dropped by the caller).
fn parse_group_line(line: &str, errors: &mut Vec<ValidationError>) -> Result<Option<Group>, ()> {
  let mut parts = line.split(" S,");
  let kind_token = parts.next().unwrap_or("").trim();
  let kind = match kind_token {
    "L" => GroupKind::Lecture,
    "T" => GroupKind::Tutorial,
    "M" => GroupKind::Lab,
    _ => return Err(()),
  };

  let mut sessions = Vec::new();
  for descriptor in parts {
    match parse_session_descriptor(descriptor) {
      Ok(session) => sessions.push(session),
      Err(message) => errors.push(ValidationError::new(ErrorCategory::System, message)),
    }
  }

  if sessions.is_empty() {
    Ok(None)
  } else {
    Ok(Some(Group { kind, sessions }))
  }
}

fn parse_session_descriptor(descriptor: &str) -> Result<Session, String> {
  let fields: Vec<&str> = descriptor.trim().split(',').collect();
  if fields.len() != 5 {
    return Err(format!("malformed session descriptor '{descriptor}'"));
  }
  let weekday: u8 = fields[0]
    .parse()
    .map_err(|_| format!("malformed weekday in '{descriptor}'"))?;
  if !(1..=7).contains(&weekday) {
    return Err(format!("weekday {weekday} outside 1..7 in '{descriptor}'"));
  }
  let start = to_minutes(fields[1]).map_err(|_| format!("malformed start time in '{descriptor}'"))?;
  let end = to_minutes(fields[2]).map_err(|_| format!("malformed end time in '{descriptor}'"))?;
  if start >= end {
    return Err(format!("start >= end in '{descriptor}'"));
  }
  let building = fields[3].trim();
  if building.is_empty() || building.len() > 4 || !building.bytes().all(|b| b.is_ascii_digit()) {
    return Err(format!("malformed building code in '{descriptor}'"));
  }
  let room = fields[4].trim();
  if room.is_empty() || room.len() > 3 || !room.bytes().all(|b| b.is_ascii_digit()) {
    return Err(format!("malformed room code in '{descriptor}'"));
  }

  Ok(Session {
    weekday,
    start,
    end,
    building: building.to_string(),
    room: room.to_string(),
  })
}

/// Re-emits a `$$$$`-delimited course-DB blob for a course slice, the
/// inverse of [`parse_course_db`] used by the round-trip property (§8.5).
pub fn serialize_course_db(courses: &[Course]) -> String {
  let mut out = String::new();
  for course in courses {
    out.push_str(&course.name);
    out.push('\n');
    out.push_str(&course.raw_id);
    out.push('\n');
    out.push_str(&course.teacher);
    out.push('\n');
    for (kind, groups) in [
      (GroupKind::Lecture, &course.lecture_groups),
      (GroupKind::Tutorial, &course.tutorial_groups),
      (GroupKind::Lab, &course.lab_groups),
      (GroupKind::Block, &course.block_groups),
    ] {
      let prefix = match kind {
        GroupKind::Lecture => "L",
        GroupKind::Tutorial => "T",
        GroupKind::Lab => "M",
        GroupKind::Block => continue, // synthetic blocks are never re-serialized into the DB text
      };
      for group in groups {
        out.push_str(prefix);
        for session in &group.sessions {
          out.push_str(" S,");
          out.push_str(&session.weekday.to_string());
          out.push(',');
          out.push_str(&crate::time::minutes_to_hhmm(session.start));
          out.push(',');
          out.push_str(&crate::time::minutes_to_hhmm(session.end));
          out.push(',');
          out.push_str(&session.building);
          out.push(',');
          out.push_str(&session.room);
        }
        out.push('\n');
      }
    }
    out.push_str(RECORD_DELIMITER);
    out.push('\n');
  }
  out
}
