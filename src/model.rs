//! The data model shared across the generation pipeline: sessions, groups,
//! courses, selections, schedules and the enriched, day-indexed view of a
//! schedule.
//!
//! Courses and the groups/sessions they own live in a [`CourseArena`] for
//! the lifetime of one generation run. Everything downstream of parsing
//! (selections, schedules) refers back into the arena by index rather than
//! by pointer or `Arc`, so a run's lifetime is exactly the arena's lifetime.

use serde::{Deserialize, Serialize};

/// Weekday, `1..=7`.
pub type Weekday = u8;
/// Minute-of-day, `0..1440`.
pub type Minutes = u16;

/// The four categories a [`ValidationError`] can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCategory {
  Overlap,
  BadTime,
  BadRoom,
  System,
}

/// A collected, non-fatal diagnostic from parsing or validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
  pub message: String,
  pub category: ErrorCategory,
}

impl ValidationError {
  pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
    Self {
      message: message.into(),
      category,
    }
  }
}

/// A single timetabled meeting. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
  pub weekday: Weekday,
  pub start: Minutes,
  pub end: Minutes,
  pub building: String,
  pub room: String,
}

impl Session {
  /// `true` iff `self` and `other` share a weekday and their `[start, end)`
  /// intervals strictly overlap.
  pub fn overlaps(&self, other: &Session) -> bool {
    crate::time::overlap(
      self.weekday,
      self.start,
      self.end,
      other.weekday,
      other.start,
      other.end,
    )
  }
}

/// The kind of meeting a [`Group`] bundles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GroupKind {
  Lecture,
  Tutorial,
  Lab,
  Block,
}

impl GroupKind {
  /// The label used on a [`crate::model::ScheduleItem`], matching §4.8.
  pub fn label(self) -> &'static str {
    match self {
      GroupKind::Lecture => "lecture",
      GroupKind::Tutorial => "tutorial",
      GroupKind::Lab => "lab",
      GroupKind::Block => "block",
    }
  }
}

/// An indivisible bundle of sessions of one kind. Picking a group means
/// taking all of its sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
  pub kind: GroupKind,
  pub sessions: Vec<Session>,
}

impl Group {
  /// `true` iff any session of `self` overlaps any session of `other`.
  pub fn conflicts_with(&self, other: &Group) -> bool {
    self
      .sessions
      .iter()
      .any(|a| other.sessions.iter().any(|b| a.overlaps(b)))
  }
}

/// A parsed course: a name, a teacher, and up to four kinds of group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
  pub numeric_id: u32,
  pub raw_id: String,
  pub name: String,
  pub teacher: String,
  pub lecture_groups: Vec<Group>,
  pub tutorial_groups: Vec<Group>,
  pub lab_groups: Vec<Group>,
  pub block_groups: Vec<Group>,
}

impl Course {
  /// Groups of `kind`, in parse order.
  pub fn groups_of(&self, kind: GroupKind) -> &[Group] {
    match kind {
      GroupKind::Lecture => &self.lecture_groups,
      GroupKind::Tutorial => &self.tutorial_groups,
      GroupKind::Lab => &self.lab_groups,
      GroupKind::Block => &self.block_groups,
    }
  }
}

/// Owns every [`Course`] (and transitively every [`Group`]/[`Session`]) for
/// one generation run. Everything downstream refers into this arena by
/// index; nothing borrows a `Course` directly across the pipeline.
#[derive(Debug, Default, Clone)]
pub struct CourseArena {
  courses: Vec<Course>,
}

impl CourseArena {
  pub fn new(courses: Vec<Course>) -> Self {
    Self { courses }
  }

  pub fn len(&self) -> usize {
    self.courses.len()
  }

  pub fn is_empty(&self) -> bool {
    self.courses.is_empty()
  }

  pub fn courses(&self) -> &[Course] {
    &self.courses
  }

  pub fn course(&self, idx: usize) -> &Course {
    &self.courses[idx]
  }
}

/// A non-owning reference to one [`Group`] inside a [`CourseArena`]: an
/// index pair, never a raw pointer, per the ownership split mandated for
/// this component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRef {
  pub course_idx: usize,
  pub kind: GroupKind,
  pub group_idx: usize,
}

impl GroupRef {
  pub fn resolve<'a>(&self, arena: &'a CourseArena) -> &'a Group {
    &arena.course(self.course_idx).groups_of(self.kind)[self.group_idx]
  }
}

/// A per-course pick: one lecture group plus, when offered, one tutorial
/// and/or one lab group, internally conflict-free.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseSelection {
  pub course_idx: usize,
  pub lecture: GroupRef,
  pub tutorial: Option<GroupRef>,
  pub lab: Option<GroupRef>,
}

impl CourseSelection {
  /// All group refs present in this selection, lecture first.
  pub fn group_refs(&self) -> impl Iterator<Item = GroupRef> + '_ {
    std::iter::once(self.lecture)
      .chain(self.tutorial)
      .chain(self.lab)
  }

  /// `true` iff any group of `self` conflicts with any group of `other`.
  pub fn conflicts_with(&self, other: &CourseSelection, arena: &CourseArena) -> bool {
    self.group_refs().any(|a| {
      other
        .group_refs()
        .any(|b| a.resolve(arena).conflicts_with(b.resolve(arena)))
    })
  }
}

/// An ordered pick of one [`CourseSelection`] per participating course, all
/// pairwise conflict-free.
pub type Schedule = Vec<CourseSelection>;

/// Projection of one session inside a schedule, ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleItem {
  pub course_name: String,
  pub raw_id: String,
  pub kind_label: String,
  pub start: Minutes,
  pub end: Minutes,
  pub building: String,
  pub room: String,
}

/// A schedule projected onto its seven weekdays and annotated with
/// aggregate statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InformativeSchedule {
  pub index: usize,
  /// `week[0]` is weekday 1, ..., `week[6]` is weekday 7. Each bucket is
  /// sorted by `start` ascending; empty means inactive.
  pub week: [Vec<ScheduleItem>; 7],
  pub amount_days: usize,
  pub amount_gaps: usize,
  pub gaps_time_minutes: u32,
  pub avg_start_minutes: u32,
  pub avg_end_minutes: u32,
}

impl InformativeSchedule {
  /// Iterator over the non-empty day buckets, in weekday order.
  pub fn active_days(&self) -> impl Iterator<Item = &[ScheduleItem]> {
    self.week.iter().filter(|day| !day.is_empty()).map(Vec::as_slice)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn session(weekday: Weekday, start: Minutes, end: Minutes) -> Session {
    Session {
      weekday,
      start,
      end,
      building: "1".into(),
      room: "2".into(),
    }
  }

  #[test]
  fn group_conflict_requires_a_shared_overlapping_pair() {
    let a = Group {
      kind: GroupKind::Lecture,
      sessions: vec![session(1, 540, 600)],
    };
    let b = Group {
      kind: GroupKind::Tutorial,
      sessions: vec![session(1, 600, 660)],
    };
    assert!(!a.conflicts_with(&b), "touching boundary is not a conflict");

    let c = Group {
      kind: GroupKind::Lab,
      sessions: vec![session(1, 590, 650)],
    };
    assert!(a.conflicts_with(&c));
  }

  #[test]
  fn group_ref_resolves_through_the_arena() {
    let course = Course {
      numeric_id: 1,
      raw_id: "00001".into(),
      name: "Algorithms".into(),
      teacher: "Prof. A".into(),
      lecture_groups: vec![Group {
        kind: GroupKind::Lecture,
        sessions: vec![session(1, 540, 600)],
      }],
      tutorial_groups: vec![],
      lab_groups: vec![],
      block_groups: vec![],
    };
    let arena = CourseArena::new(vec![course]);
    let r = GroupRef {
      course_idx: 0,
      kind: GroupKind::Lecture,
      group_idx: 0,
    };
    assert_eq!(r.resolve(&arena).sessions.len(), 1);
  }
}
