//! Legal-Combination Generator (§4.6): per course, every internally
//! conflict-free `(lecture, optional tutorial, optional lab)` triple.

use crate::model::{Course, CourseSelection, GroupKind, GroupRef};

/// Emits every legal [`CourseSelection`] for the course at `course_idx`.
/// Tutorial/lab options include an implicit "absent" choice when the
/// course offers none with sessions, never a null placeholder among real
/// options (§9 open-question resolution).
pub fn legal_combinations(course: &Course, course_idx: usize) -> Vec<CourseSelection> {
  let mut out = Vec::new();

  for (lecture_idx, _lecture) in course.lecture_groups.iter().enumerate() {
    let lecture_ref = crate::model::GroupRef {
      course_idx,
      kind: GroupKind::Lecture,
      group_idx: lecture_idx,
    };

    let tutorial_options: Vec<Option<usize>> = if course.tutorial_groups.is_empty() {
      vec![None]
    } else {
      course.tutorial_groups.iter().enumerate().map(|(i, _)| Some(i)).collect()
    };
    let lab_options: Vec<Option<usize>> = if course.lab_groups.is_empty() {
      vec![None]
    } else {
      course.lab_groups.iter().enumerate().map(|(i, _)| Some(i)).collect()
    };

    for &tutorial_idx in &tutorial_options {
      let tutorial_ref = tutorial_idx.map(|idx| crate::model::GroupRef {
        course_idx,
        kind: GroupKind::Tutorial,
        group_idx: idx,
      });
      if let Some(t) = tutorial_ref {
        if course.lecture_groups[lecture_idx].conflicts_with(&course.tutorial_groups[t.group_idx]) {
          continue;
        }
      }

      for &lab_idx in &lab_options {
        let lab_ref = lab_idx.map(|idx| crate::model::GroupRef {
          course_idx,
          kind: GroupKind::Lab,
          group_idx: idx,
        });
        if let Some(l) = lab_ref {
          if course.lecture_groups[lecture_idx].conflicts_with(&course.lab_groups[l.group_idx]) {
            continue;
          }
          if let Some(t) = tutorial_ref {
            if course.tutorial_groups[t.group_idx].conflicts_with(&course.lab_groups[l.group_idx]) {
              continue;
            }
          }
        }

        out.push(CourseSelection {
          course_idx,
          lecture: lecture_ref,
          tutorial: tutorial_ref,
          lab: lab_ref,
        });
      }
    }
  }

  out
}

/// The synthetic block-time course (§4.4) has no lecture groups, so it never
/// goes through [`legal_combinations`]'s mandatory-lecture iteration. It
/// contributes exactly one fixed `CourseSelection` per run, carrying its
/// single block [`Group`] in the `lecture` slot purely as a storage
/// convenience — [`crate::model::CourseSelection::group_refs`] and the
/// enricher both dispatch on the ref's `kind`, not on which field holds it.
/// Returns `None` when no block windows were supplied (the course has no
/// block groups).
pub fn block_combination(course_idx: usize, block_course: &Course) -> Option<CourseSelection> {
  if block_course.block_groups.is_empty() {
    return None;
  }
  Some(CourseSelection {
    course_idx,
    lecture: GroupRef {
      course_idx,
      kind: GroupKind::Block,
      group_idx: 0,
    },
    tutorial: None,
    lab: None,
  })
}
