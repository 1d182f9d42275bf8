//! Schedule-Builder (§4.7): cross-course depth-first backtracking over
//! per-course legal combinations, pruning on the first conflict with the
//! partial assignment.

use crate::model::{CourseArena, CourseSelection, Schedule};
use crate::validator::CancellationToken;

/// Builds every pairwise-conflict-free schedule from `options[i]` being the
/// legal combinations of the i-th participating course. `n = 0` yields one
/// empty schedule; any empty `options[i]` yields zero schedules.
///
/// Cancellation is observed between top-level (depth-0) iterations only,
/// per §5's suspension-point contract.
pub fn build_schedules(
  options: &[Vec<CourseSelection>],
  arena: &CourseArena,
  token: &CancellationToken,
) -> Vec<Schedule> {
  let mut results = Vec::new();
  if options.is_empty() {
    results.push(Vec::new());
    return results;
  }

  let mut partial: Schedule = Vec::with_capacity(options.len());
  for candidate in &options[0] {
    if token.is_cancelled() {
      break;
    }
    partial.push(*candidate);
    backtrack(options, 1, &mut partial, arena, &mut results);
    partial.pop();
  }
  results
}

fn backtrack(
  options: &[Vec<CourseSelection>],
  depth: usize,
  partial: &mut Schedule,
  arena: &CourseArena,
  results: &mut Vec<Schedule>,
) {
  if depth == options.len() {
    results.push(partial.clone());
    return;
  }

  for candidate in &options[depth] {
    let conflicts = partial.iter().any(|placed| placed.conflicts_with(candidate, arena));
    if conflicts {
      continue;
    }
    partial.push(*candidate);
    backtrack(options, depth + 1, partial, arena, results);
    partial.pop();
  }
}
