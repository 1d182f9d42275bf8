//! `RunError`: the orchestrator-level error taxonomy (§7), as a
//! `thiserror`-derived enum alongside the parser/validator's
//! [`crate::model::ValidationError`] collected-diagnostics type.

use thiserror::Error;

use crate::model::ValidationError;

/// Fatal outcomes of a generation run. `conflict_detected` and
/// `empty_result` are not represented here: the former rides alongside a
/// successful result rather than aborting it, and the latter is an empty
/// `Vec` plus an informational log line, not an error (§7).
#[derive(Debug, Error)]
pub enum RunError {
  /// Malformed DB input left zero courses to work with.
  #[error("no usable courses after parsing: {0:?}")]
  NoCoursesParsed(Vec<ValidationError>),

  /// Empty, over-cap, or fully-unmatched selection (§4.3).
  #[error("selection invalid: {0}")]
  SelectionInvalid(ValidationError),

  /// A block-time window was malformed or conflicted with another (§4.4).
  #[error("block-time invalid: {0}")]
  BlockTimeInvalid(ValidationError),

  /// Cancellation was observed; no partial results are returned.
  #[error("run cancelled")]
  Cancelled,

  /// The validator exceeded its timeout (§4.5).
  #[error("course validation timed out after {0:?}")]
  Timeout(std::time::Duration),

  /// A submitted SQL predicate failed validation (§4.9).
  #[error("query invalid: {0}")]
  QueryInvalid(String),
}

impl std::fmt::Display for ValidationError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "[{:?}] {}", self.category, self.message)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::ErrorCategory;

  #[test]
  fn display_includes_the_category() {
    let err = ValidationError::new(ErrorCategory::BadTime, "bad time");
    assert_eq!(format!("{err}"), "[BadTime] bad time");
  }

  #[test]
  fn run_error_variants_format_without_panicking() {
    let _ = RunError::Cancelled.to_string();
    let _ = RunError::Timeout(std::time::Duration::from_secs(5)).to_string();
    let _ = RunError::QueryInvalid("bad query".into()).to_string();
  }
}
