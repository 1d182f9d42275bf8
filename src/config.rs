//! `RunConfig` (SPEC_FULL.md §10.3): the small set of tunables this
//! document fixes as constants, exposed as a builder-constructed struct so
//! a host can override them without touching pipeline logic.

use std::time::Duration;
use typed_builder::TypedBuilder;

use crate::selection::SELECTION_CAP;

/// Tunables for one generation run. Defaults reproduce every numeric
/// constant §4/§5 names.
#[derive(Debug, Clone, TypedBuilder)]
#[builder(field_defaults(default))]
pub struct RunConfig {
  /// Maximum distinct selected course ids (§4.3).
  #[builder(default = SELECTION_CAP)]
  pub selection_cap: usize,
  /// `(min, max)` clamp on the Enricher's worker-thread count (§4.8).
  #[builder(default = (1, 8))]
  pub enrichment_thread_clamp: (usize, usize),
  /// Minimum schedules per enrichment range before parallelizing (§4.8).
  #[builder(default = 64)]
  pub enrichment_min_chunk: usize,
  /// Hard ceiling on the validator's timeout, regardless of course count (§4.5).
  #[builder(default = Duration::from_secs(30))]
  pub validator_fixed_max: Duration,
  /// Per-course coefficient of the validator's timeout formula (§4.5).
  #[builder(default = Duration::from_millis(100))]
  pub validator_per_course: Duration,
  /// Base constant of the validator's timeout formula (§4.5).
  #[builder(default = Duration::from_secs(10))]
  pub validator_base: Duration,
}

impl RunConfig {
  /// `min(FIXED_MAX, N_courses * per_course + base)`, per §4.5.
  pub fn validator_timeout(&self, course_count: usize) -> Duration {
    let scaled = self.validator_per_course * course_count as u32 + self.validator_base;
    scaled.min(self.validator_fixed_max)
  }
}

impl Default for RunConfig {
  fn default() -> Self {
    RunConfig::builder().build()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_match_the_documented_constants() {
    let cfg = RunConfig::default();
    assert_eq!(cfg.selection_cap, 7);
    assert_eq!(cfg.enrichment_thread_clamp, (1, 8));
    assert_eq!(cfg.enrichment_min_chunk, 64);
    assert_eq!(cfg.validator_fixed_max, Duration::from_secs(30));
  }

  #[test]
  fn timeout_formula_is_clamped() {
    let cfg = RunConfig::default();
    assert_eq!(cfg.validator_timeout(0), Duration::from_secs(10));
    assert_eq!(cfg.validator_timeout(10), Duration::from_secs(11));
    // at large N the fixed max wins
    assert_eq!(cfg.validator_timeout(100_000), Duration::from_secs(30));
  }

  #[test]
  fn builder_overrides_a_single_field() {
    let cfg = RunConfig::builder().selection_cap(3).build();
    assert_eq!(cfg.selection_cap, 3);
    assert_eq!(cfg.enrichment_min_chunk, 64);
  }
}
