//! Enricher (§4.8): turns raw schedules into day-indexed
//! `InformativeSchedule`s with aggregate statistics, in parallel over
//! contiguous ranges of the input vector so the kept output stays
//! deterministic and contiguously indexed.

use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::slice::ParallelSlice;

use crate::config::RunConfig;
use crate::model::{CourseArena, GroupKind, InformativeSchedule, Schedule, ScheduleItem};

/// Builds the `InformativeSchedule` for one raw schedule, or `None` if
/// every day bucket ends up empty (the schedule is discarded, §4.8 item 2).
fn enrich_one(schedule: &Schedule, arena: &CourseArena) -> Option<InformativeSchedule> {
  let mut week: [Vec<ScheduleItem>; 7] = Default::default();

  for selection in schedule {
    let course = arena.course(selection.course_idx);
    for group_ref in selection.group_refs() {
      if group_ref.kind == GroupKind::Block {
        continue; // block sessions never enter a day bucket (§4.8 item 1)
      }
      let group = group_ref.resolve(arena);
      for session in &group.sessions {
        let item = ScheduleItem {
          course_name: course.name.clone(),
          raw_id: course.raw_id.clone(),
          kind_label: group_ref.kind.label().to_string(),
          start: session.start,
          end: session.end,
          building: session.building.clone(),
          room: session.room.clone(),
        };
        week[(session.weekday - 1) as usize].push(item);
      }
    }
  }

  if week.iter().all(Vec::is_empty) {
    return None;
  }

  for day in &mut week {
    day.sort_by_key(|item| item.start);
  }

  let amount_days = week.iter().filter(|d| !d.is_empty()).count();

  let mut amount_gaps = 0usize;
  let mut gaps_time_minutes: u32 = 0;
  let mut start_sum: u32 = 0;
  let mut end_sum: u32 = 0;

  for day in week.iter().filter(|d| !d.is_empty()) {
    start_sum += day.first().unwrap().start as u32;
    end_sum += day.iter().map(|i| i.end as u32).max().unwrap();
    for pair in day.windows(2) {
      let (a, b) = (&pair[0], &pair[1]);
      if b.start > a.end {
        amount_gaps += 1;
        gaps_time_minutes += (b.start - a.end) as u32;
      }
    }
  }

  let (avg_start_minutes, avg_end_minutes) = if amount_days > 0 {
    (start_sum / amount_days as u32, end_sum / amount_days as u32)
  } else {
    (0, 0)
  };

  Some(InformativeSchedule {
    index: 0, // assigned by the caller once the kept order is known
    week,
    amount_days,
    amount_gaps,
    gaps_time_minutes,
    avg_start_minutes,
    avg_end_minutes,
  })
}

/// Enriches every raw schedule, dropping empty ones and assigning a
/// contiguous 1-based `index` in input order. Parallelizes over ranges per
/// §4.8's parallelism contract when there are enough schedules to be worth
/// it; a shared atomic counter tracks kept schedules for progress
/// reporting only, never for ordering.
pub fn enrich_schedules(schedules: &[Schedule], arena: &CourseArena, config: &RunConfig) -> Vec<InformativeSchedule> {
  let kept_counter = AtomicUsize::new(0);
  let n = schedules.len();
  if n == 0 {
    return Vec::new();
  }

  let (min_threads, max_threads) = config.enrichment_thread_clamp;
  let threads = std::thread::available_parallelism()
    .map(|p| p.get())
    .unwrap_or(1)
    .clamp(min_threads, max_threads);

  let chunk_size = n.div_ceil(threads).max(1);
  let chunk_size = if chunk_size < config.enrichment_min_chunk {
    n // too few schedules to be worth splitting: one range, effectively serial
  } else {
    chunk_size
  };

  let processed: Vec<Vec<InformativeSchedule>> = schedules
    .par_chunks(chunk_size)
    .map(|chunk| {
      let mut local = Vec::new();
      for schedule in chunk {
        if let Some(informative) = enrich_one(schedule, arena) {
          kept_counter.fetch_add(1, Ordering::Relaxed);
          local.push(informative);
        }
      }
      local
    })
    .collect();

  let mut flat: Vec<InformativeSchedule> = processed.into_iter().flatten().collect();
  for (i, schedule) in flat.iter_mut().enumerate() {
    schedule.index = i + 1;
  }
  debug_assert_eq!(flat.len(), kept_counter.load(Ordering::Relaxed));
  flat
}
