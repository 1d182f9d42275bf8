//! Filter/Sort Engine (§4.9): metric-based predicates over an enriched
//! schedule set, a single-key stable sort, and the whitelisted SQL-predicate
//! surface a downstream assistant can drive instead of the typed predicates.

use rusqlite::Connection;
use rusqlite::types::Value as SqlValue;
use typed_builder::TypedBuilder;

use crate::error::RunError;
use crate::model::InformativeSchedule;

/// The five independently-enableable predicates of §4.9. Disabled criteria
/// are vacuously true; all enabled criteria are ANDed.
#[derive(Debug, Clone, Default, TypedBuilder)]
#[builder(field_defaults(default))]
pub struct FilterCriteria {
  #[builder(default, setter(strip_option))]
  pub days_to_study: Option<usize>,
  #[builder(default, setter(strip_option))]
  pub total_gaps: Option<usize>,
  #[builder(default, setter(strip_option))]
  pub max_gap_time: Option<u32>,
  #[builder(default, setter(strip_option))]
  pub avg_day_start: Option<u32>,
  #[builder(default, setter(strip_option))]
  pub avg_day_end: Option<u32>,
}

impl FilterCriteria {
  /// `true` iff `schedule` passes every enabled criterion. A schedule with
  /// `amount_days == 0` vacuously passes every enabled start/end criterion.
  pub fn matches(&self, schedule: &InformativeSchedule) -> bool {
    if let Some(max_days) = self.days_to_study {
      if schedule.amount_days > max_days {
        return false;
      }
    }
    if let Some(max_gaps) = self.total_gaps {
      if schedule.amount_gaps > max_gaps {
        return false;
      }
    }
    if let Some(max_single_gap) = self.max_gap_time {
      let worst = max_single_gap_minutes(schedule);
      if worst > max_single_gap {
        return false;
      }
    }
    if schedule.amount_days > 0 {
      if let Some(min_start) = self.avg_day_start {
        if schedule.avg_start_minutes < min_start {
          return false;
        }
      }
      if let Some(max_end) = self.avg_day_end {
        if schedule.avg_end_minutes > max_end {
          return false;
        }
      }
    }
    true
  }

  /// Indices (1-based `InformativeSchedule::index`) of every schedule that
  /// matches, in input order.
  pub fn apply(&self, schedules: &[InformativeSchedule]) -> Vec<usize> {
    schedules
      .iter()
      .filter(|s| self.matches(s))
      .map(|s| s.index)
      .collect()
  }
}

/// The largest single-gap duration, in minutes, across every active day of
/// `schedule`; `0` if the schedule has no gaps at all.
fn max_single_gap_minutes(schedule: &InformativeSchedule) -> u32 {
  schedule
    .active_days()
    .flat_map(|day| day.windows(2))
    .map(|pair| {
      let (a, b) = (&pair[0], &pair[1]);
      b.start.saturating_sub(a.end) as u32
    })
    .filter(|&gap| gap > 0)
    .max()
    .unwrap_or(0)
}

/// The single sort key a request can choose, per §4.9.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
  AmountDays,
  AmountGaps,
  GapsTime,
  AvgStart,
  AvgEnd,
}

fn sort_value(schedule: &InformativeSchedule, key: SortKey) -> u32 {
  match key {
    SortKey::AmountDays => schedule.amount_days as u32,
    SortKey::AmountGaps => schedule.amount_gaps as u32,
    SortKey::GapsTime => schedule.gaps_time_minutes,
    SortKey::AvgStart => schedule.avg_start_minutes,
    SortKey::AvgEnd => schedule.avg_end_minutes,
  }
}

/// Remembers the last sort request so that flipping only the direction of an
/// unchanged key can reverse the vector in place (§4.9) instead of re-sorting.
#[derive(Debug, Default)]
pub struct Sorter {
  last: Option<(SortKey, bool)>,
}

impl Sorter {
  pub fn new() -> Self {
    Self::default()
  }

  /// Sorts `schedules` in place by `key`, ascending iff `ascending`. Stable
  /// with respect to prior index order on ties. `amount_days` uses a
  /// counting sort over its known `1..=7` range; the remaining keys use a
  /// standard stable comparison sort.
  pub fn sort(&mut self, schedules: &mut Vec<InformativeSchedule>, key: SortKey, ascending: bool) {
    if let Some((last_key, last_ascending)) = self.last {
      if last_key == key && last_ascending != ascending {
        schedules.reverse();
        self.last = Some((key, ascending));
        return;
      }
    }

    if key == SortKey::AmountDays {
      counting_sort_by_amount_days(schedules, ascending);
    } else {
      schedules.sort_by_key(|s| sort_value(s, key));
      if !ascending {
        schedules.reverse();
      }
    }
    self.last = Some((key, ascending));
  }
}

/// Bucket sort over the known `1..=7` range of `amount_days`, stable on
/// ties. `amount_days == 0` (never populated per §4.8 item 2, but handled
/// defensively) sorts into bucket `0`.
fn counting_sort_by_amount_days(schedules: &mut Vec<InformativeSchedule>, ascending: bool) {
  let mut buckets: Vec<Vec<InformativeSchedule>> = (0..=7).map(|_| Vec::new()).collect();
  for schedule in schedules.drain(..) {
    let bucket = schedule.amount_days.min(7);
    buckets[bucket].push(schedule);
  }
  let order: Box<dyn Iterator<Item = usize>> = if ascending {
    Box::new(0..=7)
  } else {
    Box::new((0..=7).rev())
  };
  for bucket in order {
    schedules.extend(buckets[bucket].drain(..));
  }
}

/// Forbidden keywords for the whitelisted SQL-predicate surface (§4.9),
/// checked case-insensitively after comments are stripped.
const FORBIDDEN_KEYWORDS: &[&str] = &[
  "insert", "update", "delete", "drop", "create", "alter", "truncate", "grant", "revoke", "exec", "execute",
  "declare", "cast", "convert", "union", "into", "merge", "replace", "call", "do", "handler", "load", "rename",
  "optimize", "repair", "analyze", "check", "checksum", "restore", "backup", "show", "describe", "explain",
];

const WHITELISTED_TABLES: &[&str] = &["schedule", "schedule_set"];
const ALLOWED_SELECT_COLUMN: &str = "schedule_index";

/// Strips `--` line comments and `/* */` block comments, used only to
/// narrow the table/column extraction step further down in
/// [`validate_query`] — the forbidden-keyword scan runs over the raw text
/// instead, precisely so a keyword cannot hide inside a comment (§8 property
/// 10). Does not attempt to special-case string literals, since literals are
/// rejected outright by [`validate_query`].
fn strip_comments(sql: &str) -> String {
  let mut out = String::with_capacity(sql.len());
  let mut chars = sql.chars().peekable();
  while let Some(c) = chars.next() {
    if c == '-' && chars.peek() == Some(&'-') {
      while let Some(&next) = chars.peek() {
        if next == '\n' {
          break;
        }
        chars.next();
      }
      continue;
    }
    if c == '/' && chars.peek() == Some(&'*') {
      chars.next();
      while let Some(next) = chars.next() {
        if next == '*' && chars.peek() == Some(&'/') {
          chars.next();
          break;
        }
      }
      out.push(' ');
      continue;
    }
    out.push(c);
  }
  out
}

/// Splits `sql` into lowercase word tokens (identifiers/keywords), ignoring
/// punctuation, numbers, and placeholder markers.
fn word_tokens(sql: &str) -> Vec<String> {
  sql
    .split(|c: char| !c.is_ascii_alphanumeric() && c != '_')
    .filter(|tok| !tok.is_empty() && tok.chars().next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_'))
    .map(str::to_ascii_lowercase)
    .collect()
}

/// Validates a textual predicate against §4.9's whitelist surface: a single
/// `SELECT schedule_index` statement over whitelisted tables, free of
/// forbidden keywords and literal values. Returns the cleaned statement text
/// ready for [`execute_query`] on success.
pub fn validate_query(sql: &str) -> Result<String, RunError> {
  // The forbidden-keyword scan runs over the raw, un-stripped text: a
  // keyword hidden inside a `--` or `/* */` comment is still a token and is
  // still rejected. Comment-stripping below narrows the table/column
  // extraction step only, never the keyword ban — narrowing the ban by
  // stripping first is the exact validator defect this surface must not
  // repeat.
  let raw_tokens = word_tokens(sql);
  for keyword in FORBIDDEN_KEYWORDS {
    if raw_tokens.iter().any(|tok| tok == keyword) {
      return Err(RunError::QueryInvalid(format!(
        "forbidden keyword '{keyword}' in query"
      )));
    }
  }

  let stripped = strip_comments(sql);
  let trimmed = stripped.trim();
  if trimmed.is_empty() {
    return Err(RunError::QueryInvalid("empty query".into()));
  }

  // exactly one statement: at most one trailing semicolon, none elsewhere.
  let body = trimmed.strip_suffix(';').unwrap_or(trimmed).trim();
  if body.contains(';') {
    return Err(RunError::QueryInvalid(
      "only a single SELECT statement is allowed".into(),
    ));
  }

  // literals are rejected outright: no quoted strings, no bare numeric tokens.
  if body.contains('\'') || body.contains('"') {
    return Err(RunError::QueryInvalid(
      "literal values are rejected; use parameter placeholders".into(),
    ));
  }
  // `?1`-style positional placeholders are legitimate and must not be
  // mistaken for numeric literals; blank them out before scanning for one.
  let without_placeholders: String = {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
      if c == '?' {
        while chars.peek().is_some_and(|d| d.is_ascii_digit()) {
          chars.next();
        }
        out.push(' ');
        continue;
      }
      out.push(c);
    }
    out
  };
  if without_placeholders
    .split(|c: char| !c.is_ascii_alphanumeric() && c != '_' && c != '.')
    .any(|tok| !tok.is_empty() && tok.chars().all(|c| c.is_ascii_digit()))
  {
    return Err(RunError::QueryInvalid(
      "literal values are rejected; use parameter placeholders".into(),
    ));
  }

  let tokens = word_tokens(body);
  if tokens.first().map(String::as_str) != Some("select") {
    return Err(RunError::QueryInvalid(
      "only a single SELECT statement is allowed".into(),
    ));
  }

  let lower_body = body.to_ascii_lowercase();
  let from_pos = lower_body.find(" from ").ok_or_else(|| {
    RunError::QueryInvalid("query must reference a whitelisted table via FROM".to_string())
  })?;

  let select_list = lower_body[("select".len())..from_pos].trim();
  let select_list = select_list.trim_start_matches("schedule.").trim();
  if select_list != ALLOWED_SELECT_COLUMN {
    return Err(RunError::QueryInvalid(format!(
      "only the '{ALLOWED_SELECT_COLUMN}' column may be selected"
    )));
  }

  let rest = &lower_body[from_pos + " from ".len()..];
  let where_pos = rest.find(" where ").unwrap_or(rest.len());
  let table_clause = &rest[..where_pos];
  for table_tok in table_clause.split(',') {
    let table_tok = table_tok.trim();
    let name = table_tok
      .split_whitespace()
      .next()
      .unwrap_or(table_tok)
      .trim_matches(|c: char| c == '(' || c == ')');
    if !name.is_empty() && !WHITELISTED_TABLES.contains(&name) {
      return Err(RunError::QueryInvalid(format!(
        "table '{name}' is not whitelisted"
      )));
    }
  }

  Ok(body.to_string())
}

/// The in-process relational store backing the SQL-predicate surface: a
/// `schedule` table (one row per enriched schedule, the aggregate stats as
/// columns) and a `schedule_set` table (just the set of valid indices, for
/// predicates that only need membership).
pub struct ScheduleStore {
  conn: Connection,
}

impl ScheduleStore {
  /// Builds an in-memory store populated from `schedules`.
  pub fn build(schedules: &[InformativeSchedule]) -> rusqlite::Result<Self> {
    let conn = Connection::open_in_memory()?;
    conn.execute_batch(
      "CREATE TABLE schedule (
         schedule_index   INTEGER PRIMARY KEY,
         amount_days      INTEGER NOT NULL,
         amount_gaps      INTEGER NOT NULL,
         gaps_time_minutes INTEGER NOT NULL,
         avg_start_minutes INTEGER NOT NULL,
         avg_end_minutes  INTEGER NOT NULL
       );
       CREATE TABLE schedule_set (schedule_index INTEGER PRIMARY KEY);",
    )?;
    {
      let mut insert_schedule = conn.prepare(
        "INSERT INTO schedule
           (schedule_index, amount_days, amount_gaps, gaps_time_minutes, avg_start_minutes, avg_end_minutes)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
      )?;
      let mut insert_set = conn.prepare("INSERT INTO schedule_set (schedule_index) VALUES (?1)")?;
      for schedule in schedules {
        insert_schedule.execute(rusqlite::params![
          schedule.index as i64,
          schedule.amount_days as i64,
          schedule.amount_gaps as i64,
          schedule.gaps_time_minutes as i64,
          schedule.avg_start_minutes as i64,
          schedule.avg_end_minutes as i64,
        ])?;
        insert_set.execute(rusqlite::params![schedule.index as i64])?;
      }
    }
    Ok(Self { conn })
  }

  /// Runs an already-[`validate_query`]d statement with positional
  /// parameters and returns the matching `schedule_index` values.
  pub fn execute_query(&self, validated_sql: &str, params: &[SqlValue]) -> rusqlite::Result<Vec<usize>> {
    let mut stmt = self.conn.prepare(validated_sql)?;
    let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|v| v as &dyn rusqlite::ToSql).collect();
    let rows = stmt.query_map(param_refs.as_slice(), |row| row.get::<_, i64>(0))?;
    let mut out = Vec::new();
    for row in rows {
      out.push(row? as usize);
    }
    Ok(out)
  }
}

/// Validates `sql`, then runs it against a store built from `schedules`,
/// returning the matching `schedule_index` values (§4.9's SQL-predicate
/// mode). A validation failure never touches the database.
pub fn run_sql_predicate(
  schedules: &[InformativeSchedule],
  sql: &str,
  params: &[SqlValue],
) -> Result<Vec<usize>, RunError> {
  let validated = validate_query(sql)?;
  let store = ScheduleStore::build(schedules)
    .map_err(|e| RunError::QueryInvalid(format!("failed to prepare schedule store: {e}")))?;
  store
    .execute_query(&validated, params)
    .map_err(|e| RunError::QueryInvalid(format!("query execution failed: {e}")))
}
