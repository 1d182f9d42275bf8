//! Pure time arithmetic shared by every component that reasons about
//! weekday/minute-of-day meetings: parsing `HH:MM` strings and testing two
//! meetings for overlap.

use crate::model::ErrorCategory;

/// Minute-of-day, in `[0, 1440)`.
pub type Minutes = u16;

/// ISO-ish weekday, in `1..=7`.
pub type Weekday = u8;

/// Parses an `HH:MM` string into a minute-of-day value.
///
/// `HH` must be in `0..=23` and `MM` in `0..=59`; anything else, including a
/// missing colon or non-numeric fields, is a `bad_time` error.
pub fn to_minutes(text: &str) -> Result<Minutes, ErrorCategory> {
  let (hour_str, minute_str) = text.split_once(':').ok_or(ErrorCategory::BadTime)?;
  if hour_str.is_empty() || minute_str.is_empty() {
    return Err(ErrorCategory::BadTime);
  }
  let hour: u16 = hour_str.parse().map_err(|_| ErrorCategory::BadTime)?;
  let minute: u16 = minute_str.parse().map_err(|_| ErrorCategory::BadTime)?;
  if hour > 23 || minute > 59 {
    return Err(ErrorCategory::BadTime);
  }
  Ok(hour * 60 + minute)
}

/// Formats a minute-of-day value back into `HH:MM`, zero-padded.
pub fn minutes_to_hhmm(minutes: Minutes) -> String {
  format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// Half-open overlap test: true iff the two meetings share a weekday and
/// `a.start < b.end && b.start < a.end`. Touching at a boundary is not an
/// overlap.
pub fn overlap(
  a_weekday: Weekday,
  a_start: Minutes,
  a_end: Minutes,
  b_weekday: Weekday,
  b_start: Minutes,
  b_end: Minutes,
) -> bool {
  a_weekday == b_weekday && a_start < b_end && b_start < a_end
}

/// Validates that a weekday falls in `1..=7`.
pub fn is_valid_weekday(weekday: Weekday) -> bool {
  (1..=7).contains(&weekday)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_valid_time() {
    assert_eq!(to_minutes("09:00").unwrap(), 540);
    assert_eq!(to_minutes("00:00").unwrap(), 0);
    assert_eq!(to_minutes("23:59").unwrap(), 1439);
  }

  #[test]
  fn rejects_malformed_time() {
    assert!(to_minutes("9:00").is_ok()); // single-digit hour is fine, just parse() tolerant
    assert!(to_minutes("24:00").is_err());
    assert!(to_minutes("09:60").is_err());
    assert!(to_minutes("0900").is_err());
    assert!(to_minutes("").is_err());
    assert!(to_minutes(":00").is_err());
    assert!(to_minutes("09:").is_err());
  }

  #[test]
  fn roundtrips_hhmm() {
    assert_eq!(minutes_to_hhmm(540), "09:00");
    assert_eq!(minutes_to_hhmm(0), "00:00");
  }

  #[test]
  fn overlap_is_strict_and_weekday_scoped() {
    // touching boundary: not an overlap
    assert!(!overlap(1, 540, 600, 1, 600, 660));
    // strict overlap
    assert!(overlap(3, 540, 660, 3, 600, 720));
    // same times, different weekday: no overlap
    assert!(!overlap(1, 540, 600, 2, 540, 600));
  }
}
