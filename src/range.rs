//! Date range filtering for category tables.

use crate::constants::{RANGE_DATETIME_FORMATS, RANGE_DATE_FORMATS};
use crate::error::{HealthError, Result};
use chrono::{NaiveDate, NaiveDateTime};
use std::fmt;
use tracing::debug;

/// Exclusive `(start, end)` window over row start timestamps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl DateRange {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self> {
        if start > end {
            return Err(HealthError::InvalidDateRange {
                reason: format!("start {} is after end {}", start, end),
            });
        }
        Ok(Self { start, end })
    }

    /// Parse both bounds from text
    ///
    /// Accepts `YYYY-MM-DD HH:MM`, `MM/DD/YY HH:MM`, or a bare
    /// `YYYY-MM-DD` meaning midnight.
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        Self::new(parse_bound(start)?, parse_bound(end)?)
    }

    /// Join a date with an optional `HH:MM` time for each bound
    ///
    /// If either joined bound does not parse, both bounds fall back to
    /// midnight of their dates.
    pub fn from_parts(
        start_date: &str,
        start_time: Option<&str>,
        end_date: &str,
        end_time: Option<&str>,
    ) -> Result<Self> {
        let join = |date: &str, time: Option<&str>| match time {
            Some(time) if !time.trim().is_empty() => format!("{} {}", date.trim(), time.trim()),
            _ => date.trim().to_string(),
        };

        let joined = parse_bound(&join(start_date, start_time))
            .and_then(|start| Ok((start, parse_bound(&join(end_date, end_time))?)));

        match joined {
            Ok((start, end)) => Self::new(start, end),
            Err(e) => {
                debug!("{}; using date-only bounds", e);
                Self::new(parse_date_bound(start_date)?, parse_date_bound(end_date)?)
            }
        }
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    /// Strictly after `start` and strictly before `end`
    pub fn contains(&self, timestamp: NaiveDateTime) -> bool {
        timestamp > self.start && timestamp < self.end
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} .. {}", self.start, self.end)
    }
}

fn parse_bound(raw: &str) -> Result<NaiveDateTime> {
    let raw = raw.trim();

    for format in RANGE_DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(parsed);
        }
    }

    for format in RANGE_DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return Ok(date.and_time(chrono::NaiveTime::MIN));
        }
    }

    Err(HealthError::InvalidDateRange {
        reason: format!(
            "unrecognised date '{}', expected YYYY-MM-DD[ HH:MM] or MM/DD/YY HH:MM",
            raw
        ),
    })
}

fn parse_date_bound(raw: &str) -> Result<NaiveDateTime> {
    let raw = raw.trim();

    RANGE_DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
        .map(|date| date.and_time(chrono::NaiveTime::MIN))
        .ok_or_else(|| HealthError::InvalidDateRange {
            reason: format!("unrecognised date '{}', expected YYYY-MM-DD", raw),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn test_parse_formats() {
        let range = DateRange::parse("2020-01-01 06:30", "01/31/20 18:00").unwrap();
        assert_eq!(range.start(), at(2020, 1, 1, 6, 30));
        assert_eq!(range.end(), at(2020, 1, 31, 18, 0));

        let range = DateRange::parse("2020-01-01", "2020-02-01").unwrap();
        assert_eq!(range.start(), at(2020, 1, 1, 0, 0));
        assert_eq!(range.end(), at(2020, 2, 1, 0, 0));
    }

    #[test]
    fn test_from_parts() {
        let range = DateRange::from_parts("2020-01-01", Some("08:00"), "2020-01-02", None).unwrap();
        assert_eq!(range.start(), at(2020, 1, 1, 8, 0));
        assert_eq!(range.end(), at(2020, 1, 2, 0, 0));

        let range = DateRange::from_parts("2020-01-01", Some(" "), "2020-01-02", Some("")).unwrap();
        assert_eq!(range.start(), at(2020, 1, 1, 0, 0));
    }

    #[test]
    fn test_from_parts_bad_time_falls_back_to_dates() {
        let range =
            DateRange::from_parts("2020-01-01", Some("8am"), "2020-01-02", Some("10:00")).unwrap();
        assert_eq!(range.start(), at(2020, 1, 1, 0, 0));
        assert_eq!(range.end(), at(2020, 1, 2, 0, 0));

        let range =
            DateRange::from_parts("2020-01-01", Some("08:00"), "2020-01-02", Some("25:00")).unwrap();
        assert_eq!(range.start(), at(2020, 1, 1, 0, 0));
        assert_eq!(range.end(), at(2020, 1, 2, 0, 0));
    }

    #[test]
    fn test_from_parts_bad_date_is_an_error() {
        assert!(matches!(
            DateRange::from_parts("yesterday", Some("08:00"), "2020-01-02", None),
            Err(HealthError::InvalidDateRange { .. })
        ));
        assert!(matches!(
            DateRange::from_parts("2020-01-03", Some("bad"), "2020-01-02", None),
            Err(HealthError::InvalidDateRange { .. })
        ));
    }

    #[test]
    fn test_invalid_ranges() {
        assert!(matches!(
            DateRange::parse("last week", "2020-01-01"),
            Err(HealthError::InvalidDateRange { .. })
        ));
        assert!(matches!(
            DateRange::parse("2020-02-01", "2020-01-01"),
            Err(HealthError::InvalidDateRange { .. })
        ));
    }

    #[test]
    fn test_contains_is_exclusive() {
        let range = DateRange::parse("2020-01-01", "2020-01-02").unwrap();
        assert!(!range.contains(at(2020, 1, 1, 0, 0)));
        assert!(range.contains(at(2020, 1, 1, 0, 1)));
        assert!(range.contains(at(2020, 1, 1, 23, 59)));
        assert!(!range.contains(at(2020, 1, 2, 0, 0)));
    }
}
