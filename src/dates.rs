//! Date normalization for heterogeneous headline timestamps.
//!
//! The raw feed mixes ISO-8601 timestamps that carry an offset with naive
//! timestamps that are implicitly U.S. Eastern time, plus a long tail of
//! hand-typed formats. [`DateNormalizer`] runs an ordered chain of
//! [`DateStrategy`] implementations and takes the first success:
//!
//! 1. [`GeneralStrategy`]: RFC 3339 / ISO-8601 and U.S. numeric formats
//! 2. [`PermissiveStrategy`]: RFC 2822, month names, AM/PM, trailing zone markers
//!
//! Naive results are localized to a civil timezone (default
//! `America/New_York`) using the zone's DST rules and then converted to UTC.
//!
//! # Known limitation
//!
//! Numeric dates such as `03/04/2020` are read month-first. Day-first input is
//! silently misread rather than rejected.

use chrono::{
    DateTime, FixedOffset, LocalResult, NaiveDate, NaiveDateTime, Offset, TimeDelta, TimeZone, Utc,
};
use chrono_tz::Tz;
use std::borrow::Cow;
use std::fmt;
use thiserror::Error;
use tracing::trace;

/// Timezone assumed for timestamps that carry no offset.
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::America::New_York;

/// Zone meant by a trailing `ET`, `EST` or `EDT`.
const EASTERN: Tz = chrono_tz::America::New_York;

/// Offset-bearing layouts tried by [`GeneralStrategy`] after RFC 3339.
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%#z",
    "%Y-%m-%d %H:%M%:z",
];

const GENERAL_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

const GENERAL_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];

const PERMISSIVE_DATETIME_FORMATS: &[&str] = &[
    "%B %d, %Y %H:%M:%S",
    "%B %d, %Y %H:%M",
    "%B %d, %Y %I:%M:%S %p",
    "%B %d, %Y %I:%M %p",
    "%B %d, %Y, %H:%M:%S",
    "%B %d, %Y, %H:%M",
    "%B %d, %Y, %I:%M:%S %p",
    "%B %d, %Y, %I:%M %p",
    "%B %d %Y %H:%M",
    "%d %B %Y %H:%M:%S",
    "%d %B %Y %H:%M",
    "%a, %d %b %Y %H:%M:%S",
    "%a %b %d %H:%M:%S %Y",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %I:%M %p",
    "%Y-%m-%d %I:%M %p",
    "%m-%d-%Y %H:%M",
];

const PERMISSIVE_DATE_FORMATS: &[&str] = &[
    "%B %d, %Y",
    "%B %d %Y",
    "%d %B %Y",
    "%a, %B %d, %Y",
    "%m-%d-%Y",
    "%m/%d/%y",
];

const UTC_MARKERS: &[&str] = &["UTC", "GMT", "Z"];
const EASTERN_MARKERS: &[&str] = &["ET", "EST", "EDT"];

/// Result of a single strategy before timezone resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedDate {
    /// The input carried an explicit offset.
    Aware(DateTime<FixedOffset>),
    /// No offset; the caller decides which civil zone applies.
    Naive(NaiveDateTime),
}

/// One link in the fallback chain.
///
/// Returning `None` hands the input to the next strategy.
pub trait DateStrategy: Send + Sync {
    /// Short name used in trace logs.
    fn name(&self) -> &'static str;

    fn parse(&self, input: &str) -> Option<ParsedDate>;
}

/// Why a date could not be normalized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnparseableDate {
    #[error("date is missing")]
    Missing,
    #[error("date is empty")]
    Empty,
    #[error("no strategy recognized `{0}`")]
    Unrecognized(String),
    #[error("`{0}` has no mapping in the assumed timezone")]
    Unmappable(String),
}

/// ISO-8601 / RFC 3339 plus the numeric formats a CSV export usually emits.
#[derive(Debug, Default, Clone, Copy)]
pub struct GeneralStrategy;

impl DateStrategy for GeneralStrategy {
    fn name(&self) -> &'static str {
        "general"
    }

    fn parse(&self, input: &str) -> Option<ParsedDate> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
            return Some(ParsedDate::Aware(dt));
        }
        if let Some(expanded) = expand_basic_iso(input) {
            return parse_naive(&expanded, GENERAL_DATETIME_FORMATS, GENERAL_DATE_FORMATS)
                .map(ParsedDate::Naive);
        }
        OFFSET_FORMATS
            .iter()
            .find_map(|fmt| DateTime::parse_from_str(input, fmt).ok())
            .map(ParsedDate::Aware)
            .or_else(|| {
                parse_naive(input, GENERAL_DATETIME_FORMATS, GENERAL_DATE_FORMATS)
                    .map(ParsedDate::Naive)
            })
    }
}

/// Looser formats: RFC 2822, spelled-out months, 12-hour clocks and a trailing
/// zone marker such as `UTC` or `ET`.
#[derive(Debug, Default, Clone, Copy)]
pub struct PermissiveStrategy;

impl PermissiveStrategy {
    fn parse_any_naive(input: &str) -> Option<NaiveDateTime> {
        parse_naive(input, GENERAL_DATETIME_FORMATS, GENERAL_DATE_FORMATS).or_else(|| {
            parse_naive(input, PERMISSIVE_DATETIME_FORMATS, PERMISSIVE_DATE_FORMATS)
        })
    }
}

impl DateStrategy for PermissiveStrategy {
    fn name(&self) -> &'static str {
        "permissive"
    }

    fn parse(&self, input: &str) -> Option<ParsedDate> {
        if let Ok(dt) = DateTime::parse_from_rfc2822(input) {
            return Some(ParsedDate::Aware(dt));
        }

        let input = strip_month_period(input);
        if let Some((rest, marker)) = input.rsplit_once(char::is_whitespace) {
            let rest = rest.trim_end();
            if UTC_MARKERS.iter().any(|m| marker.eq_ignore_ascii_case(m)) {
                return Self::parse_any_naive(rest)
                    .map(|naive| ParsedDate::Aware(naive.and_utc().fixed_offset()));
            }
            // An explicit Eastern marker wins over the configured zone.
            if EASTERN_MARKERS.iter().any(|m| marker.eq_ignore_ascii_case(m)) {
                return Self::parse_any_naive(rest)
                    .and_then(|naive| localize(naive, &EASTERN))
                    .map(|dt| ParsedDate::Aware(dt.fixed_offset()));
            }
        }

        parse_naive(&input, PERMISSIVE_DATETIME_FORMATS, PERMISSIVE_DATE_FORMATS)
            .map(ParsedDate::Naive)
    }
}

/// Rewrite ISO-8601 basic format (`20200605`, `20200605T093000`) into the
/// extended form the general layouts understand.
fn expand_basic_iso(input: &str) -> Option<String> {
    let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    let date = |d: &str| format!("{}-{}-{}", &d[..4], &d[4..6], &d[6..8]);

    match input.split_once(['T', 't']) {
        None if input.len() == 8 && digits(input) => Some(date(input)),
        Some((d, t)) if d.len() == 8 && t.len() == 6 && digits(d) && digits(t) => {
            Some(format!("{}T{}:{}:{}", date(d), &t[..2], &t[2..4], &t[4..6]))
        }
        _ => None,
    }
}

/// Drop the period after an abbreviated month name (`Jun. 5, 2020`).
fn strip_month_period(input: &str) -> Cow<'_, str> {
    let (first, rest) = input.split_once(' ').unwrap_or((input, ""));
    match first.strip_suffix('.') {
        Some(month) if month.len() == 3 && month.bytes().all(|b| b.is_ascii_alphabetic()) => {
            Cow::Owned(format!("{month} {rest}"))
        }
        _ => Cow::Borrowed(input),
    }
}

fn parse_naive(
    input: &str,
    datetime_formats: &[&str],
    date_formats: &[&str],
) -> Option<NaiveDateTime> {
    datetime_formats
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
        .or_else(|| {
            date_formats
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(input, fmt).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// Interpret a naive timestamp as civil time in `tz` and convert it to UTC.
///
/// * Autumn fold (the wall clock repeats): the later, standard-time reading wins.
/// * Spring gap (the wall clock skips): the offset in force just before the
///   transition is applied, so `02:30` on the spring-forward day in New York
///   reads as `02:30 EST`.
///
/// Returns `None` only if no offset can be found around the gap.
pub fn localize(naive: NaiveDateTime, tz: &Tz) -> Option<DateTime<Utc>> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Some(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(_, later) => Some(later.with_timezone(&Utc)),
        LocalResult::None => {
            let offset = [1, 24].iter().find_map(|hours| {
                let before = naive.checked_sub_signed(TimeDelta::hours(*hours))?;
                tz.offset_from_local_datetime(&before).earliest()
            })?;
            offset
                .fix()
                .from_local_datetime(&naive)
                .single()
                .map(|dt| dt.with_timezone(&Utc))
        }
    }
}

/// Ordered fallback chain turning free-form strings into UTC instants.
pub struct DateNormalizer {
    strategies: Vec<Box<dyn DateStrategy>>,
    timezone: Tz,
}

impl DateNormalizer {
    /// General then permissive parsing, naive times read in `timezone`.
    pub fn new(timezone: Tz) -> Self {
        Self::with_strategies(
            timezone,
            vec![Box::new(GeneralStrategy), Box::new(PermissiveStrategy)],
        )
    }

    pub fn with_strategies(timezone: Tz, strategies: Vec<Box<dyn DateStrategy>>) -> Self {
        Self {
            strategies,
            timezone,
        }
    }

    /// The civil zone applied to naive timestamps.
    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Normalize a raw date cell.
    ///
    /// # Arguments
    ///
    /// * `input` - The cell value, `None` when the cell was empty or absent
    ///
    /// # Returns
    ///
    /// The instant in UTC, or an [`UnparseableDate`] describing why every
    /// strategy rejected the input. Leading and trailing whitespace is ignored.
    pub fn normalize(&self, input: Option<&str>) -> Result<DateTime<Utc>, UnparseableDate> {
        let raw = input.ok_or(UnparseableDate::Missing)?;
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(UnparseableDate::Empty);
        }

        for strategy in &self.strategies {
            let Some(parsed) = strategy.parse(trimmed) else {
                continue;
            };
            trace!(
                strategy = strategy.name(),
                input = trimmed,
                "Date recognized"
            );
            return match parsed {
                ParsedDate::Aware(dt) => Ok(dt.with_timezone(&Utc)),
                ParsedDate::Naive(naive) => localize(naive, &self.timezone)
                    .ok_or_else(|| UnparseableDate::Unmappable(trimmed.to_string())),
            };
        }

        Err(UnparseableDate::Unrecognized(trimmed.to_string()))
    }
}

impl Default for DateNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEZONE)
    }
}

impl fmt::Debug for DateNormalizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.strategies.iter().map(|s| s.name()).collect();
        f.debug_struct("DateNormalizer")
            .field("strategies", &names)
            .field("timezone", &self.timezone)
            .finish()
    }
}
