use std::sync::LazyLock;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};
use regex::Regex;

const MONTH_PATTERN: &str = "jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|jun(?:e)?|jul(?:y)?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?";

/// Yearless dates further than this into the future are assumed to be last year's.
const YEARLESS_FUTURE_DAYS: i64 = 7;

static RE_TODAY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\btoday\b").unwrap());
static RE_YESTERDAY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\byesterday\b").unwrap());
static RE_ISO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(20\d{2})[-/.](\d{1,2})[-/.](\d{1,2})\b").unwrap());
static RE_NUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{1,2})[/-](\d{1,2})[/-](\d{4}|\d{2})\b").unwrap());
static RE_MONTH_DAY_YEAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\b({MONTH_PATTERN})\s+(\d{{1,2}})(?:st|nd|rd|th)?(?:,\s*(\d{{4}}|\d{{2}})|\s+(\d{{4}}))\b"
    ))
    .unwrap()
});
static RE_DAY_MONTH_YEAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\b(\d{{1,2}})(?:st|nd|rd|th)?\s+({MONTH_PATTERN}),?\s+(\d{{4}})\b"
    ))
    .unwrap()
});
static RE_MONTH_DAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\b({MONTH_PATTERN})\s+(\d{{1,2}})(?:st|nd|rd|th)?\b"
    ))
    .unwrap()
});
static RE_DAY_MONTH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\b(\d{{1,2}})(?:st|nd|rd|th)?\s+({MONTH_PATTERN})\b"
    ))
    .unwrap()
});

/// Extracts a calendar date from recognized text.
///
/// Patterns are tried in priority order; the first one that yields a valid
/// calendar date wins. An impossible date (Feb 30, month 13) from one pattern
/// falls through to the next.
pub fn parse_date(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    if RE_TODAY.is_match(text) {
        return Some(today);
    }
    if RE_YESTERDAY.is_match(text) {
        return today.checked_sub_signed(Duration::days(1));
    }

    let matchers: [fn(&str, NaiveDate) -> Option<NaiveDate>; 6] = [
        match_iso,
        match_numeric,
        match_month_day_year,
        match_day_month_year,
        match_month_day,
        match_day_month,
    ];

    matchers.iter().find_map(|matcher| matcher(text, today))
}

/// Parses a date handed over by a structured recognizer.
///
/// Accepts RFC 3339 timestamps, bare `YYYY-MM-DD`, and anything [`parse_date`] accepts.
pub fn parse_date_value(value: &str, today: NaiveDate) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(date);
    }
    parse_date(trimmed, today)
}

/// Represents a calendar date as its UTC midnight instant.
pub fn to_utc_midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// Builds a date, rejecting anything that does not exist on the calendar.
pub fn build_date(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
}

fn normalize_year(year: i32) -> i32 {
    if year < 100 {
        2000 + year
    } else {
        year
    }
}

fn month_from_name(name: &str) -> Option<u32> {
    let prefix = name.get(..3)?.to_ascii_lowercase();
    let month = match prefix.as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}

fn resolve_yearless(month: u32, day: u32, today: NaiveDate) -> Option<NaiveDate> {
    let candidate = build_date(today.year(), month, day)?;
    if (candidate - today).num_days() > YEARLESS_FUTURE_DAYS {
        return build_date(today.year() - 1, month, day);
    }
    Some(candidate)
}

fn capture_num<T: std::str::FromStr>(caps: &regex::Captures<'_>, idx: usize) -> Option<T> {
    caps.get(idx)?.as_str().parse().ok()
}

fn match_iso(text: &str, _today: NaiveDate) -> Option<NaiveDate> {
    let caps = RE_ISO.captures(text)?;
    build_date(
        capture_num(&caps, 1)?,
        capture_num(&caps, 2)?,
        capture_num(&caps, 3)?,
    )
}

fn match_numeric(text: &str, _today: NaiveDate) -> Option<NaiveDate> {
    let caps = RE_NUMERIC.captures(text)?;
    let part_a: u32 = capture_num(&caps, 1)?;
    let part_b: u32 = capture_num(&caps, 2)?;
    let year = normalize_year(capture_num(&caps, 3)?);

    // Day-first only when the first part cannot be a month.
    let (month, day) = if part_a > 12 && part_b <= 12 {
        (part_b, part_a)
    } else {
        (part_a, part_b)
    };
    build_date(year, month, day)
}

fn match_month_day_year(text: &str, _today: NaiveDate) -> Option<NaiveDate> {
    let caps = RE_MONTH_DAY_YEAR.captures(text)?;
    let month = month_from_name(caps.get(1)?.as_str())?;
    let day = capture_num(&caps, 2)?;
    let year = capture_num(&caps, 3).or_else(|| capture_num(&caps, 4))?;
    build_date(normalize_year(year), month, day)
}

fn match_day_month_year(text: &str, _today: NaiveDate) -> Option<NaiveDate> {
    let caps = RE_DAY_MONTH_YEAR.captures(text)?;
    let day = capture_num(&caps, 1)?;
    let month = month_from_name(caps.get(2)?.as_str())?;
    build_date(capture_num(&caps, 3)?, month, day)
}

fn match_month_day(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    let caps = RE_MONTH_DAY.captures(text)?;
    let month = month_from_name(caps.get(1)?.as_str())?;
    resolve_yearless(month, capture_num(&caps, 2)?, today)
}

fn match_day_month(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    let caps = RE_DAY_MONTH.captures(text)?;
    let month = month_from_name(caps.get(2)?.as_str())?;
    resolve_yearless(month, capture_num(&caps, 1)?, today)
}
