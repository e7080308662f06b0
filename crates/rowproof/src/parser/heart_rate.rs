use std::sync::LazyLock;

use regex::Regex;

pub const MIN_HEART_RATE: u32 = 40;
pub const MAX_HEART_RATE: u32 = 230;

static RE_AVERAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:avg|average)\s*(?:heart\s*rate|hr|bpm)?\s*[:\-]?\s*(\d{2,3})\b").unwrap()
});
static RE_BPM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)(\d{2,3})\s*bpm\b").unwrap());
// Console shorthand, e.g. "r 152".
static RE_RATE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\br\s*(\d{2,3})\b").unwrap());

/// Extracts the average heart rate in bpm.
pub fn parse_avg_hr(text: &str) -> Option<u32> {
    [&*RE_AVERAGE, &*RE_BPM, &*RE_RATE]
        .iter()
        .find_map(|re| first_in_range(re, text))
}

pub fn is_plausible_heart_rate(bpm: u32) -> bool {
    (MIN_HEART_RATE..=MAX_HEART_RATE).contains(&bpm)
}

fn first_in_range(re: &Regex, text: &str) -> Option<u32> {
    let value: u32 = re.captures(text)?.get(1)?.as_str().parse().ok()?;
    is_plausible_heart_rate(value).then_some(value)
}
