use std::sync::LazyLock;

use regex::Regex;

/// Characters inspected on each side of a bare `H:MM` to recognise pace expressions.
const PACE_CONTEXT_CHARS: usize = 8;

static RE_LABELED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:moving|total|elapsed)\s*time[:\s]*(\d{1,2}:\d{2}(?::\d{2})?(?:[.,]\d)?)")
        .unwrap()
});
static RE_HOURS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d{1,2})\s*h(?:ours?)?\s*(\d{1,2})?\s*(?:m|min|mins|minutes)?\b").unwrap()
});
static RE_MINUTES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d{1,3})\s*(?:min|mins|minutes)\b").unwrap());
static RE_HHMMSS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,2}):(\d{2}):(\d{2})(?:[.,](\d{1,2}))?").unwrap());
static RE_HHMM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d{1,2}):(\d{2})").unwrap());
static RE_SPLIT_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/\d{2,4}\s*m").unwrap());

/// Extracts the workout duration in whole minutes.
///
/// Every pattern family contributes candidates and the longest one wins:
/// shorter matches are usually pace or split fragments of the same screen.
pub fn parse_minutes(text: &str) -> Option<u32> {
    let mut candidates: Vec<f64> = Vec::new();

    for caps in RE_LABELED.captures_iter(text) {
        if let Some(minutes) = caps.get(1).and_then(|m| parse_duration_minutes(m.as_str())) {
            candidates.push(minutes);
        }
    }

    for caps in RE_HOURS.captures_iter(text) {
        let hours: Option<f64> = caps.get(1).and_then(|m| m.as_str().parse().ok());
        let minutes: f64 = caps
            .get(2)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0.0);
        if let Some(hours) = hours {
            candidates.push(hours * 60.0 + minutes);
        }
    }

    for caps in RE_MINUTES.captures_iter(text) {
        if let Some(minutes) = caps.get(1).and_then(|m| m.as_str().parse::<f64>().ok()) {
            candidates.push(minutes);
        }
    }

    for caps in RE_HHMMSS.captures_iter(text) {
        let parts: Option<(f64, f64, f64)> = (|| {
            Some((
                caps.get(1)?.as_str().parse().ok()?,
                caps.get(2)?.as_str().parse().ok()?,
                caps.get(3)?.as_str().parse().ok()?,
            ))
        })();
        let fraction: f64 = caps
            .get(4)
            .and_then(|m| format!("0.{}", m.as_str()).parse().ok())
            .unwrap_or(0.0);
        if let Some((hours, minutes, seconds)) = parts {
            candidates.push(hours * 60.0 + minutes + (seconds + fraction) / 60.0);
        }
    }

    for caps in RE_HHMM.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        if is_pace_context(text, whole.start(), whole.end()) {
            continue;
        }

        let first: Option<f64> = caps.get(1).and_then(|m| m.as_str().parse().ok());
        let second: Option<f64> = caps.get(2).and_then(|m| m.as_str().parse().ok());
        if let (Some(first), Some(second)) = (first, second) {
            // 45:30 reads as minutes:seconds, 1:30 as hours:minutes.
            let minutes = if first >= 10.0 {
                first + second / 60.0
            } else {
                first * 60.0 + second
            };
            candidates.push(minutes);
        }
    }

    round_minutes(candidates.into_iter().fold(None, max_candidate))
}

/// Converts a colon-delimited duration to minutes.
///
/// Three components are `H:MM:SS`, two are `MM:SS`. Commas count as decimal points.
pub fn parse_duration_minutes(raw: &str) -> Option<f64> {
    let cleaned = raw.replace(',', ".");
    let numbers: Vec<f64> = cleaned
        .trim()
        .split(':')
        .map(|part| part.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .ok()?;

    match numbers.as_slice() {
        [hours, minutes, seconds] => Some((hours * 3600.0 + minutes * 60.0 + seconds) / 60.0),
        [minutes, seconds] => Some((minutes * 60.0 + seconds) / 60.0),
        _ => None,
    }
}

/// Rounds a minute count, treating anything under half a minute as absent.
pub(crate) fn round_minutes(value: Option<f64>) -> Option<u32> {
    let rounded = value?.round();
    if rounded >= 1.0 && rounded <= u32::MAX as f64 {
        Some(rounded as u32)
    } else {
        None
    }
}

pub(crate) fn max_candidate(acc: Option<f64>, value: f64) -> Option<f64> {
    match acc {
        Some(current) if current >= value => Some(current),
        _ => Some(value),
    }
}

fn is_pace_context(text: &str, start: usize, end: usize) -> bool {
    let window = context_window(text, start, end, PACE_CONTEXT_CHARS).to_lowercase();
    window.contains("/km")
        || window.contains("/mi")
        || RE_SPLIT_MARKER.is_match(&window)
        || window.contains("pace")
}

/// Slice of `text` spanning `[start, end)` widened by up to `radius` characters per side.
fn context_window(text: &str, start: usize, end: usize, radius: usize) -> &str {
    let from = text[..start]
        .char_indices()
        .rev()
        .nth(radius.saturating_sub(1))
        .map(|(idx, _)| idx)
        .unwrap_or(0);
    let to = text[end..]
        .char_indices()
        .nth(radius)
        .map(|(idx, _)| end + idx)
        .unwrap_or(text.len());
    &text[from..to]
}
