use std::sync::LazyLock;

use regex::Regex;

static RE_THOUSANDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{1,3}(,\d{3})+$").unwrap());

/// Parses a number written with either comma or dot conventions.
///
/// - both `,` and `.` present: commas are thousands separators (`1,234.5`)
/// - only commas, grouped in threes: thousands separators (`12,000`)
/// - a lone comma otherwise: decimal point (`10,5`)
pub fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let has_comma = trimmed.contains(',');
    let has_dot = trimmed.contains('.');

    let normalized = if has_comma && has_dot {
        trimmed.replace(',', "")
    } else if has_comma {
        if RE_THOUSANDS.is_match(trimmed) {
            trimmed.replace(',', "")
        } else {
            trimmed.replace(',', ".")
        }
    } else {
        trimmed.to_string()
    };

    let compact: String = normalized.chars().filter(|c| !c.is_whitespace()).collect();
    compact.parse::<f64>().ok().filter(|v| v.is_finite())
}
