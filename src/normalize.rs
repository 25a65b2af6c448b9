use crate::model::FeeClass;
use crate::profile::{DateRule, FeeRule};
use chrono::{Datelike, NaiveDate, Utc};
use chrono_tz::Tz;

/// Date line and time line split out of a combined raw block. Sites render
/// the date above the time; anything past the second line is ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhenParts {
    pub date_line: String,
    pub time_line: String,
}

pub fn split_when_block(raw: &str) -> WhenParts {
    let mut lines = raw.lines().map(str::trim).filter(|line| !line.is_empty());
    let date_line = lines.next().unwrap_or_default().to_string();
    let time_line = lines.next().unwrap_or_default().to_string();
    WhenParts {
        date_line,
        time_line,
    }
}

const WEEKDAYS: &[&str] = &[
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Parse a site's date line into a calendar date. The leading weekday is
/// dropped before matching the configured formats; a year-less line resolves
/// against the current year in the declared source timezone. No hour-offset
/// arithmetic happens here.
pub fn parse_event_date(raw: &str, rule: &DateRule, timezone: Option<&str>) -> Option<NaiveDate> {
    let trimmed = strip_weekday_prefix(raw.trim());
    if trimmed.is_empty() {
        return None;
    }

    for format in &rule.formats {
        if !format.contains("%Y") {
            continue;
        }
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Some(date);
        }
    }

    if rule.infer_year {
        let year = current_year_in(timezone);
        for format in &rule.formats {
            if format.contains("%Y") {
                continue;
            }
            let with_year = format!("{trimmed}, {year}");
            let format_with_year = format!("{format}, %Y");
            if let Ok(date) = NaiveDate::parse_from_str(&with_year, &format_with_year) {
                return Some(date);
            }
        }
    }

    None
}

fn strip_weekday_prefix(text: &str) -> &str {
    for day in WEEKDAYS {
        if let Some(rest) = text.strip_prefix(day) {
            return rest.trim_start_matches([',', ' ']);
        }
    }
    text
}

fn current_year_in(timezone: Option<&str>) -> i32 {
    if let Some(name) = timezone
        && let Ok(tz) = name.parse::<Tz>()
    {
        return Utc::now().with_timezone(&tz).year();
    }
    Utc::now().year()
}

/// Classify the fee from the marker element's full text. A missing element
/// or unmatched text falls back to the profile default; the asymmetry per
/// site is documented on the profiles.
pub fn classify_fee(raw: Option<&str>, rule: &FeeRule) -> FeeClass {
    let Some(text) = raw else {
        return rule.default;
    };
    if rule.free_markers.iter().any(|m| text.contains(m.as_str())) {
        return FeeClass::Free;
    }
    if rule.paid_markers.iter().any(|m| text.contains(m.as_str())) {
        return FeeClass::Paid;
    }
    rule.default
}

/// Drop cache-busting query parameters from a banner URL.
pub fn strip_query(url: &str) -> String {
    match url.split_once('?') {
        Some((base, _)) => base.to_string(),
        None => url.to_string(),
    }
}
