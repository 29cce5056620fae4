use anyhow::{bail, Context};
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use once_cell::sync::Lazy;
use regex::Regex;

pub const WEEK_FORMAT: &str = "%Y-%m-%d";

static SHEET_WEEK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})\.(\d{2})\.(\d{2})$").expect("valid sheet week pattern"));

static ISO_WEEK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid iso week pattern"));

/// Turns a sheet name such as `2026.01.15` into the week `2026-01-15`.
///
/// Only the shape is checked: `2026.13.45` yields `2026-13-45`.
pub fn week_from_sheet_name(name: &str) -> Option<String> {
    let caps = SHEET_WEEK.captures(name)?;
    Some(format!("{}-{}-{}", &caps[1], &caps[2], &caps[3]))
}

pub fn parse_week(value: &str) -> anyhow::Result<NaiveDate> {
    if !ISO_WEEK.is_match(value) {
        bail!("invalid date format '{value}', use YYYY-MM-DD");
    }
    NaiveDate::parse_from_str(value, WEEK_FORMAT)
        .with_context(|| format!("invalid date '{value}', use YYYY-MM-DD"))
}

/// First Sunday strictly after `from`.
pub fn next_sunday(from: NaiveDate) -> NaiveDate {
    let days_ahead = 6 - from.weekday().num_days_from_monday() as i64;
    let days_ahead = if days_ahead <= 0 { days_ahead + 7 } else { days_ahead };
    from + Duration::days(days_ahead)
}

pub fn is_sunday(date: NaiveDate) -> bool {
    date.weekday() == Weekday::Sun
}

pub fn format_week(date: NaiveDate) -> String {
    date.format(WEEK_FORMAT).to_string()
}
