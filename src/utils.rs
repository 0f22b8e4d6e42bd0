use chrono::{Duration, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;

pub mod models;

/// Full french weekday names and their abbreviations used by the timetable
const DAYS: [(&str, &str); 7] = [
    ("LUNDI", "LUN"),
    ("MARDI", "MAR"),
    ("MERCREDI", "MER"),
    ("JEUDI", "JEU"),
    ("VENDREDI", "VEN"),
    ("SAMEDI", "SAM"),
    ("DIMANCHE", "DIM"),
];

// hh => heure | mm => minute
static HOUR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?P<hh>\d{2})(?P<mm>\d{2})$").unwrap());

/// Abbreviate a full weekday name, unknown names are returned as is
#[must_use]
pub fn abbreviate(day: &str) -> String {
    let day = day.trim().to_uppercase();
    DAYS.iter()
        .find(|(full, _)| *full == day)
        .map_or(day.clone(), |(_, short)| (*short).to_owned())
}

/// Parse an `HHMM` token of the timetable
#[must_use]
pub fn parse_hour(token: &str) -> Option<NaiveTime> {
    let captures = HOUR.captures(token.trim())?;
    let hour = captures["hh"].parse().ok()?;
    let minute = captures["mm"].parse().ok()?;

    NaiveTime::from_hms_opt(hour, minute, 0)
}

/// Format a duration the way iCalendar expects it, i.e.: `PT2H` or `-PT30M`
#[must_use]
pub fn iso_duration(duration: Duration) -> String {
    let sign = if duration < Duration::zero() { "-" } else { "" };
    let minutes = duration.num_minutes().abs();
    let (hours, minutes) = (minutes / 60, minutes % 60);

    match (hours, minutes) {
        (0, m) => format!("{sign}PT{m}M"),
        (h, 0) => format!("{sign}PT{h}H"),
        (h, m) => format!("{sign}PT{h}H{m}M"),
    }
}
