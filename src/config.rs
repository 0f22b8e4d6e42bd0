use std::{fs, path::Path, path::PathBuf};

use chrono::NaiveDate;
use chrono_tz::Tz;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::{
    error::{Error, Result},
    filter::Selection,
    info::DayOverride,
};

static OVERRIDE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?P<date>\d{4}-\d{2}-\d{2})=(?P<day>\p{L}+)$").unwrap());

/// Everything needed for a run
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Timetable export, `;`-separated
    pub timetable: PathBuf,

    /// Alternance legend, `,`-separated
    pub alternance: PathBuf,

    /// Where the calendar is written
    pub output: PathBuf,

    /// IANA name of the timezone of the classes
    pub timezone: String,

    /// Days following another weekday's schedule
    pub overrides: Vec<DayOverride>,

    pub selection: Selection,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timetable: PathBuf::from("horsage.csv"),
            alternance: PathBuf::from("alternance.csv"),
            output: PathBuf::from("schedule.ics"),
            timezone: "America/Toronto".to_owned(),
            // Tuesday 2024-10-01 followed the monday schedule
            overrides: NaiveDate::from_ymd_opt(2024, 10, 1)
                .into_iter()
                .map(|date| DayOverride {
                    date,
                    weekday: "LUN".to_owned(),
                })
                .collect(),
            selection: Selection::default(),
        }
    }
}

impl Config {
    /// Read a TOML configuration file, missing keys take their default value
    ///
    /// # Errors
    ///
    /// Fails if the file can't be read or isn't a valid configuration.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| Error::Read {
            path: path.to_owned(),
            source,
        })?;

        toml::from_str(&content).map_err(|source| Error::Config {
            path: path.to_owned(),
            source,
        })
    }

    /// Timezone of the classes
    ///
    /// # Errors
    ///
    /// Fails if the name isn't a known IANA timezone.
    pub fn tz(&self) -> Result<Tz> {
        self.timezone
            .parse()
            .map_err(|_| Error::Timezone(self.timezone.clone()))
    }
}

/// Parse an override like `2024-10-01=LUN`
///
/// # Errors
///
/// Fails if the argument isn't well formatted or the date doesn't exist.
pub fn parse_override(arg: &str) -> Result<DayOverride> {
    let invalid = || Error::Override(arg.to_owned());

    let captures = OVERRIDE.captures(arg.trim()).ok_or_else(invalid)?;
    let date = NaiveDate::parse_from_str(&captures["date"], "%Y-%m-%d").map_err(|_| invalid())?;

    Ok(DayOverride {
        date,
        weekday: captures["day"].to_uppercase(),
    })
}
