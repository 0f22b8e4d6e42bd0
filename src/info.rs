use std::{collections::BTreeMap, fs::File, io, path::Path};

use chrono::NaiveDate;
use csv::ReaderBuilder;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::{
    error::{Error, Result},
    utils::{abbreviate, models::Report},
};

/// Information about a day of the semester
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DayInfo {
    /// Full weekday name, i.e.: LUNDI
    pub day_name: String,
    /// B1, B2 or anything else
    pub week_type: String,
    /// Weekday abbreviation forced by an override
    pub forced: Option<String>,
}

impl DayInfo {
    /// Weekday abbreviation the schedule follows this day
    #[must_use]
    pub fn abbreviation(&self) -> String {
        match &self.forced {
            Some(day) => day.clone(),
            None => abbreviate(&self.day_name),
        }
    }
}

/// A day which doesn't follow its usual weekday, i.e.: a tuesday following monday's schedule
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct DayOverride {
    pub date: NaiveDate,
    /// Abbreviation or full name
    pub weekday: String,
}

/// Every known day of the semester
#[derive(Clone, Debug, Default)]
pub struct AlternanceMap {
    days: BTreeMap<NaiveDate, DayInfo>,
}

impl AlternanceMap {
    #[must_use]
    pub fn get(&self, date: NaiveDate) -> Option<&DayInfo> {
        self.days.get(&date)
    }

    /// First and last day of the semester
    #[must_use]
    pub fn range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.days.keys().next()?;
        let last = self.days.keys().next_back()?;

        Some((*first, *last))
    }

    /// Insert a day, returns the previous information of this date if any
    pub fn insert(&mut self, date: NaiveDate, day: DayInfo) -> Option<DayInfo> {
        self.days.insert(date, day)
    }

    /// Force the weekday of known dates
    pub fn apply_overrides(&mut self, overrides: &[DayOverride]) {
        for day_override in overrides {
            match self.days.get_mut(&day_override.date) {
                Some(day) => day.forced = Some(abbreviate(&day_override.weekday)),
                None => debug!(
                    date = %day_override.date,
                    "override outside of the alternance calendar"
                ),
            }
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.days.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

/// Build the alternance calendar from its CSV legend
///
/// # Errors
///
/// Fails only on I/O errors, malformed records are counted in the report.
pub fn read<R: io::Read>(reader: R) -> std::result::Result<(AlternanceMap, Report), csv::Error> {
    let mut reader = ReaderBuilder::new()
        .delimiter(b',')
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let mut report = Report::default();
    let mut alternance = AlternanceMap::default();
    for (i, record) in reader.records().enumerate() {
        report.row();
        let line = i + 2;

        let record = match record {
            Ok(record) => record,
            Err(err) if err.is_io_error() => return Err(err),
            Err(err) => {
                debug!(line, %err, "unreadable alternance row");
                report.skip();
                continue;
            }
        };

        if record.len() != 3 {
            debug!(line, columns = record.len(), "alternance row skipped");
            report.skip();
            continue;
        }

        let Ok(date) = NaiveDate::parse_from_str(record[0].trim(), "%Y-%m-%d") else {
            debug!(line, date = &record[0], "alternance row with an invalid date");
            report.skip();
            continue;
        };

        let day = DayInfo {
            day_name: record[1].trim().to_uppercase(),
            week_type: record[2].trim().to_uppercase(),
            forced: None,
        };

        // Last one wins
        if alternance.insert(date, day).is_some() {
            warn!(%date, line, "date found twice in the alternance calendar");
        }
    }

    Ok((alternance, report))
}

/// Read the alternance legend at `path`
///
/// # Errors
///
/// Fails if the file can't be opened or read.
pub fn load(path: &Path) -> Result<AlternanceMap> {
    let file = File::open(path).map_err(|source| Error::Read {
        path: path.to_owned(),
        source,
    })?;

    let (alternance, report) = read(file).map_err(|source| Error::Csv {
        path: path.to_owned(),
        source,
    })?;

    if report.skipped > 0 {
        warn!(
            path = %path.display(),
            skipped = report.skipped,
            "malformed alternance rows ignored"
        );
    }
    info!(path = %path.display(), days = alternance.len(), "{report}");

    Ok(alternance)
}
