//! Turn the timetable exports of Polytechnique Montréal into an iCalendar file.
//!
//! The timetable export lists one hour of class per row, the alternance legend
//! tells for each day of the semester its weekday and if it's a B1 or B2 week.

pub mod config;
pub mod error;
pub mod filter;
pub mod ics;
pub mod info;
pub mod timetable;
pub mod utils;

pub use config::Config;
pub use error::{Error, Result};

use crate::{filter::Selection, info::AlternanceMap, timetable::models::Courses};

/// Build the events of the selection and export them, returns how many events were written
///
/// # Errors
///
/// Fails if the timezone is unknown, the alternance calendar is empty or the
/// output can't be written.
pub fn generate(
    config: &Config,
    courses: &Courses,
    alternance: &AlternanceMap,
    selection: &Selection,
) -> Result<usize> {
    let tz = config.tz()?;

    let mut alternance = alternance.clone();
    alternance.apply_overrides(&config.overrides);

    let events = timetable::build(courses, selection, &alternance, tz)?;
    crate::ics::export(&events, &config.output)?;

    Ok(events.len())
}
