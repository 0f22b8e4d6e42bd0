use std::{fs, path::Path};

use chrono::Utc;
use ics::{
    escape_text,
    properties::{Description, DtStart, Duration, Location, Summary, Trigger},
    Alarm, ICalendar,
};
use tracing::info;

use crate::{
    error::{Error, Result},
    timetable::models::Event,
    utils::iso_duration,
};

const PRODID: &str = concat!(
    "-//",
    env!("CARGO_PKG_NAME"),
    "//",
    env!("CARGO_PKG_VERSION"),
    "//FR"
);

/// iCalendar UTC datetime
const UTC_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// Build the calendar holding all the events
#[must_use]
pub fn calendar(events: &[Event]) -> ICalendar<'static> {
    let mut calendar = ICalendar::new("2.0", PRODID);
    let dtstamp = Utc::now().format(UTC_FORMAT).to_string();

    for event in events {
        let mut ics_event =
            ics::Event::new(uuid::Uuid::new_v4().to_string(), dtstamp.clone());

        ics_event.push(DtStart::new(
            event.start.with_timezone(&Utc).format(UTC_FORMAT).to_string(),
        ));
        ics_event.push(Duration::new(iso_duration(event.duration)));
        ics_event.push(Summary::new(escape_text(event.title.clone())));
        ics_event.push(Location::new(escape_text(event.location.clone())));

        ics_event.add_alarm(Alarm::display(
            Trigger::new(iso_duration(-event.alarm)),
            Description::new(escape_text(event.title.clone())),
        ));

        calendar.add_event(ics_event);
    }

    calendar
}

/// Export the events to an `.ics` file, replacing it if it exists
///
/// # Errors
///
/// Fails if the file can't be written.
pub fn export(events: &[Event], path: &Path) -> Result<()> {
    let content = calendar(events).to_string();

    fs::write(path, content).map_err(|source| Error::Write {
        path: path.to_owned(),
        source,
    })?;

    info!(path = %path.display(), events = events.len(), "calendar exported");

    Ok(())
}
