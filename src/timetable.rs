use std::{fmt, fs::File, io, path::Path};

use chrono::TimeZone;
use chrono_tz::Tz;
use csv::{ReaderBuilder, StringRecord};
use tracing::{debug, info, warn};

use crate::{
    error::{Error, Result},
    filter::Selection,
    info::AlternanceMap,
    utils::{models::Report, parse_hour},
};

use self::models::{Course, Courses, Event, Frequency, Group, GroupType};

pub mod models;

/// Minimum amount of columns of the timetable export
const FIELDS: usize = 15;

/// Reminder before every class, in minutes
const ALARM_MINUTES: i64 = 30;

/// A valid row of the timetable, before merging
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Row {
    pub sigle: String,
    pub name: String,
    pub nb_credit: u32,
    /// `None` when the period type is neither `C` nor `L`
    pub group_type: Option<GroupType>,
    pub group: Group,
}

/// Why a row was left out
#[derive(Debug, PartialEq, Eq)]
pub enum Skip {
    TooShort(usize),
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for Skip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooShort(n) => write!(f, "{n} columns instead of at least {FIELDS}"),
            Self::Missing(field) => write!(f, "empty {field}"),
            Self::Invalid(field) => write!(f, "invalid {field}"),
        }
    }
}

/// Turn a record of the timetable into a row
///
/// # Errors
///
/// Returns why the record isn't usable.
pub fn parse_row(record: &StringRecord) -> std::result::Result<Row, Skip> {
    if record.len() < FIELDS {
        return Err(Skip::TooShort(record.len()));
    }

    let field = |i: usize, name: &'static str| match record.get(i) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(Skip::Missing(name)),
    };

    let sigle = field(1, "code")?;
    let number = field(2, "group number")?;
    let nb_credit = field(3, "credits")?;
    let room = field(6, "room")?;
    let period_type = field(7, "period type")?;
    field(10, "course type")?;
    let name = field(11, "name")?;
    let week_day = field(13, "weekday")?;
    let hour = field(14, "hour")?;
    let week_nb = record.get(9).unwrap_or_default();

    let number = number
        .trim()
        .parse::<u32>()
        .map_err(|_| Skip::Invalid("group number"))?;
    let nb_credit = parse_credits(nb_credit).ok_or(Skip::Invalid("credits"))?;

    let tokens: Vec<&str> = hour
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .collect();
    if tokens.is_empty() || tokens.iter().any(|token| parse_hour(token).is_none()) {
        return Err(Skip::Invalid("hour"));
    }

    // One row holds one hour of course
    let group = Group::new(
        number,
        week_day,
        room,
        1,
        Frequency::from_week_flag(week_nb),
        hour,
    );

    Ok(Row {
        sigle: sigle.to_owned(),
        name: name.to_owned(),
        nb_credit,
        group_type: GroupType::from_token(period_type),
        group,
    })
}

/// Credits are written with a decimal comma, i.e.: `3,0`
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn parse_credits(value: &str) -> Option<u32> {
    let credits = value.trim().replace(',', ".").parse::<f64>().ok()?;
    if !credits.is_finite() || credits < 0.0 || credits > f64::from(u32::MAX) {
        return None;
    }

    Some(credits.trunc() as u32)
}

/// Iterate over the valid rows of a timetable export
///
/// # Errors
///
/// Fails only on I/O errors, malformed records are counted in the report.
pub fn rows<R: io::Read>(reader: R) -> std::result::Result<(Vec<Row>, Report), csv::Error> {
    let mut reader = ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let mut report = Report::default();
    let mut rows = vec![];
    for (i, record) in reader.records().enumerate() {
        report.row();
        // +2 for the header and because lines starts at 1
        let line = i + 2;

        let record = match record {
            Ok(record) => record,
            Err(err) if err.is_io_error() => return Err(err),
            Err(err) => {
                debug!(line, %err, "unreadable timetable row");
                report.skip();
                continue;
            }
        };

        match parse_row(&record) {
            Ok(row) => rows.push(row),
            Err(reason) => {
                debug!(line, %reason, "timetable row skipped");
                report.skip();
            }
        }
    }

    Ok((rows, report))
}

/// Build the courses registry from a timetable export
///
/// # Errors
///
/// Fails only on I/O errors.
pub fn read<R: io::Read>(reader: R) -> std::result::Result<(Courses, Report), csv::Error> {
    let (rows, report) = rows(reader)?;

    let mut courses = Courses::default();
    for row in rows {
        let course = courses.entry(&row.sigle, &row.name, row.nb_credit);
        match row.group_type {
            Some(group_type) => course.add_group(group_type, row.group),
            None => debug!(sigle = %row.sigle, "group with an unknown period type ignored"),
        }
    }

    // Merging once gives the same result as merging after each insertion
    courses.merge_groups();

    Ok((courses, report))
}

/// Read the timetable export at `path`
///
/// # Errors
///
/// Fails if the file can't be opened or read.
pub fn load(path: &Path) -> Result<Courses> {
    let file = File::open(path).map_err(|source| Error::Read {
        path: path.to_owned(),
        source,
    })?;

    let (courses, report) = read(file).map_err(|source| Error::Csv {
        path: path.to_owned(),
        source,
    })?;

    if report.skipped > 0 {
        warn!(
            path = %path.display(),
            skipped = report.skipped,
            "malformed timetable rows ignored"
        );
    }
    info!(path = %path.display(), courses = courses.len(), "{report}");

    Ok(courses)
}

/// Build the events of every selected group over the semester
///
/// # Errors
///
/// Fails if the alternance calendar is empty.
pub fn build(
    courses: &Courses,
    selection: &Selection,
    alternance: &AlternanceMap,
    tz: Tz,
) -> Result<Vec<Event>> {
    let (first, last) = alternance.range().ok_or(Error::EmptyAlternance)?;

    let mut events = vec![];
    for (sigle, group_type, number) in selection.entries() {
        let Some(course) = courses.get_course(sigle) else {
            debug!(sigle, "selected course not in the timetable");
            continue;
        };
        let Some(group_type) = GroupType::from_token(group_type) else {
            debug!(sigle, group_type, "unknown group type in selection");
            continue;
        };
        let Some(groups) = course.groups(group_type, number) else {
            debug!(sigle, number, "selected group not in the timetable");
            continue;
        };

        for group in groups {
            let Some(start) = group.start() else {
                continue;
            };

            for date in first.iter_days().take_while(|date| *date <= last) {
                // Days without alternance aren't class days
                let Some(day) = alternance.get(date) else {
                    continue;
                };

                if day.abbreviation() != group.week_day || !group.frequency.matches(&day.week_type)
                {
                    continue;
                }

                let Some(dtstart) = tz.from_local_datetime(&date.and_time(start)).earliest()
                else {
                    warn!(
                        %date,
                        %start,
                        sigle,
                        "class starts at a time that doesn't exist locally"
                    );
                    continue;
                };

                events.push(Event {
                    title: title(course, group_type, group),
                    start: dtstart,
                    duration: group.duration(),
                    location: group.room.clone(),
                    alarm: chrono::Duration::minutes(ALARM_MINUTES),
                });
            }
        }
    }

    info!(events = events.len(), "timetable built");

    Ok(events)
}

/// Name of the event, i.e.: `LOG1810 - Éléments de logiciel - Groupe 2 (COURS)`
fn title(course: &Course, group_type: GroupType, group: &Group) -> String {
    format!(
        "{} - {} - Groupe {} ({})",
        course.sigle,
        course.name,
        group.number,
        group_type.label()
    )
}

/// Display the courses of the timetable
pub fn display(courses: &Courses) {
    for course in courses.iter() {
        println!(
            "{} - {} ({} crédit(s))",
            course.sigle, course.name, course.nb_credit
        );
        for (group_type, group) in course.all_groups() {
            println!(
                "    {:<5} {:>2} │ {} {:<15} │ {:<10} │ {}",
                group_type.label(),
                group.number,
                group.week_day,
                group.hour(),
                group.room,
                group.frequency
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Timelike};

    use super::*;
    use crate::info;

    const HEADER: &str =
        "id;sigle;groupe;credits;a;b;local;type;c;semaine;type_cours;nom;d;jour;heure\n";

    fn timetable(rows: &[&str]) -> Courses {
        let data = format!("{HEADER}{}\n", rows.join("\n"));
        read(data.as_bytes()).unwrap().0
    }

    fn alternance(rows: &[&str]) -> AlternanceMap {
        let data = format!("date,jour,semaine\n{}\n", rows.join("\n"));
        info::read(data.as_bytes()).unwrap().0
    }

    fn selection(sigle: &str, group_type: GroupType, number: u32) -> Selection {
        let mut selection = Selection::default();
        selection.add(sigle, group_type, number);
        selection
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn course_from_a_single_row() {
        let courses =
            timetable(&[";LOG1810;2;3,0;;;B-2325;C;;;C;Éléments de logiciel;;LUN;0930,0830"]);

        let course = courses.get_course("LOG1810").unwrap();
        assert_eq!(course.name, "Éléments de logiciel");
        assert_eq!(course.nb_credit, 3);

        let groups = course.groups(GroupType::Theory, 2).unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].hour(), "0830,0930");
        assert_eq!(groups[0].room, "B-2325");
        assert_eq!(groups[0].frequency, Frequency::EveryWeek);
    }

    #[test]
    fn malformed_rows_are_skipped() {
        let data = format!(
            "{HEADER}{}\n",
            [
                // Too short
                ";LOG1810;2;3,0;;;B-2325;C;;;C",
                // No room
                ";LOG1810;2;3,0;;;;C;;;C;Éléments de logiciel;;LUN;0830",
                // Bad group number
                ";LOG1810;deux;3,0;;;B-2325;C;;;C;Éléments de logiciel;;LUN;0830",
                // Bad credits
                ";LOG1810;2;trois;;;B-2325;C;;;C;Éléments de logiciel;;LUN;0830",
                // Bad hour
                ";LOG1810;2;3,0;;;B-2325;C;;;C;Éléments de logiciel;;LUN;8h30",
                // Valid
                ";LOG1810;2;3,0;;;B-2325;C;;;C;Éléments de logiciel;;LUN;0830",
            ]
            .join("\n")
        );

        let (rows, report) = rows(data.as_bytes()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(report.read, 6);
        assert_eq!(report.skipped, 5);
        assert_eq!(report.used(), 1);
    }

    #[test]
    fn one_group_per_valid_row_before_merging() {
        let data = format!(
            "{HEADER}{}\n",
            [
                ";INF1015;1;3;;;B-415;C;;;C;Programmation;;MAR;0830",
                ";INF1015;1;3;;;B-415;C;;;C;Programmation;;MAR;0930",
                ";INF1015;1;3;;;L-4714;L;;I;L;Programmation;;JEU;1245",
            ]
            .join("\n")
        );

        let (rows, _) = rows(data.as_bytes()).unwrap();
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|row| row.group.course_length == 1));
        assert_eq!(rows[2].group_type, Some(GroupType::Lab));
        assert_eq!(rows[2].group.frequency, Frequency::B1);
    }

    #[test]
    fn rows_are_merged_after_reading() {
        let courses = timetable(&[
            ";INF1015;1;3;;;B-415;C;;;C;Programmation;;MAR;0930",
            ";INF1015;1;3;;;B-415;C;;;C;Programmation;;MAR;0830",
            ";INF1015;1;3;;;L-4714;l;;P;L;Programmation;;JEU;1245",
            ";INF1015;1;3;;;L-4714;l;;P;L;Programmation;;JEU;1345",
            ";INF1015;1;3;;;L-4714;l;;I;L;Programmation;;JEU;1245",
        ]);

        let course = courses.get_course("INF1015").unwrap();
        let theo = course.groups(GroupType::Theory, 1).unwrap();
        assert_eq!(theo.len(), 1);
        assert_eq!(theo[0].course_length, 2);
        assert_eq!(theo[0].hour(), "0830,0930");

        let lab = course.groups(GroupType::Lab, 1).unwrap();
        assert_eq!(lab.len(), 2);
        assert_eq!(lab[0].frequency, Frequency::B2);
        assert_eq!(lab[0].course_length, 2);
        assert_eq!(lab[1].frequency, Frequency::B1);
    }

    #[test]
    fn first_row_of_a_code_names_the_course() {
        let courses = timetable(&[
            ";INF1015;1;3,0;;;B-415;C;;;C;Programmation orientée objet;;MAR;0830",
            ";INF1015;2;4,0;;;B-416;C;;;C;Programmation avancée;;JEU;0830",
        ]);

        assert_eq!(courses.len(), 1);
        let course = courses.get_course("INF1015").unwrap();
        assert_eq!(course.name, "Programmation orientée objet");
        assert_eq!(course.nb_credit, 3);
        assert!(course.groups(GroupType::Theory, 1).is_some());
        assert!(course.groups(GroupType::Theory, 2).is_some());
    }

    #[test]
    fn unknown_period_type_keeps_the_course_only() {
        let courses = timetable(&[";MTH1102;3;2;;;A-532;T;;;C;Calcul II;;VEN;1030"]);

        let course = courses.get_course("MTH1102").unwrap();
        assert_eq!(course.all_groups().count(), 0);
    }

    #[test]
    fn single_class_event() {
        let courses =
            timetable(&[";LOG1810;2;3,0;;;B-2325;C;;;C;Éléments de logiciel;;LUN;0830,0930"]);
        let alternance = alternance(&["2024-09-02,LUNDI,B1"]);

        let events = build(
            &courses,
            &selection("LOG1810", GroupType::Theory, 2),
            &alternance,
            chrono_tz::America::Toronto,
        )
        .unwrap();

        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert!(event.title.contains("LOG1810"));
        assert!(event.title.contains("COURS"));
        assert_eq!(event.start.date_naive(), date(2024, 9, 2));
        assert_eq!((event.start.hour(), event.start.minute()), (8, 30));
        assert_eq!(event.start.timezone(), chrono_tz::America::Toronto);
        assert_eq!(event.duration, chrono::Duration::hours(2));
        assert_eq!(event.location, "B-2325");
        assert_eq!(event.alarm, chrono::Duration::minutes(30));
    }

    #[test]
    fn frequency_follows_week_types() {
        let courses = timetable(&[
            ";INF1015;1;3;;;L-4714;L;;I;L;Programmation;;LUN;1245",
            ";INF1015;1;3;;;B-415;C;;;C;Programmation;;LUN;0830",
        ]);
        let alternance = alternance(&[
            "2024-09-02,LUNDI,B1",
            "2024-09-09,LUNDI,B2",
            "2024-09-16,LUNDI,B1",
            "2024-09-23,LUNDI,B2",
        ]);

        let lab = build(
            &courses,
            &selection("INF1015", GroupType::Lab, 1),
            &alternance,
            chrono_tz::America::Toronto,
        )
        .unwrap();
        let dates: Vec<_> = lab.iter().map(|event| event.start.date_naive()).collect();
        assert_eq!(dates, vec![date(2024, 9, 2), date(2024, 9, 16)]);

        let theo = build(
            &courses,
            &selection("INF1015", GroupType::Theory, 1),
            &alternance,
            chrono_tz::America::Toronto,
        )
        .unwrap();
        assert_eq!(theo.len(), 4);
    }

    #[test]
    fn even_week_group_follows_b2_weeks() {
        let courses = timetable(&[
            ";INF1015;3;3;;;L-4714;L;;P;L;Programmation;;LUN;1545",
            ";INF1015;3;3;;;L-4714;L;;P;L;Programmation;;LUN;1645",
        ]);
        let alternance = alternance(&[
            "2024-09-02,LUNDI,B1",
            "2024-09-09,LUNDI,B2",
            "2024-09-16,LUNDI,B1",
            "2024-09-23,LUNDI,B2",
        ]);

        let events = build(
            &courses,
            &selection("INF1015", GroupType::Lab, 3),
            &alternance,
            chrono_tz::America::Toronto,
        )
        .unwrap();

        let dates: Vec<_> = events.iter().map(|event| event.start.date_naive()).collect();
        assert_eq!(dates, vec![date(2024, 9, 9), date(2024, 9, 23)]);
        assert!(events.iter().all(|event| event.title.contains("(LAB)")));
        assert!(events
            .iter()
            .all(|event| event.duration == chrono::Duration::hours(2)));
    }

    #[test]
    fn days_missing_from_alternance_are_skipped() {
        let courses = timetable(&[";LOG1810;2;3;;;B-2325;C;;;C;Éléments de logiciel;;LUN;0830"]);
        // 2024-09-09 is a monday, but isn't in the calendar
        let alternance = alternance(&["2024-09-02,LUNDI,B1", "2024-09-16,LUNDI,B1"]);

        let events = build(
            &courses,
            &selection("LOG1810", GroupType::Theory, 2),
            &alternance,
            chrono_tz::America::Toronto,
        )
        .unwrap();

        let dates: Vec<_> = events.iter().map(|event| event.start.date_naive()).collect();
        assert_eq!(dates, vec![date(2024, 9, 2), date(2024, 9, 16)]);
        assert!(dates.iter().all(|d| *d >= date(2024, 9, 2) && *d <= date(2024, 9, 16)));
    }

    #[test]
    fn overridden_day_follows_forced_weekday() {
        let courses = timetable(&[";LOG1810;2;3;;;B-2325;C;;;C;Éléments de logiciel;;LUN;0830"]);
        let mut alternance = alternance(&["2024-09-30,LUNDI,B1", "2024-10-01,MARDI,B1"]);
        alternance.apply_overrides(&[info::DayOverride {
            date: date(2024, 10, 1),
            weekday: "LUN".to_owned(),
        }]);

        let events = build(
            &courses,
            &selection("LOG1810", GroupType::Theory, 2),
            &alternance,
            chrono_tz::America::Toronto,
        )
        .unwrap();

        assert_eq!(events.len(), 2);
        assert_eq!(events[1].start.date_naive(), date(2024, 10, 1));
    }

    #[test]
    fn unknown_selection_gives_nothing() {
        let courses = timetable(&[";LOG1810;2;3;;;B-2325;C;;;C;Éléments de logiciel;;LUN;0830"]);
        let alternance = alternance(&["2024-09-02,LUNDI,B1"]);

        for selection in [
            selection("LOG9999", GroupType::Theory, 2),
            selection("LOG1810", GroupType::Theory, 7),
            selection("LOG1810", GroupType::Lab, 2),
        ] {
            let events =
                build(&courses, &selection, &alternance, chrono_tz::America::Toronto).unwrap();
            assert!(events.is_empty());
        }
    }

    #[test]
    fn empty_alternance_fails() {
        let courses = timetable(&[";LOG1810;2;3;;;B-2325;C;;;C;Éléments de logiciel;;LUN;0830"]);

        let result = build(
            &courses,
            &selection("LOG1810", GroupType::Theory, 2),
            &AlternanceMap::default(),
            chrono_tz::America::Toronto,
        );
        assert!(matches!(result, Err(Error::EmptyAlternance)));
    }
}
