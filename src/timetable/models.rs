use std::{collections::BTreeMap, fmt};

use chrono::{DateTime, Duration, NaiveTime};
use chrono_tz::Tz;

use crate::utils::parse_hour;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GroupType {
    /// Theoretical course
    Theory,
    /// Laboratory
    Lab,
}

impl GroupType {
    /// Parse the `C`/`L` token of the timetable, case-insensitive
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "c" => Some(Self::Theory),
            "l" => Some(Self::Lab),
            _ => None,
        }
    }

    /// Key used in selections
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::Theory => "c",
            Self::Lab => "l",
        }
    }

    /// Label showed in the event's title
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Theory => "COURS",
            Self::Lab => "LAB",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Frequency {
    EveryWeek,
    B1,
    B2,
}

impl Frequency {
    /// Frequency from the week number column: `I` for odd weeks, `P` for even weeks
    #[must_use]
    pub fn from_week_flag(flag: &str) -> Self {
        match flag {
            "I" => Self::B1,
            "P" => Self::B2,
            _ => Self::EveryWeek,
        }
    }

    /// Check if a group with this frequency takes place during a week of the given type
    #[must_use]
    pub fn matches(self, week_type: &str) -> bool {
        match self {
            Self::EveryWeek => true,
            Self::B1 => week_type == "B1",
            Self::B2 => week_type == "B2",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EveryWeek => write!(f, "chaque semaine"),
            Self::B1 => write!(f, "B1"),
            Self::B2 => write!(f, "B2"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Group {
    /// Group's number
    pub number: u32,

    /// Abbreviated weekday, i.e.: LUN
    pub week_day: String,

    /// Room where the group takes place
    pub room: String,

    /// Number of hour-units, one per row of the timetable
    pub course_length: u32,

    pub frequency: Frequency,

    /// Sorted and de-duplicated list of `HHMM` tokens
    hours: Vec<String>,
}

impl Group {
    #[must_use]
    pub fn new(
        number: u32,
        week_day: &str,
        room: &str,
        course_length: u32,
        frequency: Frequency,
        hour: &str,
    ) -> Self {
        let mut hours: Vec<String> = hour
            .split(',')
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(ToOwned::to_owned)
            .collect();
        hours.sort();
        hours.dedup();

        Self {
            number,
            week_day: week_day.trim().to_uppercase(),
            room: room.to_owned(),
            course_length,
            frequency,
            hours,
        }
    }

    /// Comma-joined hour list
    #[must_use]
    pub fn hour(&self) -> String {
        self.hours.join(",")
    }

    /// Time the group starts, from the first hour token
    #[must_use]
    pub fn start(&self) -> Option<NaiveTime> {
        self.hours.first().and_then(|token| parse_hour(token))
    }

    /// Length of a session, one hour per token
    #[must_use]
    pub fn duration(&self) -> Duration {
        Duration::hours(i64::try_from(self.hours.len()).unwrap_or_default())
    }
}

/// Collapse the groups sharing the same weekday, room and frequency
#[must_use]
pub fn merge(groups: &[Group]) -> Vec<Group> {
    // Keys in order of first appearance
    let mut merged: Vec<(&Group, u32, Vec<&str>)> = Vec::new();

    for group in groups {
        let slot = merged.iter_mut().find(|(first, _, _)| {
            first.week_day == group.week_day
                && first.room == group.room
                && first.frequency == group.frequency
        });
        match slot {
            Some((_, length, hours)) => {
                *length += group.course_length;
                hours.extend(group.hours.iter().map(String::as_str));
            }
            None => merged.push((
                group,
                group.course_length,
                group.hours.iter().map(String::as_str).collect(),
            )),
        }
    }

    merged
        .into_iter()
        .map(|(first, length, hours)| {
            Group::new(
                first.number,
                &first.week_day,
                &first.room,
                length,
                first.frequency,
                &hours.join(","),
            )
        })
        .collect()
}

/// Merge each bucket of groups separately
fn merge_buckets(buckets: &mut BTreeMap<u32, Vec<Group>>) {
    for groups in buckets.values_mut() {
        *groups = merge(groups);
    }
}

#[derive(Clone, Debug)]
pub struct Course {
    /// Course's code, i.e.: LOG1810
    pub sigle: String,

    /// Course's name
    pub name: String,

    pub nb_credit: u32,

    /// Theoretical groups by number
    pub theo_groups: BTreeMap<u32, Vec<Group>>,

    /// Lab groups by number
    pub lab_groups: BTreeMap<u32, Vec<Group>>,
}

impl Course {
    #[must_use]
    pub fn new(sigle: &str, name: &str, nb_credit: u32) -> Self {
        Self {
            sigle: sigle.to_owned(),
            name: name.to_owned(),
            nb_credit,
            theo_groups: BTreeMap::new(),
            lab_groups: BTreeMap::new(),
        }
    }

    /// Add a group without merging
    pub fn add_group(&mut self, group_type: GroupType, group: Group) {
        self.buckets_mut(group_type)
            .entry(group.number)
            .or_default()
            .push(group);
    }

    /// Merge the groups of the same type happening on the same day, room and frequency
    pub fn merge_groups(&mut self) {
        merge_buckets(&mut self.theo_groups);
        merge_buckets(&mut self.lab_groups);
    }

    /// Groups of a given type and number
    #[must_use]
    pub fn groups(&self, group_type: GroupType, number: u32) -> Option<&[Group]> {
        self.buckets(group_type).get(&number).map(Vec::as_slice)
    }

    /// Every group of the course, theoretical ones first
    pub fn all_groups(&self) -> impl Iterator<Item = (GroupType, &Group)> {
        let theo = self
            .theo_groups
            .values()
            .flatten()
            .map(|group| (GroupType::Theory, group));
        let lab = self
            .lab_groups
            .values()
            .flatten()
            .map(|group| (GroupType::Lab, group));

        theo.chain(lab)
    }

    #[must_use]
    pub fn buckets(&self, group_type: GroupType) -> &BTreeMap<u32, Vec<Group>> {
        match group_type {
            GroupType::Theory => &self.theo_groups,
            GroupType::Lab => &self.lab_groups,
        }
    }

    fn buckets_mut(&mut self, group_type: GroupType) -> &mut BTreeMap<u32, Vec<Group>> {
        match group_type {
            GroupType::Theory => &mut self.theo_groups,
            GroupType::Lab => &mut self.lab_groups,
        }
    }
}

/// Registry of every course of the timetable
#[derive(Clone, Debug, Default)]
pub struct Courses {
    courses: BTreeMap<String, Course>,
}

impl Courses {
    /// Course by its code, created on first use
    pub fn entry(&mut self, sigle: &str, name: &str, nb_credit: u32) -> &mut Course {
        self.courses
            .entry(sigle.to_owned())
            .or_insert_with(|| Course::new(sigle, name, nb_credit))
    }

    #[must_use]
    pub fn get_course(&self, sigle: &str) -> Option<&Course> {
        self.courses.get(sigle)
    }

    pub fn merge_groups(&mut self) {
        self.courses.values_mut().for_each(Course::merge_groups);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Course> {
        self.courses.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.courses.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }
}

/// A single class, ready to be exported
#[derive(Clone, Debug)]
pub struct Event {
    pub title: String,
    pub start: DateTime<Tz>,
    pub duration: Duration,
    pub location: String,
    /// How long before the start the reminder fires
    pub alarm: Duration,
}
