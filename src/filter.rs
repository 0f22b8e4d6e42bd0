use std::collections::BTreeMap;

use dialoguer::MultiSelect;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::{
    error::{Error, Result},
    timetable::models::{Courses, GroupType},
};

const DISCLAIMER: &str = "(selection avec ESPACE, ENTRER pour valider)";

// sigle => course code | groups => i.e. c2,l4
static ENTRY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?P<sigle>[^:\s]+):(?P<groups>[^:]+)$").unwrap());
static GROUP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?P<type>[cl])(?P<number>\d+)$").unwrap());

/// Groups to export, by course code then by group type (`c` or `l`)
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Selection(BTreeMap<String, BTreeMap<String, Vec<u32>>>);

impl Selection {
    pub fn add(&mut self, sigle: &str, group_type: GroupType, number: u32) {
        let numbers = self
            .0
            .entry(sigle.to_owned())
            .or_default()
            .entry(group_type.key().to_owned())
            .or_default();
        if !numbers.contains(&number) {
            numbers.push(number);
        }
    }

    /// Add the groups of an entry like `LOG1810:c2,l4`
    ///
    /// # Errors
    ///
    /// Fails if the entry isn't well formatted.
    pub fn add_entry(&mut self, entry: &str) -> Result<()> {
        let invalid = || Error::Selection(entry.to_owned());

        let captures = ENTRY.captures(entry.trim()).ok_or_else(invalid)?;
        let sigle = captures["sigle"].to_uppercase();

        let mut groups = vec![];
        for token in captures["groups"].split(',') {
            let group = GROUP.captures(token.trim()).ok_or_else(invalid)?;
            let group_type = GroupType::from_token(&group["type"]).ok_or_else(invalid)?;
            let number = group["number"].parse().map_err(|_| invalid())?;
            groups.push((group_type, number));
        }

        for (group_type, number) in groups {
            self.add(&sigle, group_type, number);
        }

        Ok(())
    }

    /// Every selected `(code, group type, group number)`
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str, u32)> {
        self.0.iter().flat_map(|(sigle, types)| {
            types.iter().flat_map(move |(group_type, numbers)| {
                numbers
                    .iter()
                    .map(move |number| (sigle.as_str(), group_type.as_str(), *number))
            })
        })
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries().next().is_none()
    }
}

/// Ask which courses, then which groups to export
///
/// # Errors
///
/// Fails if the terminal can't be used.
pub fn interactive(courses: &Courses) -> Result<Selection> {
    let courses: Vec<_> = courses.iter().collect();
    let multiselected: Vec<String> = courses
        .iter()
        .map(|course| format!("{} - {}", course.sigle, course.name))
        .collect();

    let defaults = vec![false; multiselected.len()];
    let chosen = MultiSelect::new()
        .with_prompt(format!("Choisis tes cours {DISCLAIMER}"))
        .items(&multiselected[..])
        .defaults(&defaults[..])
        .interact()?;

    // List of groups of the chosen courses, one entry per group number
    let mut groups = vec![];
    for course in chosen.into_iter().map(|i| courses[i]) {
        for group_type in [GroupType::Theory, GroupType::Lab] {
            for (number, slots) in course.buckets(group_type) {
                let when = slots
                    .iter()
                    .map(|slot| format!("{} {}", slot.week_day, slot.hour()))
                    .collect::<Vec<_>>()
                    .join(" / ");
                groups.push((
                    course.sigle.as_str(),
                    group_type,
                    *number,
                    format!(
                        "{} - Groupe {} ({}) {}",
                        course.sigle,
                        number,
                        group_type.label(),
                        when
                    ),
                ));
            }
        }
    }

    let multiselected: Vec<&str> = groups.iter().map(|group| group.3.as_str()).collect();
    let defaults = vec![false; multiselected.len()];
    let chosen = MultiSelect::new()
        .with_prompt(format!("Choisis tes groupes {DISCLAIMER}"))
        .items(&multiselected[..])
        .defaults(&defaults[..])
        .interact()?;

    let mut selection = Selection::default();
    for (sigle, group_type, number, _) in chosen.into_iter().map(|i| &groups[i]) {
        selection.add(sigle, *group_type, *number);
    }

    Ok(selection)
}
