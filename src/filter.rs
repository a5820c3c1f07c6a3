use std::collections::HashMap;
use std::str::FromStr;

use serde::Serialize;

use crate::models::{Status, Student};
use crate::schools::SchoolTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(Status),
}

impl StatusFilter {
    pub fn matches(&self, student: &Student) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(status) => student.status == *status,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(StatusFilter::All)
        } else {
            s.parse::<Status>().map(StatusFilter::Only)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SchoolFilter {
    #[default]
    All,
    Only(String),
}

impl SchoolFilter {
    pub fn matches(&self, student: &Student, table: &SchoolTable) -> bool {
        let selected = match self {
            SchoolFilter::All => return true,
            SchoolFilter::Only(selected) => selected.trim(),
        };
        let school = student.school.trim();

        school.to_lowercase() == selected.to_lowercase()
            || table.abbreviation_matches(selected, school)
    }
}

impl FromStr for SchoolFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(SchoolFilter::All)
        } else {
            Ok(SchoolFilter::Only(s.trim().to_string()))
        }
    }
}

/// The two filter dimensions; a student must pass both.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Selection {
    pub status: StatusFilter,
    pub school: SchoolFilter,
}

pub fn apply<'a>(
    students: &'a [Student],
    selection: &Selection,
    table: &SchoolTable,
) -> Vec<&'a Student> {
    students
        .iter()
        .filter(|student| selection.status.matches(student))
        .filter(|student| selection.school.matches(student, table))
        .collect()
}

/// Badge counts. Computed over the full collection so every button shows
/// what choosing it alone would yield.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterCounts {
    pub total: usize,
    pub by_status: HashMap<Status, usize>,
    pub by_school: HashMap<String, usize>,
}

impl FilterCounts {
    pub fn status(&self, status: Status) -> usize {
        self.by_status.get(&status).copied().unwrap_or(0)
    }
}

pub fn counts(students: &[Student]) -> FilterCounts {
    let mut counts = FilterCounts {
        total: students.len(),
        ..FilterCounts::default()
    };

    for student in students {
        *counts.by_status.entry(student.status).or_insert(0) += 1;

        let school = student.school.trim();
        if !school.is_empty() {
            *counts.by_school.entry(school.to_string()).or_insert(0) += 1;
        }
    }

    counts
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusOption {
    pub status: Status,
    pub label: String,
    pub count: usize,
}

/// One option per status present in the data, in first-seen order. The
/// label is the first raw spreadsheet label seen for that status.
pub fn status_options(students: &[Student]) -> Vec<StatusOption> {
    let counts = counts(students);
    let mut options: Vec<StatusOption> = Vec::new();

    for student in students {
        let raw = student.raw_status.trim();
        match options.iter_mut().find(|o| o.status == student.status) {
            Some(option) => {
                if option.label == student.status.label() && !raw.is_empty() {
                    option.label = raw.to_string();
                }
            }
            None => options.push(StatusOption {
                status: student.status,
                label: student.status_label().trim().to_string(),
                count: counts.status(student.status),
            }),
        }
    }

    options
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchoolOption {
    /// The school text as it appears in the sheet; also the filter value.
    pub value: String,
    pub label: String,
    pub abbreviation: Option<String>,
    pub count: usize,
}

/// Each count is what choosing that option alone would show, so an
/// abbreviation also counts the rows spelled out in full.
pub fn school_options(students: &[Student], table: &SchoolTable) -> Vec<SchoolOption> {
    let mut options: Vec<SchoolOption> = Vec::new();

    for student in students {
        let value = student.school.trim();
        if value.is_empty() || options.iter().any(|o| o.value == value) {
            continue;
        }

        let known = table.lookup(value);
        let filter = SchoolFilter::Only(value.to_string());
        let count = students
            .iter()
            .filter(|student| filter.matches(student, table))
            .count();
        options.push(SchoolOption {
            value: value.to_string(),
            label: known
                .map(|school| school.full_name.clone())
                .unwrap_or_else(|| value.to_string()),
            abbreviation: known.map(|school| school.abbreviation.clone()),
            count,
        });
    }

    options.sort_by(|a, b| a.label.cmp(&b.label));
    options
}
