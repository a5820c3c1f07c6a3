use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A scalar spreadsheet value as read from one cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Text(String),
    Number(f64),
    Blank,
}

impl Cell {
    /// True for the values a lookup should fall through: blank cells, empty
    /// text and a numeric zero.
    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Text(s) => s.is_empty(),
            Cell::Number(n) => *n == 0.0,
            Cell::Blank => true,
        }
    }

    pub fn as_text(&self) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Number(n) => format_number(*n),
            Cell::Blank => String::new(),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            Cell::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            Cell::Blank => None,
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

/// Integers print without a fractional part, everything else as-is.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// One spreadsheet row keyed by free-text column headers, in sheet order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RawRow {
    cells: Vec<(String, Cell)>,
}

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, header: &str) -> Option<&Cell> {
        self.cells
            .iter()
            .find(|(name, _)| name == header)
            .map(|(_, cell)| cell)
    }

    /// Replaces the value under `header`, appending the column when missing.
    pub fn set(&mut self, header: &str, cell: Cell) {
        match self.cells.iter_mut().find(|(name, _)| name == header) {
            Some(entry) => entry.1 = cell,
            None => self.cells.push((header.to_string(), cell)),
        }
    }

    pub fn with(mut self, header: &str, cell: impl Into<Cell>) -> Self {
        self.set(header, cell.into());
        self
    }

    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(name, _)| name.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Placed,
    Unplaced,
    InternshipUnpaid,
    InternshipPaid,
    JobReady,
    JobReadyUnderProcess,
    LongLeave,
    Dropout,
}

impl Status {
    pub const ALL: [Status; 8] = [
        Status::Placed,
        Status::Unplaced,
        Status::InternshipUnpaid,
        Status::InternshipPaid,
        Status::JobReady,
        Status::JobReadyUnderProcess,
        Status::LongLeave,
        Status::Dropout,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Placed => "placed",
            Status::Unplaced => "unplaced",
            Status::InternshipUnpaid => "internship_unpaid",
            Status::InternshipPaid => "internship_paid",
            Status::JobReady => "job_ready",
            Status::JobReadyUnderProcess => "job_ready_under_process",
            Status::LongLeave => "long_leave",
            Status::Dropout => "dropout",
        }
    }

    /// Display label used when a row carries no raw status text.
    pub fn label(self) -> &'static str {
        match self {
            Status::Placed => "Placed",
            Status::Unplaced => "Unplaced",
            Status::InternshipUnpaid => "Internship unpaid",
            Status::InternshipPaid => "Internship paid",
            Status::JobReady => "Job ready",
            Status::JobReadyUnderProcess => "Job ready under process",
            Status::LongLeave => "Long leave",
            Status::Dropout => "Dropout",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Status::ALL
            .into_iter()
            .find(|status| status.as_str() == wanted)
            .ok_or_else(|| format!("unknown status '{s}'"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(format!("unknown difficulty '{s}'")),
        }
    }
}

/// Canonical student record derived from one non-blank-name row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Student {
    pub id: usize,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub campus: String,
    pub school: String,
    pub resume: String,
    pub projects: String,
    pub status: Status,
    pub raw_status: String,
    pub group: String,
    pub feedback: String,
    pub resume_score: Option<f64>,
    pub resume_structure: String,
    pub resume_projects: String,
    pub project_score: Option<f64>,
    pub project_difficulty: Option<Difficulty>,
    pub project_review: String,
}

impl Student {
    /// Whether an admin or the review engine has left anything worth
    /// exporting on this record.
    pub fn has_review_data(&self) -> bool {
        !self.feedback.trim().is_empty()
            || !self.group.trim().is_empty()
            || self.resume_score.is_some()
            || !self.resume_structure.trim().is_empty()
            || !self.resume_projects.trim().is_empty()
            || self.project_score.is_some()
            || self.project_difficulty.is_some()
            || !self.project_review.trim().is_empty()
    }

    pub fn status_label(&self) -> &str {
        if self.raw_status.trim().is_empty() {
            self.status.label()
        } else {
            &self.raw_status
        }
    }

    pub fn apply_review(&mut self, review: &Review) {
        self.resume_score = Some(review.structure_score);
        self.resume_structure = review.structure.clone();
        self.resume_projects = review.projects.clone();
        self.project_score = Some(review.projects_score);
        self.project_difficulty = Some(review.difficulty);
        self.project_review = review.projects.clone();
    }
}

/// Output of the heuristic resume/project review.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Review {
    pub structure: String,
    pub projects: String,
    pub structure_score: f64,
    pub projects_score: f64,
    pub difficulty: Difficulty,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_replaces_in_place_and_appends_new_headers() {
        let mut row = RawRow::new().with("Name", "Asha").with("School", "SOP");
        row.set("Name", Cell::from("Ravi"));
        row.set("Group", Cell::from("A"));

        let headers: Vec<&str> = row.headers().collect();
        assert_eq!(headers, vec!["Name", "School", "Group"]);
        assert_eq!(row.get("Name"), Some(&Cell::Text("Ravi".to_string())));
    }

    #[test]
    fn numbers_render_without_trailing_zero() {
        assert_eq!(Cell::Number(9876543210.0).as_text(), "9876543210");
        assert_eq!(Cell::Number(7.5).as_text(), "7.5");
        assert_eq!(Cell::from(" 8.5 ").as_number(), Some(8.5));
        assert_eq!(Cell::from("n/a").as_number(), None);
    }

    #[test]
    fn status_parses_from_snake_case() {
        for status in Status::ALL {
            assert_eq!(status.as_str().parse::<Status>(), Ok(status));
        }
        assert!("graduated".parse::<Status>().is_err());
    }
}
