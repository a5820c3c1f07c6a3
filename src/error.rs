use std::path::PathBuf;

use thiserror::Error;

/// Failures surfaced to the admin as a message. None of them leave the
/// session in a broken state.
#[derive(Debug, Error)]
pub enum RosterError {
    #[error("Failed to read {}: {reason}", path.display())]
    Read { path: PathBuf, reason: String },

    #[error("Sheet \"{0}\" not found in workbook")]
    SheetNotFound(String),

    #[error(
        "No review data found. Review resumes and projects, or add scores, feedback or group assignments first"
    )]
    NoReviewData,

    #[error("Export failed: {0}")]
    Export(String),

    #[error("No student with id {0}")]
    UnknownStudent(usize),

    #[error("No students to review")]
    NoStudents,

    #[error("No data to export")]
    NoData,
}

impl RosterError {
    pub fn read(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        RosterError::Read {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RosterError>;
