use std::collections::BTreeSet;
use std::path::Path;

use tracing::{debug, info};

use crate::error::{Result, RosterError};
use crate::filter::{self, FilterCounts, SchoolOption, Selection, StatusOption};
use crate::models::{Cell, RawRow, Review, Student};
use crate::normalize::{has_usable_name, normalize};
use crate::review::perform_automated_review;
use crate::schools::SchoolTable;
use crate::workbook::{self, ExportedFile};

pub const FULL_EXPORT_PREFIX: &str = "students";
pub const REVIEW_EXPORT_PREFIX: &str = "student_reviews";

/// State of one admin session over one processed sheet.
///
/// `rows` holds every data row of the sheet, indexed by student id, including
/// rows whose blank name keeps them out of `students`. Export projections
/// are derived from both at export time; the canonical records are the
/// source of truth for anything edited.
#[derive(Debug, Default)]
pub struct Session {
    sheet_name: String,
    rows: Vec<RawRow>,
    students: Vec<Student>,
    edited: BTreeSet<usize>,
    selection: Selection,
    schools: SchoolTable,
}

impl Session {
    pub fn new(schools: SchoolTable) -> Self {
        Self {
            schools,
            ..Self::default()
        }
    }

    /// Reads `sheet` (or the first sheet) from `path` into a new session.
    pub async fn open(path: &Path, sheet: Option<&str>, schools: SchoolTable) -> Result<Self> {
        let mut session = Session::new(schools);
        session.load_sheet(path, sheet).await?;
        Ok(session)
    }

    /// Replaces the session contents with a sheet from `path`. On failure
    /// the current contents are left untouched.
    pub async fn load_sheet(&mut self, path: &Path, sheet: Option<&str>) -> Result<usize> {
        let sheets = workbook::list_sheets_async(path.to_path_buf()).await?;
        let sheet_name = match sheet {
            Some(name) => name.to_string(),
            None => sheets
                .first()
                .cloned()
                .ok_or_else(|| RosterError::read(path, "workbook has no sheets"))?,
        };
        if !sheets.contains(&sheet_name) {
            return Err(RosterError::SheetNotFound(sheet_name));
        }

        let rows = workbook::read_sheet_async(path.to_path_buf(), sheet_name.clone()).await?;
        Ok(self.process(sheet_name, rows))
    }

    /// Normalizes `rows` and makes them the session's data. Returns the number
    /// of students materialized.
    pub fn process(&mut self, sheet_name: String, rows: Vec<RawRow>) -> usize {
        self.students = rows
            .iter()
            .enumerate()
            .map(|(index, row)| normalize(row, index))
            .filter(has_usable_name)
            .collect();
        self.rows = rows;
        self.sheet_name = sheet_name;
        self.edited.clear();
        self.selection = Selection::default();

        info!(
            sheet = %self.sheet_name,
            rows = self.rows.len(),
            students = self.students.len(),
            "processed sheet"
        );
        self.students.len()
    }

    pub fn sheet_name(&self) -> &str {
        &self.sheet_name
    }

    pub fn students(&self) -> &[Student] {
        &self.students
    }

    pub fn student(&self, id: usize) -> Option<&Student> {
        self.students.iter().find(|s| s.id == id)
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn set_selection(&mut self, selection: Selection) {
        self.selection = selection;
    }

    pub fn visible(&self) -> Vec<&Student> {
        filter::apply(&self.students, &self.selection, &self.schools)
    }

    pub fn counts(&self) -> FilterCounts {
        filter::counts(&self.students)
    }

    pub fn status_options(&self) -> Vec<StatusOption> {
        filter::status_options(&self.students)
    }

    pub fn school_options(&self) -> Vec<SchoolOption> {
        filter::school_options(&self.students, &self.schools)
    }

    /// Replaces the student with the same id.
    pub fn update_student(&mut self, updated: Student) -> Result<()> {
        let id = updated.id;
        let slot = self
            .students
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(RosterError::UnknownStudent(id))?;
        *slot = updated;
        self.edited.insert(id);
        debug!(id, "student updated");
        Ok(())
    }

    /// Runs the heuristic review for one student and stores the outcome.
    pub fn review_student(&mut self, id: usize) -> Result<Review> {
        let mut student = self
            .student(id)
            .cloned()
            .ok_or(RosterError::UnknownStudent(id))?;
        let review = review_for(&student);
        student.apply_review(&review);
        self.update_student(student)?;
        Ok(review)
    }

    /// Reviews every student with resume or project text. Students with
    /// neither are skipped and not counted.
    pub fn auto_review_all(&mut self) -> Result<usize> {
        if self.students.is_empty() {
            return Err(RosterError::NoStudents);
        }

        let mut reviewed = 0;
        for student in self.students.iter_mut() {
            if student.resume.is_empty() && student.projects.is_empty() {
                continue;
            }
            let review = review_for(student);
            student.apply_review(&review);
            self.edited.insert(student.id);
            reviewed += 1;
        }

        info!(reviewed, total = self.students.len(), "automated review completed");
        Ok(reviewed)
    }

    /// Every original row in sheet order, with the edited students' fields
    /// written over their rows.
    pub fn export_rows(&self) -> Vec<RawRow> {
        self.rows
            .iter()
            .enumerate()
            .map(|(id, row)| {
                let edited = self.edited.contains(&id).then(|| self.student(id)).flatten();
                match edited {
                    Some(student) => overlay(row.clone(), student),
                    None => row.clone(),
                }
            })
            .collect()
    }

    pub fn export_all(&self, out_dir: &Path) -> Result<ExportedFile> {
        if self.rows.is_empty() {
            return Err(RosterError::NoData);
        }
        workbook::export_single_sheet(
            &self.export_rows(),
            &self.sheet_name,
            FULL_EXPORT_PREFIX,
            out_dir,
        )
    }

    pub fn export_reviews(&self, out_dir: &Path) -> Result<ExportedFile> {
        if self.students.is_empty() {
            return Err(RosterError::NoData);
        }
        workbook::export_grouped_sheets(&self.students, &self.schools, REVIEW_EXPORT_PREFIX, out_dir)
    }
}

/// The resume cell doubles as the resume link.
fn review_for(student: &Student) -> Review {
    perform_automated_review(&student.resume, &student.resume, &student.projects)
}

fn overlay(mut row: RawRow, student: &Student) -> RawRow {
    let text = |value: &str| Cell::Text(value.to_string());
    let score = |value: Option<f64>| value.map(Cell::Number).unwrap_or(Cell::Blank);

    row.set("Group", text(&student.group));
    row.set("Feedback", text(&student.feedback));
    row.set("Resume Score", score(student.resume_score));
    row.set("Resume Structure", text(&student.resume_structure));
    row.set("Resume Projects", text(&student.resume_projects));
    row.set("Project Score", score(student.project_score));
    row.set(
        "Project Difficulty",
        student
            .project_difficulty
            .map(|d| text(d.as_str()))
            .unwrap_or(Cell::Blank),
    );
    row.set("Project Review", text(&student.project_review));
    row.set("Status", text(student.status.as_str()));
    row
}
