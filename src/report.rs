use std::fmt::Write;

use chrono::NaiveDate;

use crate::filter::{SchoolOption, StatusOption};
use crate::models::{Difficulty, Student};
use crate::session::Session;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReviewCoverage {
    pub reviewed: usize,
    pub avg_resume_score: f64,
    pub avg_project_score: f64,
    pub easy: usize,
    pub medium: usize,
    pub hard: usize,
}

pub fn review_coverage(students: &[Student]) -> ReviewCoverage {
    let mut coverage = ReviewCoverage::default();
    let mut resume_total = (0.0, 0usize);
    let mut project_total = (0.0, 0usize);

    for student in students {
        if student.has_review_data() {
            coverage.reviewed += 1;
        }
        if let Some(score) = student.resume_score {
            resume_total.0 += score;
            resume_total.1 += 1;
        }
        if let Some(score) = student.project_score {
            project_total.0 += score;
            project_total.1 += 1;
        }
        match student.project_difficulty {
            Some(Difficulty::Easy) => coverage.easy += 1,
            Some(Difficulty::Medium) => coverage.medium += 1,
            Some(Difficulty::Hard) => coverage.hard += 1,
            None => {}
        }
    }

    let average = |(total, count): (f64, usize)| {
        if count == 0 {
            0.0
        } else {
            total / count as f64
        }
    };
    coverage.avg_resume_score = average(resume_total);
    coverage.avg_project_score = average(project_total);
    coverage
}

/// Scored students, best combined resume and project score first.
pub fn top_students(students: &[Student], limit: usize) -> Vec<&Student> {
    let combined = |s: &Student| s.resume_score.unwrap_or(0.0) + s.project_score.unwrap_or(0.0);
    let mut scored: Vec<&Student> = students
        .iter()
        .filter(|s| s.resume_score.is_some() || s.project_score.is_some())
        .collect();
    scored.sort_by(|a, b| {
        combined(b)
            .partial_cmp(&combined(a))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    scored.truncate(limit);
    scored
}

fn write_status_mix(output: &mut String, options: &[StatusOption]) {
    let _ = writeln!(output, "## Status Mix");
    if options.is_empty() {
        let _ = writeln!(output, "No students loaded.");
        return;
    }
    for option in options {
        let _ = writeln!(output, "- {} ({}): {}", option.label, option.status, option.count);
    }
}

fn write_school_mix(output: &mut String, options: &[SchoolOption]) {
    let _ = writeln!(output, "## School Mix");
    if options.is_empty() {
        let _ = writeln!(output, "No school recorded for any student.");
        return;
    }
    for option in options {
        match &option.abbreviation {
            Some(abbreviation) => {
                let _ = writeln!(output, "- {} [{}]: {}", option.label, abbreviation, option.count);
            }
            None => {
                let _ = writeln!(output, "- {}: {}", option.label, option.count);
            }
        }
    }
}

pub fn build_report(session: &Session, generated_on: NaiveDate) -> String {
    let students = session.students();
    let coverage = review_coverage(students);

    let mut output = String::new();
    let _ = writeln!(output, "# Student Roster Report");
    let _ = writeln!(
        output,
        "Sheet \"{}\": {} students (generated {})",
        session.sheet_name(),
        students.len(),
        generated_on
    );
    let _ = writeln!(output);

    write_status_mix(&mut output, &session.status_options());
    let _ = writeln!(output);
    write_school_mix(&mut output, &session.school_options());
    let _ = writeln!(output);

    let _ = writeln!(output, "## Review Coverage");
    if coverage.reviewed == 0 {
        let _ = writeln!(output, "No students reviewed yet.");
    } else {
        let _ = writeln!(
            output,
            "- {} of {} students carry review data",
            coverage.reviewed,
            students.len()
        );
        let _ = writeln!(output, "- avg resume score {:.1}", coverage.avg_resume_score);
        let _ = writeln!(output, "- avg project score {:.1}", coverage.avg_project_score);
        let _ = writeln!(
            output,
            "- difficulty: {} easy, {} medium, {} hard",
            coverage.easy, coverage.medium, coverage.hard
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Top Scored Students");
    let top = top_students(students, 10);
    if top.is_empty() {
        let _ = writeln!(output, "No scores recorded.");
    } else {
        for student in top {
            let _ = writeln!(
                output,
                "- {} ({}) resume {} / project {}",
                student.name,
                if student.school.is_empty() { "no school" } else { student.school.as_str() },
                score_text(student.resume_score),
                score_text(student.project_score)
            );
        }
    }

    output
}

fn score_text(score: Option<f64>) -> String {
    score.map(|s| format!("{s:.1}")).unwrap_or_else(|| "-".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawRow;
    use crate::schools::SchoolTable;

    fn session() -> Session {
        let rows = vec![
            RawRow::new()
                .with("Name", "Asha")
                .with("Current Status", "Placed")
                .with("School", "SOP")
                .with("Projects", "Project A and project B on docker"),
            RawRow::new()
                .with("Name", "Ravi")
                .with("Current Status", "Long Leave")
                .with("School", "Music"),
            RawRow::new().with("Name", "Meera").with("Resume", "skills, education"),
        ];
        let mut session = Session::new(SchoolTable::default());
        session.process("Batch 7".to_string(), rows);
        session
    }

    #[test]
    fn coverage_averages_only_scored_students() {
        let mut session = session();
        session.auto_review_all().expect("review");

        let coverage = review_coverage(session.students());
        assert_eq!(coverage.reviewed, 2);
        assert_eq!(coverage.hard, 1);
        assert_eq!(coverage.easy, 1);
        // Asha has no resume (0.0), Meera scores 5 + education + skills.
        assert!((coverage.avg_resume_score - 3.5).abs() < 1e-9);
    }

    #[test]
    fn top_students_orders_by_combined_score() {
        let mut session = session();
        session.auto_review_all().expect("review");
        let names: Vec<&str> = top_students(session.students(), 10)
            .iter()
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(names, vec!["Asha", "Meera"]);
    }

    #[test]
    fn report_lists_sections() {
        let session = session();
        let date = NaiveDate::from_ymd_opt(2026, 2, 2).expect("date");
        let report = build_report(&session, date);

        assert!(report.contains("Sheet \"Batch 7\": 3 students (generated 2026-02-02)"));
        assert!(report.contains("- Placed (placed): 1"));
        assert!(report.contains("- School of Programming [SOP]: 1"));
        assert!(report.contains("- Music: 1"));
        assert!(report.contains("No students reviewed yet."));
        assert!(report.contains("No scores recorded."));
    }
}
