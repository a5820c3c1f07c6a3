use crate::models::{Cell, Difficulty, RawRow, Status, Student};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Name,
    Email,
    Phone,
    Campus,
    School,
    Resume,
    Projects,
    Status,
    Group,
    Feedback,
    ResumeScore,
    ResumeStructure,
    ResumeProjects,
    ProjectScore,
    ProjectDifficulty,
    ProjectReview,
}

/// Header synonyms per logical field, tried in order. New spellings seen in
/// the wild go here.
const ALIASES: &[(Field, &[&str])] = &[
    (Field::Name, &["Name", "name", "Student Name"]),
    (Field::Email, &["Email", "email", "Email Address"]),
    (
        Field::Phone,
        &["Contact details", "Contact Details", "Contact", "Phone", "phone", "Mobile"],
    ),
    (Field::Campus, &["Campus", "campus"]),
    (Field::School, &["School", "school"]),
    (Field::Resume, &["Resume", "resume", "Resume Link"]),
    (Field::Projects, &["Projects", "projects", "Project Details"]),
    (Field::Status, &["Current Status", "Current Si", "Status", "status"]),
    (Field::Group, &["Group", "group"]),
    (Field::Feedback, &["Feedback", "feedback"]),
    (Field::ResumeScore, &["Resume Score", "resumeScore"]),
    (Field::ResumeStructure, &["Resume Structure", "resumeStructure"]),
    (Field::ResumeProjects, &["Resume Projects", "resumeProjects"]),
    (Field::ProjectScore, &["Project Score", "projectScore"]),
    (Field::ProjectDifficulty, &["Project Difficulty", "projectDifficulty"]),
    (Field::ProjectReview, &["Project Review", "projectReview"]),
];

fn lookup<'a>(row: &'a RawRow, field: Field) -> Option<&'a Cell> {
    let aliases = ALIASES
        .iter()
        .find(|(candidate, _)| *candidate == field)
        .map(|(_, aliases)| *aliases)
        .unwrap_or(&[]);

    aliases
        .iter()
        .filter_map(|header| row.get(header))
        .find(|cell| !cell.is_empty())
}

fn text(row: &RawRow, field: Field) -> String {
    lookup(row, field).map(Cell::as_text).unwrap_or_default()
}

/// Maps one spreadsheet row onto the canonical record. `index` becomes the
/// student id.
pub fn normalize(row: &RawRow, index: usize) -> Student {
    let raw_status = text(row, Field::Status);

    Student {
        id: index,
        name: text(row, Field::Name),
        email: text(row, Field::Email),
        phone: format_phone(&text(row, Field::Phone)),
        campus: text(row, Field::Campus),
        school: text(row, Field::School),
        resume: text(row, Field::Resume),
        projects: text(row, Field::Projects),
        status: classify_status(&raw_status),
        raw_status,
        group: text(row, Field::Group),
        feedback: text(row, Field::Feedback),
        resume_score: lookup(row, Field::ResumeScore).and_then(Cell::as_number),
        resume_structure: text(row, Field::ResumeStructure),
        resume_projects: text(row, Field::ResumeProjects),
        project_score: lookup(row, Field::ProjectScore).and_then(Cell::as_number),
        project_difficulty: text(row, Field::ProjectDifficulty)
            .parse::<Difficulty>()
            .ok(),
        project_review: text(row, Field::ProjectReview),
    }
}

/// Rows whose name is blank or the `N/A` placeholder are kept for export but
/// never shown as students.
pub fn has_usable_name(student: &Student) -> bool {
    let name = student.name.trim();
    !name.is_empty() && name != "N/A"
}

/// Canonical tokens such as `job_ready_under_process` (what the full export
/// writes back) map to themselves. Free text goes through the substring
/// rules, first match wins, so "Unplaced" lands on `placed`.
pub fn classify_status(raw: &str) -> Status {
    let trimmed = raw.trim();
    if let Some(status) = Status::ALL
        .into_iter()
        .find(|status| status.as_str() == trimmed)
    {
        return status;
    }

    let s = trimmed.to_lowercase();
    let has = |needle: &str| s.contains(needle);

    if has("placed") && !has("under process") {
        Status::Placed
    } else if has("internship") && (has("unp") || has("unpaid")) {
        Status::InternshipUnpaid
    } else if has("internship") && has("paid") {
        Status::InternshipPaid
    } else if has("job ready") && has("under process") {
        Status::JobReadyUnderProcess
    } else if has("job ready") {
        Status::JobReady
    } else if has("long leave") || has("leave") {
        Status::LongLeave
    } else if has("dropout") || has("drop out") {
        Status::Dropout
    } else {
        Status::Unplaced
    }
}

/// Formats Indian mobile numbers for display. Anything that does not look
/// like one is returned trimmed but otherwise untouched.
pub fn format_phone(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    let mut cleaned = String::with_capacity(trimmed.len());
    for ch in trimmed.chars() {
        if ch.is_ascii_digit() || (ch == '+' && cleaned.is_empty()) {
            cleaned.push(ch);
        }
    }

    let national = cleaned
        .strip_prefix("+91")
        .or_else(|| cleaned.strip_prefix("91"));
    if let Some(digits) = national {
        if is_ten_digits(digits) {
            return format!("+91 {} {}", &digits[..5], &digits[5..]);
        }
    }

    if is_ten_digits(&cleaned) {
        return format!("{} {}", &cleaned[..5], &cleaned[5..]);
    }

    trimmed.to_string()
}

fn is_ten_digits(s: &str) -> bool {
    s.len() == 10 && s.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_canonical_phone_inputs() {
        assert_eq!(format_phone("9876543210"), "98765 43210");
        assert_eq!(format_phone("+919876543210"), "+91 98765 43210");
        assert_eq!(format_phone("919876543210"), "+91 98765 43210");
        assert_eq!(format_phone("+91-99887-76655"), "+91 99887 76655");
        assert_eq!(format_phone(""), "");
        assert_eq!(format_phone("   "), "");
    }

    #[test]
    fn unrecognised_phone_passes_through_trimmed() {
        assert_eq!(format_phone(" 12345 "), "12345");
        assert_eq!(format_phone("call office"), "call office");
        assert_eq!(format_phone("+1 415 555 0100 x2"), "+1 415 555 0100 x2");
    }

    #[test]
    fn status_rules_apply_in_order() {
        let cases = [
            ("Placed", Status::Placed),
            ("  PLACED ", Status::Placed),
            ("Internship - UnP", Status::InternshipUnpaid),
            ("Internship - Unpaid", Status::InternshipUnpaid),
            ("Internship - Paid", Status::InternshipPaid),
            ("Job Ready", Status::JobReady),
            ("Job Ready - Under Process", Status::JobReadyUnderProcess),
            ("Long Leave", Status::LongLeave),
            ("On leave", Status::LongLeave),
            ("Dropout", Status::Dropout),
            ("Drop out", Status::Dropout),
            ("", Status::Unplaced),
            ("something else", Status::Unplaced),
        ];

        for (raw, expected) in cases {
            assert_eq!(classify_status(raw), expected, "classifying {raw:?}");
        }
    }

    #[test]
    fn placed_under_process_is_not_placed() {
        assert_eq!(classify_status("Placed - Under Process"), Status::Unplaced);
        assert_ne!(
            classify_status("Job Ready - Under Process"),
            Status::JobReady
        );
    }

    #[test]
    fn placed_substring_wins_over_later_rules() {
        assert_eq!(classify_status("Unplaced"), Status::Placed);
        assert_eq!(classify_status("Not Placed"), Status::Placed);
        assert_eq!(classify_status("Not placed - Internship Paid"), Status::Placed);
        assert_eq!(
            classify_status("Placed - Internship Unpaid - Under Process"),
            Status::InternshipUnpaid
        );
    }

    #[test]
    fn canonical_tokens_classify_as_themselves() {
        for status in Status::ALL {
            assert_eq!(classify_status(status.as_str()), status, "token {status}");
        }
        assert_eq!(classify_status(" job_ready "), Status::JobReady);
        assert_eq!(classify_status("JOB_READY"), Status::Unplaced);
    }

    #[test]
    fn normalize_uses_first_non_empty_alias() {
        let row = RawRow::new()
            .with("Name", "")
            .with("Student Name", "Asha")
            .with("Contact", 9876543210.0)
            .with("Current Status", "Job Ready")
            .with("Status", "Placed")
            .with("Resume Score", "7.5")
            .with("Project Difficulty", "Hard");

        let student = normalize(&row, 4);
        assert_eq!(student.id, 4);
        assert_eq!(student.name, "Asha");
        assert_eq!(student.phone, "98765 43210");
        assert_eq!(student.status, Status::JobReady);
        assert_eq!(student.raw_status, "Job Ready");
        assert_eq!(student.resume_score, Some(7.5));
        assert_eq!(student.project_difficulty, Some(Difficulty::Hard));
        assert_eq!(student.email, "");
        assert_eq!(student.project_score, None);
    }

    #[test]
    fn normalize_is_idempotent() {
        let row = RawRow::new()
            .with("Name", "Ravi")
            .with("Phone", "+91-99887-76655")
            .with("School", "School of Data Analytics");
        assert_eq!(normalize(&row, 2), normalize(&row, 2));
    }

    #[test]
    fn blank_and_placeholder_names_are_unusable() {
        let blank = normalize(&RawRow::new().with("Name", "  "), 0);
        let placeholder = normalize(&RawRow::new().with("Name", "N/A"), 1);
        let lowercase = normalize(&RawRow::new().with("Name", "n/a"), 2);
        assert!(!has_usable_name(&blank));
        assert!(!has_usable_name(&placeholder));
        assert!(has_usable_name(&lowercase));
    }
}
