use std::collections::HashMap;
use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Data, Reader};
use chrono::Utc;
use rust_xlsxwriter::{Workbook, Worksheet, XlsxError};
use tracing::{debug, info, warn};

use crate::error::{Result, RosterError};
use crate::models::{Cell, RawRow, Student};
use crate::schools::SchoolTable;

/// Columns of each sheet in the grouped review export, in order.
pub const REVIEW_COLUMNS: [&str; 13] = [
    "Name",
    "Campus",
    "Contact Details",
    "Email",
    "School",
    "Group",
    "Feedback",
    "Resume Score",
    "Resume Structure",
    "Resume Projects",
    "Project Score",
    "Project Difficulty",
    "Project Review",
];

const MAX_SHEET_NAME: usize = 31;
const GROUP_NAME_CHARS: usize = 10;
const DEFAULT_SHEET: &str = "Students";
const UNGROUPED_SCHOOL: &str = "Other";

fn is_csv(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}

fn csv_sheet_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("Sheet1")
        .to_string()
}

/// Names of every sheet in the workbook, in workbook order. A CSV file is a
/// single sheet named after the file.
pub fn list_sheets(path: &Path) -> Result<Vec<String>> {
    if is_csv(path) {
        if !path.is_file() {
            return Err(RosterError::read(path, "file not found"));
        }
        return Ok(vec![csv_sheet_name(path)]);
    }

    let workbook = open_workbook_auto(path).map_err(|e| RosterError::read(path, e))?;
    let names = workbook.sheet_names().to_vec();
    debug!(path = %path.display(), sheets = names.len(), "listed sheets");
    Ok(names)
}

pub fn read_sheet(path: &Path, sheet_name: &str) -> Result<Vec<RawRow>> {
    let grid = if is_csv(path) {
        if sheet_name != csv_sheet_name(path) {
            return Err(RosterError::SheetNotFound(sheet_name.to_string()));
        }
        read_csv_grid(path)?
    } else {
        read_workbook_grid(path, sheet_name)?
    };

    let rows = rows_from_grid(grid);
    info!(sheet = sheet_name, rows = rows.len(), "read sheet");
    Ok(rows)
}

pub async fn list_sheets_async(path: PathBuf) -> Result<Vec<String>> {
    let task_path = path.clone();
    tokio::task::spawn_blocking(move || list_sheets(&task_path))
        .await
        .map_err(|e| RosterError::read(path, e))?
}

pub async fn read_sheet_async(path: PathBuf, sheet_name: String) -> Result<Vec<RawRow>> {
    let task_path = path.clone();
    tokio::task::spawn_blocking(move || read_sheet(&task_path, &sheet_name))
        .await
        .map_err(|e| RosterError::read(path, e))?
}

fn read_workbook_grid(path: &Path, sheet_name: &str) -> Result<Vec<Vec<Cell>>> {
    let mut workbook = open_workbook_auto(path).map_err(|e| RosterError::read(path, e))?;
    if !workbook.sheet_names().iter().any(|name| name == sheet_name) {
        return Err(RosterError::SheetNotFound(sheet_name.to_string()));
    }

    let range = workbook
        .worksheet_range(sheet_name)
        .map_err(|e| RosterError::read(path, e))?;

    Ok(range
        .rows()
        .map(|row| row.iter().map(cell_from_data).collect())
        .collect())
}

fn read_csv_grid(path: &Path) -> Result<Vec<Vec<Cell>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|e| RosterError::read(path, e))?;

    let mut grid = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| RosterError::read(path, e))?;
        grid.push(
            record
                .iter()
                .map(|value| {
                    if value.is_empty() {
                        Cell::Blank
                    } else {
                        Cell::Text(value.to_string())
                    }
                })
                .collect(),
        );
    }
    Ok(grid)
}

fn cell_from_data(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Blank,
        Data::String(s) if s.is_empty() => Cell::Blank,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Float(n) => Cell::Number(*n),
        Data::Int(n) => Cell::Number(*n as f64),
        Data::Bool(b) => Cell::Text(if *b { "TRUE" } else { "FALSE" }.to_string()),
        Data::Error(e) => Cell::Text(format!("#{e:?}")),
        // Dates stay as Excel serials.
        Data::DateTime(dt) => Cell::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
    }
}

/// First row is the header. Blank headers become `__EMPTY`, repeats get a
/// numeric suffix, and rows without any value are dropped.
fn rows_from_grid(grid: Vec<Vec<Cell>>) -> Vec<RawRow> {
    let mut lines = grid.into_iter();
    let Some(header_cells) = lines.next() else {
        return Vec::new();
    };

    let mut seen: HashMap<String, usize> = HashMap::new();
    let headers: Vec<String> = header_cells
        .iter()
        .map(|cell| {
            let base = match cell.as_text() {
                text if text.is_empty() => "__EMPTY".to_string(),
                text => text,
            };
            let count = seen.entry(base.clone()).or_insert(0);
            let header = if *count == 0 {
                base
            } else {
                format!("{base}_{count}")
            };
            *count += 1;
            header
        })
        .collect();

    lines
        .filter_map(|cells| {
            let mut row = RawRow::new();
            for (header, cell) in headers.iter().zip(cells) {
                if cell != Cell::Blank {
                    row.set(header, cell);
                }
            }
            (!row.is_empty()).then_some(row)
        })
        .collect()
}

/// A workbook written to disk by one of the export functions.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedFile {
    pub path: PathBuf,
    pub sheets: Vec<String>,
    pub rows: usize,
}

fn today() -> String {
    Utc::now().date_naive().format("%Y-%m-%d").to_string()
}

fn file_component(value: &str) -> String {
    value
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
        .collect()
}

/// Makes `name` acceptable to Excel: no `[]:*?/\`, no edge apostrophes,
/// at most 31 characters and never blank.
fn sheet_title(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if matches!(c, '[' | ']' | ':' | '*' | '?' | '/' | '\\') { '_' } else { c })
        .collect();
    let truncated: String = cleaned.chars().take(MAX_SHEET_NAME).collect();
    let title = truncated.trim_matches('\'').to_string();

    if title.trim().is_empty() {
        DEFAULT_SHEET.to_string()
    } else if title.eq_ignore_ascii_case("history") {
        format!("{title}_")
    } else {
        title
    }
}

fn export_error(e: XlsxError) -> RosterError {
    RosterError::Export(e.to_string())
}

fn position(row: usize, col: usize) -> Result<(u32, u16)> {
    let row = u32::try_from(row).map_err(|_| RosterError::Export(format!("row {row} out of range")))?;
    let col = u16::try_from(col).map_err(|_| RosterError::Export(format!("column {col} out of range")))?;
    Ok((row, col))
}

fn write_cell(worksheet: &mut Worksheet, row: usize, col: usize, cell: &Cell) -> Result<()> {
    let (row, col) = position(row, col)?;
    match cell {
        Cell::Text(s) if !s.is_empty() => {
            worksheet.write_string(row, col, s.as_str()).map_err(export_error)?
        }
        Cell::Number(n) => worksheet.write_number(row, col, *n).map_err(export_error)?,
        Cell::Text(_) | Cell::Blank => return Ok(()),
    };
    Ok(())
}

fn write_table(worksheet: &mut Worksheet, headers: &[String], rows: &[RawRow]) -> Result<()> {
    for (col, header) in headers.iter().enumerate() {
        write_cell(worksheet, 0, col, &Cell::Text(header.clone()))?;
    }
    for (index, row) in rows.iter().enumerate() {
        for (col, header) in headers.iter().enumerate() {
            if let Some(cell) = row.get(header) {
                write_cell(worksheet, index + 1, col, cell)?;
            }
        }
    }
    Ok(())
}

/// Serializes in memory and writes the file in one call, so a failed export
/// never leaves a half-written workbook behind.
fn save(workbook: &mut Workbook, path: &Path) -> Result<()> {
    let buffer = workbook.save_to_buffer().map_err(export_error)?;
    if let Err(e) = std::fs::write(path, buffer) {
        if path.exists() {
            if let Err(cleanup) = std::fs::remove_file(path) {
                warn!(path = %path.display(), error = %cleanup, "failed to remove partial export");
            }
        }
        return Err(RosterError::Export(format!("{}: {e}", path.display())));
    }
    Ok(())
}

/// Writes `rows` to `<out_dir>/<prefix>_<sheet>_<date>.xlsx`. The header is
/// every column seen across the rows, in first-seen order.
pub fn export_single_sheet(
    rows: &[RawRow],
    sheet_name: &str,
    filename_prefix: &str,
    out_dir: &Path,
) -> Result<ExportedFile> {
    let title = sheet_title(sheet_name);
    let file_stem = if sheet_name.trim().is_empty() {
        DEFAULT_SHEET
    } else {
        sheet_name
    };

    let mut headers: Vec<String> = Vec::new();
    for row in rows {
        for header in row.headers() {
            if !headers.iter().any(|h| h == header) {
                headers.push(header.to_string());
            }
        }
    }

    let mut workbook = Workbook::new();
    let worksheet = workbook
        .add_worksheet()
        .set_name(title.as_str())
        .map_err(export_error)?;
    write_table(worksheet, &headers, rows)?;

    let path = out_dir.join(format!(
        "{}_{}_{}.xlsx",
        filename_prefix,
        file_component(file_stem),
        today()
    ));
    save(&mut workbook, &path)?;

    info!(path = %path.display(), rows = rows.len(), "exported sheet");
    Ok(ExportedFile {
        path,
        sheets: vec![title],
        rows: rows.len(),
    })
}

fn review_row(student: &Student) -> RawRow {
    let text = |value: &str| Cell::Text(value.to_string());
    let score = |value: Option<f64>| value.map(Cell::Number).unwrap_or(Cell::Blank);

    let values = [
        text(&student.name),
        text(&student.campus),
        text(&student.phone),
        text(&student.email),
        text(&student.school),
        text(&student.group),
        text(&student.feedback),
        score(student.resume_score),
        text(&student.resume_structure),
        text(&student.resume_projects),
        score(student.project_score),
        student
            .project_difficulty
            .map(|d| text(d.as_str()))
            .unwrap_or(Cell::Blank),
        text(&student.project_review),
    ];

    REVIEW_COLUMNS
        .iter()
        .zip(values)
        .fold(RawRow::new(), |row, (header, value)| row.with(header, value))
}

/// Abbreviation for known schools, otherwise the first characters of the
/// school name, within Excel's sheet-name limit.
pub fn review_sheet_name(school: &str, table: &SchoolTable) -> String {
    let name: String = match table.lookup(school) {
        Some(known) => known.abbreviation.clone(),
        None => school.chars().take(GROUP_NAME_CHARS).collect(),
    };
    sheet_title(&name)
}

fn unique_sheet_name(base: String, used: &[String]) -> String {
    let taken = |name: &str| used.iter().any(|u| u.eq_ignore_ascii_case(name));
    if !taken(&base) {
        return base;
    }

    (2..)
        .map(|n| {
            let suffix = format!(" ({n})");
            let keep = MAX_SHEET_NAME - suffix.chars().count();
            format!("{}{}", base.chars().take(keep).collect::<String>(), suffix)
        })
        .find(|candidate| !taken(candidate))
        .unwrap_or(base)
}

/// One sheet per school for every student carrying review data. Fails with
/// `NoReviewData` before touching the filesystem when nobody qualifies.
pub fn export_grouped_sheets(
    students: &[Student],
    table: &SchoolTable,
    filename_prefix: &str,
    out_dir: &Path,
) -> Result<ExportedFile> {
    let mut groups: Vec<(String, Vec<&Student>)> = Vec::new();
    for student in students.iter().filter(|s| s.has_review_data()) {
        let school = match student.school.trim() {
            "" => UNGROUPED_SCHOOL,
            school => school,
        };
        match groups.iter_mut().find(|(name, _)| name == school) {
            Some((_, members)) => members.push(student),
            None => groups.push((school.to_string(), vec![student])),
        }
    }

    if groups.is_empty() {
        return Err(RosterError::NoReviewData);
    }

    let headers: Vec<String> = REVIEW_COLUMNS.iter().map(|h| h.to_string()).collect();
    let mut workbook = Workbook::new();
    let mut sheet_names: Vec<String> = Vec::new();
    let mut total_rows = 0;

    for (school, members) in &groups {
        let name = unique_sheet_name(review_sheet_name(school, table), &sheet_names);
        let rows: Vec<RawRow> = members.iter().map(|s| review_row(s)).collect();

        let worksheet = workbook
            .add_worksheet()
            .set_name(name.as_str())
            .map_err(export_error)?;
        write_table(worksheet, &headers, &rows)?;

        debug!(school = %school, sheet = %name, rows = rows.len(), "wrote review sheet");
        total_rows += rows.len();
        sheet_names.push(name);
    }

    let path = out_dir.join(format!("{}_{}.xlsx", filename_prefix, today()));
    save(&mut workbook, &path)?;

    info!(path = %path.display(), sheets = sheet_names.len(), "exported review sheets");
    Ok(ExportedFile {
        path,
        sheets: sheet_names,
        rows: total_rows,
    })
}
