use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

/// A school the roster knows by abbreviation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct School {
    pub abbreviation: String,
    pub full_name: String,
    /// Substring that identifies the school inside free-text school cells.
    pub keyword: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct SchoolTable {
    schools: Vec<School>,
}

impl Default for SchoolTable {
    fn default() -> Self {
        let school = |abbreviation: &str, full_name: &str, keyword: &str| School {
            abbreviation: abbreviation.to_string(),
            full_name: full_name.to_string(),
            keyword: keyword.to_string(),
        };

        Self {
            schools: vec![
                school("SOP", "School of Programming", "Programming"),
                school("SOB", "School of Business", "Business"),
                school("SOD", "School of Data Analytics", "Analytics"),
            ],
        }
    }
}

impl SchoolTable {
    /// Reads a JSON array of `{abbreviation, full_name, keyword}` objects.
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read school table {}", path.display()))?;
        let table: SchoolTable = serde_json::from_str(&raw)
            .with_context(|| format!("invalid school table {}", path.display()))?;
        Ok(table)
    }

    pub fn by_abbreviation(&self, abbreviation: &str) -> Option<&School> {
        self.schools
            .iter()
            .find(|school| school.abbreviation == abbreviation)
    }

    /// Exact match on either the abbreviation or the full name.
    pub fn lookup(&self, name: &str) -> Option<&School> {
        let name = name.trim();
        self.schools
            .iter()
            .find(|school| school.abbreviation == name || school.full_name == name)
    }

    /// True when `school` is the student's school under the abbreviation
    /// `selection`, e.g. "SOD" against "School of Data Analytics".
    pub fn abbreviation_matches(&self, selection: &str, school: &str) -> bool {
        self.by_abbreviation(selection)
            .is_some_and(|entry| school.contains(&entry.keyword))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_resolves_both_spellings() {
        let table = SchoolTable::default();
        assert_eq!(table.lookup("SOP").map(|s| s.full_name.as_str()), Some("School of Programming"));
        assert_eq!(table.lookup(" School of Business ").map(|s| s.abbreviation.as_str()), Some("SOB"));
        assert!(table.lookup("School of Design").is_none());
    }

    #[test]
    fn abbreviation_matches_on_keyword() {
        let table = SchoolTable::default();
        assert!(table.abbreviation_matches("SOD", "School of Data Analytics"));
        assert!(!table.abbreviation_matches("SOD", "School of Business"));
        assert!(!table.abbreviation_matches("XYZ", "School of Business"));
    }

    #[test]
    fn table_loads_from_json() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("schools.json");
        std::fs::write(
            &path,
            r#"[{"abbreviation": "SOX", "full_name": "School of Design", "keyword": "Design"}]"#,
        )
        .expect("write table");

        let table = SchoolTable::from_json_file(&path).expect("load table");
        assert!(table.abbreviation_matches("SOX", "School of Design"));
        assert!(table.by_abbreviation("SOP").is_none());
    }
}
