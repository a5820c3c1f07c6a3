use std::path::PathBuf;

use anyhow::Result;

use crate::schools::SchoolTable;

/// Settings read from the environment (and `.env` when present).
#[derive(Debug, Clone)]
pub struct Config {
    pub output_dir: PathBuf,
    pub schools_file: Option<PathBuf>,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Config {
            output_dir: std::env::var("PLACEHUB_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".")),
            schools_file: std::env::var("PLACEHUB_SCHOOLS").ok().map(PathBuf::from),
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// The configured school table, or the built-in SOP/SOB/SOD table.
    pub fn school_table(&self) -> Result<SchoolTable> {
        match &self.schools_file {
            Some(path) => SchoolTable::from_json_file(path),
            None => Ok(SchoolTable::default()),
        }
    }
}
