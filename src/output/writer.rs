//! Dataset files
//!
//! Every file is written to a temporary file in the output directory and renamed into
//! place, so an interrupted run never leaves a truncated file behind.

use crate::config::OutputConfig;
use crate::output::OutputResult;
use crate::record::MergedRecord;
use serde::Serialize;
use std::collections::BTreeSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub const LISTING_FILE: &str = "listing.json";
pub const DETAIL_FILE: &str = "detail.json";
pub const FINAL_JSON_FILE: &str = "final.json";
pub const FINAL_CSV_FILE: &str = "final.csv";
pub const SUMMARY_FILE: &str = "summary.md";

/// Writes run outputs into one directory
#[derive(Debug, Clone)]
pub struct DatasetWriter {
    directory: PathBuf,
    prefix: Option<String>,
}

impl DatasetWriter {
    pub fn new(directory: impl Into<PathBuf>, prefix: Option<String>) -> Self {
        Self {
            directory: directory.into(),
            prefix,
        }
    }

    pub fn from_config(config: &OutputConfig) -> Self {
        Self::new(&config.directory, config.file_prefix.clone())
    }

    /// Path of an output file, with the configured prefix applied
    pub fn path_for(&self, name: &str) -> PathBuf {
        match &self.prefix {
            Some(prefix) => self.directory.join(format!("{}_{}", prefix, name)),
            None => self.directory.join(name),
        }
    }

    /// Writes `value` as pretty-printed UTF-8 JSON
    pub fn write_json<T>(&self, name: &str, value: &T) -> OutputResult<PathBuf>
    where
        T: Serialize + ?Sized,
    {
        self.persist(name, |file| {
            serde_json::to_writer_pretty(&mut *file, value)?;
            file.write_all(b"\n")?;
            Ok(())
        })
    }

    /// Writes merged records as CSV
    ///
    /// The header is the sorted union of every record's columns; a record missing a column
    /// gets an empty cell.
    pub fn write_csv(&self, name: &str, records: &[MergedRecord]) -> OutputResult<PathBuf> {
        let rows: Vec<_> = records.iter().map(MergedRecord::to_row).collect();
        let header: BTreeSet<&str> = rows
            .iter()
            .flat_map(|row| row.keys().map(String::as_str))
            .collect();

        self.persist(name, |file| {
            let mut writer = csv::Writer::from_writer(file);
            if !header.is_empty() {
                writer.write_record(&header)?;
            }
            for row in &rows {
                writer.write_record(
                    header
                        .iter()
                        .map(|column| row.get(*column).map(String::as_str).unwrap_or("")),
                )?;
            }
            writer.flush()?;
            Ok(())
        })
    }

    /// Writes a UTF-8 text file
    pub fn write_text(&self, name: &str, text: &str) -> OutputResult<PathBuf> {
        self.persist(name, |file| {
            file.write_all(text.as_bytes())?;
            Ok(())
        })
    }

    fn persist<F>(&self, name: &str, write: F) -> OutputResult<PathBuf>
    where
        F: FnOnce(&mut NamedTempFile) -> OutputResult<()>,
    {
        std::fs::create_dir_all(&self.directory)?;

        let target = self.path_for(name);
        let mut file = NamedTempFile::new_in(&self.directory)?;
        write(&mut file)?;
        file.flush()?;
        file.persist(&target).map_err(|e| e.error)?;

        tracing::debug!("Wrote {}", target.display());
        Ok(target)
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }
}
