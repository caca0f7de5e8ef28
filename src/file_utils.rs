use anyhow::{Result, Context};
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::translation::{ScheduleReport, TextUnit, TranslatedUnit, UnitFile};

// @module: File and directory utilities

/// Translated document as written by the CLI
#[derive(Debug, Serialize)]
pub struct OutputDocument<'a> {
    /// Translated units in input order
    pub units: &'a [TranslatedUnit],
    /// Run summary
    pub report: &'a ScheduleReport,
}

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_file()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.as_os_str().is_empty() && !path.exists() {
            fs::create_dir_all(path)?;
        }
        Ok(())
    }

    // @generates: Output path next to the input, tagged with the target language
    pub fn generate_output_path<P: AsRef<Path>>(input_file: P, target_language: &str) -> PathBuf {
        let input_file = input_file.as_ref();
        let stem = input_file.file_stem().unwrap_or_default();

        let mut output_filename = stem.to_string_lossy().to_string();
        output_filename.push('.');
        output_filename.push_str(&target_language.to_lowercase().replace(' ', "_"));
        output_filename.push_str(".json");

        input_file.with_file_name(output_filename)
    }

    /// Read a file to a string
    pub fn read_to_string<P: AsRef<Path>>(path: P) -> Result<String> {
        fs::read_to_string(&path)
            .with_context(|| format!("Failed to read file: {:?}", path.as_ref()))
    }

    /// Write a string to a file, replacing it atomically
    pub fn write_to_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        let path = path.as_ref();
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        Self::ensure_dir(&parent)?;

        let mut file = NamedTempFile::new_in(&parent)
            .with_context(|| format!("Failed to create temporary file in {:?}", parent))?;
        file.write_all(content.as_bytes())
            .with_context(|| format!("Failed to write to file: {:?}", path))?;
        file.persist(path)
            .with_context(|| format!("Failed to replace file: {:?}", path))?;

        Ok(())
    }

    /// Read ordered text units from a JSON unit file
    pub fn read_units<P: AsRef<Path>>(path: P) -> Result<Vec<TextUnit>> {
        let path = path.as_ref();
        let content = Self::read_to_string(path)?;
        let file: UnitFile = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse unit file: {:?}", path))?;
        let units = file.into_units();

        let mut seen = std::collections::HashSet::new();
        if let Some(duplicate) = units.iter().find(|unit| !seen.insert(unit.id.as_str())) {
            return Err(anyhow::anyhow!("Duplicate unit id '{}' in {:?}", duplicate.id, path));
        }

        Ok(units)
    }

    /// Write translated units and the run report as pretty JSON
    pub fn write_output<P: AsRef<Path>>(path: P, units: &[TranslatedUnit], report: &ScheduleReport) -> Result<()> {
        let document = OutputDocument { units, report };
        let content = serde_json::to_string_pretty(&document)
            .context("Failed to serialize translated units")?;
        Self::write_to_file(path, &content)
    }
}
