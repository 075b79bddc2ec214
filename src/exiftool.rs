//! Metadata extraction through exiftool.
//!
//! The [`MetadataSource`] trait is the seam between the renamer and whatever
//! reads metadata from disk. The production implementation, [`ExifTool`],
//! shells out to `exiftool -json -G <file>` and parses the JSON it prints.
//! The `-G` flag prefixes every key with its group (`EXIF:`, `MakerNotes:`),
//! which is what [`MetadataRecord::fetch`](crate::metadata::MetadataRecord::fetch)
//! expects.
//!
//! Only a missing exiftool binary is fatal for a batch; see
//! [`ExtractError::is_fatal`].

use crate::metadata::MetadataRecord;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("{0} not found. Install it first.")]
    ToolNotFound(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{program} failed on {}: {stderr}", path.display())]
    ToolFailed {
        program: String,
        path: PathBuf,
        stderr: String,
    },
    #[error("Could not parse metadata: {0}")]
    Json(#[from] serde_json::Error),
}

impl ExtractError {
    /// Whether the whole batch should stop, not just this file.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ExtractError::ToolNotFound(_))
    }
}

/// Reads the metadata record of one image.
pub trait MetadataSource: Sync {
    fn read(&self, path: &Path) -> Result<MetadataRecord, ExtractError>;
}

/// Runs an exiftool binary once per image.
#[derive(Debug, Clone)]
pub struct ExifTool {
    program: String,
}

impl ExifTool {
    pub fn new() -> Self {
        Self::with_program("exiftool")
    }

    /// Use a specific executable, e.g. `/opt/homebrew/bin/exiftool`.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Default for ExifTool {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataSource for ExifTool {
    fn read(&self, path: &Path) -> Result<MetadataRecord, ExtractError> {
        let output = Command::new(&self.program)
            .args(["-json", "-G"])
            .arg(path)
            .output()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => ExtractError::ToolNotFound(self.program.clone()),
                _ => ExtractError::Io(e),
            })?;

        if !output.status.success() {
            return Err(ExtractError::ToolFailed {
                program: self.program.clone(),
                path: path.to_path_buf(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(MetadataRecord::from_json_str(&stdout)?)
    }
}
