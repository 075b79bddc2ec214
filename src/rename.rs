//! Batch renaming.
//!
//! Takes a list of image paths, reads each one's metadata through a
//! [`MetadataSource`], derives the tagged file name, and (when asked to)
//! renames the file in place:
//!
//! ```text
//! photos/DSCF0042.JPG  →  photos/DSCF0042_[CH04][Velvia].JPG
//! ```
//!
//! ## Failure handling
//!
//! Per-file problems never stop the batch:
//!
//! - a path that is not a file is reported as [`Outcome::Missing`];
//! - an exiftool failure or unparseable output is logged and the file gets
//!   an empty metadata record (so its name comes back unchanged);
//! - a failed rename is reported as [`Outcome::Failed`].
//!
//! A missing exiftool binary aborts the whole run, since every other file
//! would fail the same way.
//!
//! ## Parallel Processing
//!
//! Files are handled in parallel with [rayon](https://docs.rs/rayon). The
//! returned outcomes are in input order regardless of completion order.

use crate::events::DeriveObserver;
use crate::exiftool::{ExtractError, MetadataSource};
use crate::metadata::MetadataRecord;
use crate::output;
use crate::recipe::Recipe;
use crate::tags::new_file_name;
use rayon::prelude::*;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, Default)]
pub struct RenameOptions {
    /// Actually rename files; otherwise only compute the new names.
    pub apply: bool,
}

/// What happened to one input path.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Dry run: the name the file would get.
    Planned { source: PathBuf, new_name: String },
    Renamed {
        source: PathBuf,
        destination: PathBuf,
        new_name: String,
    },
    Missing(PathBuf),
    Failed { source: PathBuf, error: String },
}

impl Outcome {
    /// The derived file name, for outcomes that produced one.
    pub fn new_name(&self) -> Option<&str> {
        match self {
            Outcome::Planned { new_name, .. } | Outcome::Renamed { new_name, .. } => {
                Some(new_name.as_str())
            }
            Outcome::Missing(_) | Outcome::Failed { .. } => None,
        }
    }
}

/// Derive names for (and optionally rename) every image in `images`.
pub fn run(
    images: &[PathBuf],
    source: &impl MetadataSource,
    recipes: &[Recipe],
    options: RenameOptions,
    observer: &impl DeriveObserver,
) -> Result<Vec<Outcome>, ExtractError> {
    images
        .par_iter()
        .map(|image| rename_one(image, source, recipes, options, observer))
        .collect()
}

fn rename_one(
    image: &Path,
    source: &impl MetadataSource,
    recipes: &[Recipe],
    options: RenameOptions,
    observer: &impl DeriveObserver,
) -> Result<Outcome, ExtractError> {
    if !image.is_file() {
        tracing::warn!("Not found: {}", image.display());
        return Ok(Outcome::Missing(image.to_path_buf()));
    }

    let record = read_metadata(source, image)?;
    dump_metadata(image, &record);

    let file_name = image
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_default();
    let new_name = new_file_name(&file_name, &record, recipes, observer);

    if !options.apply {
        return Ok(Outcome::Planned {
            source: image.to_path_buf(),
            new_name,
        });
    }

    let destination = image
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(&new_name);
    match std::fs::rename(image, &destination) {
        Ok(()) => {
            tracing::info!(
                "Renamed: {} \u{2192} {}",
                image.display(),
                destination.display()
            );
            Ok(Outcome::Renamed {
                source: image.to_path_buf(),
                destination,
                new_name,
            })
        }
        Err(e) => {
            tracing::error!("Failed to rename {}: {e}", image.display());
            Ok(Outcome::Failed {
                source: image.to_path_buf(),
                error: e.to_string(),
            })
        }
    }
}

/// Image paths from newline-separated input, as piped from `find` or `ls`.
///
/// Blank lines are dropped; other lines are kept verbatim apart from a `\r\n` ending.
pub fn parse_image_list(input: &str) -> Vec<PathBuf> {
    input
        .lines()
        .filter(|line| !line.is_empty())
        .map(PathBuf::from)
        .collect()
}

/// Read metadata, downgrading every error except a missing tool to an empty record.
fn read_metadata(
    source: &impl MetadataSource,
    image: &Path,
) -> Result<MetadataRecord, ExtractError> {
    match source.read(image) {
        Ok(record) => {
            tracing::debug!("Loaded EXIF for {}", image.display());
            Ok(record)
        }
        Err(e) if e.is_fatal() => {
            tracing::error!("{e}");
            Err(e)
        }
        Err(e) => {
            tracing::warn!("exiftool error on {}: {e}", image.display());
            Ok(MetadataRecord::new())
        }
    }
}

fn dump_metadata(image: &Path, record: &MetadataRecord) {
    if !tracing::enabled!(tracing::Level::DEBUG) {
        return;
    }
    let mut lines = output::format_metadata_dump(image, record).into_iter();
    if let Some(header) = lines.next() {
        tracing::info!("{header}");
    }
    for line in lines {
        tracing::debug!("{line}");
    }
    if let Ok(json) = serde_json::to_string_pretty(record) {
        tracing::info!("Full EXIF JSON for {}:\n{json}", image.display());
    }
}
