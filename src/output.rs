//! CLI and log output formatting.
//!
//! # Output Format
//!
//! ## Standard output
//!
//! One line per image that produced a name, nothing else, so the output can
//! be piped:
//!
//! ```text
//! DSCF0001_[ClassicChrome].JPG
//! DSCF0042_[CH04][Velvia].JPG
//! ```
//!
//! Missing files and failed renames go to the log, and failed renames also
//! get an `Error:` line on stderr.
//!
//! ## Log lines
//!
//! ```text
//! Recipe 'Kodachrome 64' check: FilmMode: expected 'Classic Chrome', got 'Classic Chrome'
//! Matched recipe 'Kodachrome 64'
//! Applied Recipe tag: Kodachrome64
//! Skipped Saturation tag because Film/Recipe tag is present
//! ```
//!
//! # Architecture
//!
//! Each `format_*` function is pure and returns strings for testability;
//! [`print_outcomes`] is the only function here that writes.

use crate::events::DeriveEvent;
use crate::metadata::MetadataRecord;
use crate::rename::Outcome;
use serde_json::Value;
use std::path::Path;

/// Render a metadata value the way a user typed it: strings unquoted.
fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// ============================================================================
// Derivation events
// ============================================================================

/// Format a derivation event as a single log line.
pub fn format_derive_event(event: &DeriveEvent) -> String {
    match event {
        DeriveEvent::RecipeCheck {
            recipe,
            tag,
            expected,
            actual,
            ..
        } => {
            let actual = actual.as_ref().map_or("None".to_string(), display_value);
            format!(
                "Recipe '{recipe}' check: {tag}: expected '{}', got '{actual}'",
                display_value(expected)
            )
        }
        DeriveEvent::RecipeSkipped { recipe } => {
            format!("Recipe '{recipe}' has no settings object; skipped")
        }
        DeriveEvent::RecipeMatched { recipe } => format!("Matched recipe '{recipe}'"),
        DeriveEvent::TagApplied { kind, tag } => {
            format!("Applied {} tag: {tag}", kind.label())
        }
        DeriveEvent::SaturationSkipped => {
            "Skipped Saturation tag because Film/Recipe tag is present".to_string()
        }
    }
}

// ============================================================================
// Metadata dump
// ============================================================================

/// Header line plus one `key: value` line per entry, sorted by key.
pub fn format_metadata_dump(image: &Path, record: &MetadataRecord) -> Vec<String> {
    let file_name = image
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| image.display().to_string());

    let mut entries: Vec<(&String, &Value)> = record.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    let mut lines = vec![format!(
        "--- EXIF for {file_name} ({} tags) ---",
        record.len()
    )];
    lines.extend(
        entries
            .into_iter()
            .map(|(key, value)| format!("{key}: {}", display_value(value))),
    );
    lines
}

// ============================================================================
// Batch results
// ============================================================================

/// The stdout line for an outcome, if it has one.
pub fn format_outcome(outcome: &Outcome) -> Option<String> {
    outcome.new_name().map(str::to_string)
}

/// The stderr line for an outcome, if it has one.
pub fn format_outcome_error(outcome: &Outcome) -> Option<String> {
    match outcome {
        Outcome::Failed { source, .. } => {
            Some(format!("Error: could not rename {}", source.display()))
        }
        _ => None,
    }
}

/// Print outcomes: new names to stdout, rename failures to stderr.
pub fn print_outcomes(outcomes: &[Outcome]) {
    for outcome in outcomes {
        if let Some(line) = format_outcome_error(outcome) {
            eprintln!("{}", line);
        }
        if let Some(line) = format_outcome(outcome) {
            println!("{}", line);
        }
    }
}
