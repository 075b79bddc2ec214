//! Shared test utilities for the xtag test suite.
//!
//! Provides terse builders for metadata records and recipes, a fixture
//! loader and log capture, plus a mock [`MetadataSource`] for batch tests.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let record = record(&[("MakerNotes:FilmMode", json!("Eterna"))]);
//! let recipes = vec![recipe("Cinema", &[("FilmMode", json!("Eterna"))])];
//! let tags = derive_tags(&record, &recipes, &());
//! assert_eq!(tag_texts(&tags), vec!["Cinema"]);
//! ```

use serde_json::Value;
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::exiftool::{ExtractError, MetadataSource};
use crate::metadata::MetadataRecord;
use crate::recipe::Recipe;
use crate::tags::Tag;

// =========================================================================
// Builders
// =========================================================================

/// Metadata record from `(key, value)` pairs, order preserved.
pub fn record(entries: &[(&str, Value)]) -> MetadataRecord {
    entries.iter().map(|(k, v)| (*k, v.clone())).collect()
}

/// Recipe with the given settings, order preserved.
pub fn recipe(name: &str, settings: &[(&str, Value)]) -> Recipe {
    Recipe::new(name, settings.iter().map(|(k, v)| (*k, v.clone())))
}

/// Tag texts without brackets, in order.
pub fn tag_texts(tags: &[Tag]) -> Vec<String> {
    tags.iter().map(|t| t.text.clone()).collect()
}

/// Load `fixtures/exiftool/<name>.json` as a metadata record.
pub fn fixture_record(name: &str) -> MetadataRecord {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("fixtures/exiftool")
        .join(format!("{name}.json"));
    let content = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("fixture {} unreadable: {e}", path.display()));
    MetadataRecord::from_json_str(&content).unwrap()
}

// =========================================================================
// Log capture
// =========================================================================

/// Run `f` under a DEBUG-level subscriber on this thread and return the log text.
pub fn capture_logs(f: impl FnOnce()) -> String {
    let buffer = Arc::new(Mutex::new(Vec::new()));
    let writer = Arc::clone(&buffer);
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_writer(move || LogBuffer(Arc::clone(&writer)))
        .finish();
    tracing::subscriber::with_default(subscriber, f);
    let bytes = buffer.lock().unwrap().clone();
    String::from_utf8(bytes).unwrap()
}

struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

// =========================================================================
// Mock metadata source
// =========================================================================

/// Serves canned records by file name and records every read.
/// Uses Mutex (not RefCell) so it is Sync and works with rayon's par_iter.
#[derive(Default)]
pub struct MockSource {
    records: HashMap<String, MetadataRecord>,
    error: Option<fn() -> ExtractError>,
    reads: Mutex<Vec<PathBuf>>,
}

impl MockSource {
    /// Files not listed get an empty record.
    pub fn with_records(records: &[(&str, MetadataRecord)]) -> Self {
        Self {
            records: records
                .iter()
                .map(|(name, record)| (name.to_string(), record.clone()))
                .collect(),
            ..Self::default()
        }
    }

    /// Every read fails with the error `make_error` builds.
    pub fn failing(make_error: fn() -> ExtractError) -> Self {
        Self {
            error: Some(make_error),
            ..Self::default()
        }
    }

    pub fn reads(&self) -> Vec<PathBuf> {
        self.reads.lock().unwrap().clone()
    }
}

impl MetadataSource for MockSource {
    fn read(&self, path: &Path) -> Result<MetadataRecord, ExtractError> {
        self.reads.lock().unwrap().push(path.to_path_buf());
        if let Some(make_error) = self.error {
            return Err(make_error());
        }
        let name = path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(self.records.get(&name).cloned().unwrap_or_default())
    }
}
