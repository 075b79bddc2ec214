//! Metadata records and tag lookup.
//!
//! A [`MetadataRecord`] is the flat key/value object exiftool prints for one
//! image when run with `-json -G`. Keys carry the group they came from:
//!
//! ```text
//! {
//!   "EXIF:ExposureMode": "Auto bracket",
//!   "MakerNotes:FilmMode": "F2/Fujichrome (Velvia)",
//!   "MakerNotes:SequenceNumber": 3
//! }
//! ```
//!
//! ## Lookup
//!
//! Callers ask for bare tag names (`FilmMode`). [`MetadataRecord::fetch`]
//! walks the entries in the order exiftool emitted them and returns the first
//! whose key is either exactly the tag name or ends with `:TagName`. Null
//! values are skipped. When several groups expose the same tag the first one
//! wins; there is no group priority.
//!
//! ## Coercion
//!
//! The typed helpers never fail. [`MetadataRecord::text`] yields `None` for
//! anything that is not a string, and [`MetadataRecord::integer`] degrades to
//! `0` for values that do not look like an integer.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One image's metadata, keys in extractor order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetadataRecord(Map<String, Value>);

impl MetadataRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse exiftool JSON output.
    ///
    /// Accepts either the array exiftool prints (first element is used, an
    /// empty array gives an empty record) or a single object.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        match serde_json::from_str::<Value>(json)? {
            Value::Array(items) => match items.into_iter().next() {
                Some(Value::Object(map)) => Ok(Self(map)),
                Some(other) => Err(not_an_object(&other)),
                None => Ok(Self::new()),
            },
            Value::Object(map) => Ok(Self(map)),
            other => Err(not_an_object(&other)),
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Look up a tag by bare name, matching `Tag` or `Group:Tag`.
    ///
    /// Returns the first non-null match in iteration order.
    pub fn fetch(&self, tag: &str) -> Option<&Value> {
        self.0
            .iter()
            .filter(|(_, value)| !value.is_null())
            .find(|(key, _)| key_matches(key, tag))
            .map(|(_, value)| value)
    }

    /// [`fetch`](Self::fetch) with a caller-supplied fallback.
    pub fn fetch_or<'a>(&'a self, tag: &str, default: &'a Value) -> &'a Value {
        self.fetch(tag).unwrap_or(default)
    }

    /// The tag's value if it is a string.
    pub fn text(&self, tag: &str) -> Option<&str> {
        self.fetch(tag).and_then(Value::as_str)
    }

    /// The tag's value as an integer, `0` when absent or malformed.
    ///
    /// Integral numbers are taken as-is, fractional numbers are truncated and
    /// strings are parsed after trimming.
    pub fn integer(&self, tag: &str) -> i64 {
        match self.fetch(tag) {
            Some(Value::Number(n)) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
                .unwrap_or(0),
            Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
            _ => 0,
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for MetadataRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

fn key_matches(key: &str, tag: &str) -> bool {
    key == tag
        || key
            .strip_suffix(tag)
            .is_some_and(|prefix| prefix.ends_with(':'))
}

fn not_an_object(value: &Value) -> serde_json::Error {
    serde::de::Error::custom(format!("expected a metadata object, found {value}"))
}
