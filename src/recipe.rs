//! Recipes and recipe matching.
//!
//! A recipe is a named set of camera settings. When every setting listed in a
//! recipe equals the image's metadata, the recipe's name replaces the raw
//! film-simulation name in the derived filename:
//!
//! ```json
//! [
//!   { "name": "Tri-X 400", "settings": { "Saturation": "Acros", "GrainEffectRoughness": "Strong" } },
//!   { "name": "Kodachrome 64", "settings": { "FilmMode": "Classic Chrome", "HighlightTone": "0 (normal)" } }
//! ]
//! ```
//!
//! ## Priority
//!
//! Recipes are tried in list order and the first full match wins. Extra
//! recipes given on the command line are placed in front of the defaults, so
//! they override them. A recipe with an empty `settings` object matches
//! everything, which makes it a catch-all when placed last.
//!
//! ## Comparison
//!
//! Values compare by JSON type: the number `3` does not equal the string
//! `"3"`. Numbers compare numerically (`3` equals `3.0`). A tag missing from
//! the metadata compares as `null`.
//!
//! ## Malformed input
//!
//! Loading never fails. Non-object list entries are dropped, a missing or
//! non-object `settings` leaves the recipe in the list but it never matches,
//! and a missing `name` becomes the empty string.

use crate::events::{DeriveEvent, DeriveObserver};
use crate::metadata::MetadataRecord;
use serde_json::{Map, Value};
use std::path::Path;

/// A named set of expected metadata values.
#[derive(Debug, Clone, PartialEq)]
pub struct Recipe {
    pub name: String,
    /// `None` when the source entry had no usable `settings` object.
    pub settings: Option<Map<String, Value>>,
}

impl Recipe {
    pub fn new<K, V>(name: impl Into<String>, settings: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        Self {
            name: name.into(),
            settings: Some(
                settings
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    /// Build a recipe from one element of a recipe list.
    ///
    /// Returns `None` only when the element is not a JSON object.
    pub fn from_value(value: &Value) -> Option<Self> {
        let entry = value.as_object()?;
        let name = entry
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let settings = entry.get("settings").and_then(Value::as_object).cloned();
        Some(Self { name, settings })
    }
}

/// Return the name of the first recipe whose settings all match `record`.
///
/// Stops comparing a recipe at its first mismatching setting. Each comparison
/// is reported to `observer`.
pub fn match_recipe<'r>(
    record: &MetadataRecord,
    recipes: &'r [Recipe],
    observer: &impl DeriveObserver,
) -> Option<&'r str> {
    for recipe in recipes {
        let Some(settings) = &recipe.settings else {
            observer.observe(DeriveEvent::RecipeSkipped {
                recipe: recipe.name.clone(),
            });
            continue;
        };

        let all_match = settings.iter().all(|(tag, expected)| {
            let actual = record.fetch(tag);
            let matched = values_equal(actual.unwrap_or(&Value::Null), expected);
            observer.observe(DeriveEvent::RecipeCheck {
                recipe: recipe.name.clone(),
                tag: tag.clone(),
                expected: expected.clone(),
                actual: actual.cloned(),
                matched,
            });
            matched
        });

        if all_match {
            observer.observe(DeriveEvent::RecipeMatched {
                recipe: recipe.name.clone(),
            });
            return Some(&recipe.name);
        }
    }
    None
}

fn values_equal(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Number(a), Value::Number(b)) => match (a.as_i64(), b.as_i64()) {
            (Some(a), Some(b)) => a == b,
            _ => a.as_f64() == b.as_f64(),
        },
        _ => actual == expected,
    }
}

// =============================================================================
// Loading
// =============================================================================

/// Parse a JSON recipe list.
///
/// Anything other than a JSON array is logged and ignored.
pub fn parse_recipes_json(json: &str) -> Vec<Recipe> {
    match recipe_list(json) {
        Ok(Some(recipes)) => recipes,
        Ok(None) => {
            tracing::warn!("recipes-json is not a list; ignoring.");
            Vec::new()
        }
        Err(e) => {
            tracing::warn!("Failed to parse recipes-json: {e}");
            Vec::new()
        }
    }
}

/// `None` when the JSON is valid but not an array.
fn recipe_list(json: &str) -> serde_json::Result<Option<Vec<Recipe>>> {
    Ok(match serde_json::from_str::<Value>(json)? {
        Value::Array(items) => Some(items.iter().filter_map(Recipe::from_value).collect()),
        _ => None,
    })
}

/// Read the default recipe file. Missing or broken files yield no recipes.
pub fn load_recipe_file(path: &Path) -> Vec<Recipe> {
    if !path.is_file() {
        tracing::debug!("No default recipes file at {}", path.display());
        return Vec::new();
    }
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            tracing::warn!("Could not load default recipes: {e}");
            return Vec::new();
        }
    };
    match recipe_list(&content) {
        Ok(Some(recipes)) => {
            tracing::debug!(
                "Loaded {} default recipes from {}",
                recipes.len(),
                path.display()
            );
            recipes
        }
        Ok(None) => {
            tracing::warn!(
                "Could not load default recipes: {} is not a list",
                path.display()
            );
            Vec::new()
        }
        Err(e) => {
            tracing::warn!("Could not load default recipes: {e}");
            Vec::new()
        }
    }
}

/// Load the defaults from `defaults_file` and put `extra_json` recipes first.
pub fn load_recipes(defaults_file: &Path, extra_json: Option<&str>) -> Vec<Recipe> {
    let defaults = load_recipe_file(defaults_file);
    let extras = extra_json
        .filter(|s| !s.is_empty())
        .map(parse_recipes_json)
        .unwrap_or_default();
    tracing::debug!("Loaded {} extra recipes from CLI/env", extras.len());

    let merged: Vec<Recipe> = extras.into_iter().chain(defaults).collect();
    tracing::info!("Total recipes (extras+defaults): {}", merged.len());
    merged
}
