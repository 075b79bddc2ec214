//! # xtag
//!
//! Appends descriptive tags to photo filenames, derived from the camera
//! metadata exiftool reports. Built around Fujifilm bodies: film simulation,
//! burst and bracketing sequences, advanced filters and saturation all end up
//! in the name, so a folder listing tells you how each frame was shot.
//!
//! ```text
//! DSCF0042.JPG  →  DSCF0042_[HDR][CH04][Velvia][ToyCamera].JPG
//! ```
//!
//! # Pipeline
//!
//! ```text
//! 1. Extract   image file   →  MetadataRecord   (exiftool -json -G)
//! 2. Match     record       →  recipe name      (first full match wins)
//! 3. Derive    record       →  ordered tags     (five fixed rules)
//! 4. Rename    tags         →  BASE_[A][B].EXT  (optional)
//! ```
//!
//! Steps 2 and 3 are pure functions of the metadata and the recipe list: no
//! filesystem, no global state. Everything they decide is reported as
//! structured events to an injectable observer instead of being logged
//! directly, which keeps them trivially testable and safe to run in
//! parallel.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`metadata`] | `MetadataRecord` and namespaced tag lookup (`Group:Tag`) |
//! | [`recipe`] | Recipes, first-match recipe lookup, recipe file loading |
//! | [`tags`] | The ordered tag rules and filename assembly |
//! | [`events`] | Diagnostic events and observers (`()`, channel, `tracing`) |
//! | [`exiftool`] | `MetadataSource` trait and the exiftool-backed implementation |
//! | [`rename`] | Batch runner: extract, derive, rename, in parallel |
//! | [`config`] | `xtag.toml` loading, validation and merging |
//! | [`output`] | Formatting of stdout lines and log lines |
//!
//! # Recipes
//!
//! A recipe names a combination of camera settings. When every setting
//! matches, the recipe name replaces the film simulation in the filename, so
//! a Classic Chrome frame shot with your "Kodachrome 64" settings is tagged
//! `[Kodachrome64]` rather than `[ClassicChrome]`. Recipes are tried in
//! order: extras passed on the command line first, then the recipe file.

pub mod config;
pub mod events;
pub mod exiftool;
pub mod metadata;
pub mod output;
pub mod recipe;
pub mod rename;
pub mod tags;

#[cfg(test)]
pub(crate) mod test_helpers;
