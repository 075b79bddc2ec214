//! Tag derivation: metadata in, filename suffix out.
//!
//! Each image gets an ordered list of short tags, rendered as bracketed
//! tokens between the base name and the extension:
//!
//! ```text
//! DSCF0042.JPG  →  DSCF0042_[HDR][CH04][Velvia][ToyCamera].JPG
//! ```
//!
//! ## Rules
//!
//! The tags come from a fixed, ordered list of rules. Each rule is a pure
//! function of the metadata and the recipe match; the order of the list is
//! the order of the tags in the filename.
//!
//! | # | Rule | Source tags | Example |
//! |---|------|-------------|---------|
//! | 1 | HDR | `PictureMode` contains `HDR` | `[HDR]` |
//! | 2 | Sequence | `SequenceNumber`, `DriveMode`, `ExposureMode` | `[CL03]`, `[CH12]`, `[EB02]`, `[05]` |
//! | 3 | Naming | matched recipe name, else `FilmMode` | `[MyRecipe]`, `[Velvia]` |
//! | 4 | Advanced filter | `AdvancedFilter` | `[ToyCamera]` |
//! | 5 | Saturation | `Saturation`, only when rule 3 produced nothing | `[+2(high)]` |
//!
//! Spaces are removed from every tag. A recipe match always beats the film
//! mode, so an image carries at most one naming tag, and the saturation tag
//! only shows up on images without one (monochrome simulations report
//! themselves through `Saturation`, e.g. `Acros`).
//!
//! ## Robustness
//!
//! Nothing here fails. Missing tags, non-string values and unparseable
//! sequence numbers just produce fewer tags.
//!
//! ## Re-running on renamed files
//!
//! Tags depend only on metadata. Running twice on a file that was already
//! renamed appends the same tags again; callers should derive from the
//! original base name.

use crate::events::{DeriveEvent, DeriveObserver};
use crate::metadata::MetadataRecord;
use crate::recipe::{Recipe, match_recipe};
use std::fmt;

/// Which rule produced a tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    Hdr,
    /// Burst or bracketing frame: `CL03`, `CH12`, `EB02`.
    Sequence,
    /// Sequence number without a drive mode prefix: `05`.
    RawSequence,
    Recipe,
    FilmMode,
    AdvancedFilter,
    Saturation,
}

impl TagKind {
    /// Recipe and film-mode tags name the look of the image.
    pub fn is_naming(self) -> bool {
        matches!(self, TagKind::Recipe | TagKind::FilmMode)
    }

    pub fn label(self) -> &'static str {
        match self {
            TagKind::Hdr => "HDR",
            TagKind::Sequence => "DriveMode",
            TagKind::RawSequence => "raw SequenceNumber",
            TagKind::Recipe => "Recipe",
            TagKind::FilmMode => "FilmMode",
            TagKind::AdvancedFilter => "AdvancedFilter",
            TagKind::Saturation => "Saturation",
        }
    }
}

/// One derived tag. Displays with its brackets: `[Velvia]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub kind: TagKind,
    pub text: String,
}

impl Tag {
    fn new(kind: TagKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.text)
    }
}

/// A tag rule: metadata plus the matched recipe name, if any.
type Rule = fn(&MetadataRecord, Option<&str>) -> Option<Tag>;

const RULES: [Rule; 5] = [
    hdr_tag,
    sequence_tag,
    naming_tag,
    advanced_filter_tag,
    saturation_tag,
];

/// Derive the ordered tag list for one image.
pub fn derive_tags(
    record: &MetadataRecord,
    recipes: &[Recipe],
    observer: &impl DeriveObserver,
) -> Vec<Tag> {
    let recipe_name = match_recipe(record, recipes, observer).filter(|name| !name.is_empty());

    let tags: Vec<Tag> = RULES
        .iter()
        .filter_map(|rule| rule(record, recipe_name))
        .collect();

    for tag in &tags {
        observer.observe(DeriveEvent::TagApplied {
            kind: tag.kind,
            tag: tag.text.clone(),
        });
    }
    if tags.iter().any(|t| t.kind.is_naming()) {
        observer.observe(DeriveEvent::SaturationSkipped);
    }
    tags
}

/// Render tags as a filename suffix: `_[A][B]`, or `""` for no tags.
pub fn suffix(tags: &[Tag]) -> String {
    if tags.is_empty() {
        return String::new();
    }
    let joined: String = tags.iter().map(Tag::to_string).collect();
    format!("_{joined}")
}

/// Build the new file name for `file_name` (no directory part).
///
/// The extension, including its case, is kept as is.
pub fn new_file_name(
    file_name: &str,
    record: &MetadataRecord,
    recipes: &[Recipe],
    observer: &impl DeriveObserver,
) -> String {
    let (base, ext) = split_extension(file_name);
    let tags = derive_tags(record, recipes, observer);
    format!("{base}{}{ext}", suffix(&tags))
}

/// Split `name` into base and extension (with its dot).
///
/// Leading dots belong to the base, so `.hidden` has no extension.
pub fn split_extension(name: &str) -> (&str, &str) {
    let leading_dots = name.len() - name.trim_start_matches('.').len();
    match name[leading_dots..].rfind('.') {
        Some(pos) => name.split_at(leading_dots + pos),
        None => (name, ""),
    }
}

fn strip_spaces(s: &str) -> String {
    s.replace(' ', "")
}

// =============================================================================
// Rules
// =============================================================================

fn hdr_tag(record: &MetadataRecord, _recipe: Option<&str>) -> Option<Tag> {
    record
        .text("PictureMode")
        .filter(|mode| mode.contains("HDR"))
        .map(|_| Tag::new(TagKind::Hdr, "HDR"))
}

fn sequence_tag(record: &MetadataRecord, _recipe: Option<&str>) -> Option<Tag> {
    let seq = record.integer("SequenceNumber");
    if seq <= 0 {
        return None;
    }
    let drive = record.text("DriveMode").unwrap_or_default();

    let prefix = if drive.contains("Continuous Low") {
        "CL"
    } else if drive.contains("Continuous High") {
        "CH"
    } else if drive.contains("Single")
        && record
            .text("ExposureMode")
            .is_some_and(|mode| mode.contains("Auto bracket"))
    {
        "EB"
    } else {
        return Some(Tag::new(TagKind::RawSequence, format!("{seq:02}")));
    };
    Some(Tag::new(TagKind::Sequence, format!("{prefix}{seq:02}")))
}

fn naming_tag(record: &MetadataRecord, recipe: Option<&str>) -> Option<Tag> {
    if let Some(name) = recipe {
        return Some(Tag::new(TagKind::Recipe, strip_spaces(name)));
    }

    let film = record.text("FilmMode")?.trim();
    let name = parenthesized(film).unwrap_or(film);
    if name.is_empty() {
        return None;
    }
    Some(Tag::new(TagKind::FilmMode, strip_spaces(name)))
}

/// The trimmed text between the first `(` and the next `)` after it.
///
/// `F2/Fujichrome (Velvia)` → `Velvia`. `None` unless both parentheses exist.
fn parenthesized(s: &str) -> Option<&str> {
    if !s.contains(')') {
        return None;
    }
    let (_, rest) = s.split_once('(')?;
    let inner = rest.split_once(')').map_or(rest, |(inner, _)| inner);
    Some(inner.trim())
}

fn advanced_filter_tag(record: &MetadataRecord, _recipe: Option<&str>) -> Option<Tag> {
    record
        .text("AdvancedFilter")
        .filter(|filter| !filter.trim().is_empty())
        .map(|filter| Tag::new(TagKind::AdvancedFilter, strip_spaces(filter)))
}

fn saturation_tag(record: &MetadataRecord, recipe: Option<&str>) -> Option<Tag> {
    if naming_tag(record, recipe).is_some() {
        return None;
    }
    let saturation = record.text("Saturation")?.trim();
    if saturation.is_empty() || saturation.to_lowercase() == "0 (normal)" {
        return None;
    }
    Some(Tag::new(TagKind::Saturation, strip_spaces(saturation)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use serde_json::json;
    use std::sync::mpsc;

    fn derive(record: &MetadataRecord) -> Vec<String> {
        tag_texts(&derive_tags(record, &[], &()))
    }

    // =========================================================================
    // Empty and HDR
    // =========================================================================

    #[test]
    fn no_recognized_tags() {
        let record = record(&[
            ("SourceFile", json!("DSCF0001.JPG")),
            ("EXIF:Make", json!("FUJIFILM")),
        ]);
        let tags = derive_tags(&record, &[], &());
        assert!(tags.is_empty());
        assert_eq!(suffix(&tags), "");
    }

    #[test]
    fn hdr_comes_first() {
        let record = record(&[
            ("MakerNotes:FilmMode", json!("Classic Chrome")),
            ("MakerNotes:PictureMode", json!("HDR Auto")),
        ]);
        assert_eq!(derive(&record), vec!["HDR", "ClassicChrome"]);
    }

    #[test]
    fn hdr_ignores_non_text_picture_mode() {
        let record = record(&[("MakerNotes:PictureMode", json!(3))]);
        assert!(derive(&record).is_empty());
    }

    // =========================================================================
    // Sequence
    // =========================================================================

    #[test]
    fn continuous_low_pads_sequence() {
        let low = |seq| {
            record(&[
                ("MakerNotes:DriveMode", json!("Continuous Low")),
                ("MakerNotes:SequenceNumber", json!(seq)),
            ])
        };
        assert_eq!(derive(&low(3)), vec!["CL03"]);
        assert_eq!(derive(&low(12)), vec!["CL12"]);
        assert_eq!(derive(&low(123)), vec!["CL123"]);
    }

    #[test]
    fn continuous_high() {
        let record = record(&[
            ("MakerNotes:DriveMode", json!("Continuous High")),
            ("MakerNotes:SequenceNumber", json!(7)),
        ]);
        assert_eq!(derive(&record), vec!["CH07"]);
    }

    #[test]
    fn exposure_bracketing() {
        let record = record(&[
            ("MakerNotes:DriveMode", json!("Single")),
            ("EXIF:ExposureMode", json!("Auto bracket")),
            ("MakerNotes:SequenceNumber", json!(5)),
        ]);
        assert_eq!(derive(&record), vec!["EB05"]);
    }

    #[test]
    fn single_without_bracketing_has_no_prefix() {
        let record = record(&[
            ("MakerNotes:DriveMode", json!("Single")),
            ("MakerNotes:SequenceNumber", json!(5)),
        ]);
        let tags = derive_tags(&record, &[], &());
        assert_eq!(tag_texts(&tags), vec!["05"]);
        assert_eq!(tags[0].kind, TagKind::RawSequence);
    }

    #[test]
    fn prefixed_sequence_kind() {
        let record = record(&[
            ("MakerNotes:DriveMode", json!("Continuous Low")),
            ("MakerNotes:SequenceNumber", json!(3)),
        ]);
        assert_eq!(derive_tags(&record, &[], &())[0].kind, TagKind::Sequence);
    }

    #[test]
    fn sequence_without_drive_mode() {
        let record = record(&[("MakerNotes:SequenceNumber", json!("9"))]);
        assert_eq!(derive(&record), vec!["09"]);
    }

    #[test]
    fn zero_or_malformed_sequence_adds_nothing() {
        for seq in [json!(0), json!("abc"), json!(-2)] {
            let record = record(&[
                ("MakerNotes:DriveMode", json!("Continuous High")),
                ("MakerNotes:SequenceNumber", seq),
            ]);
            assert!(derive(&record).is_empty());
        }
    }

    // =========================================================================
    // Recipe and film mode
    // =========================================================================

    #[test]
    fn recipe_beats_film_mode_and_saturation() {
        let record = record(&[
            ("MakerNotes:FilmMode", json!("PROVIA")),
            ("MakerNotes:Saturation", json!("+2 (high)")),
        ]);
        let recipes = vec![recipe("My Recipe", &[("FilmMode", json!("PROVIA"))])];
        let tags = derive_tags(&record, &recipes, &());
        assert_eq!(tag_texts(&tags), vec!["MyRecipe"]);
        assert_eq!(tags[0].kind, TagKind::Recipe);
    }

    #[test]
    fn film_mode_parenthesized_name() {
        let record = record(&[("MakerNotes:FilmMode", json!("Classic Chrome (CC)"))]);
        assert_eq!(derive(&record), vec!["CC"]);
    }

    #[test]
    fn film_mode_exiftool_style() {
        let record = record(&[("MakerNotes:FilmMode", json!("F2/Fujichrome (Velvia)"))]);
        assert_eq!(derive(&record), vec!["Velvia"]);
    }

    #[test]
    fn film_mode_plain_name_loses_spaces() {
        let record = record(&[("MakerNotes:FilmMode", json!("  Pro Neg. Std "))]);
        assert_eq!(derive(&record), vec!["ProNeg.Std"]);
    }

    #[test]
    fn film_mode_empty_parentheses_fall_back_to_saturation() {
        let record = record(&[
            ("MakerNotes:FilmMode", json!("Custom ( )")),
            ("MakerNotes:Saturation", json!("Acros")),
        ]);
        assert_eq!(derive(&record), vec!["Acros"]);
    }

    #[test]
    fn blank_film_mode_adds_nothing() {
        let record = record(&[("MakerNotes:FilmMode", json!("   "))]);
        assert!(derive(&record).is_empty());
    }

    #[test]
    fn unnamed_recipe_falls_back_to_film_mode() {
        let record = record(&[("MakerNotes:FilmMode", json!("Eterna"))]);
        let recipes = vec![
            recipe("", &[("FilmMode", json!("Eterna"))]),
            recipe("Cinema", &[("FilmMode", json!("Eterna"))]),
        ];
        assert_eq!(tag_texts(&derive_tags(&record, &recipes, &())), vec!["Eterna"]);
    }

    #[test]
    fn parenthesized_extraction() {
        assert_eq!(parenthesized("Classic Chrome (CC)"), Some("CC"));
        assert_eq!(parenthesized("a ( b ) c (d)"), Some("b"));
        assert_eq!(parenthesized("no parens"), None);
        assert_eq!(parenthesized("open ( only"), None);
        assert_eq!(parenthesized("close ) only"), None);
        assert_eq!(parenthesized(") before ("), Some(""));
    }

    // =========================================================================
    // Advanced filter and saturation
    // =========================================================================

    #[test]
    fn advanced_filter_is_independent_of_naming() {
        let record = record(&[
            ("MakerNotes:FilmMode", json!("F0/Standard (Provia)")),
            ("MakerNotes:AdvancedFilter", json!("Toy Camera")),
        ]);
        assert_eq!(derive(&record), vec!["Provia", "ToyCamera"]);
    }

    #[test]
    fn blank_advanced_filter_adds_nothing() {
        for value in ["", "   "] {
            let record = record(&[("MakerNotes:AdvancedFilter", json!(value))]);
            assert!(derive(&record).is_empty(), "unexpected tag for {value:?}");
        }
    }

    #[test]
    fn advanced_filter_follows_recipe() {
        let record = record(&[
            ("MakerNotes:FilmMode", json!("Classic Chrome")),
            ("MakerNotes:AdvancedFilter", json!("Toy Camera")),
            ("MakerNotes:Saturation", json!("+2 (high)")),
        ]);
        let recipes = vec![recipe("Street", &[("FilmMode", json!("Classic Chrome"))])];
        let tags = derive_tags(&record, &recipes, &());
        assert_eq!(tag_texts(&tags), vec!["Street", "ToyCamera"]);
        assert_eq!(tags[0].kind, TagKind::Recipe);
        assert_eq!(tags[1].kind, TagKind::AdvancedFilter);
    }

    #[test]
    fn non_text_values_count_as_absent() {
        let record = record(&[
            ("MakerNotes:FilmMode", json!(2)),
            ("MakerNotes:AdvancedFilter", json!(7)),
            ("MakerNotes:Saturation", json!(-1)),
        ]);
        assert!(derive(&record).is_empty());
    }

    #[test]
    fn numeric_film_mode_leaves_room_for_saturation() {
        let record = record(&[
            ("MakerNotes:FilmMode", json!(0)),
            ("MakerNotes:Saturation", json!("Acros")),
        ]);
        assert_eq!(derive(&record), vec!["Acros"]);
    }

    #[test]
    fn normal_saturation_adds_nothing() {
        for value in ["0 (normal)", " 0 (Normal) ", ""] {
            let record = record(&[("MakerNotes:Saturation", json!(value))]);
            assert!(derive(&record).is_empty(), "unexpected tag for {value:?}");
        }
    }

    #[test]
    fn high_saturation_tag() {
        let record = record(&[("MakerNotes:Saturation", json!("+2 (high)"))]);
        let tags = derive_tags(&record, &[], &());
        assert_eq!(tag_texts(&tags), vec!["+2(high)"]);
        assert_eq!(tags[0].kind, TagKind::Saturation);
    }

    #[test]
    fn full_order() {
        let record = record(&[
            ("MakerNotes:Saturation", json!("Acros")),
            ("MakerNotes:AdvancedFilter", json!("Partial Color Red")),
            ("MakerNotes:SequenceNumber", json!(2)),
            ("MakerNotes:DriveMode", json!("Continuous Low")),
            ("MakerNotes:PictureMode", json!("HDR")),
        ]);
        let tags = derive_tags(&record, &[], &());
        assert_eq!(suffix(&tags), "_[HDR][CL02][PartialColorRed][Acros]");
    }

    // =========================================================================
    // exiftool fixtures
    // =========================================================================

    #[test]
    fn fixture_classic_chrome_skips_null_group() {
        let record = fixture_record("classic_chrome");
        assert_eq!(derive(&record), vec!["ClassicChrome"]);
    }

    #[test]
    fn fixture_velvia_burst() {
        let record = fixture_record("velvia_burst");
        assert_eq!(suffix(&derive_tags(&record, &[], &())), "_[CH04][Velvia]");
    }

    #[test]
    fn fixture_acros_uses_saturation() {
        let record = fixture_record("acros_grain");
        assert_eq!(derive(&record), vec!["AcrosRedFilter"]);
    }

    #[test]
    fn fixture_hdr_bracket() {
        let record = fixture_record("hdr_bracket");
        assert_eq!(derive(&record), vec!["HDR", "EB02", "Provia", "ToyCamera"]);
    }

    // =========================================================================
    // Events
    // =========================================================================

    #[test]
    fn reports_applied_tags_and_skipped_saturation() {
        let record = record(&[
            ("MakerNotes:FilmMode", json!("Eterna")),
            ("MakerNotes:Saturation", json!("+1 (medium high)")),
        ]);
        let (tx, rx) = mpsc::channel();
        derive_tags(&record, &[], &tx);
        let events: Vec<DeriveEvent> = rx.try_iter().collect();
        assert_eq!(
            events,
            vec![
                DeriveEvent::TagApplied {
                    kind: TagKind::FilmMode,
                    tag: "Eterna".to_string(),
                },
                DeriveEvent::SaturationSkipped,
            ]
        );
    }

    // =========================================================================
    // File names
    // =========================================================================

    #[test]
    fn new_file_name_keeps_extension_case() {
        let record = record(&[("MakerNotes:FilmMode", json!("Eterna"))]);
        assert_eq!(
            new_file_name("DSCF0001.JPG", &record, &[], &()),
            "DSCF0001_[Eterna].JPG"
        );
        assert_eq!(
            new_file_name("DSCF0001.raf", &record, &[], &()),
            "DSCF0001_[Eterna].raf"
        );
    }

    #[test]
    fn new_file_name_unchanged_without_tags() {
        let record = MetadataRecord::new();
        assert_eq!(new_file_name("DSCF0001.JPG", &record, &[], &()), "DSCF0001.JPG");
    }

    #[test]
    fn new_file_name_does_not_strip_previous_tags() {
        let record = record(&[("MakerNotes:FilmMode", json!("Eterna"))]);
        assert_eq!(
            new_file_name("DSCF0001_[Eterna].JPG", &record, &[], &()),
            "DSCF0001_[Eterna]_[Eterna].JPG"
        );
    }

    #[test]
    fn split_extension_cases() {
        assert_eq!(split_extension("DSCF0001.JPG"), ("DSCF0001", ".JPG"));
        assert_eq!(split_extension("archive.tar.gz"), ("archive.tar", ".gz"));
        assert_eq!(split_extension("noext"), ("noext", ""));
        assert_eq!(split_extension(".hidden"), (".hidden", ""));
        assert_eq!(split_extension("..x.jpg"), ("..x", ".jpg"));
        assert_eq!(split_extension("trailing."), ("trailing", "."));
    }
}
