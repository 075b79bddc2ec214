//! Diagnostic events emitted while deriving tags.
//!
//! The derivation engine is pure: it never writes to stdout or a logger
//! directly. Every recipe comparison and every applied tag is reported as a
//! [`DeriveEvent`] to a caller-supplied [`DeriveObserver`]. Observers only
//! watch; nothing they do can change the derived name.
//!
//! Three observers ship with the crate:
//!
//! - `()` discards everything.
//! - [`std::sync::mpsc::Sender<DeriveEvent>`] forwards events to a channel,
//!   the same way process progress is streamed to a printer thread.
//! - [`TracingObserver`] writes each event to the `tracing` log, formatted by
//!   [`crate::output::format_derive_event`].

use crate::tags::TagKind;
use serde_json::Value;
use std::sync::mpsc::Sender;

#[derive(Debug, Clone, PartialEq)]
pub enum DeriveEvent {
    /// One setting of a recipe compared against the metadata.
    RecipeCheck {
        recipe: String,
        tag: String,
        expected: Value,
        /// `None` when the tag is not present in the metadata.
        actual: Option<Value>,
        matched: bool,
    },
    /// A recipe had no usable `settings` object and was passed over.
    RecipeSkipped { recipe: String },
    /// Every setting of this recipe matched.
    RecipeMatched { recipe: String },
    TagApplied { kind: TagKind, tag: String },
    /// A recipe or film-mode tag suppressed the saturation tag.
    SaturationSkipped,
}

/// Receives [`DeriveEvent`]s.
///
/// `Sync` so one observer can be shared by a parallel batch run.
pub trait DeriveObserver: Sync {
    fn observe(&self, event: DeriveEvent);
}

impl DeriveObserver for () {
    fn observe(&self, _event: DeriveEvent) {}
}

impl DeriveObserver for Sender<DeriveEvent> {
    fn observe(&self, event: DeriveEvent) {
        // A dropped receiver just means nobody is listening any more.
        let _ = self.send(event);
    }
}

/// Logs events through `tracing`: matches at info, everything else at debug.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl DeriveObserver for TracingObserver {
    fn observe(&self, event: DeriveEvent) {
        let line = crate::output::format_derive_event(&event);
        match event {
            DeriveEvent::RecipeMatched { .. } => tracing::info!("{line}"),
            DeriveEvent::RecipeSkipped { .. } => tracing::warn!("{line}"),
            _ => tracing::debug!("{line}"),
        }
    }
}
