//! Progress-callback trait for per-reference conversion events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::EmbedSettingsBuilder::progress_callback`] to watch a
//! conversion as it happens: drive a progress bar, collect a log, or forward
//! events to a UI. Callbacks only observe; nothing they do can change what
//! gets converted.
//!
//! # Example
//!
//! ```rust
//! use md_image_embed::{ConversionProgressCallback, EmbedSettings, ReferenceOutcome};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct FailureCounter {
//!     failed: AtomicUsize,
//! }
//!
//! impl ConversionProgressCallback for FailureCounter {
//!     fn on_reference_complete(&self, _index: usize, _total: usize, outcome: &ReferenceOutcome) {
//!         if outcome.is_failed() {
//!             self.failed.fetch_add(1, Ordering::SeqCst);
//!         }
//!     }
//! }
//!
//! let settings = EmbedSettings::builder()
//!     .progress_callback(Arc::new(FailureCounter { failed: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use crate::output::ReferenceOutcome;
use std::sync::Arc;

/// Called by the conversion engine as it works through a note.
///
/// Within one note, events arrive strictly in scan order. When several notes
/// are converted at once (see [`crate::convert::convert_many`]) events of
/// different notes may interleave, so implementations must be `Send + Sync`.
/// All methods default to no-ops.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once after scanning, before any reference is processed.
    ///
    /// # Arguments
    /// * `document`         — vault path of the note
    /// * `total_references` — references found by the scanner
    fn on_conversion_start(&self, document: &str, total_references: usize) {
        let _ = (document, total_references);
    }

    /// Called once per reference as soon as its outcome is known.
    ///
    /// # Arguments
    /// * `index`   — 0-based position in scan order
    /// * `total`   — references in the note
    /// * `outcome` — what happened to the reference
    fn on_reference_complete(&self, index: usize, total: usize, outcome: &ReferenceOutcome) {
        let _ = (index, total, outcome);
    }

    /// Called once after every reference has an outcome.
    fn on_conversion_complete(&self, document: &str, converted: usize, skipped: usize) {
        let _ = (document, converted, skipped);
    }
}

/// A no-op implementation for callers that don't need events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::EmbedSettings`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl ConversionProgressCallback for Recorder {
        fn on_conversion_start(&self, document: &str, total: usize) {
            self.events.lock().unwrap().push(format!("start {document} {total}"));
        }

        fn on_reference_complete(&self, index: usize, total: usize, outcome: &ReferenceOutcome) {
            self.events
                .lock()
                .unwrap()
                .push(format!("{index}/{total} {}", outcome.path()));
        }

        fn on_conversion_complete(&self, document: &str, converted: usize, skipped: usize) {
            self.events
                .lock()
                .unwrap()
                .push(format!("done {document} {converted}+{skipped}"));
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_conversion_start("a.md", 1);
        cb.on_reference_complete(
            0,
            1,
            &ReferenceOutcome::SkippedRemote {
                path: "https://x/y.png".into(),
            },
        );
        cb.on_conversion_complete("a.md", 0, 1);
    }

    #[test]
    fn recorder_receives_events_in_order() {
        let rec = Arc::new(Recorder::default());
        let cb: ProgressCallback = rec.clone();
        cb.on_conversion_start("a.md", 2);
        cb.on_reference_complete(0, 2, &ReferenceOutcome::SkippedWikiDisabled { path: "p.png".into() });
        cb.on_reference_complete(1, 2, &ReferenceOutcome::SkippedRemote { path: "q.png".into() });
        cb.on_conversion_complete("a.md", 0, 2);

        let events = rec.events.lock().unwrap();
        assert_eq!(
            *events,
            vec!["start a.md 2", "0/2 p.png", "1/2 q.png", "done a.md 0+2"]
        );
    }
}
