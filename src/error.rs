//! Error types for the md-image-embed library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`EmbedError`] — **Fatal**: the operation cannot proceed at all
//!   (document missing, output already exists, settings file unreadable).
//!   Returned as `Err(EmbedError)` from the document-level functions in
//!   [`crate::convert`].
//!
//! * [`AssetError`] — **Non-fatal**: a single image reference could not be
//!   embedded. Stored inside [`crate::output::ReferenceOutcome::Failed`] so
//!   callers see every other reference converted rather than losing the whole
//!   document to one missing picture.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the md-image-embed library.
///
/// Reference-level failures use [`AssetError`] and are stored in
/// [`crate::output::ConversionReport`] rather than propagated here.
#[derive(Debug, Error)]
pub enum EmbedError {
    // ── Document errors ───────────────────────────────────────────────────
    /// The document does not exist in the vault.
    #[error("Document not found in vault: '{path}'")]
    DocumentNotFound { path: String },

    /// Only Markdown notes can be converted.
    #[error("Not a Markdown document: '{path}'\nOnly .md files can be converted.")]
    NotMarkdown { path: String },

    /// The document exists but could not be read as UTF-8 text.
    #[error("Failed to read document '{path}': {source}")]
    DocumentReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Save-as target is already present; existing notes are never overwritten.
    #[error("Output already exists: '{path}'\nRemove it or choose another --suffix.")]
    OutputExists { path: String },

    /// Could not create or write the output document.
    #[error("Failed to write output '{path}': {source}")]
    OutputWriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    // ── Vault errors ──────────────────────────────────────────────────────
    /// The vault root is missing or not a directory.
    #[error("Vault root is not a directory: '{path}'")]
    VaultNotFound { path: PathBuf },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A persisted settings file could not be read or parsed.
    #[error("Failed to load settings from '{path}': {detail}")]
    SettingsLoadFailed { path: PathBuf, detail: String },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single image reference.
///
/// Both variants surface to users with the same reason,
/// [`AssetError::REASON`]; the `Display` text keeps the detail for logs.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum AssetError {
    /// No vault file matched the reference by any resolution strategy.
    #[error("no asset matches '{reference}'")]
    NotFound { reference: String },

    /// The asset resolved but reading its bytes failed.
    #[error("reading '{path}' failed: {detail}")]
    ReadFailed { path: String, detail: String },
}

impl AssetError {
    /// User-facing reason shared by every variant.
    pub const REASON: &'static str = "File not found";

    pub fn reason(&self) -> &'static str {
        Self::REASON
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_exists_display() {
        let e = EmbedError::OutputExists {
            path: "notes/a_base64.md".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("notes/a_base64.md"), "got: {msg}");
        assert!(msg.contains("--suffix"));
    }

    #[test]
    fn not_markdown_display() {
        let e = EmbedError::NotMarkdown {
            path: "img/cat.png".into(),
        };
        assert!(e.to_string().contains("img/cat.png"));
    }

    #[test]
    fn asset_errors_share_reason() {
        let missing = AssetError::NotFound {
            reference: "nope.png".into(),
        };
        let unreadable = AssetError::ReadFailed {
            path: "a.png".into(),
            detail: "permission denied".into(),
        };
        assert_eq!(missing.reason(), "File not found");
        assert_eq!(unreadable.reason(), "File not found");
        assert!(unreadable.to_string().contains("permission denied"));
    }

    #[test]
    fn asset_error_serialises() {
        let e = AssetError::NotFound {
            reference: "x.png".into(),
        };
        let json = serde_json::to_string(&e).expect("serialise");
        assert!(json.contains("NotFound"), "got: {json}");
    }
}
