//! Reference scanning: find every image reference in a note.
//!
//! Two syntaxes are recognised by one combined, case-insensitive pattern:
//!
//! ```text
//! ![alt](path)        ![alt](<path with spaces>)      markdown form
//! ![[name.png]]                                        wiki form
//! ```
//!
//! Scanning is purely syntactic. `data:` URIs and `http(s)://` links are
//! still returned as references; deciding what to do with them is the
//! engine's job.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::ops::Range;

/// Image extensions the wiki form accepts.
pub const WIKI_IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "svg", "bmp"];

static RE_IMAGE_REFERENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)!\[([^\]]*)\]\(<?([^)\x22>]+)>?\)|!\[\[([^\]]+\.(?:png|jpg|jpeg|gif|webp|svg|bmp))\]\]",
    )
    .unwrap()
});

/// Which syntax a reference was written in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceKind {
    /// `![alt](path)`
    Markdown { alt: String },
    /// `![[name.ext]]`
    Wiki,
}

/// One image reference located in the note text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    /// Byte span of the whole match in the scanned text.
    pub span: Range<usize>,
    pub kind: ReferenceKind,
    /// Path or name exactly as written (angle brackets already stripped by
    /// the pattern when they wrapped the whole path).
    pub raw: String,
}

impl ImageReference {
    /// The matched text, sliced from the note it was scanned from.
    pub fn source<'t>(&self, text: &'t str) -> &'t str {
        &text[self.span.clone()]
    }

    pub fn is_wiki(&self) -> bool {
        matches!(self.kind, ReferenceKind::Wiki)
    }

    /// Alt text of a markdown reference; `None` for wiki links.
    pub fn alt(&self) -> Option<&str> {
        match &self.kind {
            ReferenceKind::Markdown { alt } => Some(alt),
            ReferenceKind::Wiki => None,
        }
    }
}

/// Scan `text` for image references, left to right, non-overlapping.
pub fn scan_references(text: &str) -> Vec<ImageReference> {
    RE_IMAGE_REFERENCE
        .captures_iter(text)
        .filter_map(|caps| to_reference(&caps))
        .collect()
}

fn to_reference(caps: &Captures<'_>) -> Option<ImageReference> {
    let whole = caps.get(0)?;
    let span = whole.start()..whole.end();

    if let Some(name) = caps.get(3) {
        return Some(ImageReference {
            span,
            kind: ReferenceKind::Wiki,
            raw: name.as_str().to_string(),
        });
    }

    Some(ImageReference {
        span,
        kind: ReferenceKind::Markdown {
            alt: caps.get(1).map_or("", |m| m.as_str()).to_string(),
        },
        raw: caps.get(2)?.as_str().to_string(),
    })
}
