//! Conversion entry points.
//!
//! [`convert`] is the engine: note text in, rewritten text plus a
//! per-reference report out. It never fails. A reference that cannot be
//! embedded is recorded as an outcome and its text is left as it was.
//!
//! The document-level functions wrap it with the store operations a caller
//! needs around it: read the note ([`convert_document`]), write the result
//! next to it ([`save_as`]), or do either for many notes ([`convert_many`]).
//! Those can fail, and return [`EmbedError`] when the note itself is the
//! problem.

use crate::config::EmbedSettings;
use crate::error::{AssetError, EmbedError};
use crate::output::{ConversionReport, ImageStats, ReferenceOutcome, SavedDocument};
use crate::pipeline::{encode, resolve, scan};
use crate::pipeline::scan::{ImageReference, ReferenceKind};
use crate::vault::{parent_folder, VaultStore};
use futures::stream::{self, StreamExt};
use std::io;
use std::ops::Range;
use tracing::{debug, info, warn};

/// Embed every local image referenced by a note as a data URI.
///
/// # Arguments
/// * `store`         — vault the images are read from (never written)
/// * `text`          — the note's full text
/// * `document_path` — vault path of the note, used for relative lookups
/// * `settings`      — skip policy and logging switches
///
/// References are processed strictly one at a time in scan order. Replacement
/// is by recorded span, so two identical references are each rewritten
/// exactly once.
pub async fn convert(
    store: &dyn VaultStore,
    text: &str,
    document_path: &str,
    settings: &EmbedSettings,
) -> ConversionReport {
    let references = scan::scan_references(text);
    let total = references.len();
    debug!("Found {} image references in {}", total, document_path);

    if let Some(ref cb) = settings.progress_callback {
        cb.on_conversion_start(document_path, total);
    }

    let mut outcomes = Vec::with_capacity(total);
    let mut replacements: Vec<(Range<usize>, String)> = Vec::new();

    for (index, reference) in references.iter().enumerate() {
        let (outcome, replacement) = process_reference(store, reference, document_path, settings).await;

        if settings.show_detailed_log {
            match outcome.reason() {
                None => info!("✓ {}", outcome.path()),
                Some(reason) => info!("✗ {} ({})", outcome.path(), reason),
            }
        }
        if let Some(ref cb) = settings.progress_callback {
            cb.on_reference_complete(index, total, &outcome);
        }

        if let Some(new_text) = replacement {
            replacements.push((reference.span.clone(), new_text));
        }
        outcomes.push(outcome);
    }

    let converted_count = outcomes.iter().filter(|o| o.is_converted()).count();
    let skipped_count = total - converted_count;

    if settings.show_conversion_log {
        info!(
            "{}: {} images converted, {} skipped",
            document_path, converted_count, skipped_count
        );
    }
    if let Some(ref cb) = settings.progress_callback {
        cb.on_conversion_complete(document_path, converted_count, skipped_count);
    }

    ConversionReport {
        content: splice(text, &replacements),
        converted_count,
        skipped_count,
        outcomes,
    }
}

/// Blocking wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally; do not call from inside one.
pub fn convert_sync(
    store: &dyn VaultStore,
    text: &str,
    document_path: &str,
    settings: &EmbedSettings,
) -> Result<ConversionReport, EmbedError> {
    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| EmbedError::Internal(format!("Failed to create tokio runtime: {e}")))?;
    Ok(runtime.block_on(convert(store, text, document_path, settings)))
}

/// Read a note from the vault and convert it.
///
/// # Errors
/// - [`EmbedError::NotMarkdown`] for anything but a `.md` note
/// - [`EmbedError::DocumentNotFound`] / [`EmbedError::DocumentReadFailed`]
pub async fn convert_document(
    store: &dyn VaultStore,
    document_path: &str,
    settings: &EmbedSettings,
) -> Result<ConversionReport, EmbedError> {
    if !is_markdown(document_path) {
        return Err(EmbedError::NotMarkdown {
            path: document_path.to_string(),
        });
    }
    let text = store
        .read(document_path)
        .await
        .map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => EmbedError::DocumentNotFound {
                path: document_path.to_string(),
            },
            _ => EmbedError::DocumentReadFailed {
                path: document_path.to_string(),
                source: e,
            },
        })?;
    Ok(convert(store, &text, document_path, settings).await)
}

/// Convert a note and store the result as a new note beside it.
///
/// The new note is named `<prefix><basename><suffix>.md` (see
/// [`save_as_path`]). An existing note at that path is never overwritten.
pub async fn save_as(
    store: &dyn VaultStore,
    document_path: &str,
    settings: &EmbedSettings,
) -> Result<SavedDocument, EmbedError> {
    settings.validate()?;
    let report = convert_document(store, document_path, settings).await?;
    let path = save_as_path(document_path, settings);

    store
        .create(&path, &report.content)
        .await
        .map_err(|e| match e.kind() {
            io::ErrorKind::AlreadyExists => EmbedError::OutputExists { path: path.clone() },
            _ => EmbedError::OutputWriteFailed {
                path: path.clone(),
                source: e,
            },
        })?;

    info!("Saved {} ({} images converted)", path, report.converted_count);
    Ok(SavedDocument { path, report })
}

/// Vault path save-as writes to: same folder, templated file name.
///
/// `notes/trip.md` with suffix `_base64` → `notes/trip_base64.md`.
pub fn save_as_path(document_path: &str, settings: &EmbedSettings) -> String {
    let file_name = document_path.rsplit('/').next().unwrap_or(document_path);
    let base_name = match file_name.rsplit_once('.') {
        Some((stem, ext)) if ext.eq_ignore_ascii_case("md") => stem,
        _ => file_name,
    };
    let new_name = format!(
        "{}{}{}.md",
        settings.file_prefix,
        base_name,
        settings.effective_suffix()
    );
    match parent_folder(document_path) {
        Some(folder) => format!("{folder}/{new_name}"),
        None => new_name,
    }
}

/// Convert several notes, at most `concurrency` at once.
///
/// Each note is still processed reference by reference; only separate notes
/// overlap. Results come back in the order of `document_paths`.
pub async fn convert_many(
    store: &dyn VaultStore,
    document_paths: &[String],
    settings: &EmbedSettings,
    concurrency: usize,
) -> Vec<Result<ConversionReport, EmbedError>> {
    stream::iter(document_paths.iter().map(|path| convert_document(store, path, settings)))
        .buffered(concurrency.max(1))
        .collect()
        .await
}

/// Count a note's image references by class, without touching the vault.
pub fn inspect(text: &str) -> ImageStats {
    let mut stats = ImageStats::default();
    for reference in scan::scan_references(text) {
        stats.total += 1;
        if reference.is_wiki() {
            stats.wiki += 1;
        } else if is_embedded(&reference.raw) {
            stats.embedded += 1;
        } else if is_remote(&reference.raw) {
            stats.remote += 1;
        } else {
            stats.local += 1;
        }
    }
    stats
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Classify one reference and, if it should be embedded, embed it.
///
/// Returns the outcome and the replacement text for converted references.
async fn process_reference(
    store: &dyn VaultStore,
    reference: &ImageReference,
    document_path: &str,
    settings: &EmbedSettings,
) -> (ReferenceOutcome, Option<String>) {
    let raw = reference.raw.as_str();

    let alt = match &reference.kind {
        ReferenceKind::Markdown { alt } => {
            if settings.skip_base64_images && is_embedded(raw) {
                debug!("Skipping already embedded image '{}'", alt);
                return (
                    ReferenceOutcome::SkippedAlreadyEmbedded { path: alt.clone() },
                    None,
                );
            }
            if is_remote(raw) {
                debug!("Skipping network image {}", raw);
                return (
                    ReferenceOutcome::SkippedRemote {
                        path: raw.to_string(),
                    },
                    None,
                );
            }
            alt.as_str()
        }
        ReferenceKind::Wiki => {
            if !settings.convert_wiki_links {
                debug!("Skipping wiki link {}", raw);
                return (
                    ReferenceOutcome::SkippedWikiDisabled {
                        path: raw.to_string(),
                    },
                    None,
                );
            }
            // Wiki links become markdown links titled by the file name.
            raw
        }
    };

    match embed(store, raw, document_path).await {
        Ok((asset, uri)) => (
            ReferenceOutcome::Converted {
                path: raw.to_string(),
                asset,
            },
            Some(format!("![{alt}]({uri})")),
        ),
        Err(error) => {
            warn!("Image not embedded: {} ({})", raw, error);
            (
                ReferenceOutcome::Failed {
                    path: raw.to_string(),
                    error,
                },
                None,
            )
        }
    }
}

/// Resolve, read and encode one reference. Returns the asset path and URI.
async fn embed(
    store: &dyn VaultStore,
    raw: &str,
    document_path: &str,
) -> Result<(String, String), AssetError> {
    let resolved = resolve::resolve_asset(store, raw, document_path)
        .await
        .ok_or_else(|| AssetError::NotFound {
            reference: raw.to_string(),
        })?;
    let asset = resolved.asset;

    let bytes = store
        .read_binary(&asset)
        .await
        .map_err(|e| AssetError::ReadFailed {
            path: asset.path().to_string(),
            detail: e.to_string(),
        })?;

    let uri = encode::data_uri(&bytes, asset.extension());
    Ok((asset.path().to_string(), uri))
}

/// Rebuild `text` with each span replaced. Spans are ordered and disjoint.
fn splice(text: &str, replacements: &[(Range<usize>, String)]) -> String {
    if replacements.is_empty() {
        return text.to_string();
    }
    let extra: usize = replacements.iter().map(|(_, r)| r.len()).sum();
    let mut out = String::with_capacity(text.len() + extra);
    let mut cursor = 0;
    for (span, new_text) in replacements {
        out.push_str(&text[cursor..span.start]);
        out.push_str(new_text);
        cursor = span.end;
    }
    out.push_str(&text[cursor..]);
    out
}

fn is_embedded(raw: &str) -> bool {
    raw.starts_with("data:image")
}

fn is_remote(raw: &str) -> bool {
    raw.starts_with("http://") || raw.starts_with("https://")
}

fn is_markdown(path: &str) -> bool {
    path.rsplit('/')
        .next()
        .and_then(|name| name.rsplit_once('.'))
        .is_some_and(|(stem, ext)| !stem.is_empty() && ext.eq_ignore_ascii_case("md"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vault::MemoryVault;

    const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

    fn png_uri() -> String {
        encode::data_uri(PNG, "png")
    }

    #[test]
    fn splice_replaces_by_span() {
        let text = "a XX b XX c";
        let out = splice(text, &[(2..4, "1".into()), (7..9, "22".into())]);
        assert_eq!(out, "a 1 b 22 c");
        assert_eq!(splice(text, &[]), text);
    }

    #[test]
    fn save_as_path_templates() {
        let s = EmbedSettings::default();
        assert_eq!(save_as_path("notes/trip.md", &s), "notes/trip_base64.md");
        assert_eq!(save_as_path("trip.md", &s), "trip_base64.md");

        let s = EmbedSettings::builder()
            .file_prefix("share-")
            .file_suffix("_x")
            .build()
            .unwrap();
        assert_eq!(save_as_path("a/b/c.md", &s), "a/b/share-c_x.md");
    }

    #[test]
    fn save_as_path_strips_extension_in_any_case() {
        let s = EmbedSettings::default();
        assert_eq!(save_as_path("notes/Trip.Md", &s), "notes/Trip_base64.md");
        assert_eq!(save_as_path("TRIP.MD", &s), "TRIP_base64.md");
        assert_eq!(save_as_path("v1.2.md", &s), "v1.2_base64.md");
    }

    #[tokio::test]
    async fn save_as_rejects_unbuilt_separator_suffix() {
        let vault = MemoryVault::new().with_text("notes/a.md", "text");
        let mut settings = EmbedSettings::default();
        settings.file_suffix = "x/../../y".into();

        let err = save_as(&vault, "notes/a.md", &settings).await.unwrap_err();
        assert!(matches!(err, EmbedError::InvalidConfig(_)));
        assert!(vault.find_by_path("y.md").await.is_none());
    }

    #[test]
    fn markdown_detection() {
        assert!(is_markdown("notes/a.md"));
        assert!(is_markdown("A.MD"));
        assert!(!is_markdown("img/a.png"));
        assert!(!is_markdown("notes/.md"));
        assert!(!is_markdown("README"));
    }

    #[test]
    fn inspect_counts_classes() {
        let text = "![a](x.png) ![b](https://e.com/y.png) ![[z.gif]] ![c](data:image/png;base64,AA)";
        let stats = inspect(text);
        assert_eq!(
            stats,
            ImageStats {
                total: 4,
                embedded: 1,
                remote: 1,
                wiki: 1,
                local: 1,
            }
        );
    }

    #[tokio::test]
    async fn duplicate_references_each_rewritten_once() {
        let vault = MemoryVault::new().with_file("img/a.png", PNG);
        let text = "![a](img/a.png)\n![a](img/a.png)\n";
        let report = convert(&vault, text, "note.md", &EmbedSettings::default()).await;
        let uri = png_uri();
        assert_eq!(report.content, format!("![a]({uri})\n![a]({uri})\n"));
        assert_eq!(report.converted_count, 2);
    }

    #[tokio::test]
    async fn duplicate_text_after_failed_reference_is_untouched() {
        let vault = MemoryVault::new().with_file("img/a.png", PNG);
        let text = "![x](missing.png) ![a](img/a.png) ![x](missing.png)";
        let report = convert(&vault, text, "note.md", &EmbedSettings::default()).await;
        assert_eq!(
            report.content,
            format!("![x](missing.png) ![a]({}) ![x](missing.png)", png_uri())
        );
        assert_eq!(report.skipped_count, 2);
        assert_eq!(report.failed_count(), 2);
    }

    #[tokio::test]
    async fn keep_base64_sends_data_uri_to_resolution() {
        let vault = MemoryVault::new();
        let settings = EmbedSettings::builder()
            .skip_base64_images(false)
            .build()
            .unwrap();
        let text = "![x](data:image/png;base64,AAAA)";
        let report = convert(&vault, text, "n.md", &settings).await;
        assert_eq!(report.content, text);
        assert!(report.outcomes[0].is_failed());
    }

    #[tokio::test]
    async fn unreadable_asset_folds_into_file_not_found() {
        struct BrokenReads(MemoryVault);

        #[async_trait::async_trait]
        impl VaultStore for BrokenReads {
            async fn read(&self, path: &str) -> io::Result<String> {
                self.0.read(path).await
            }
            async fn read_binary(&self, _: &crate::vault::AssetHandle) -> io::Result<Vec<u8>> {
                Err(io::Error::new(io::ErrorKind::PermissionDenied, "locked"))
            }
            async fn find_by_path(&self, path: &str) -> Option<crate::vault::AssetHandle> {
                self.0.find_by_path(path).await
            }
            async fn resolve_link(
                &self,
                link: &str,
                source: &str,
            ) -> Option<crate::vault::AssetHandle> {
                self.0.resolve_link(link, source).await
            }
            async fn create(&self, path: &str, content: &str) -> io::Result<()> {
                self.0.create(path, content).await
            }
        }

        let vault = BrokenReads(MemoryVault::new().with_file("a.png", PNG));
        let report = convert(&vault, "![a](a.png)", "n.md", &EmbedSettings::default()).await;
        let outcome = &report.outcomes[0];
        assert_eq!(outcome.reason(), Some("File not found"));
        assert!(matches!(
            outcome,
            ReferenceOutcome::Failed {
                error: AssetError::ReadFailed { .. },
                ..
            }
        ));
        assert_eq!(report.content, "![a](a.png)");
    }

    #[tokio::test]
    async fn convert_document_rejects_non_markdown() {
        let vault = MemoryVault::new().with_file("a.png", PNG);
        let err = convert_document(&vault, "a.png", &EmbedSettings::default())
            .await
            .unwrap_err();
        assert!(matches!(err, EmbedError::NotMarkdown { .. }));

        let err = convert_document(&vault, "missing.md", &EmbedSettings::default())
            .await
            .unwrap_err();
        assert!(matches!(err, EmbedError::DocumentNotFound { .. }));
    }

    #[test]
    fn convert_sync_runs_outside_runtime() {
        let vault = MemoryVault::new().with_file("a.png", PNG);
        let report = convert_sync(&vault, "![[a.png]]", "n.md", &EmbedSettings::default()).unwrap();
        assert_eq!(report.content, format!("![a.png]({})", png_uri()));
    }
}
