//! Path resolution: which vault file does a reference designate?
//!
//! Notes written in different tools spell image paths differently: relative
//! to the vault root, relative to the note, or as a bare file name that the
//! editor finds anywhere in the vault. Three strategies are tried in strict
//! priority order and the first hit wins:
//!
//! 1. [`Strategy::VaultRoot`]      — the path as given, from the vault root
//! 2. [`Strategy::RelativeToNote`] — the path joined onto the note's folder
//! 3. [`Strategy::LinkResolution`] — the store's own link-name lookup
//!
//! Before any lookup the raw reference is cleaned (stray `<`/`>` and
//! surrounding whitespace removed) and percent-decoded, so `my%20pic.png`
//! finds `my pic.png`. A malformed escape is not an error: the undecoded
//! string is used instead.

use crate::vault::{parent_folder, AssetHandle, VaultStore};
use percent_encoding::percent_decode_str;
use tracing::debug;

/// The strategy that located an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    VaultRoot,
    RelativeToNote,
    LinkResolution,
}

/// An asset together with the strategy that found it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAsset {
    pub asset: AssetHandle,
    pub strategy: Strategy,
}

/// Resolve `raw` as written in the note at `document_path`.
///
/// Returns `None` when no strategy matches. Never fails otherwise.
pub async fn resolve_asset(
    store: &dyn VaultStore,
    raw: &str,
    document_path: &str,
) -> Option<ResolvedAsset> {
    let cleaned = clean_reference(raw);
    let path = decode_reference(cleaned);

    if let Some(asset) = store.find_by_path(&path).await {
        return Some(found(asset, Strategy::VaultRoot));
    }

    if let Some(folder) = parent_folder(document_path) {
        let relative = format!("{folder}/{path}");
        if let Some(asset) = store.find_by_path(&relative).await {
            return Some(found(asset, Strategy::RelativeToNote));
        }
    }

    if let Some(asset) = store.resolve_link(&path, document_path).await {
        return Some(found(asset, Strategy::LinkResolution));
    }

    debug!("No asset for '{}' from '{}'", path, document_path);
    None
}

fn found(asset: AssetHandle, strategy: Strategy) -> ResolvedAsset {
    debug!("Resolved '{}' via {:?}", asset.path(), strategy);
    ResolvedAsset { asset, strategy }
}

/// Drop one leading `<`, one trailing `>`, then surrounding whitespace.
pub fn clean_reference(raw: &str) -> &str {
    let s = raw.strip_prefix('<').unwrap_or(raw);
    let s = s.strip_suffix('>').unwrap_or(s);
    s.trim()
}

/// Percent-decode a reference, falling back to the input unchanged when an
/// escape is malformed or the decoded bytes are not UTF-8.
pub fn decode_reference(cleaned: &str) -> String {
    if has_malformed_escape(cleaned) {
        debug!("Malformed percent-escape in '{}', using it undecoded", cleaned);
        return cleaned.to_string();
    }
    percent_decode_str(cleaned)
        .decode_utf8()
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| cleaned.to_string())
}

fn has_malformed_escape(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.iter().enumerate().any(|(i, &b)| {
        b == b'%'
            && !(bytes.get(i + 1).is_some_and(u8::is_ascii_hexdigit)
                && bytes.get(i + 2).is_some_and(u8::is_ascii_hexdigit))
    })
}
