//! The vault: hierarchical storage holding notes and their image assets.
//!
//! The conversion engine never touches the disk directly. It talks to a
//! [`VaultStore`], which answers four questions: what text is in this note,
//! which bytes are in this asset, is there a file at exactly this path, and
//! which file does a bare link name point at from a given note.
//!
//! Two implementations ship with the crate:
//!
//! * [`FsVault`]     — a directory on disk (an Obsidian vault folder)
//! * [`MemoryVault`] — an in-memory map, for embedding and tests
//!
//! Vault paths are always `/`-separated and relative to the vault root,
//! e.g. `notes/travel.md` or `attachments/cat.png`.

mod fs;
mod memory;

pub use fs::FsVault;
pub use memory::MemoryVault;

use async_trait::async_trait;
use std::io;

/// A resolved binary asset inside the vault.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssetHandle {
    path: String,
}

impl AssetHandle {
    /// Wrap an already-normalised vault path.
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    /// Vault-relative path of the asset.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// File name without its folder.
    pub fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// Extension after the last dot of the file name, as written.
    ///
    /// Empty for names without a dot and for dot-files such as `.hidden`.
    pub fn extension(&self) -> &str {
        match self.name().rfind('.') {
            Some(0) | None => "",
            Some(i) => &self.name()[i + 1..],
        }
    }
}

/// Storage the conversion engine reads from (and save-as writes to).
///
/// Lookups return `Option`: a missing file is a routine answer, not an error.
/// Reads return `io::Result` so callers can attach their own context.
#[async_trait]
pub trait VaultStore: Send + Sync {
    /// Full text of a note.
    async fn read(&self, path: &str) -> io::Result<String>;

    /// Raw bytes of an asset.
    async fn read_binary(&self, asset: &AssetHandle) -> io::Result<Vec<u8>>;

    /// Exact lookup from the vault root. Folders never match.
    async fn find_by_path(&self, path: &str) -> Option<AssetHandle>;

    /// Link-name lookup scoped to the note at `source_path`.
    ///
    /// Mirrors how wiki links resolve: `cat.png` finds `attachments/cat.png`
    /// even though the note never spelled out the folder.
    async fn resolve_link(&self, link: &str, source_path: &str) -> Option<AssetHandle>;

    /// Create a new note. Fails with `AlreadyExists` rather than overwrite.
    async fn create(&self, path: &str, content: &str) -> io::Result<()>;
}

/// Normalise a vault path.
///
/// Backslashes become `/`, a leading `/` or `./` is dropped, empty and `.`
/// segments vanish and `..` pops its parent. Returns `None` for a path that
/// is empty after normalisation or that climbs above the vault root.
pub fn normalize_path(raw: &str) -> Option<String> {
    let unified = raw.replace('\\', "/");
    let mut segments: Vec<&str> = Vec::new();
    for segment in unified.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            s => segments.push(s),
        }
    }
    if segments.is_empty() {
        None
    } else {
        Some(segments.join("/"))
    }
}

/// Folder part of a vault path, or `None` for files at the root.
pub fn parent_folder(path: &str) -> Option<&str> {
    match path.rfind('/') {
        Some(0) | None => None,
        Some(i) => Some(&path[..i]),
    }
}

/// Pick the file a bare link name designates.
///
/// Candidates are vault files whose path equals `link` or ends with
/// `/` + `link`, compared ASCII case-insensitively. A candidate in the source
/// note's own folder wins; otherwise the shortest path wins, ties broken
/// lexicographically.
pub fn pick_link_target<'a, I>(files: I, link: &str, source_path: &str) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let link = normalize_path(link)?;
    let source_folder = parent_folder(source_path);

    let mut best: Option<&str> = None;
    for file in files {
        if !matches_link(file, &link) {
            continue;
        }
        let local = match source_folder {
            Some(folder) => parent_folder(file) == Some(folder),
            None => file.len() == link.len(),
        };
        if local {
            return Some(file.to_string());
        }
        best = match best {
            Some(b) if (b.len(), b) <= (file.len(), file) => Some(b),
            _ => Some(file),
        };
    }
    best.map(str::to_string)
}

/// `file` is `link` itself or ends with `/` + `link`, ignoring ASCII case.
fn matches_link(file: &str, link: &str) -> bool {
    let Some(start) = file.len().checked_sub(link.len()) else {
        return false;
    };
    file.is_char_boundary(start)
        && file[start..].eq_ignore_ascii_case(link)
        && (start == 0 || file.as_bytes()[start - 1] == b'/')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_and_resolves() {
        assert_eq!(normalize_path("/a/b.png").as_deref(), Some("a/b.png"));
        assert_eq!(normalize_path("./a//b.png").as_deref(), Some("a/b.png"));
        assert_eq!(normalize_path("a/x/../b.png").as_deref(), Some("a/b.png"));
        assert_eq!(normalize_path("a\\b.png").as_deref(), Some("a/b.png"));
        assert_eq!(normalize_path("../b.png"), None);
        assert_eq!(normalize_path(""), None);
        assert_eq!(normalize_path("/"), None);
    }

    #[test]
    fn parent_folder_of_root_file_is_none() {
        assert_eq!(parent_folder("note.md"), None);
        assert_eq!(parent_folder("a/b/note.md"), Some("a/b"));
    }

    #[test]
    fn asset_extension_and_name() {
        let a = AssetHandle::new("img/Cat.PNG");
        assert_eq!(a.name(), "Cat.PNG");
        assert_eq!(a.extension(), "PNG");
        assert_eq!(AssetHandle::new("img/raw").extension(), "");
        assert_eq!(AssetHandle::new(".hidden").extension(), "");
    }

    #[test]
    fn link_target_prefers_same_folder() {
        let files = ["a/cat.png", "notes/cat.png", "cat.png"];
        let got = pick_link_target(files, "cat.png", "notes/trip.md");
        assert_eq!(got.as_deref(), Some("notes/cat.png"));
    }

    #[test]
    fn link_target_falls_back_to_shortest() {
        let files = ["deep/er/cat.png", "zz/cat.png", "aa/cat.png"];
        let got = pick_link_target(files, "cat.png", "notes/trip.md");
        assert_eq!(got.as_deref(), Some("aa/cat.png"));
    }

    #[test]
    fn link_target_ignores_partial_names() {
        let files = ["img/bobcat.png"];
        assert_eq!(pick_link_target(files, "cat.png", "trip.md"), None);
    }

    #[test]
    fn link_target_ignores_case() {
        let files = ["attachments/cat.png", "notes/trip.md"];
        assert_eq!(
            pick_link_target(files, "Cat.PNG", "notes/trip.md").as_deref(),
            Some("attachments/cat.png")
        );
        assert_eq!(
            pick_link_target(["Cat.png"], "cat.png", "trip.md").as_deref(),
            Some("Cat.png")
        );
    }
}
