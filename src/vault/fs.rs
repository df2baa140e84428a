use super::{normalize_path, parent_folder, pick_link_target, AssetHandle, VaultStore};
use crate::error::EmbedError;
use async_trait::async_trait;
use jwalk::WalkDir;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A vault backed by a directory on disk.
///
/// Hidden entries (`.obsidian/`, `.trash/`, …) are skipped when resolving
/// link names, matching what the note editor shows.
#[derive(Debug, Clone)]
pub struct FsVault {
    root: PathBuf,
}

impl FsVault {
    /// Open the vault rooted at `root`, which must be an existing directory.
    pub fn open(root: impl AsRef<Path>) -> Result<Self, EmbedError> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(EmbedError::VaultNotFound {
                path: root.to_path_buf(),
            });
        }
        let root = root
            .canonicalize()
            .map_err(|_| EmbedError::VaultNotFound {
                path: root.to_path_buf(),
            })?;
        debug!("Opened vault at {}", root.display());
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Turn a file-system path into a vault path.
    ///
    /// Relative paths are taken relative to the current directory. Returns
    /// `None` when the path does not lie inside the vault.
    pub fn vault_path_of(&self, fs_path: impl AsRef<Path>) -> Option<String> {
        let fs_path = fs_path.as_ref();
        let absolute = if fs_path.is_absolute() {
            fs_path.to_path_buf()
        } else {
            std::env::current_dir().ok()?.join(fs_path)
        };
        let absolute = absolute.canonicalize().unwrap_or(absolute);
        let relative = absolute.strip_prefix(&self.root).ok()?;
        let joined = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        normalize_path(&joined)
    }

    fn full_path(&self, vault_path: &str) -> PathBuf {
        vault_path
            .split('/')
            .fold(self.root.clone(), |acc, segment| acc.join(segment))
    }

    /// Every regular file in the vault, as vault paths.
    async fn list_files(&self) -> io::Result<Vec<String>> {
        let root = self.root.clone();
        tokio::task::spawn_blocking(move || {
            WalkDir::new(&root)
                .skip_hidden(true)
                .into_iter()
                .filter_map(|entry| entry.ok())
                .filter(|entry| entry.file_type().is_file())
                .filter_map(|entry| {
                    let path = entry.path();
                    let relative = path.strip_prefix(&root).ok()?;
                    let joined = relative
                        .components()
                        .map(|c| c.as_os_str().to_string_lossy())
                        .collect::<Vec<_>>()
                        .join("/");
                    Some(joined)
                })
                .collect()
        })
        .await
        .map_err(|e| io::Error::other(format!("vault walk panicked: {e}")))
    }
}

#[async_trait]
impl VaultStore for FsVault {
    async fn read(&self, path: &str) -> io::Result<String> {
        let vault_path = normalize_path(path).ok_or_else(|| invalid_path(path))?;
        tokio::fs::read_to_string(self.full_path(&vault_path)).await
    }

    async fn read_binary(&self, asset: &AssetHandle) -> io::Result<Vec<u8>> {
        let vault_path = normalize_path(asset.path()).ok_or_else(|| invalid_path(asset.path()))?;
        tokio::fs::read(self.full_path(&vault_path)).await
    }

    async fn find_by_path(&self, path: &str) -> Option<AssetHandle> {
        let vault_path = normalize_path(path)?;
        match tokio::fs::metadata(self.full_path(&vault_path)).await {
            Ok(meta) if meta.is_file() => Some(AssetHandle::new(vault_path)),
            _ => None,
        }
    }

    async fn resolve_link(&self, link: &str, source_path: &str) -> Option<AssetHandle> {
        let files = match self.list_files().await {
            Ok(files) => files,
            Err(e) => {
                warn!("Could not list vault files: {}", e);
                return None;
            }
        };
        pick_link_target(files.iter().map(String::as_str), link, source_path).map(AssetHandle::new)
    }

    async fn create(&self, path: &str, content: &str) -> io::Result<()> {
        let vault_path = normalize_path(path).ok_or_else(|| invalid_path(path))?;
        let target = self.full_path(&vault_path);
        if tokio::fs::try_exists(&target).await? {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("'{vault_path}' already exists"),
            ));
        }

        let dir = match parent_folder(&vault_path) {
            Some(folder) => self.full_path(folder),
            None => self.root.clone(),
        };
        tokio::fs::create_dir_all(&dir).await?;

        // Temp file in the target folder, then a no-clobber persist: readers
        // never observe a half-written note.
        let content = content.to_owned();
        tokio::task::spawn_blocking(move || {
            let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
            tmp.write_all(content.as_bytes())?;
            tmp.persist_noclobber(&target).map_err(|e| e.error)?;
            Ok(())
        })
        .await
        .map_err(|e| io::Error::other(format!("write task panicked: {e}")))?
    }
}

fn invalid_path(path: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidInput,
        format!("'{path}' is not a path inside the vault"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn vault_with(files: &[(&str, &[u8])]) -> (TempDir, FsVault) {
        let dir = TempDir::new().unwrap();
        for (path, bytes) in files {
            let full = dir.path().join(path);
            std::fs::create_dir_all(full.parent().unwrap()).unwrap();
            std::fs::write(full, bytes).unwrap();
        }
        let vault = FsVault::open(dir.path()).unwrap();
        (dir, vault)
    }

    #[test]
    fn open_rejects_missing_root() {
        let err = FsVault::open("/definitely/not/a/vault").unwrap_err();
        assert!(matches!(err, EmbedError::VaultNotFound { .. }));
    }

    #[tokio::test]
    async fn find_by_path_only_matches_files() {
        let (_dir, vault) = vault_with(&[("img/a.png", b"x")]);
        assert!(vault.find_by_path("img/a.png").await.is_some());
        assert!(vault.find_by_path("/img/a.png").await.is_some());
        assert!(vault.find_by_path("img").await.is_none());
        assert!(vault.find_by_path("../outside.png").await.is_none());
    }

    #[tokio::test]
    async fn resolve_link_skips_hidden_folders() {
        let (_dir, vault) = vault_with(&[
            (".obsidian/pic.png", b"hidden"),
            ("attachments/pic.png", b"real"),
        ]);
        let hit = vault.resolve_link("pic.png", "notes/a.md").await.unwrap();
        assert_eq!(hit.path(), "attachments/pic.png");
        assert_eq!(vault.read_binary(&hit).await.unwrap(), b"real");
    }

    #[tokio::test]
    async fn resolve_link_ignores_case() {
        let (_dir, vault) = vault_with(&[("attachments/cat.png", b"meow")]);
        let hit = vault.resolve_link("Cat.png", "notes/a.md").await.unwrap();
        assert_eq!(hit.path(), "attachments/cat.png");
    }

    #[tokio::test]
    async fn create_writes_and_refuses_overwrite() {
        let (_dir, vault) = vault_with(&[("a.md", b"old")]);
        vault.create("out/new.md", "fresh").await.unwrap();
        assert_eq!(vault.read("out/new.md").await.unwrap(), "fresh");

        let err = vault.create("a.md", "clobber").await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
        assert_eq!(vault.read("a.md").await.unwrap(), "old");
    }

    #[test]
    fn vault_path_of_maps_inside_paths() {
        let (dir, vault) = vault_with(&[("notes/a.md", b"")]);
        let mapped = vault.vault_path_of(dir.path().join("notes").join("a.md"));
        assert_eq!(mapped.as_deref(), Some("notes/a.md"));
        assert_eq!(vault.vault_path_of("/definitely/elsewhere.md"), None);
    }
}
