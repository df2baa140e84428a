use super::{normalize_path, pick_link_target, AssetHandle, VaultStore};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::io;
use tokio::sync::RwLock;

/// A vault held entirely in memory.
///
/// Useful when notes come from a database or network rather than a folder,
/// and as a deterministic store in tests.
///
/// ```rust
/// use md_image_embed::vault::{MemoryVault, VaultStore};
///
/// # tokio_test::block_on(async {
/// let vault = MemoryVault::new()
///     .with_text("notes/trip.md", "![cat](cat.png)")
///     .with_file("notes/cat.png", vec![0x89, b'P', b'N', b'G']);
/// assert!(vault.find_by_path("notes/cat.png").await.is_some());
/// # });
/// ```
#[derive(Debug, Default)]
pub struct MemoryVault {
    files: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryVault {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a binary file. Paths are normalised; an unusable path is ignored.
    pub fn with_file(mut self, path: &str, bytes: impl Into<Vec<u8>>) -> Self {
        if let Some(path) = normalize_path(path) {
            self.files.get_mut().insert(path, bytes.into());
        }
        self
    }

    /// Add a text note.
    pub fn with_text(self, path: &str, text: &str) -> Self {
        self.with_file(path, text.as_bytes().to_vec())
    }
}

#[async_trait]
impl VaultStore for MemoryVault {
    async fn read(&self, path: &str) -> io::Result<String> {
        let bytes = self.read_binary(&AssetHandle::new(path)).await?;
        String::from_utf8(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    async fn read_binary(&self, asset: &AssetHandle) -> io::Result<Vec<u8>> {
        let key = normalize_path(asset.path()).unwrap_or_default();
        self.files.read().await.get(&key).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("'{}' is not in the vault", asset.path()),
            )
        })
    }

    async fn find_by_path(&self, path: &str) -> Option<AssetHandle> {
        let path = normalize_path(path)?;
        self.files
            .read()
            .await
            .contains_key(&path)
            .then(|| AssetHandle::new(path))
    }

    async fn resolve_link(&self, link: &str, source_path: &str) -> Option<AssetHandle> {
        let files = self.files.read().await;
        pick_link_target(files.keys().map(String::as_str), link, source_path).map(AssetHandle::new)
    }

    async fn create(&self, path: &str, content: &str) -> io::Result<()> {
        let key = normalize_path(path).ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, format!("invalid vault path '{path}'"))
        })?;
        let mut files = self.files.write().await;
        if files.contains_key(&key) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("'{key}' already exists"),
            ));
        }
        files.insert(key, content.as_bytes().to_vec());
        Ok(())
    }
}
