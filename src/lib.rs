//! # md-image-embed
//!
//! Make Markdown notes self-contained by embedding their local images as
//! Base64 `data:` URIs.
//!
//! A note that says `![cat](images/cat.png)` only renders where
//! `images/cat.png` travels with it. After conversion it says
//! `![cat](data:image/png;base64,iVBOR…)` and can be pasted into a chat,
//! an issue tracker or another vault without losing its pictures.
//!
//! ## Pipeline Overview
//!
//! ```text
//! note text
//!  │
//!  ├─ 1. Scan      find ![alt](path) and ![[name.ext]] references
//!  ├─ 2. Classify  skip data URIs, remote images, disabled wiki links
//!  ├─ 3. Resolve   vault root → note folder → link-name lookup
//!  ├─ 4. Encode    asset bytes → data:<mime>;base64,…
//!  └─ 5. Rewrite   replace each reference by span, report every outcome
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use md_image_embed::{convert_document, EmbedSettings, FsVault};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let vault = FsVault::open("/path/to/vault")?;
//!     let settings = EmbedSettings::default();
//!     let report = convert_document(&vault, "notes/trip.md", &settings).await?;
//!     println!("{}", report.content);
//!     eprintln!("{} converted, {} skipped", report.converted_count, report.skipped_count);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `mdembed` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! md-image-embed = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod vault;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{EmbedSettings, EmbedSettingsBuilder};
pub use convert::{
    convert, convert_document, convert_many, convert_sync, inspect, save_as, save_as_path,
};
pub use error::{AssetError, EmbedError};
pub use output::{ConversionReport, ImageStats, ReferenceOutcome, SavedDocument};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use vault::{AssetHandle, FsVault, MemoryVault, VaultStore};
