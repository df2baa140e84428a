//! Settings for image embedding.
//!
//! All conversion behaviour is controlled through [`EmbedSettings`], passed
//! explicitly to every conversion call. There is no global settings object:
//! two calls with different settings never influence each other.
//!
//! Settings can be built in code via [`EmbedSettings::builder()`] or loaded
//! from a persisted JSON file whose keys use the note-editor plugin's
//! camelCase spelling (`skipBase64Images`, `convertWikiLinks`, …). Missing
//! keys keep their defaults.

use crate::error::EmbedError;
use crate::progress::{ConversionProgressCallback, ProgressCallback};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

const DEFAULT_SUFFIX: &str = "_base64";

/// Configuration for a conversion.
///
/// # Example
/// ```rust
/// use md_image_embed::EmbedSettings;
///
/// let settings = EmbedSettings::builder()
///     .convert_wiki_links(false)
///     .file_suffix("_inline")
///     .build()
///     .unwrap();
/// assert!(settings.skip_base64_images);
/// ```
#[derive(Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EmbedSettings {
    /// Leave references that already hold a `data:image` URI untouched. Default: true.
    ///
    /// When false such references go through resolution like any other path
    /// and end up as failures, since no vault file is named `data:…`.
    pub skip_base64_images: bool,

    /// Convert `![[name.ext]]` wiki links. Default: true.
    ///
    /// Converted wiki links are rewritten in standard markdown form,
    /// `![name.ext](data:…)`, so the output renders outside the vault too.
    pub convert_wiki_links: bool,

    /// Prefix for save-as file names. Default: empty.
    pub file_prefix: String,

    /// Suffix for save-as file names. Default: `_base64`
    /// (`trip.md` → `trip_base64.md`).
    pub file_suffix: String,

    /// Log a one-line summary per converted note. Default: true.
    pub show_conversion_log: bool,

    /// Log every reference outcome. Default: false.
    pub show_detailed_log: bool,

    /// Maximum diagnostic lines shown per note. Default: 10.
    pub max_log_entries: usize,

    /// Observer notified of each reference outcome, in scan order.
    #[serde(skip)]
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for EmbedSettings {
    fn default() -> Self {
        Self {
            skip_base64_images: true,
            convert_wiki_links: true,
            file_prefix: String::new(),
            file_suffix: DEFAULT_SUFFIX.to_string(),
            show_conversion_log: true,
            show_detailed_log: false,
            max_log_entries: 10,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for EmbedSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmbedSettings")
            .field("skip_base64_images", &self.skip_base64_images)
            .field("convert_wiki_links", &self.convert_wiki_links)
            .field("file_prefix", &self.file_prefix)
            .field("file_suffix", &self.file_suffix)
            .field("show_conversion_log", &self.show_conversion_log)
            .field("show_detailed_log", &self.show_detailed_log)
            .field("max_log_entries", &self.max_log_entries)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl EmbedSettings {
    /// Create a new builder starting from the defaults.
    pub fn builder() -> EmbedSettingsBuilder {
        EmbedSettingsBuilder {
            settings: Self::default(),
        }
    }

    /// Start a builder from these settings, e.g. after loading a file.
    pub fn to_builder(&self) -> EmbedSettingsBuilder {
        EmbedSettingsBuilder {
            settings: self.clone(),
        }
    }

    /// Parse persisted settings, merging them over the defaults, and
    /// validate them.
    pub fn from_json_str(json: &str) -> Result<Self, EmbedError> {
        let settings: Self = serde_json::from_str(json)
            .map_err(|e| EmbedError::InvalidConfig(format!("Malformed settings JSON: {e}")))?;
        settings.to_builder().build()
    }

    /// Load persisted settings from a JSON file and validate them.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, EmbedError> {
        let path = path.as_ref();
        let load_failed = |detail: String| EmbedError::SettingsLoadFailed {
            path: path.to_path_buf(),
            detail,
        };
        let text = std::fs::read_to_string(path).map_err(|e| load_failed(e.to_string()))?;
        let settings: Self = serde_json::from_str(&text).map_err(|e| load_failed(e.to_string()))?;
        settings.to_builder().build()
    }

    /// Save-as suffix, `_base64` when left empty.
    pub fn effective_suffix(&self) -> &str {
        if self.file_suffix.is_empty() {
            DEFAULT_SUFFIX
        } else {
            &self.file_suffix
        }
    }

    /// Check the save-as name template. Also run by
    /// [`crate::convert::save_as`] before anything is written.
    pub fn validate(&self) -> Result<(), EmbedError> {
        for (name, value) in [("prefix", &self.file_prefix), ("suffix", &self.file_suffix)] {
            if value.contains(['/', '\\']) {
                return Err(EmbedError::InvalidConfig(format!(
                    "File {name} must not contain path separators, got '{value}'"
                )));
            }
        }
        Ok(())
    }
}

/// Builder for [`EmbedSettings`].
#[derive(Debug)]
pub struct EmbedSettingsBuilder {
    settings: EmbedSettings,
}

impl EmbedSettingsBuilder {
    pub fn skip_base64_images(mut self, v: bool) -> Self {
        self.settings.skip_base64_images = v;
        self
    }

    pub fn convert_wiki_links(mut self, v: bool) -> Self {
        self.settings.convert_wiki_links = v;
        self
    }

    pub fn file_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.settings.file_prefix = prefix.into();
        self
    }

    /// An empty suffix falls back to the default `_base64` on build.
    pub fn file_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.settings.file_suffix = suffix.into();
        self
    }

    pub fn show_conversion_log(mut self, v: bool) -> Self {
        self.settings.show_conversion_log = v;
        self
    }

    pub fn show_detailed_log(mut self, v: bool) -> Self {
        self.settings.show_detailed_log = v;
        self
    }

    pub fn max_log_entries(mut self, n: usize) -> Self {
        self.settings.max_log_entries = n;
        self
    }

    pub fn progress_callback(mut self, cb: Arc<dyn ConversionProgressCallback>) -> Self {
        self.settings.progress_callback = Some(cb);
        self
    }

    /// Build the settings, validating the save-as name template.
    pub fn build(mut self) -> Result<EmbedSettings, EmbedError> {
        if self.settings.file_suffix.is_empty() {
            self.settings.file_suffix = DEFAULT_SUFFIX.to_string();
        }
        self.settings.validate()?;
        Ok(self.settings)
    }
}
