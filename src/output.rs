//! Result types produced by a conversion.

use crate::error::AssetError;
use serde::{Deserialize, Serialize};

/// What happened to one image reference.
///
/// Every scanned reference produces exactly one outcome, in scan order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReferenceOutcome {
    /// Replaced by an inline data URI. `asset` is the vault file embedded.
    Converted { path: String, asset: String },
    /// Already a `data:image` URI; left alone.
    SkippedAlreadyEmbedded { path: String },
    /// An `http(s)://` image; remote fetching is not supported.
    SkippedRemote { path: String },
    /// A `![[…]]` link while wiki-link conversion is off.
    SkippedWikiDisabled { path: String },
    /// Not resolvable or not readable; the text is left unmodified.
    Failed { path: String, error: AssetError },
}

impl ReferenceOutcome {
    /// Display path: the reference as written (alt text for data URIs).
    pub fn path(&self) -> &str {
        match self {
            Self::Converted { path, .. }
            | Self::SkippedAlreadyEmbedded { path }
            | Self::SkippedRemote { path }
            | Self::SkippedWikiDisabled { path }
            | Self::Failed { path, .. } => path,
        }
    }

    /// Human-readable reason; `None` for converted references.
    pub fn reason(&self) -> Option<&'static str> {
        match self {
            Self::Converted { .. } => None,
            Self::SkippedAlreadyEmbedded { .. } => Some("Already Base64"),
            Self::SkippedRemote { .. } => Some("Network image (not supported)"),
            Self::SkippedWikiDisabled { .. } => Some("Wiki link conversion disabled"),
            Self::Failed { error, .. } => Some(error.reason()),
        }
    }

    pub fn is_converted(&self) -> bool {
        matches!(self, Self::Converted { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Full result of converting one note.
///
/// Invariant: `converted_count + skipped_count == outcomes.len()`.
/// Failed references count as skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionReport {
    /// The rewritten note text.
    pub content: String,
    pub converted_count: usize,
    pub skipped_count: usize,
    pub outcomes: Vec<ReferenceOutcome>,
}

impl ConversionReport {
    /// Number of references scanned.
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    /// Skipped references that were attempted and failed.
    pub fn failed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_failed()).count()
    }

    /// One-line summary for a status bar or notice.
    pub fn notice(&self, show_log: bool) -> String {
        if show_log {
            format!(
                "{} images converted, {} skipped",
                self.converted_count, self.skipped_count
            )
        } else {
            "Converted to Base64 format".to_string()
        }
    }

    /// Bounded diagnostic view: one `"<reason>: <path>"` line per
    /// non-converted reference, at most `limit` lines, then a count of the
    /// rest.
    pub fn diagnostic_lines(&self, limit: usize) -> Vec<String> {
        let mut issues = self
            .outcomes
            .iter()
            .filter_map(|o| o.reason().map(|r| format!("{r}: {}", o.path())));
        let mut lines: Vec<String> = issues.by_ref().take(limit).collect();
        let rest = issues.count();
        if rest > 0 {
            lines.push(format!("... and {rest} more"));
        }
        lines
    }
}

/// Reference counts by class, without touching the vault.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageStats {
    pub total: usize,
    /// `data:image` URIs already inline.
    pub embedded: usize,
    /// `http://` / `https://` images.
    pub remote: usize,
    /// `![[…]]` references.
    pub wiki: usize,
    /// Markdown references to local files.
    pub local: usize,
}

/// Result of a save-as: where the converted note went and how it went.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedDocument {
    pub path: String,
    pub report: ConversionReport,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report_with(outcomes: Vec<ReferenceOutcome>) -> ConversionReport {
        let converted_count = outcomes.iter().filter(|o| o.is_converted()).count();
        ConversionReport {
            content: String::new(),
            converted_count,
            skipped_count: outcomes.len() - converted_count,
            outcomes,
        }
    }

    fn failed(path: &str) -> ReferenceOutcome {
        ReferenceOutcome::Failed {
            path: path.into(),
            error: AssetError::NotFound {
                reference: path.into(),
            },
        }
    }

    #[test]
    fn reasons() {
        assert_eq!(
            ReferenceOutcome::SkippedRemote { path: "u".into() }.reason(),
            Some("Network image (not supported)")
        );
        assert_eq!(failed("x.png").reason(), Some("File not found"));
        let ok = ReferenceOutcome::Converted {
            path: "a.png".into(),
            asset: "img/a.png".into(),
        };
        assert_eq!(ok.reason(), None);
        assert_eq!(ok.path(), "a.png");
    }

    #[test]
    fn diagnostic_lines_are_bounded() {
        let report = report_with((0..7).map(|i| failed(&format!("{i}.png"))).collect());
        let lines = report.diagnostic_lines(5);
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0], "File not found: 0.png");
        assert_eq!(lines[5], "... and 2 more");
        assert_eq!(report.failed_count(), 7);
    }

    #[test]
    fn diagnostic_lines_skip_converted() {
        let report = report_with(vec![
            ReferenceOutcome::Converted {
                path: "a.png".into(),
                asset: "a.png".into(),
            },
            ReferenceOutcome::SkippedWikiDisabled {
                path: "b.png".into(),
            },
        ]);
        assert_eq!(
            report.diagnostic_lines(10),
            vec!["Wiki link conversion disabled: b.png".to_string()]
        );
        assert_eq!(report.notice(true), "1 images converted, 1 skipped");
        assert_eq!(report.notice(false), "Converted to Base64 format");
    }

    #[test]
    fn outcome_json_is_tagged() {
        let json = serde_json::to_string(&ReferenceOutcome::SkippedRemote {
            path: "https://x/y.png".into(),
        })
        .unwrap();
        assert!(json.contains(r#""status":"skipped_remote""#), "got: {json}");
    }
}
