//! CLI binary for md-image-embed.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `EmbedSettings`, runs the conversion and prints results.

use anyhow::{bail, Context, Result};
use clap::Parser;
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use md_image_embed::{
    convert_many, inspect, save_as, ConversionProgressCallback, ConversionReport, EmbedSettings,
    FsVault, ProgressCallback, ReferenceOutcome, VaultStore,
};
use md_image_embed::vault::normalize_path;
use serde::Serialize;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar over all notes, one line per finished
/// note, and optionally one line per reference.
struct CliProgressCallback {
    bar: ProgressBar,
    detailed: bool,
}

impl CliProgressCallback {
    fn new(total_documents: usize, detailed: bool) -> Arc<Self> {
        let bar = ProgressBar::new(total_documents as u64);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} notes  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(style);
        bar.set_prefix("Embedding");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self { bar, detailed })
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_conversion_start(&self, document: &str, total_references: usize) {
        self.bar
            .set_message(format!("{document} ({total_references} images)"));
    }

    fn on_reference_complete(&self, index: usize, total: usize, outcome: &ReferenceOutcome) {
        if !self.detailed {
            return;
        }
        let line = match outcome.reason() {
            None => format!("    {} {}", green("✓"), outcome.path()),
            Some(reason) => format!(
                "    {} {}  {}",
                red("✗"),
                truncate(outcome.path(), 60),
                dim(reason)
            ),
        };
        self.bar
            .println(format!("{line}  {}", dim(&format!("[{}/{}]", index + 1, total))));
    }

    fn on_conversion_complete(&self, document: &str, converted: usize, skipped: usize) {
        self.bar.println(format!(
            "  {} {}  {}",
            if skipped == 0 { green("✓") } else { cyan("⚠") },
            document,
            dim(&format!("{converted} converted, {skipped} skipped")),
        ));
        self.bar.inc(1);
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Print the converted note (vault = current directory)
  mdembed notes/trip.md

  # Write the converted note to a file
  mdembed --vault ~/Vault notes/trip.md -o trip-inline.md

  # Save converted copies next to the originals (trip.md → trip_base64.md)
  mdembed --vault ~/Vault --save notes/*.md

  # Keep wiki links as they are, use a custom suffix
  mdembed --save --no-wiki-links --suffix _share notes/trip.md

  # Count image references without converting
  mdembed --stats notes/trip.md

  # Per-reference JSON report
  mdembed --json notes/trip.md > report.json

REFERENCE FORMS:
  ![alt](path/to/img.png)      markdown, path relative to vault or note
  ![alt](<path with spaces>)   markdown, angle-bracket path
  ![[img.png]]                 wiki link, resolved by name anywhere in the vault

  Images already embedded (data:image…) and remote images (http/https)
  are skipped and left as written.

SETTINGS FILE (--settings):
  {"skipBase64Images": true, "convertWikiLinks": true,
   "filePrefix": "", "fileSuffix": "_base64",
   "showConversionLog": true, "showDetailedLog": false, "maxLogEntries": 10}
"#;

/// Embed local images in Markdown notes as Base64 data URIs.
#[derive(Parser, Debug)]
#[command(
    name = "mdembed",
    version,
    about = "Embed local images in Markdown notes as Base64 data URIs",
    long_about = "Rewrite the image references of Markdown notes (standard ![alt](path) \
and wiki-style ![[name.png]]) into inline data: URIs, so the notes render anywhere \
without their attachment folders.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Notes to convert: vault paths or file-system paths inside the vault.
    #[arg(required = true, num_args = 1..)]
    documents: Vec<PathBuf>,

    /// Vault root directory.
    #[arg(long, env = "MDEMBED_VAULT", default_value = ".")]
    vault: PathBuf,

    /// Write the converted note to this file instead of stdout.
    #[arg(short, long, env = "MDEMBED_OUTPUT", conflicts_with_all = ["save", "stats", "json"])]
    output: Option<PathBuf>,

    /// Save converted copies into the vault beside each note.
    #[arg(long, env = "MDEMBED_SAVE")]
    save: bool,

    /// Only count image references; convert nothing.
    #[arg(long)]
    stats: bool,

    /// Output structured JSON instead of Markdown.
    #[arg(long, env = "MDEMBED_JSON")]
    json: bool,

    /// JSON settings file (plugin data.json format); flags override it.
    #[arg(long, env = "MDEMBED_SETTINGS")]
    settings: Option<PathBuf>,

    /// Leave ![[wiki]] image links unconverted.
    #[arg(long, env = "MDEMBED_NO_WIKI_LINKS")]
    no_wiki_links: bool,

    /// Do not skip references that already hold a data:image URI.
    #[arg(long, env = "MDEMBED_KEEP_BASE64")]
    keep_base64: bool,

    /// Prefix for saved file names.
    #[arg(long, env = "MDEMBED_PREFIX")]
    prefix: Option<String>,

    /// Suffix for saved file names (default: _base64).
    #[arg(long, env = "MDEMBED_SUFFIX")]
    suffix: Option<String>,

    /// Hide the per-note conversion summary.
    #[arg(long, env = "MDEMBED_QUIET_LOG")]
    quiet_log: bool,

    /// Show the outcome of every image reference.
    #[arg(long, env = "MDEMBED_DETAILED")]
    detailed: bool,

    /// Maximum skipped/failed references listed per note.
    #[arg(long, env = "MDEMBED_MAX_LOG_ENTRIES")]
    max_log_entries: Option<usize>,

    /// Number of notes converted concurrently.
    #[arg(short, long, env = "MDEMBED_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// Disable progress bar.
    #[arg(long, env = "MDEMBED_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "MDEMBED_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "MDEMBED_QUIET")]
    quiet: bool,
}

#[derive(Serialize)]
struct DocumentJson<'a, T: Serialize> {
    document: &'a str,
    #[serde(flatten)]
    result: T,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar carries the feedback when it is shown, so library
    // logs drop to errors only.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.stats;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Vault and documents ──────────────────────────────────────────────
    let vault = FsVault::open(&cli.vault)
        .with_context(|| format!("Failed to open vault {:?}", cli.vault))?;
    let documents = cli
        .documents
        .iter()
        .map(|p| to_vault_path(&vault, p))
        .collect::<Result<Vec<_>>>()?;

    // ── Stats-only mode ──────────────────────────────────────────────────
    if cli.stats {
        return print_stats(&vault, &documents, cli.json).await;
    }

    if !cli.save && !cli.json && documents.len() > 1 {
        bail!("{} notes given; use --save or --json to convert several at once", documents.len());
    }

    // ── Build settings ───────────────────────────────────────────────────
    let cli_cb = show_progress.then(|| CliProgressCallback::new(documents.len(), cli.detailed));
    let settings = build_settings(&cli, cli_cb.clone().map(|cb| cb as ProgressCallback))?;
    let bar = cli_cb.as_ref().map(|cb| &cb.bar);

    // ── Run conversion ───────────────────────────────────────────────────
    if cli.save {
        run_save(&cli, &vault, &documents, &settings, bar).await
    } else {
        run_convert(&cli, &vault, &documents, &settings, bar).await
    }
}

async fn run_save(
    cli: &Cli,
    vault: &FsVault,
    documents: &[String],
    settings: &EmbedSettings,
    bar: Option<&ProgressBar>,
) -> Result<()> {
    let results: Vec<_> = stream::iter(documents.iter().map(|doc| save_as(vault, doc, settings)))
        .buffered(cli.concurrency.max(1))
        .collect()
        .await;
    if let Some(bar) = bar {
        bar.finish_and_clear();
    }

    let mut failures = 0;
    let mut json_items = Vec::new();
    for (doc, result) in documents.iter().zip(results) {
        match result {
            Ok(saved) => {
                if cli.json {
                    json_items.push(serde_json::to_value(DocumentJson {
                        document: doc,
                        result: &saved,
                    })?);
                } else if !cli.quiet {
                    eprintln!(
                        "{} {}  →  {}  {}",
                        green("✔"),
                        doc,
                        bold(&saved.path),
                        dim(&saved.report.notice(settings.show_conversion_log)),
                    );
                    print_diagnostics(&saved.report, settings);
                }
            }
            Err(e) => {
                failures += 1;
                eprintln!("{} {}  {}", red("✘"), doc, red(&e.to_string()));
            }
        }
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&json_items).context("Failed to serialise reports")?);
    }
    if failures > 0 {
        bail!("{failures}/{} notes could not be saved", documents.len());
    }
    Ok(())
}

async fn run_convert(
    cli: &Cli,
    vault: &FsVault,
    documents: &[String],
    settings: &EmbedSettings,
    bar: Option<&ProgressBar>,
) -> Result<()> {
    let results = convert_many(vault, documents, settings, cli.concurrency).await;
    if let Some(bar) = bar {
        bar.finish_and_clear();
    }

    if cli.json {
        let mut items = Vec::new();
        for (doc, result) in documents.iter().zip(results) {
            let report = result.with_context(|| format!("Conversion of {doc} failed"))?;
            items.push(serde_json::to_value(DocumentJson {
                document: doc,
                result: &report,
            })?);
        }
        println!("{}", serde_json::to_string_pretty(&items).context("Failed to serialise reports")?);
        return Ok(());
    }

    // Exactly one document from here on.
    let (doc, result) = documents
        .iter()
        .zip(results)
        .next()
        .context("No document converted")?;
    let report = result.with_context(|| format!("Conversion of {doc} failed"))?;

    if let Some(ref output_path) = cli.output {
        tokio::fs::write(output_path, &report.content)
            .await
            .with_context(|| format!("Failed to write {:?}", output_path))?;
        if !cli.quiet {
            eprintln!(
                "{}  {}  →  {}",
                if report.skipped_count == 0 { green("✔") } else { cyan("⚠") },
                dim(&report.notice(settings.show_conversion_log)),
                bold(&output_path.display().to_string()),
            );
        }
    } else {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(report.content.as_bytes())
            .context("Failed to write to stdout")?;
        if !report.content.ends_with('\n') {
            handle.write_all(b"\n").ok();
        }
        if !cli.quiet && settings.show_conversion_log {
            eprintln!("{}", dim(&report.notice(true)));
        }
    }

    if !cli.quiet {
        print_diagnostics(&report, settings);
    }
    Ok(())
}

async fn print_stats(vault: &FsVault, documents: &[String], json: bool) -> Result<()> {
    let mut items = Vec::new();
    for doc in documents {
        let text = vault
            .read(doc)
            .await
            .with_context(|| format!("Failed to read {doc}"))?;
        let stats = inspect(&text);
        if json {
            items.push(serde_json::to_value(DocumentJson {
                document: doc,
                result: stats,
            })?);
        } else {
            println!("Note:       {}", doc);
            println!("Images:     {}", stats.total);
            println!("  local:    {}", stats.local);
            println!("  wiki:     {}", stats.wiki);
            println!("  remote:   {}", stats.remote);
            println!("  embedded: {}", stats.embedded);
        }
    }
    if json {
        println!("{}", serde_json::to_string_pretty(&items).context("Failed to serialise stats")?);
    }
    Ok(())
}

/// Map CLI args to `EmbedSettings`.
fn build_settings(cli: &Cli, progress: Option<ProgressCallback>) -> Result<EmbedSettings> {
    let base = match cli.settings {
        Some(ref path) => EmbedSettings::from_json_file(path).context("Invalid settings file")?,
        None => EmbedSettings::default(),
    };

    let mut builder = base.to_builder();
    if cli.no_wiki_links {
        builder = builder.convert_wiki_links(false);
    }
    if cli.keep_base64 {
        builder = builder.skip_base64_images(false);
    }
    if let Some(ref prefix) = cli.prefix {
        builder = builder.file_prefix(prefix.clone());
    }
    if let Some(ref suffix) = cli.suffix {
        builder = builder.file_suffix(suffix.clone());
    }
    if cli.quiet_log {
        builder = builder.show_conversion_log(false);
    }
    if cli.detailed {
        builder = builder.show_detailed_log(true);
    }
    if let Some(n) = cli.max_log_entries {
        builder = builder.max_log_entries(n);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Accept either a file-system path inside the vault or a vault path.
fn to_vault_path(vault: &FsVault, path: &Path) -> Result<String> {
    if path.exists() {
        return vault.vault_path_of(path).with_context(|| {
            format!("{:?} is not inside the vault {:?}", path, vault.root())
        });
    }
    if path.is_absolute() {
        bail!("{:?} does not exist", path);
    }
    let as_text = path.to_string_lossy();
    normalize_path(&as_text)
        .with_context(|| format!("{:?} is not a usable vault path", path))
}

fn print_diagnostics(report: &ConversionReport, settings: &EmbedSettings) {
    if !settings.show_conversion_log || settings.show_detailed_log {
        return;
    }
    for line in report.diagnostic_lines(settings.max_log_entries) {
        eprintln!("    {}", dim(&line));
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() > max_chars {
        let head: String = s.chars().take(max_chars - 1).collect();
        format!("{head}\u{2026}")
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_conflicts_with_json() {
        let err = Cli::try_parse_from(["mdembed", "--json", "-o", "out.md", "a.md"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
        assert!(Cli::try_parse_from(["mdembed", "-o", "out.md", "a.md"]).is_ok());
    }

    #[test]
    fn missing_absolute_document_is_rejected() {
        let dir = tempfile::TempDir::new().unwrap();
        let vault = FsVault::open(dir.path()).unwrap();

        let missing = dir.path().join("nowhere/a.md");
        assert!(to_vault_path(&vault, &missing).is_err());

        let relative = to_vault_path(&vault, Path::new("notes/./a.md")).unwrap();
        assert_eq!(relative, "notes/a.md");
    }
}
