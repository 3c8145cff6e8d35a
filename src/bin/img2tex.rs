//! CLI binary for edgequake-img2tex.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ConversionConfig` and prints or writes results.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_img2tex::convert::write_atomic;
use edgequake_img2tex::{
    convert, convert_batch, convert_text, convert_to_files, ConversionConfig, ConversionOutput,
    ConversionProgressCallback, FallbackPolicy, MathDelimiters, ProgressCallback,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::{HashMap, HashSet};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
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

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

/// Shorten a message to `max` characters for one-line log output.
fn truncate(msg: &str, max: usize) -> String {
    if msg.chars().count() > max {
        let head: String = msg.chars().take(max - 1).collect();
        format!("{head}\u{2026}")
    } else {
        msg.to_string()
    }
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback for batch runs. Images may complete out of
/// order, so start times are keyed by batch index.
struct CliProgressCallback {
    bar: ProgressBar,
    start_times: Mutex<HashMap<usize, Instant>>,
    fallbacks: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} images  ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);
        bar.set_style(style);
        bar.set_prefix("Converting");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
            fallbacks: AtomicUsize::new(0),
        })
    }

    fn elapsed_secs(&self, index: usize) -> f64 {
        self.start_times
            .lock()
            .ok()
            .and_then(|mut m| m.remove(&index))
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Starting conversion of {total} images…"))
        ));
    }

    fn on_image_start(&self, index: usize, _total: usize) {
        if let Ok(mut m) = self.start_times.lock() {
            m.insert(index, Instant::now());
        }
    }

    fn on_image_fallback(&self, index: usize, total: usize, reason: &str) {
        self.fallbacks.fetch_add(1, Ordering::SeqCst);
        self.bar.println(format!(
            "  {} Image {:>3}/{:<3}  {}",
            yellow("!"),
            index + 1,
            total,
            yellow(&truncate(&format!("OCR failed, placeholder used: {reason}"), 80)),
        ));
    }

    fn on_image_complete(&self, index: usize, total: usize, latex_len: usize) {
        let secs = self.elapsed_secs(index);
        self.bar.println(format!(
            "  {} Image {:>3}/{:<3}  {:<8}  {}",
            green("✓"),
            index + 1,
            total,
            dim(&format!("{latex_len:>5} chars")),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_image_error(&self, index: usize, total: usize, error: &str) {
        let secs = self.elapsed_secs(index);
        let first_line = error.lines().next().unwrap_or(error);
        self.bar.println(format!(
            "  {} Image {:>3}/{:<3}  {}  {}",
            red("✗"),
            index + 1,
            total,
            red(&truncate(first_line, 80)),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total: usize, success_count: usize) {
        let failed = total.saturating_sub(success_count);
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} {} images converted",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} images converted  ({} failed)",
                if failed == total { red("✘") } else { cyan("⚠") },
                bold(&success_count.to_string()),
                total,
                red(&failed.to_string()),
            );
        }
        let fallbacks = self.fallbacks.load(Ordering::SeqCst);
        if fallbacks > 0 {
            eprintln!(
                "{} {} of them used placeholder text",
                yellow("!"),
                bold(&fallbacks.to_string())
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # One image, LaTeX body to stdout
  img2tex equation.png

  # Body and a compilable preview document
  img2tex equation.png -o equation.tex --preview preview.tex

  # Indonesian + English, fail instead of falling back to placeholder text
  img2tex -l ind+eng --no-fallback notes.jpg

  # Many images, four at a time, into a directory
  img2tex scans/*.png --out-dir tex/ -c 4

  # Convert text you already have (or '-' for stdin)
  echo "E = mc^2" | img2tex --from-text -

  # Which languages does the local tesseract know?
  img2tex --list-langs

OUTPUT:
  Lines with math become display math (\[ ... \], or $$ ... $$ with
  --delimiters dollars); other lines are escaped prose. Recognised forms:
    1/3         → \frac{1}{3}
    mc^2        → mc^{2}
    sqrt(4)     → \sqrt{4}
    int_0^1 x   → \int_{0}^{1} x
    sin, log …  → \sin, \log …

PLACEHOLDER FALLBACK:
  If tesseract is missing or fails, fixed demonstration text is converted
  instead and a warning is printed. Use --no-fallback to make that an error.

ENVIRONMENT VARIABLES:
  TESSERACT_PATH          Path to the tesseract executable (skips the search)
  IMG2TEX_*               Any flag, e.g. IMG2TEX_LANG=ind, IMG2TEX_TIMEOUT=30
  RUST_LOG                Log filter (overrides -v / -q)

SETUP:
  Debian/Ubuntu:  apt install tesseract-ocr tesseract-ocr-eng
  macOS:          brew install tesseract
  Windows:        UB-Mannheim installer, or set TESSERACT_PATH
"#;

/// Convert images of equations and notes to LaTeX via Tesseract OCR.
#[derive(Parser, Debug)]
#[command(
    name = "img2tex",
    version,
    about = "Convert images of equations and notes to LaTeX via Tesseract OCR",
    long_about = "Convert photos or scans of handwritten or printed text and equations \
(local files or URLs) to LaTeX. Tesseract reads the image; rule-based conversion turns \
fractions, exponents, roots, integrals and function names into LaTeX markup.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Image file paths or HTTP/HTTPS URLs (text files with --from-text).
    #[arg(required_unless_present = "list_langs")]
    inputs: Vec<String>,

    /// Tesseract language code(s), e.g. eng, ind, eng+deu.
    #[arg(short, long = "lang", env = "IMG2TEX_LANG", default_value = "eng")]
    language: String,

    /// Write the LaTeX body to this file instead of stdout (single input).
    #[arg(short, long, env = "IMG2TEX_OUTPUT", conflicts_with = "out_dir")]
    output: Option<PathBuf>,

    /// Also write a compilable preview document to this file (single input).
    #[arg(long, env = "IMG2TEX_PREVIEW", conflicts_with = "out_dir")]
    preview: Option<PathBuf>,

    /// Write <stem>.tex and <stem>.preview.tex per input into this directory.
    #[arg(long, env = "IMG2TEX_OUT_DIR")]
    out_dir: Option<PathBuf>,

    /// Treat inputs as text files (or '-' for stdin) and skip OCR.
    #[arg(long, env = "IMG2TEX_FROM_TEXT")]
    from_text: bool,

    /// Math delimiters in the output.
    #[arg(long, env = "IMG2TEX_DELIMITERS", value_enum, default_value = "brackets")]
    delimiters: DelimitersArg,

    /// Tesseract page segmentation mode (0–13).
    #[arg(long, env = "IMG2TEX_PSM", default_value_t = 6,
          value_parser = clap::value_parser!(u8).range(0..=13))]
    psm: u8,

    /// Tesseract OCR engine mode (0–3).
    #[arg(long, env = "IMG2TEX_OEM",
          value_parser = clap::value_parser!(u8).range(0..=3))]
    oem: Option<u8>,

    /// Path to the tesseract executable. Default: search TESSERACT_PATH, PATH, well-known dirs.
    #[arg(long, env = "IMG2TEX_TESSERACT")]
    tesseract: Option<PathBuf>,

    /// Per-image OCR timeout in seconds.
    #[arg(long, env = "IMG2TEX_TIMEOUT", default_value_t = 60,
          value_parser = clap::value_parser!(u64).range(1..))]
    timeout: u64,

    /// Fail instead of substituting placeholder text when OCR fails.
    #[arg(long, env = "IMG2TEX_NO_FALLBACK")]
    no_fallback: bool,

    /// Convert images to grayscale before OCR.
    #[arg(long, env = "IMG2TEX_PREPROCESS")]
    preprocess: bool,

    /// Title of the preview document.
    #[arg(long, env = "IMG2TEX_TITLE")]
    title: Option<String>,

    /// Author of the preview document.
    #[arg(long, env = "IMG2TEX_AUTHOR")]
    author: Option<String>,

    /// Output structured JSON instead of LaTeX.
    #[arg(long, env = "IMG2TEX_JSON")]
    json: bool,

    /// Print the tesseract version and installed languages, then exit.
    #[arg(long)]
    list_langs: bool,

    /// Number of images processed concurrently.
    #[arg(short, long, env = "IMG2TEX_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "IMG2TEX_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Disable progress bar.
    #[arg(long, env = "IMG2TEX_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "IMG2TEX_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "IMG2TEX_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum DelimitersArg {
    Brackets,
    Dollars,
}

impl From<DelimitersArg> for MathDelimiters {
    fn from(v: DelimitersArg) -> Self {
        match v {
            DelimitersArg::Brackets => MathDelimiters::Brackets,
            DelimitersArg::Dollars => MathDelimiters::Dollars,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs during batch runs.
    let batch = cli.inputs.len() > 1 || cli.out_dir.is_some();
    let show_progress = batch && !cli.quiet && !cli.no_progress && !cli.json && !cli.from_text;
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

    if cli.list_langs {
        return list_langs(&cli);
    }

    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    if cli.from_text {
        run_text(&cli, &config).await
    } else if batch {
        run_batch(&cli, &config).await
    } else {
        run_single(&cli, &config).await
    }
}

/// One image: stdout, or `-o` / `--preview` files.
async fn run_single(cli: &Cli, config: &ConversionConfig) -> Result<()> {
    let input = &cli.inputs[0];
    let output = match cli.output {
        Some(ref body) => convert_to_files(input, body, cli.preview.as_deref(), config)
            .await
            .context("Conversion failed")?,
        None => {
            let output = convert(input, config).await.context("Conversion failed")?;
            if let Some(ref preview) = cli.preview {
                write_atomic(preview, &output.document)
                    .await
                    .context("Failed to write preview")?;
            }
            output
        }
    };

    warn_if_placeholder(&output);
    emit(cli, &output)?;
    if !cli.quiet {
        print_summary(&output, cli.output.as_deref());
    }
    Ok(())
}

/// Several images (or `--out-dir`): concurrent batch, one pair of files each.
async fn run_batch(cli: &Cli, config: &ConversionConfig) -> Result<()> {
    if cli.out_dir.is_none() && !cli.json {
        anyhow::bail!("Multiple inputs need --out-dir (or --json)");
    }

    let batch = convert_batch(cli.inputs.iter().cloned(), config)
        .await
        .context("Conversion failed")?;

    for output in batch.outputs() {
        warn_if_placeholder(output);
    }

    if let Some(ref dir) = cli.out_dir {
        let mut used = HashSet::new();
        for result in &batch.images {
            if let Some(ref output) = result.output {
                let stem = unique_stem(&result.input, result.index, &mut used);
                write_pair(dir, &stem, output).await?;
            }
        }
        if !cli.quiet {
            eprintln!(
                "   {} → {}",
                dim(&format!("{}ms total", batch.total_duration_ms)),
                bold(&dir.display().to_string())
            );
        }
    }

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&batch).context("Failed to serialise output")?
        );
    }

    if !cli.quiet && cli.no_progress {
        eprintln!(
            "Converted {}/{} images ({} placeholder)",
            batch.succeeded,
            batch.images.len(),
            batch.placeholders
        );
    }
    Ok(())
}

/// Text inputs: the LaTeX engine only.
async fn run_text(cli: &Cli, config: &ConversionConfig) -> Result<()> {
    let mut used = HashSet::new();
    for (index, input) in cli.inputs.iter().enumerate() {
        let raw = read_text(input).with_context(|| format!("Failed to read '{input}'"))?;
        let mut output = convert_text(&raw, config);
        output.input = input.clone();

        match cli.out_dir {
            Some(ref dir) => {
                let stem = unique_stem(input, index, &mut used);
                write_pair(dir, &stem, &output).await?;
            }
            None => {
                if let Some(ref body) = cli.output {
                    write_atomic(body, &output.latex)
                        .await
                        .context("Failed to write output")?;
                }
                if let Some(ref preview) = cli.preview {
                    write_atomic(preview, &output.document)
                        .await
                        .context("Failed to write preview")?;
                }
                emit(cli, &output)?;
            }
        }
    }
    Ok(())
}

/// Print the body (or JSON) to stdout unless it went to `-o`.
fn emit(cli: &Cli, output: &ConversionOutput) -> Result<()> {
    if cli.json {
        let json = serde_json::to_string_pretty(output).context("Failed to serialise output")?;
        println!("{json}");
    } else if cli.output.is_none() {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(output.latex.as_bytes())
            .context("Failed to write to stdout")?;
        if !output.latex.ends_with('\n') {
            handle.write_all(b"\n").ok();
        }
    }
    Ok(())
}

fn warn_if_placeholder(output: &ConversionOutput) {
    if !output.is_placeholder() {
        return;
    }
    eprintln!(
        "{} {}",
        red("⚠"),
        bold(&red(&format!(
            "WARNING: '{}' was NOT recognised; the output is placeholder text.",
            output.input
        )))
    );
    if let Some(ref reason) = output.fallback_reason {
        eprintln!("   {}", yellow(reason));
    }
    eprintln!(
        "   {}",
        dim("Install tesseract, set TESSERACT_PATH, or pass --no-fallback to fail instead.")
    );
}

fn print_summary(output: &ConversionOutput, written: Option<&Path>) {
    let s = &output.stats;
    let mark = if output.is_placeholder() {
        yellow("!")
    } else {
        green("✔")
    };
    let dest = written
        .map(|p| format!("  →  {}", bold(&p.display().to_string())))
        .unwrap_or_default();
    eprintln!(
        "{}  {} lines ({} math, {} prose)  {}{}",
        mark,
        s.total_lines,
        s.display_lines + s.inline_lines,
        s.prose_lines,
        dim(&format!("{}ms", s.total_duration_ms)),
        dest,
    );
}

async fn write_pair(dir: &Path, stem: &str, output: &ConversionOutput) -> Result<()> {
    let body = dir.join(format!("{stem}.tex"));
    let preview = dir.join(format!("{stem}.preview.tex"));
    write_atomic(&body, &output.latex)
        .await
        .with_context(|| format!("Failed to write {}", body.display()))?;
    write_atomic(&preview, &output.document)
        .await
        .with_context(|| format!("Failed to write {}", preview.display()))?;
    Ok(())
}

/// File stem for an input, made unique within one run.
fn unique_stem(input: &str, index: usize, used: &mut HashSet<String>) -> String {
    let last = input.rsplit(['/', '\\']).next().unwrap_or(input);
    let last = last.split(['?', '#']).next().unwrap_or(last);
    let stem = match last {
        "-" => "stdin".to_string(),
        _ => Path::new(last)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "image".to_string()),
    };
    if used.insert(stem.clone()) {
        stem
    } else {
        let alt = format!("{stem}-{index}");
        used.insert(alt.clone());
        alt
    }
}

fn read_text(input: &str) -> io::Result<String> {
    if input == "-" {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        std::fs::read_to_string(input)
    }
}

fn list_langs(cli: &Cli) -> Result<()> {
    let bin = match cli.tesseract {
        Some(ref p) => p.clone(),
        None => tesseract_locate::locate_tesseract().context("Could not find tesseract")?,
    };
    let version = tesseract_locate::tesseract_version(&bin).context("Failed to query version")?;
    let langs = tesseract_locate::list_languages(&bin).context("Failed to list languages")?;

    if cli.json {
        let json = serde_json::json!({
            "binary": bin,
            "version": version,
            "languages": langs,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&json).context("Failed to serialise output")?
        );
    } else {
        println!("Binary:     {}", bin.display());
        println!("Version:    {}", version);
        println!("Languages:  {}", langs.join(", "));
    }
    Ok(())
}

/// Map CLI args to `ConversionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::builder()
        .language(cli.language.clone())
        .psm(cli.psm)
        .ocr_timeout_secs(cli.timeout)
        .fallback(if cli.no_fallback {
            FallbackPolicy::Disabled
        } else {
            FallbackPolicy::Placeholder
        })
        .preprocess(cli.preprocess)
        .delimiters(cli.delimiters.into())
        .concurrency(cli.concurrency)
        .download_timeout_secs(cli.download_timeout);

    if let Some(oem) = cli.oem {
        builder = builder.oem(oem);
    }
    if let Some(ref path) = cli.tesseract {
        builder = builder.tesseract_path(path);
    }
    if let Some(ref title) = cli.title {
        builder = builder.title(title.clone());
    }
    if let Some(ref author) = cli.author {
        builder = builder.author(author.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stems_are_unique() {
        let mut used = HashSet::new();
        assert_eq!(unique_stem("scans/eq.png", 0, &mut used), "eq");
        assert_eq!(unique_stem("other/eq.jpg", 1, &mut used), "eq-1");
        assert_eq!(unique_stem("https://x.org/a/b.png?s=2", 2, &mut used), "b");
        assert_eq!(unique_stem("-", 3, &mut used), "stdin");
    }

    #[test]
    fn truncate_on_char_boundary() {
        assert_eq!(truncate("short", 10), "short");
        let t = truncate("ααααααααααα", 5);
        assert_eq!(t.chars().count(), 5);
        assert!(t.ends_with('\u{2026}'));
    }

    #[test]
    fn cli_parses_flags() {
        let cli = Cli::try_parse_from([
            "img2tex",
            "eq.png",
            "-l",
            "ind+eng",
            "--delimiters",
            "dollars",
            "--no-fallback",
            "--psm",
            "7",
        ])
        .unwrap();
        let config = build_config(&cli, None).unwrap();
        assert_eq!(config.language, "ind+eng");
        assert_eq!(config.psm, 7);
        assert_eq!(config.delimiters, MathDelimiters::Dollars);
        assert_eq!(config.fallback, FallbackPolicy::Disabled);
    }

    #[test]
    fn list_langs_needs_no_input() {
        let cli = Cli::try_parse_from(["img2tex", "--list-langs"]).unwrap();
        assert!(cli.inputs.is_empty());
        assert!(Cli::try_parse_from(["img2tex", "-l", "eng"]).is_err());
    }
}
