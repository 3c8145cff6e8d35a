//! Eager conversion entry points.
//!
//! [`convert`] handles one image and returns once its LaTeX is ready;
//! [`convert_batch`] runs several with bounded concurrency and returns them
//! all in input order. Use [`crate::stream::convert_stream`] to receive batch
//! results as each image finishes.

use crate::config::{validate_language, ConversionConfig};
use crate::document::wrap_document;
use crate::error::{Img2TexError, ImageError};
use crate::latex::LatexConverter;
use crate::output::{BatchOutput, ConversionOutput, ConversionStats, ImageResult};
use crate::pipeline::ocr::{self, OcrSource, OcrText};
use crate::pipeline::{input, preprocess};
use futures::stream::{self, StreamExt};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Convert an image file or URL to LaTeX.
///
/// This is the primary entry point for the library.
///
/// # Arguments
/// * `input`  — Local file path or HTTP/HTTPS URL to an image
/// * `config` — Conversion configuration
///
/// # Errors
/// - missing or unreadable input path, before any OCR runs
/// - a file that is not a decodable image, or an OCR failure, when
///   [`crate::FallbackPolicy::Disabled`] is set
///
/// With the default policy those last two yield the placeholder text;
/// check [`ConversionOutput::is_placeholder`].
pub async fn convert(
    input_str: impl AsRef<str>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Img2TexError> {
    let total_start = Instant::now();
    let input_str = input_str.as_ref();
    info!("Starting conversion: {}", input_str);
    validate_language(&config.language)?;

    // ── Steps 1–3: Resolve, preprocess, OCR ──────────────────────────────
    // A missing input is fatal. A file that is not a readable image is an
    // OCR execution failure and follows the fallback policy.
    let text = match recognize(input_str, config).await {
        Ok(text) => text,
        Err(e) if e.unreadable_image().is_some() => ocr::recover_unreadable(e, config).await?,
        Err(e) => return Err(e),
    };
    if text.source == OcrSource::Placeholder {
        warn!(
            "Output for {} is placeholder text, not a recognition of the image",
            input_str
        );
    }

    // ── Step 4: Text → LaTeX ─────────────────────────────────────────────
    let mut output = build_output(input_str, text, config);
    output.stats.total_duration_ms = total_start.elapsed().as_millis() as u64;

    info!(
        "Conversion complete: {} lines ({} math) in {}ms",
        output.stats.total_lines,
        output.stats.display_lines + output.stats.inline_lines,
        output.stats.total_duration_ms
    );
    Ok(output)
}

/// Convert already-recognised text, skipping input resolution and OCR.
///
/// The output's source is `Custom("text")`.
pub fn convert_text(raw: &str, config: &ConversionConfig) -> ConversionOutput {
    let start = Instant::now();
    let text = OcrText {
        text: raw.to_string(),
        source: OcrSource::Custom("text".to_string()),
        language: config.language.clone(),
        duration_ms: 0,
        fallback_reason: None,
    };
    let mut output = build_output("<text>", text, config);
    output.stats.total_duration_ms = start.elapsed().as_millis() as u64;
    output
}

/// Convert an image and write the body and, optionally, the wrapped document.
///
/// Each file is written atomically (temp file + rename), so a failure never
/// leaves a partial `.tex` behind.
pub async fn convert_to_files(
    input_str: impl AsRef<str>,
    body_path: impl AsRef<Path>,
    document_path: Option<&Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Img2TexError> {
    let output = convert(input_str, config).await?;
    write_atomic(body_path.as_ref(), &output.latex).await?;
    if let Some(doc) = document_path {
        write_atomic(doc, &output.document).await?;
    }
    Ok(output)
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    input_str: impl AsRef<str>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Img2TexError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Img2TexError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(input_str, config))
}

/// Convert several images, up to `config.concurrency` at a time.
///
/// Individual failures are recorded in the returned [`BatchOutput`];
/// only a batch in which every image failed is an error.
pub async fn convert_batch<I, S>(
    inputs: I,
    config: &ConversionConfig,
) -> Result<BatchOutput, Img2TexError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let start = Instant::now();
    let inputs: Vec<String> = inputs.into_iter().map(Into::into).collect();
    if inputs.is_empty() {
        return Err(Img2TexError::InvalidConfig("No input images given".into()));
    }
    validate_language(&config.language)?;

    let total = inputs.len();
    info!("Starting batch of {} images", total);
    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_start(total);
    }

    let results: Vec<ImageResult> = stream::iter(
        inputs
            .into_iter()
            .enumerate()
            .map(|(index, input)| process_image(index, input, total, config)),
    )
    .buffer_unordered(config.concurrency)
    .collect()
    .await;

    let batch = BatchOutput::from_results(results, start.elapsed().as_millis() as u64);

    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_complete(total, batch.succeeded);
    }

    if batch.succeeded == 0 {
        let first_error = batch
            .errors()
            .next()
            .map(|e| e.detail.clone())
            .unwrap_or_else(|| "Unknown error".to_string());
        return Err(Img2TexError::AllImagesFailed { total, first_error });
    }

    info!(
        "Batch complete: {}/{} images, {} placeholder, {}ms",
        batch.succeeded, total, batch.placeholders, batch.total_duration_ms
    );
    Ok(batch)
}

/// Write `contents` to `path` via a sibling temp file and a rename.
pub async fn write_atomic(path: &Path, contents: &str) -> Result<(), Img2TexError> {
    let write_err = |source| Img2TexError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let tmp_path = tmp_sibling(path);
    tokio::fs::write(&tmp_path, contents).await.map_err(write_err)?;
    if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(write_err(e));
    }
    debug!("Wrote {} bytes to {}", contents.len(), path.display());
    Ok(())
}

// ── Internal helpers ─────────────────────────────────────────────────────

async fn recognize(input_str: &str, config: &ConversionConfig) -> Result<OcrText, Img2TexError> {
    // ── Step 1: Resolve input ────────────────────────────────────────────
    let resolved = input::resolve_input(input_str, config.download_timeout_secs).await?;
    debug!("Input format: {:?}", resolved.format());

    // ── Step 2: Preprocess ───────────────────────────────────────────────
    let prepared = preprocess::prepare_image(resolved.path(), config.preprocess).await?;

    // ── Step 3: OCR ──────────────────────────────────────────────────────
    ocr::run_ocr(prepared.path(), config).await
}

/// Run one batch entry, reporting progress and capturing any failure.
pub(crate) async fn process_image(
    index: usize,
    input: String,
    total: usize,
    config: &ConversionConfig,
) -> ImageResult {
    let cb = config.progress_callback.as_ref();
    if let Some(cb) = cb {
        cb.on_image_start(index, total);
    }

    match convert(&input, config).await {
        Ok(output) => {
            if let Some(cb) = cb {
                if let Some(ref reason) = output.fallback_reason {
                    cb.on_image_fallback(index, total, reason);
                }
                cb.on_image_complete(index, total, output.latex.len());
            }
            ImageResult {
                index,
                input,
                output: Some(output),
                error: None,
            }
        }
        Err(e) => {
            warn!("Image {} ({}) failed: {}", index, input, e);
            let err = ImageError::new(index, input.clone(), &e);
            if let Some(cb) = cb {
                cb.on_image_error(index, total, &err.detail);
            }
            ImageResult {
                index,
                input,
                output: None,
                error: Some(err),
            }
        }
    }
}

fn build_output(input: &str, text: OcrText, config: &ConversionConfig) -> ConversionOutput {
    let start = Instant::now();
    let result = LatexConverter::with_delimiters(config.delimiters).convert_lines(&text.text);
    let latex = result.to_latex();
    let document = wrap_document(&latex, &config.document);

    let mut stats = ConversionStats::from_result(&result);
    stats.ocr_duration_ms = text.duration_ms;
    stats.convert_duration_ms = start.elapsed().as_millis() as u64;

    ConversionOutput {
        input: input.to_string(),
        latex,
        document,
        raw_text: text.text,
        source: text.source,
        language: text.language,
        fallback_reason: text.fallback_reason,
        lines: result.lines,
        stats,
    }
}

fn tmp_sibling(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}
