//! OCR adapter: run an engine over an image and get back plain text.
//!
//! The default engine is the `tesseract` executable, driven as a child
//! process:
//!
//! ```text
//! tesseract <image> stdout -l <lang> --psm <n> [--oem <n>]
//! ```
//!
//! The call is bounded by a timeout. The child is spawned with
//! `kill_on_drop`, so when the timeout fires and the wait future is
//! dropped, the process is killed rather than left running.
//!
//! When the engine is missing or fails, [`FallbackPolicy::Placeholder`]
//! substitutes [`PlaceholderEngine`]'s fixed demonstration text. That result
//! is tagged [`OcrSource::Placeholder`] and carries the reason, so callers
//! and the CLI can tell it apart from a real recognition.

use crate::config::{ConversionConfig, FallbackPolicy};
use crate::error::Img2TexError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Text returned by [`PlaceholderEngine`].
pub const PLACEHOLDER_TEXT: &str =
    "E = mc^2\n\n∫ from 0 to 1 x^2 dx = 1/3\n\nlim x→∞ (1 + 1/x)^x = e";

/// Which engine produced a piece of recognised text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OcrSource {
    Tesseract,
    /// The fixed demonstration text, used as a fallback.
    Placeholder,
    /// A caller-supplied engine, or text given directly.
    Custom(String),
}

impl OcrSource {
    pub fn name(&self) -> &str {
        match self {
            OcrSource::Tesseract => "tesseract",
            OcrSource::Placeholder => "placeholder",
            OcrSource::Custom(name) => name,
        }
    }
}

impl fmt::Display for OcrSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Why a single engine call failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OcrFailure {
    /// The engine could not be found or started.
    #[error("engine unavailable: {0}")]
    Unavailable(String),
    /// The engine ran and reported an error.
    #[error("engine failed: {0}")]
    Execution(String),
    /// The engine did not finish in time and was killed.
    #[error("engine timed out after {0}s")]
    Timeout(u64),
}

impl OcrFailure {
    /// Lift into the fatal error surfaced when no fallback applies.
    pub fn into_error(self, engine: &OcrSource, image: &Path) -> Img2TexError {
        let engine = engine.name().to_string();
        let path = image.to_path_buf();
        match self {
            OcrFailure::Unavailable(detail) => Img2TexError::OcrEngineUnavailable { engine, detail },
            OcrFailure::Execution(detail) => Img2TexError::OcrExecutionFailed {
                engine,
                path,
                detail,
            },
            OcrFailure::Timeout(secs) => Img2TexError::OcrTimeout { engine, path, secs },
        }
    }
}

/// Recognised text plus where it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OcrText {
    pub text: String,
    pub source: OcrSource,
    pub language: String,
    pub duration_ms: u64,
    /// Set when the text came from the fallback: the primary engine's failure.
    pub fallback_reason: Option<String>,
}

/// An OCR engine: image path + language in, text out.
///
/// Implement this to plug in another recogniser and hand it to
/// [`crate::config::ConversionConfigBuilder::engine`].
#[async_trait]
pub trait OcrEngine: Send + Sync {
    fn source(&self) -> OcrSource;

    async fn recognize(&self, image: &Path, language: &str) -> Result<String, OcrFailure>;
}

// ── Tesseract ────────────────────────────────────────────────────────────

/// The `tesseract` command-line engine.
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    binary: PathBuf,
    psm: u8,
    oem: Option<u8>,
    timeout: Duration,
}

impl TesseractEngine {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            psm: 6,
            oem: None,
            timeout: Duration::from_secs(60),
        }
    }

    /// Find the executable with [`tesseract_locate::locate_tesseract`].
    pub fn locate() -> Result<Self, OcrFailure> {
        tesseract_locate::locate_tesseract()
            .map(Self::new)
            .map_err(|e| OcrFailure::Unavailable(e.to_string()))
    }

    /// Build from a config: explicit path if set, otherwise locate.
    pub fn from_config(config: &ConversionConfig) -> Result<Self, OcrFailure> {
        let engine = match config.tesseract_path {
            Some(ref p) => Self::new(p),
            None => Self::locate()?,
        };
        let mut engine = engine
            .with_psm(config.psm)
            .with_timeout(Duration::from_secs(config.ocr_timeout_secs));
        engine.oem = config.oem;
        Ok(engine)
    }

    pub fn with_psm(mut self, psm: u8) -> Self {
        self.psm = psm;
        self
    }

    pub fn with_oem(mut self, oem: u8) -> Self {
        self.oem = Some(oem);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn command(&self, image: &Path, language: &str) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.arg(image)
            .arg("stdout")
            .arg("-l")
            .arg(language)
            .arg("--psm")
            .arg(self.psm.to_string());
        if let Some(oem) = self.oem {
            cmd.arg("--oem").arg(oem.to_string());
        }
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl OcrEngine for TesseractEngine {
    fn source(&self) -> OcrSource {
        OcrSource::Tesseract
    }

    async fn recognize(&self, image: &Path, language: &str) -> Result<String, OcrFailure> {
        debug!(
            "Running {} on {} (lang={}, psm={})",
            self.binary.display(),
            image.display(),
            language,
            self.psm
        );

        let child = self.command(image, language).spawn().map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied => {
                OcrFailure::Unavailable(format!("{}: {e}", self.binary.display()))
            }
            _ => OcrFailure::Execution(format!("failed to start {}: {e}", self.binary.display())),
        })?;

        // Dropping the wait future on timeout drops the child, which kills it.
        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(|e| OcrFailure::Execution(e.to_string()))?,
            Err(_) => return Err(OcrFailure::Timeout(self.timeout.as_secs())),
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrFailure::Execution(format!(
                "{}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

// ── Placeholder ──────────────────────────────────────────────────────────

/// Stand-in engine that ignores the image and returns [`PLACEHOLDER_TEXT`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderEngine;

#[async_trait]
impl OcrEngine for PlaceholderEngine {
    fn source(&self) -> OcrSource {
        OcrSource::Placeholder
    }

    async fn recognize(&self, _image: &Path, _language: &str) -> Result<String, OcrFailure> {
        Ok(PLACEHOLDER_TEXT.to_string())
    }
}

// ── Orchestration ────────────────────────────────────────────────────────

/// The engine a config asks for: the injected one, else tesseract.
pub fn resolve_engine(config: &ConversionConfig) -> Result<Arc<dyn OcrEngine>, OcrFailure> {
    if let Some(ref engine) = config.engine {
        return Ok(Arc::clone(engine));
    }
    Ok(Arc::new(TesseractEngine::from_config(config)?))
}

/// Recognise `image` with `primary`, applying `policy` if it fails.
pub async fn recognize_with_fallback(
    primary: &dyn OcrEngine,
    image: &Path,
    language: &str,
    policy: FallbackPolicy,
) -> Result<OcrText, Img2TexError> {
    let start = Instant::now();
    match primary.recognize(image, language).await {
        Ok(text) => {
            let duration_ms = start.elapsed().as_millis() as u64;
            info!(
                "OCR ({}) read {} chars from {} in {}ms",
                primary.source(),
                text.len(),
                image.display(),
                duration_ms
            );
            Ok(OcrText {
                text,
                source: primary.source(),
                language: language.to_string(),
                duration_ms,
                fallback_reason: None,
            })
        }
        Err(failure) => {
            fall_back(
                &primary.source(),
                failure,
                &PlaceholderEngine,
                image,
                language,
                policy,
            )
            .await
        }
    }
}

/// Resolve the configured engine and recognise `image`.
///
/// An engine that cannot be resolved (no tesseract on this machine) goes
/// through the same fallback path as one that fails at run time.
pub async fn run_ocr(image: &Path, config: &ConversionConfig) -> Result<OcrText, Img2TexError> {
    match resolve_engine(config) {
        Ok(engine) => {
            recognize_with_fallback(engine.as_ref(), image, &config.language, config.fallback)
                .await
        }
        Err(failure) => {
            fall_back(
                &OcrSource::Tesseract,
                failure,
                &PlaceholderEngine,
                image,
                &config.language,
                config.fallback,
            )
            .await
        }
    }
}

/// Recover from an input that exists but is not a readable image.
///
/// This is an execution failure of the configured engine: one placeholder
/// attempt under [`FallbackPolicy::Placeholder`], the original error under
/// [`FallbackPolicy::Disabled`]. Errors of any other kind are returned as-is.
pub async fn recover_unreadable(
    error: Img2TexError,
    config: &ConversionConfig,
) -> Result<OcrText, Img2TexError> {
    let image = match error.unreadable_image() {
        Some(path) => path.to_path_buf(),
        None => return Err(error),
    };
    if config.fallback == FallbackPolicy::Disabled {
        return Err(error);
    }
    let primary = config
        .engine
        .as_ref()
        .map_or(OcrSource::Tesseract, |engine| engine.source());
    fall_back(
        &primary,
        OcrFailure::Execution(error.to_string()),
        &PlaceholderEngine,
        &image,
        &config.language,
        config.fallback,
    )
    .await
}

async fn fall_back(
    primary: &OcrSource,
    failure: OcrFailure,
    fallback: &dyn OcrEngine,
    image: &Path,
    language: &str,
    policy: FallbackPolicy,
) -> Result<OcrText, Img2TexError> {
    if policy == FallbackPolicy::Disabled {
        return Err(failure.into_error(primary, image));
    }

    warn!(
        "OCR ({}) failed on {}: {}; using {} text instead",
        primary,
        image.display(),
        failure,
        fallback.source()
    );

    let start = Instant::now();
    match fallback.recognize(image, language).await {
        Ok(text) => Ok(OcrText {
            text,
            source: fallback.source(),
            language: language.to_string(),
            duration_ms: start.elapsed().as_millis() as u64,
            fallback_reason: Some(failure.to_string()),
        }),
        Err(second) => Err(Img2TexError::FallbackFailed {
            path: image.to_path_buf(),
            primary: failure.to_string(),
            fallback: second.to_string(),
        }),
    }
}
