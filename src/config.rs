//! Configuration types for image-to-LaTeX conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. Everything that used to be ambient
//! state (which OCR binary, which language, what to do when it fails) lives
//! here and is passed explicitly into the pipeline.

use crate::document::DocumentOptions;
use crate::error::Img2TexError;
use crate::latex::MathDelimiters;
use crate::pipeline::ocr::OcrEngine;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Tesseract language used when none is given.
pub const DEFAULT_LANGUAGE: &str = "eng";

/// Configuration for an image-to-LaTeX conversion.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_img2tex::{ConversionConfig, FallbackPolicy};
///
/// let config = ConversionConfig::builder()
///     .language("eng+ind")
///     .ocr_timeout_secs(30)
///     .fallback(FallbackPolicy::Disabled)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Tesseract language code(s), e.g. `eng`, `ind`, `eng+deu`. Default: `eng`.
    pub language: String,

    /// Explicit tesseract executable. If None, it is located at run time
    /// via `tesseract-locate` (`TESSERACT_PATH`, `PATH`, well-known dirs).
    pub tesseract_path: Option<PathBuf>,

    /// Pre-constructed OCR engine. Takes precedence over `tesseract_path`.
    pub engine: Option<Arc<dyn OcrEngine>>,

    /// Tesseract page segmentation mode (0–13). Default: 6.
    ///
    /// Mode 6 assumes a single uniform block of text, which suits a cropped
    /// photo of an equation or a short handwritten note.
    pub psm: u8,

    /// Tesseract OCR engine mode (0–3). If None, tesseract's own default.
    pub oem: Option<u8>,

    /// Per-image OCR timeout in seconds. Default: 60.
    ///
    /// The tesseract child process is killed when the timeout fires.
    pub ocr_timeout_secs: u64,

    /// What to do when OCR fails. Default: [`FallbackPolicy::Placeholder`].
    pub fallback: FallbackPolicy,

    /// Convert the image to 8-bit grayscale PNG before OCR. Default: false.
    pub preprocess: bool,

    /// Math delimiters in the produced body. Default: `\[ \]` / `\( \)`.
    pub delimiters: MathDelimiters,

    /// Title and author of the wrapped preview document.
    pub document: DocumentOptions,

    /// Number of images processed concurrently in batch mode. Default: 4.
    ///
    /// Tesseract is CPU-bound and single-threaded per page by default
    /// (`OMP_THREAD_LIMIT`), so a small multiple of the core count is plenty.
    pub concurrency: usize,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Optional per-image progress callback for batch conversions.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            language: DEFAULT_LANGUAGE.to_string(),
            tesseract_path: None,
            engine: None,
            psm: 6,
            oem: None,
            ocr_timeout_secs: 60,
            fallback: FallbackPolicy::default(),
            preprocess: false,
            delimiters: MathDelimiters::default(),
            document: DocumentOptions::default(),
            concurrency: 4,
            download_timeout_secs: 120,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("language", &self.language)
            .field("tesseract_path", &self.tesseract_path)
            .field("engine", &self.engine.as_ref().map(|_| "<dyn OcrEngine>"))
            .field("psm", &self.psm)
            .field("oem", &self.oem)
            .field("ocr_timeout_secs", &self.ocr_timeout_secs)
            .field("fallback", &self.fallback)
            .field("preprocess", &self.preprocess)
            .field("delimiters", &self.delimiters)
            .field("concurrency", &self.concurrency)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn language(mut self, lang: impl Into<String>) -> Self {
        self.config.language = lang.into();
        self
    }

    pub fn tesseract_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.tesseract_path = Some(path.into());
        self
    }

    pub fn engine(mut self, engine: Arc<dyn OcrEngine>) -> Self {
        self.config.engine = Some(engine);
        self
    }

    pub fn psm(mut self, psm: u8) -> Self {
        self.config.psm = psm.min(13);
        self
    }

    pub fn oem(mut self, oem: u8) -> Self {
        self.config.oem = Some(oem.min(3));
        self
    }

    pub fn ocr_timeout_secs(mut self, secs: u64) -> Self {
        self.config.ocr_timeout_secs = secs.max(1);
        self
    }

    pub fn fallback(mut self, policy: FallbackPolicy) -> Self {
        self.config.fallback = policy;
        self
    }

    pub fn preprocess(mut self, v: bool) -> Self {
        self.config.preprocess = v;
        self
    }

    pub fn delimiters(mut self, d: MathDelimiters) -> Self {
        self.config.delimiters = d;
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.config.document.title = title.into();
        self
    }

    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.config.document.author = author.into();
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs.max(1);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Img2TexError> {
        let c = &self.config;
        validate_language(&c.language)?;
        if c.psm > 13 {
            return Err(Img2TexError::InvalidConfig(format!(
                "Page segmentation mode must be 0–13, got {}",
                c.psm
            )));
        }
        if c.concurrency == 0 {
            return Err(Img2TexError::InvalidConfig(
                "Concurrency must be ≥ 1".into(),
            ));
        }
        if c.ocr_timeout_secs == 0 {
            return Err(Img2TexError::InvalidConfig(
                "OCR timeout must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}

/// Check a tesseract `-l` argument: one or more codes joined by `+`.
///
/// The value is passed straight to a child process, so anything outside
/// `[A-Za-z0-9_+]` is rejected.
pub fn validate_language(lang: &str) -> Result<(), Img2TexError> {
    let ok = !lang.is_empty()
        && !lang.starts_with('+')
        && !lang.ends_with('+')
        && lang
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '+');
    if ok {
        Ok(())
    } else {
        Err(Img2TexError::InvalidConfig(format!(
            "Invalid OCR language '{lang}': expected codes like 'eng' or 'eng+ind'"
        )))
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Recovery policy when the OCR engine is unavailable or fails.
///
/// The placeholder returns fixed demonstration text. Results produced that
/// way are always flagged ([`crate::output::ConversionOutput::is_placeholder`]);
/// they never pass as real recognition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FallbackPolicy {
    /// One attempt with the placeholder engine, flagged in the output. (default)
    #[default]
    Placeholder,
    /// Surface the OCR failure as an error.
    Disabled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = ConversionConfig::default();
        assert_eq!(c.language, "eng");
        assert_eq!(c.psm, 6);
        assert_eq!(c.ocr_timeout_secs, 60);
        assert_eq!(c.fallback, FallbackPolicy::Placeholder);
        assert_eq!(c.delimiters, MathDelimiters::Brackets);
        assert!(!c.preprocess);
    }

    #[test]
    fn builder_clamps() {
        let c = ConversionConfig::builder()
            .psm(42)
            .oem(9)
            .concurrency(0)
            .ocr_timeout_secs(0)
            .build()
            .unwrap();
        assert_eq!(c.psm, 13);
        assert_eq!(c.oem, Some(3));
        assert_eq!(c.concurrency, 1);
        assert_eq!(c.ocr_timeout_secs, 1);
    }

    #[test]
    fn language_validation() {
        assert!(validate_language("eng").is_ok());
        assert!(validate_language("eng+ind").is_ok());
        assert!(validate_language("chi_sim").is_ok());
        assert!(validate_language("").is_err());
        assert!(validate_language("eng; rm -rf /").is_err());
        assert!(validate_language("+eng").is_err());

        let err = ConversionConfig::builder().language("e n g").build();
        assert!(matches!(err, Err(Img2TexError::InvalidConfig(_))));
    }

    #[test]
    fn debug_hides_trait_objects() {
        let c = ConversionConfig::builder()
            .engine(Arc::new(crate::pipeline::ocr::PlaceholderEngine))
            .build()
            .unwrap();
        let dbg = format!("{c:?}");
        assert!(dbg.contains("<dyn OcrEngine>"));
    }

    #[test]
    fn document_options_via_builder() {
        let c = ConversionConfig::builder()
            .title("Lecture 3")
            .author("Ana")
            .build()
            .unwrap();
        assert_eq!(c.document.title, "Lecture 3");
        assert_eq!(c.document.author, "Ana");
    }
}
