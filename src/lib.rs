//! # edgequake-img2tex
//!
//! Turn a photo or scan of handwritten or printed equations into LaTeX.
//!
//! An OCR engine (Tesseract by default) reads the image into linear text;
//! a rule-based engine then escapes LaTeX specials, classifies each line as
//! prose, display math or inline math, and rewrites recognisable math
//! (`1/3`, `x^2`, `sqrt(4)`, `int_0^1 x`, `sin`, …) into LaTeX markup.
//!
//! ## Pipeline Overview
//!
//! ```text
//! image
//!  │
//!  ├─ 1. Input       resolve local file or download from URL, sniff format
//!  ├─ 2. Preprocess  optional grayscale PNG (spawn_blocking)
//!  ├─ 3. OCR         tesseract subprocess with timeout; flagged placeholder fallback
//!  ├─ 4. LaTeX       escape → classify → rewrite, line by line
//!  └─ 5. Output      body + compilable preview document + stats
//! ```
//!
//! The rule-based stage has no dependencies on the rest and is usable alone:
//!
//! ```rust
//! use edgequake_img2tex::LatexConverter;
//!
//! let latex = LatexConverter::new().convert("E = mc^2\n\nsqrt(4) = 2");
//! assert_eq!(latex, "\\[ E = mc^{2} \\]\n\\[ \\sqrt{4} = 2 \\]");
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_img2tex::{convert, ConversionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::default();
//!     let output = convert("equation.png", &config).await?;
//!     if output.is_placeholder() {
//!         eprintln!("warning: OCR unavailable, this is demonstration text");
//!     }
//!     println!("{}", output.latex);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `img2tex` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-img2tex = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod document;
pub mod error;
pub mod latex;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder, FallbackPolicy};
pub use convert::{convert, convert_batch, convert_sync, convert_text, convert_to_files};
pub use document::{wrap_document, DocumentOptions};
pub use error::{Img2TexError, ImageError};
pub use latex::{ConversionResult, ConvertedLine, LatexConverter, LineKind, MathDelimiters};
pub use output::{BatchOutput, ConversionOutput, ConversionStats, ImageResult};
pub use pipeline::ocr::{
    OcrEngine, OcrFailure, OcrSource, OcrText, PlaceholderEngine, TesseractEngine,
};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use stream::{convert_stream, ImageStream};
