//! Pipeline stages for image-to-LaTeX conversion.
//!
//! Each submodule implements one step, testable on its own.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ preprocess ──▶ ocr ──▶ latex::LatexConverter ──▶ document
//! (URL/path)  (grayscale)  (tesseract)   (escape/classify/rewrite)
//! ```
//!
//! 1. [`input`]      — canonicalise the user-supplied path or URL to a local
//!    image file and sniff its format
//! 2. [`preprocess`] — optional grayscale PNG copy; runs in `spawn_blocking`
//! 3. [`ocr`]        — run the OCR engine with a timeout and the
//!    placeholder fallback; the only stage that spawns a process

pub mod input;
pub mod ocr;
pub mod preprocess;
