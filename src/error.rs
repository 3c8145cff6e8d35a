//! Error types for the edgequake-img2tex library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`Img2TexError`] — **Fatal**: the conversion of an input cannot proceed
//!   (missing file, not an image, OCR engine failed with no fallback).
//!   Returned as `Err(Img2TexError)` from the top-level `convert*` functions.
//!
//! * [`ImageError`] — **Non-fatal**: one input of a batch failed while the
//!   others are fine. Stored inside [`crate::output::ImageResult`] so batch
//!   callers can inspect partial success.
//!
//! The text-to-LaTeX engine itself has no error type: it is total over all
//! strings.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// All fatal errors returned by the edgequake-img2tex library.
#[derive(Debug, Error)]
pub enum Img2TexError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input image was not found at the given path. Checked before any OCR.
    #[error("Image file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is empty or otherwise unusable as a path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The file exists and was read, but its header matches no known image format.
    #[error("File is not a recognised image: '{path}'\nFirst bytes: {magic:?}")]
    NotAnImage { path: PathBuf, magic: Vec<u8> },

    /// Preprocessing could not decode or re-encode the image.
    #[error("Failed to decode image '{path}': {detail}")]
    ImageDecodeFailed { path: PathBuf, detail: String },

    // ── OCR errors ────────────────────────────────────────────────────────
    /// The OCR engine could not be located or started.
    #[error("OCR engine '{engine}' is unavailable: {detail}")]
    OcrEngineUnavailable { engine: String, detail: String },

    /// The OCR engine ran but reported a failure (bad exit, unreadable image,
    /// unsupported language).
    #[error("OCR engine '{engine}' failed on '{path}': {detail}")]
    OcrExecutionFailed {
        engine: String,
        path: PathBuf,
        detail: String,
    },

    /// The OCR engine did not finish within the configured timeout.
    #[error("OCR engine '{engine}' timed out after {secs}s on '{path}'\nIncrease --timeout.")]
    OcrTimeout {
        engine: String,
        path: PathBuf,
        secs: u64,
    },

    /// The primary engine failed and the single fallback attempt failed too.
    #[error("OCR failed on '{path}': {primary}\nFallback also failed: {fallback}")]
    FallbackFailed {
        path: PathBuf,
        primary: String,
        fallback: String,
    },

    /// Every input of a batch failed.
    #[error("All {total} images failed.\nFirst error: {first_error}")]
    AllImagesFailed { total: usize, first_error: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output `.tex` file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Img2TexError {
    /// Path of an existing file that could not be read as an image.
    ///
    /// These failures count as OCR execution failures and go through the
    /// configured [`crate::FallbackPolicy`].
    pub fn unreadable_image(&self) -> Option<&Path> {
        match self {
            Img2TexError::NotAnImage { path, .. } | Img2TexError::ImageDecodeFailed { path, .. } => {
                Some(path)
            }
            _ => None,
        }
    }
}

/// A non-fatal error for a single input of a batch.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
#[error("Image {index} ('{input}'): {detail}")]
pub struct ImageError {
    /// 0-based position of the input in the batch.
    pub index: usize,
    pub input: String,
    pub detail: String,
}

impl ImageError {
    pub fn new(index: usize, input: impl Into<String>, err: &Img2TexError) -> Self {
        Self {
            index,
            input: input.into(),
            detail: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_not_found_display() {
        let e = Img2TexError::FileNotFound {
            path: PathBuf::from("/tmp/missing.png"),
        };
        assert!(e.to_string().contains("missing.png"));
    }

    #[test]
    fn ocr_timeout_display() {
        let e = Img2TexError::OcrTimeout {
            engine: "tesseract".into(),
            path: PathBuf::from("eq.png"),
            secs: 30,
        };
        let msg = e.to_string();
        assert!(msg.contains("30s"), "got: {msg}");
        assert!(msg.contains("tesseract"));
    }

    #[test]
    fn fallback_failed_names_both_causes() {
        let e = Img2TexError::FallbackFailed {
            path: PathBuf::from("eq.png"),
            primary: "exit status 1".into(),
            fallback: "placeholder broke".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("exit status 1"));
        assert!(msg.contains("placeholder broke"));
    }

    #[test]
    fn image_error_wraps_fatal_message() {
        let fatal = Img2TexError::NotAnImage {
            path: PathBuf::from("notes.txt"),
            magic: b"hell".to_vec(),
        };
        let e = ImageError::new(2, "notes.txt", &fatal);
        assert_eq!(e.index, 2);
        assert!(e.to_string().contains("not a recognised image"));
    }

    #[test]
    fn unreadable_image_only_for_decode_failures() {
        let not_image = Img2TexError::NotAnImage {
            path: PathBuf::from("notes.txt"),
            magic: vec![],
        };
        assert_eq!(not_image.unreadable_image(), Some(Path::new("notes.txt")));

        let decode = Img2TexError::ImageDecodeFailed {
            path: PathBuf::from("torn.png"),
            detail: "unexpected EOF".into(),
        };
        assert_eq!(decode.unreadable_image(), Some(Path::new("torn.png")));

        let missing = Img2TexError::FileNotFound {
            path: PathBuf::from("gone.png"),
        };
        assert_eq!(missing.unreadable_image(), None);
    }
}
