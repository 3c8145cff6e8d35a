//! Input resolution: normalise a user-supplied path or URL to a local image.
//!
//! Tesseract reads from a file path, so URL inputs are downloaded into a
//! `TempDir` that lives as long as the [`ResolvedInput`]. Both kinds of
//! input have their header sniffed with [`image::guess_format`] before OCR,
//! so a text file or PDF fails here with [`Img2TexError::NotAnImage`]
//! instead of as an opaque tesseract error. The caller decides whether
//! that is fatal or goes to the placeholder fallback.

use crate::error::Img2TexError;
use image::ImageFormat;
use std::io::Read;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

/// Bytes read from the head of a file for format sniffing.
const SNIFF_LEN: usize = 16;

/// The resolved input — either a local path or a downloaded temp file.
pub enum ResolvedInput {
    /// Input was already a local file.
    Local { path: PathBuf, format: ImageFormat },
    /// Input was a URL; the image lives in a temp directory that is removed
    /// when this value is dropped.
    Downloaded {
        path: PathBuf,
        format: ImageFormat,
        _temp_dir: TempDir,
    },
}

impl ResolvedInput {
    /// Path to the image regardless of how it was resolved.
    pub fn path(&self) -> &Path {
        match self {
            ResolvedInput::Local { path, .. } => path,
            ResolvedInput::Downloaded { path, .. } => path,
        }
    }

    pub fn format(&self) -> ImageFormat {
        match self {
            ResolvedInput::Local { format, .. } | ResolvedInput::Downloaded { format, .. } => {
                *format
            }
        }
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve the input string to a local image file.
///
/// Fails before any OCR work when the path is missing, unreadable, or not
/// an image.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<ResolvedInput, Img2TexError> {
    if input.trim().is_empty() {
        return Err(Img2TexError::InvalidInput {
            input: input.to_string(),
        });
    }
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        resolve_local(input)
    }
}

fn resolve_local(path_str: &str) -> Result<ResolvedInput, Img2TexError> {
    let path = PathBuf::from(path_str);

    if !path.is_file() {
        return Err(Img2TexError::FileNotFound { path });
    }

    let mut head = Vec::with_capacity(SNIFF_LEN);
    match std::fs::File::open(&path) {
        Ok(f) => {
            f.take(SNIFF_LEN as u64)
                .read_to_end(&mut head)
                .map_err(|e| Img2TexError::Internal(format!("Failed to read {}: {e}", path.display())))?;
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(Img2TexError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(Img2TexError::FileNotFound { path });
        }
    }

    let format = sniff_format(&path, &head)?;
    debug!("Resolved local {:?} image: {}", format, path.display());
    Ok(ResolvedInput::Local { path, format })
}

/// Identify the image format from its leading bytes.
pub fn sniff_format(path: &Path, head: &[u8]) -> Result<ImageFormat, Img2TexError> {
    image::guess_format(head).map_err(|_| Img2TexError::NotAnImage {
        path: path.to_path_buf(),
        magic: head.iter().take(8).copied().collect(),
    })
}

async fn download_url(url: &str, timeout_secs: u64) -> Result<ResolvedInput, Img2TexError> {
    info!("Downloading image from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| Img2TexError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let map_send_err = |e: reqwest::Error| {
        if e.is_timeout() {
            Img2TexError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            Img2TexError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    };

    let response = client.get(url).send().await.map_err(map_send_err)?;

    if !response.status().is_success() {
        return Err(Img2TexError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let bytes = response.bytes().await.map_err(map_send_err)?;

    let filename = filename_from_url(url);
    let temp_dir = TempDir::new().map_err(|e| Img2TexError::Internal(e.to_string()))?;
    let file_path = temp_dir.path().join(&filename);

    let format = sniff_format(&file_path, &bytes[..bytes.len().min(SNIFF_LEN)])?;

    tokio::fs::write(&file_path, &bytes)
        .await
        .map_err(|e| Img2TexError::Internal(format!("Failed to write temp file: {}", e)))?;

    info!("Downloaded {} bytes to: {}", bytes.len(), file_path.display());

    Ok(ResolvedInput::Downloaded {
        path: file_path,
        format,
        _temp_dir: temp_dir,
    })
}

/// Last path segment of the URL when it looks like a file name.
fn filename_from_url(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() && last.contains('.') {
                    return last.to_string();
                }
            }
        }
    }

    "downloaded.img".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/eq.png"));
        assert!(is_url("http://example.com/eq.png"));
        assert!(!is_url("/tmp/eq.png"));
        assert!(!is_url("eq.png"));
        assert!(!is_url(""));
    }

    #[test]
    fn filename_from_url_path() {
        assert_eq!(filename_from_url("https://x.org/a/b/eq.jpg?x=1"), "eq.jpg");
        assert_eq!(filename_from_url("https://x.org/a/"), "downloaded.img");
    }

    #[test]
    fn sniff_known_and_unknown() {
        assert_eq!(
            sniff_format(Path::new("a"), PNG_MAGIC).unwrap(),
            ImageFormat::Png
        );
        assert_eq!(
            sniff_format(Path::new("a"), &[0xFF, 0xD8, 0xFF, 0xE0]).unwrap(),
            ImageFormat::Jpeg
        );
        let err = sniff_format(Path::new("notes.txt"), b"hello world").unwrap_err();
        match err {
            Img2TexError::NotAnImage { magic, .. } => assert_eq!(magic, b"hello wo"),
            other => panic!("expected NotAnImage, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_file_fails_fast() {
        let err = resolve_input("/definitely/not/here.png", 5).await.err().unwrap();
        assert!(matches!(err, Img2TexError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn empty_input_is_invalid() {
        let err = resolve_input("  ", 5).await.err().unwrap();
        assert!(matches!(err, Img2TexError::InvalidInput { .. }));
    }

    #[tokio::test]
    async fn directory_is_not_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve_input(dir.path().to_str().unwrap(), 5)
            .await
            .err()
            .unwrap();
        assert!(matches!(err, Img2TexError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn local_png_resolves() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(PNG_MAGIC).unwrap();
        f.write_all(&[0u8; 32]).unwrap();
        let resolved = resolve_input(f.path().to_str().unwrap(), 5).await.unwrap();
        assert_eq!(resolved.path(), f.path());
        assert_eq!(resolved.format(), ImageFormat::Png);
    }

    #[tokio::test]
    async fn text_file_is_not_an_image() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"E = mc^2\n").unwrap();
        let err = resolve_input(f.path().to_str().unwrap(), 5).await.err().unwrap();
        assert!(matches!(err, Img2TexError::NotAnImage { .. }));
    }
}
