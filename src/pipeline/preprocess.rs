//! Optional grayscale normalisation before OCR.
//!
//! Colour photos of whiteboards and paper carry noise in the chroma
//! channels that tesseract's own binarisation handles poorly. Converting to
//! 8-bit luma and re-encoding as PNG gives it a clean single-channel input.
//! Decoding is CPU-bound, so it runs on `spawn_blocking`.

use crate::error::Img2TexError;
use image::{ImageFormat, ImageReader};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::debug;

/// The image handed to the OCR engine.
pub enum PreparedImage {
    /// Used as-is.
    Original(PathBuf),
    /// A grayscale copy in a temp directory, removed on drop.
    Grayscale { path: PathBuf, _temp_dir: TempDir },
}

impl PreparedImage {
    pub fn path(&self) -> &Path {
        match self {
            PreparedImage::Original(p) => p,
            PreparedImage::Grayscale { path, .. } => path,
        }
    }
}

/// Prepare `source` for OCR; a pass-through unless `grayscale` is set.
pub async fn prepare_image(source: &Path, grayscale: bool) -> Result<PreparedImage, Img2TexError> {
    if !grayscale {
        return Ok(PreparedImage::Original(source.to_path_buf()));
    }

    let temp_dir = TempDir::new().map_err(|e| Img2TexError::Internal(e.to_string()))?;
    let dest = temp_dir.path().join("grayscale.png");

    let src = source.to_path_buf();
    let out = dest.clone();
    tokio::task::spawn_blocking(move || to_grayscale_png(&src, &out))
        .await
        .map_err(|e| Img2TexError::Internal(format!("Preprocess task panicked: {}", e)))??;

    Ok(PreparedImage::Grayscale {
        path: dest,
        _temp_dir: temp_dir,
    })
}

fn to_grayscale_png(source: &Path, dest: &Path) -> Result<(), Img2TexError> {
    let decode_err = |detail: String| Img2TexError::ImageDecodeFailed {
        path: source.to_path_buf(),
        detail,
    };

    // Sniff rather than trust the extension; downloads get a generic name.
    let img = ImageReader::open(source)
        .and_then(|r| r.with_guessed_format())
        .map_err(|e| decode_err(e.to_string()))?
        .decode()
        .map_err(|e| decode_err(e.to_string()))?;
    let luma = img.to_luma8();
    debug!(
        "Grayscale {}x{} from {}",
        luma.width(),
        luma.height(),
        source.display()
    );
    luma.save_with_format(dest, ImageFormat::Png)
        .map_err(|e| decode_err(format!("re-encode failed: {e}")))
}
