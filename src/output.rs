//! Output types returned by the conversion entry points.

use crate::error::ImageError;
use crate::latex::{ConversionResult, ConvertedLine, LineKind};
use crate::pipeline::ocr::OcrSource;
use serde::{Deserialize, Serialize};

/// Result of converting one image (or one block of text).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutput {
    /// The input as given: a path, a URL, or `"<text>"`.
    pub input: String,
    /// The LaTeX body, one emitted line per `\n`.
    pub latex: String,
    /// `latex` wrapped in a compilable article.
    pub document: String,
    /// Text exactly as the OCR engine returned it.
    pub raw_text: String,
    /// Engine that produced `raw_text`.
    pub source: OcrSource,
    pub language: String,
    /// Why the primary engine was bypassed, when `source` is the placeholder.
    pub fallback_reason: Option<String>,
    pub lines: Vec<ConvertedLine>,
    pub stats: ConversionStats,
}

impl ConversionOutput {
    /// True when the text is the placeholder stand-in, not a recognition.
    pub fn is_placeholder(&self) -> bool {
        self.source == OcrSource::Placeholder
    }
}

/// Line counts and timings for one conversion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionStats {
    /// Emitted lines.
    pub total_lines: usize,
    pub prose_lines: usize,
    pub display_lines: usize,
    pub inline_lines: usize,
    /// Blank lines skipped.
    pub dropped_lines: usize,
    pub ocr_duration_ms: u64,
    pub convert_duration_ms: u64,
    pub total_duration_ms: u64,
}

impl ConversionStats {
    pub(crate) fn from_result(result: &ConversionResult) -> Self {
        Self {
            total_lines: result.lines.len(),
            prose_lines: result.count(LineKind::Prose),
            display_lines: result.count(LineKind::DisplayMath),
            inline_lines: result.count(LineKind::InlineMath),
            dropped_lines: result.dropped_lines,
            ..Self::default()
        }
    }
}

/// Outcome of one input in a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageResult {
    /// 0-based position in the batch.
    pub index: usize,
    pub input: String,
    pub output: Option<ConversionOutput>,
    pub error: Option<ImageError>,
}

impl ImageResult {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// All results of a batch, in input order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchOutput {
    pub images: Vec<ImageResult>,
    pub succeeded: usize,
    pub failed: usize,
    /// Successful results whose text came from the placeholder.
    pub placeholders: usize,
    pub total_duration_ms: u64,
}

impl BatchOutput {
    pub(crate) fn from_results(mut images: Vec<ImageResult>, total_duration_ms: u64) -> Self {
        images.sort_by_key(|r| r.index);
        let succeeded = images.iter().filter(|r| r.is_ok()).count();
        let placeholders = images
            .iter()
            .filter_map(|r| r.output.as_ref())
            .filter(|o| o.is_placeholder())
            .count();
        Self {
            failed: images.len() - succeeded,
            succeeded,
            placeholders,
            images,
            total_duration_ms,
        }
    }

    /// Successful outputs, in input order.
    pub fn outputs(&self) -> impl Iterator<Item = &ConversionOutput> {
        self.images.iter().filter_map(|r| r.output.as_ref())
    }

    pub fn errors(&self) -> impl Iterator<Item = &ImageError> {
        self.images.iter().filter_map(|r| r.error.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::latex::LatexConverter;

    fn failed(index: usize) -> ImageResult {
        ImageResult {
            index,
            input: format!("img{index}.png"),
            output: None,
            error: Some(ImageError {
                index,
                input: format!("img{index}.png"),
                detail: "boom".into(),
            }),
        }
    }

    #[test]
    fn stats_from_result() {
        let r = LatexConverter::new().convert_lines("Hello\n\nx + 1\n");
        let s = ConversionStats::from_result(&r);
        assert_eq!(s.total_lines, 2);
        assert_eq!(s.prose_lines, 1);
        assert_eq!(s.display_lines, 1);
        assert_eq!(s.inline_lines, 0);
        assert_eq!(s.dropped_lines, 2);
    }

    #[test]
    fn batch_sorts_and_counts() {
        let batch = BatchOutput::from_results(vec![failed(2), failed(0), failed(1)], 10);
        let order: Vec<usize> = batch.images.iter().map(|r| r.index).collect();
        assert_eq!(order, [0, 1, 2]);
        assert_eq!(batch.failed, 3);
        assert_eq!(batch.succeeded, 0);
        assert_eq!(batch.errors().count(), 3);
        assert_eq!(batch.outputs().count(), 0);
    }
}
