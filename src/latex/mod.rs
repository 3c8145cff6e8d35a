//! Text-to-LaTeX conversion engine.
//!
//! Turns the linear text produced by an OCR engine into a LaTeX body. The
//! engine has no I/O and no failure modes: it is total over all strings and
//! running it twice on the same input gives identical output.
//!
//! ## Per-line flow
//!
//! ```text
//! raw line ──▶ trim ──▶ escape ──▶ classify ──┬─ Prose ────────▶ escaped text
//!   (empty lines dropped)                     ├─ DisplayMath ──▶ rewrite ─▶ \[ … \]
//!                                             └─ InlineMath ───▶ rewrite ─▶ \( … \)
//! ```
//!
//! 1. [`escape`]   — single-pass special-character escaping
//! 2. [`classify`] — the prose / display / inline decision ladder
//! 3. [`rewrite`]  — ordered substring rules for functions, fractions,
//!    exponents, roots and bounded integrals

pub mod classify;
pub mod escape;
pub mod rewrite;

pub use classify::{classify_line, LineKind};
pub use escape::escape_latex;
pub use rewrite::rewrite_math;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Delimiters used to wrap math lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MathDelimiters {
    /// `\[ … \]` for display, `\( … \)` for inline. (default)
    #[default]
    Brackets,
    /// `$$ … $$` for display, `$ … $` for inline.
    Dollars,
}

impl MathDelimiters {
    /// Wrap already-rewritten math according to its kind.
    ///
    /// Prose is returned unchanged.
    pub fn wrap(&self, kind: LineKind, math: &str) -> String {
        match (self, kind) {
            (_, LineKind::Prose) => math.to_string(),
            (MathDelimiters::Brackets, LineKind::DisplayMath) => format!(r"\[ {math} \]"),
            (MathDelimiters::Brackets, LineKind::InlineMath) => format!(r"\( {math} \)"),
            (MathDelimiters::Dollars, LineKind::DisplayMath) => format!("$$ {math} $$"),
            (MathDelimiters::Dollars, LineKind::InlineMath) => format!("$ {math} $"),
        }
    }
}

/// One emitted output line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertedLine {
    pub kind: LineKind,
    /// Escaped (and, for math, rewritten and wrapped) LaTeX.
    pub latex: String,
}

/// Ordered result of converting one block of recognised text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionResult {
    pub lines: Vec<ConvertedLine>,
    /// Empty or whitespace-only input lines that were skipped.
    pub dropped_lines: usize,
}

impl ConversionResult {
    /// Join all emitted lines with `\n`.
    pub fn to_latex(&self) -> String {
        self.lines
            .iter()
            .map(|l| l.latex.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Number of emitted lines of the given kind.
    pub fn count(&self, kind: LineKind) -> usize {
        self.lines.iter().filter(|l| l.kind == kind).count()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// The conversion engine.
///
/// Rule tables are process-wide immutable statics; the converter itself only
/// carries presentation choices, so it is cheap to copy and share.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LatexConverter {
    delimiters: MathDelimiters,
}

impl LatexConverter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delimiters(delimiters: MathDelimiters) -> Self {
        Self { delimiters }
    }

    pub fn delimiters(&self) -> MathDelimiters {
        self.delimiters
    }

    /// Convert raw recognised text into a LaTeX body.
    ///
    /// Empty input yields an empty string.
    pub fn convert(&self, raw: &str) -> String {
        self.convert_lines(raw).to_latex()
    }

    /// Like [`convert`](Self::convert), but keeps each line's classification.
    pub fn convert_lines(&self, raw: &str) -> ConversionResult {
        let mut result = ConversionResult::default();
        if raw.is_empty() {
            return result;
        }

        for line in raw.split('\n') {
            let line = line.trim();
            if line.is_empty() {
                result.dropped_lines += 1;
                continue;
            }
            result.lines.push(self.convert_line(line));
        }

        debug!(
            "Converted {} lines ({} display, {} inline, {} prose, {} dropped)",
            result.lines.len(),
            result.count(LineKind::DisplayMath),
            result.count(LineKind::InlineMath),
            result.count(LineKind::Prose),
            result.dropped_lines
        );
        result
    }

    /// Convert a single non-empty, trimmed line.
    pub fn convert_line(&self, line: &str) -> ConvertedLine {
        let escaped = escape_latex(line);
        let kind = classify_line(&escaped);
        let latex = match kind {
            LineKind::Prose => escaped,
            LineKind::DisplayMath | LineKind::InlineMath => {
                self.delimiters.wrap(kind, &rewrite_math(&escaped))
            }
        };
        ConvertedLine { kind, latex }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_empty_output() {
        let c = LatexConverter::new();
        assert_eq!(c.convert(""), "");
        let r = c.convert_lines("");
        assert!(r.is_empty());
        assert_eq!(r.dropped_lines, 0);
    }

    #[test]
    fn whitespace_lines_are_dropped() {
        let c = LatexConverter::new();
        assert_eq!(c.convert("   \n\t\n"), "");
        let r = c.convert_lines("Hello\n   \nWorld");
        assert_eq!(r.lines.len(), 2);
        assert_eq!(r.dropped_lines, 1);
        assert_eq!(r.to_latex(), "Hello\nWorld");
    }

    #[test]
    fn einstein() {
        let out = LatexConverter::new().convert("E = mc^2");
        assert_eq!(out, r"\[ E = mc^{2} \]");
    }

    #[test]
    fn fraction_sqrt_integral_lines() {
        let c = LatexConverter::new();
        assert_eq!(c.convert("1/3"), r"\[ \frac{1}{3} \]");
        assert_eq!(c.convert("sqrt(4)"), r"\[ \sqrt{4} \]");
        assert_eq!(c.convert("int_0^1 x"), r"\[ \int_{0}^{1} x \]");
    }

    #[test]
    fn prose_is_escaped_only() {
        let c = LatexConverter::new();
        assert_eq!(c.convert("The results are in"), "The results are in");
        // The escape introduces a backslash, which makes the line display math.
        let line = c.convert_line("Profit & loss");
        assert_eq!(line.kind, LineKind::DisplayMath);
        assert_eq!(line.latex, r"\[ Profit \& loss \]");
    }

    #[test]
    fn order_is_preserved_and_crlf_trimmed() {
        let c = LatexConverter::new();
        let out = c.convert("Intro text\r\n\r\nx + y\r\nClosing words\r\n");
        assert_eq!(out, "Intro text\n\\[ x + y \\]\nClosing words");
    }

    #[test]
    fn function_name_glued_to_greek_letter() {
        let line = LatexConverter::new().convert_line("take sinθ now");
        assert_eq!(line.kind, LineKind::DisplayMath);
        assert_eq!(line.latex, r"\[ take \sinθ now \]");
    }

    #[test]
    fn dollar_delimiters() {
        let c = LatexConverter::with_delimiters(MathDelimiters::Dollars);
        assert_eq!(c.convert("1/2"), r"$$ \frac{1}{2} $$");
        assert_eq!(
            MathDelimiters::Dollars.wrap(LineKind::InlineMath, "x"),
            "$ x $"
        );
        assert_eq!(
            MathDelimiters::Brackets.wrap(LineKind::InlineMath, "x"),
            r"\( x \)"
        );
    }

    #[test]
    fn conversion_is_repeatable() {
        let c = LatexConverter::new();
        let raw = "E = mc^2\n\n∫ from 0 to 1 x^2 dx = 1/3\n\nlim x→∞ (1 + 1/x)^x = e";
        assert_eq!(c.convert(raw), c.convert(raw));
    }

    #[test]
    fn placeholder_text_converts() {
        let raw = "E = mc^2\n\n∫ from 0 to 1 x^2 dx = 1/3\n\nlim x→∞ (1 + 1/x)^x = e";
        let r = LatexConverter::new().convert_lines(raw);
        assert_eq!(r.lines.len(), 3);
        assert_eq!(r.dropped_lines, 2);
        assert!(r.lines.iter().all(|l| l.kind == LineKind::DisplayMath));
        assert_eq!(r.lines[1].latex, r"\[ ∫ from 0 to 1 x^{2} dx = \frac{1}{3} \]");
        assert!(r.lines[2].latex.starts_with(r"\[ \lim x→∞"));
    }
}
