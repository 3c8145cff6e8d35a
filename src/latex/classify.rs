//! Line classification: prose, display math, or inline math.
//!
//! Classification runs on the *escaped* line and is a fixed decision ladder:
//!
//! 1. any backslash (an escape or a command already present) → display math
//! 2. more than 60 % of non-whitespace characters are math-like → display math
//! 3. any structural math pattern matches → display math
//! 4. any inline pattern matches → inline math
//! 5. otherwise → prose
//!
//! Display detection always runs before inline detection. Every inline
//! pattern requires `=`, which is itself a structural display trigger, so in
//! practice lines reaching step 4 are rare. The order is kept as-is.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// The class of a single non-empty line of recognised text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineKind {
    /// Ordinary text, emitted escaped but otherwise untouched.
    Prose,
    /// A standalone formula, wrapped in display delimiters.
    DisplayMath,
    /// A short formula, wrapped in inline delimiters.
    InlineMath,
}

/// Fraction of math-like characters above which a line is display math.
pub const MATH_RATIO_THRESHOLD: f64 = 0.6;

/// Operators, brackets, comparison signs, calculus symbols and Greek letters.
/// Digits are counted separately.
pub const MATH_SYMBOLS: &str =
    "=+-*/^()[]{}<>|±×÷∂∆∇∫∑∏√∞≈≠≤≥αβγδϵζηθικλμνξπρστυϕχψω";

/// Structural display-math patterns, evaluated in order; first match wins.
///
/// Word boundaries and whitespace are ASCII-only (`(?-u:…)`), so a Greek
/// letter glued to a function name (`sinθ`) still ends the word.
const DISPLAY_PATTERN_SOURCES: [&str; 5] = [
    // arithmetic operators, parentheses, brackets
    r"[=+\-*/^()\[\]]",
    // digit-operator-digit
    r"[0-9]+[+\-*/][0-9]+",
    // letter = number
    r"[a-zA-Z](?-u:\s)*=(?-u:\s)*[0-9]+",
    // call-like: f(x)
    r"[a-zA-Z]\([^)]+\)",
    // known function names as whole words
    r"(?-u:\b)(?:sin|cos|tan|log|ln|lim|sum|prod|int)(?-u:\b)",
];

/// Inline-math patterns, anchored to the whole line.
const INLINE_PATTERN_SOURCES: [&str; 3] = [
    r"^[a-zA-Z](?-u:\s)*=(?-u:\s)*.+$",
    r"^.+\^.+(?-u:\s)*=.+$",
    r"^[xyz](?-u:\s)*=(?-u:\s)*[0-9]+$",
];

static DISPLAY_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| compile(&DISPLAY_PATTERN_SOURCES));
static INLINE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| compile(&INLINE_PATTERN_SOURCES));

fn compile(sources: &[&str]) -> Vec<Regex> {
    sources
        .iter()
        .map(|src| Regex::new(src).unwrap())
        .collect()
}

/// Classify an escaped, non-empty line.
///
/// Total: every input maps to exactly one [`LineKind`].
pub fn classify_line(line: &str) -> LineKind {
    if is_display_math(line) {
        LineKind::DisplayMath
    } else if is_inline_math(line) {
        LineKind::InlineMath
    } else {
        LineKind::Prose
    }
}

/// Steps 1–3 of the ladder.
pub fn is_display_math(line: &str) -> bool {
    if line.contains('\\') {
        return true;
    }

    if math_char_ratio(line).is_some_and(|r| r > MATH_RATIO_THRESHOLD) {
        return true;
    }

    DISPLAY_PATTERNS.iter().any(|re| re.is_match(line))
}

/// Step 4 of the ladder, usable on its own.
pub fn is_inline_math(line: &str) -> bool {
    INLINE_PATTERNS.iter().any(|re| re.is_match(line))
}

/// Share of non-whitespace characters that are decimal digits or [`MATH_SYMBOLS`].
///
/// `None` when the line has no non-whitespace characters.
pub fn math_char_ratio(line: &str) -> Option<f64> {
    let mut total = 0usize;
    let mut math = 0usize;
    for c in line.chars().filter(|c| !c.is_whitespace()) {
        total += 1;
        if is_math_char(c) {
            math += 1;
        }
    }
    (total > 0).then(|| math as f64 / total as f64)
}

fn is_math_char(c: char) -> bool {
    is_decimal_digit(c) || MATH_SYMBOLS.contains(c)
}

/// First code point of each run of ten decimal digits (general category Nd).
///
/// `char::is_numeric` also accepts No and Nl (`²`, `₀`, `½`, `Ⅻ`), which
/// are not digits for the ratio.
const DECIMAL_DIGIT_ZEROS: [u32; 63] = [
    0x0030, 0x0660, 0x06F0, 0x07C0, 0x0966, 0x09E6, 0x0A66, 0x0AE6, 0x0B66, 0x0BE6, 0x0C66,
    0x0CE6, 0x0D66, 0x0DE6, 0x0E50, 0x0ED0, 0x0F20, 0x1040, 0x1090, 0x17E0, 0x1810, 0x1946,
    0x19D0, 0x1A80, 0x1A90, 0x1B50, 0x1BB0, 0x1C40, 0x1C50, 0xA620, 0xA8D0, 0xA900, 0xA9D0,
    0xA9F0, 0xAA50, 0xABF0, 0xFF10, 0x104A0, 0x10D30, 0x11066, 0x110F0, 0x11136, 0x111D0,
    0x112F0, 0x11450, 0x114D0, 0x11650, 0x116C0, 0x11730, 0x118E0, 0x11950, 0x11C50, 0x11D50,
    0x11DA0, 0x11F50, 0x16A60, 0x16AC0, 0x16B50, 0x1E140, 0x1E2F0, 0x1E4F0, 0x1E950, 0x1FBF0,
];

/// Whether `c` is a decimal digit (Nd) in any script.
pub fn is_decimal_digit(c: char) -> bool {
    if c.is_ascii() {
        return c.is_ascii_digit();
    }
    let cp = c as u32;
    // Mathematical alphanumeric digits: five consecutive sets of ten.
    if (0x1D7CE..=0x1D7FF).contains(&cp) {
        return true;
    }
    DECIMAL_DIGIT_ZEROS
        .iter()
        .any(|&zero| (zero..zero + 10).contains(&cp))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prose_lines() {
        assert_eq!(classify_line("Hello world"), LineKind::Prose);
        assert_eq!(classify_line("Chapter 12 begins here"), LineKind::Prose);
        // `cos` inside a longer word is not a function name.
        assert_eq!(classify_line("using cosine similarity"), LineKind::Prose);
    }

    #[test]
    fn backslash_forces_display() {
        assert_eq!(classify_line(r"50\% off"), LineKind::DisplayMath);
        assert_eq!(classify_line(r"mc\textasciicircum{}2"), LineKind::DisplayMath);
    }

    #[test]
    fn dense_math_is_display() {
        assert_eq!(classify_line("1/3"), LineKind::DisplayMath);
        assert_eq!(classify_line("α β γ"), LineKind::DisplayMath);
        assert_eq!(classify_line("42"), LineKind::DisplayMath);
    }

    #[test]
    fn structural_patterns_are_display() {
        assert_eq!(classify_line("a + b"), LineKind::DisplayMath);
        assert_eq!(classify_line("f(x) is smooth"), LineKind::DisplayMath);
        assert_eq!(classify_line("take sin of theta"), LineKind::DisplayMath);
        assert_eq!(classify_line("lim as n grows"), LineKind::DisplayMath);
    }

    #[test]
    fn ratio_ignores_whitespace() {
        assert_eq!(math_char_ratio("1 2 3"), Some(1.0));
        assert_eq!(math_char_ratio("ab 12"), Some(0.5));
        assert_eq!(math_char_ratio("   "), None);
    }

    #[test]
    fn ratio_threshold_is_strict() {
        // 3 of 5 = 0.6 exactly, not above the threshold; no pattern matches.
        assert_eq!(math_char_ratio("123ab"), Some(0.6));
        assert_eq!(classify_line("123ab"), LineKind::Prose);
    }

    #[test]
    fn inline_patterns_match_on_their_own() {
        assert!(is_inline_math("x = 5"));
        assert!(is_inline_math("E = anything"));
        assert!(is_inline_math("a^b = c"));
        assert!(!is_inline_math("hello"));
        assert!(!is_inline_math("xy = 5"));
    }

    /// Display detection runs first, and `=` is a display trigger, so a line
    /// that satisfies the inline patterns is still classified as display math.
    #[test]
    fn inline_looking_lines_classify_as_display() {
        for line in ["x = 5", "y = 10", "E = mc"] {
            assert!(is_inline_math(line), "{line:?} should look inline");
            assert_eq!(classify_line(line), LineKind::DisplayMath, "{line:?}");
        }
    }

    #[test]
    fn classification_is_total_and_exclusive() {
        let lines = [
            "Hello", "x = 1", "1/2", "sqrt(4)", "∫", "word word word", r"\&", "a",
        ];
        for line in lines {
            let kind = classify_line(line);
            let display = is_display_math(line);
            let inline = !display && is_inline_math(line);
            let expected = match (display, inline) {
                (true, _) => LineKind::DisplayMath,
                (false, true) => LineKind::InlineMath,
                (false, false) => LineKind::Prose,
            };
            assert_eq!(kind, expected, "{line:?}");
        }
    }

    #[test]
    fn function_name_next_to_greek_letter() {
        assert!(is_display_math("take sinθ now"));
        assert_eq!(classify_line("take sinθ now"), LineKind::DisplayMath);
        assert_eq!(classify_line("logπ"), LineKind::DisplayMath);
        // A letter before the name still joins the word.
        assert_eq!(classify_line("cosine αlpha"), LineKind::Prose);
    }

    #[test]
    fn superscript_digits_are_not_math_chars() {
        assert_eq!(math_char_ratio("a²³"), Some(0.0));
        assert_eq!(classify_line("a²³"), LineKind::Prose);
        assert_eq!(math_char_ratio("½Ⅻ₀"), Some(0.0));
    }

    #[test]
    fn decimal_digits_in_any_script_count() {
        for c in ['0', '9', '٣', '۵', '७', '৪', '５', '𝟘', '𝟿'] {
            assert!(is_decimal_digit(c), "{c:?}");
        }
        for c in ['a', '²', '₁', '½', 'Ⅻ', '①', '٪'] {
            assert!(!is_decimal_digit(c), "{c:?}");
        }
        assert_eq!(math_char_ratio("٣٤ab"), Some(0.5));
    }

    #[test]
    fn every_pattern_compiles() {
        assert_eq!(DISPLAY_PATTERNS.len(), DISPLAY_PATTERN_SOURCES.len());
        assert_eq!(INLINE_PATTERNS.len(), INLINE_PATTERN_SOURCES.len());
    }

    #[test]
    fn line_kind_serialises_snake_case() {
        let json = serde_json::to_string(&LineKind::DisplayMath).unwrap();
        assert_eq!(json, "\"display_math\"");
    }
}
