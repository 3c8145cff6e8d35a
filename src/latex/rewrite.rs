//! Math rewriting: turn recognised math substrings into LaTeX markup.
//!
//! Five substring rules run in a fixed order, each as a global
//! find-and-replace over the whole line:
//!
//! 1. function names (`sin`, `log`, `int`, …) → `\sin`, `\log`, `\int`, …
//! 2. digit fractions `1/3` → `\frac{1}{3}`
//! 3. exponents `mc^2` → `mc^{2}`
//! 4. square roots `sqrt(4)` → `\sqrt{4}`
//! 5. bounded integrals `int_0^1 x` → `\int_{0}^{1} x`
//!
//! These are substring rewrites, not a parser: nested or overlapping
//! structures are not guaranteed to come out right.
//!
//! ## Escaped input
//!
//! The converter escapes a line *before* rewriting it, so `^` and `_` arrive
//! as `\textasciicircum{}` and `\_`. Rules 3 and 5 accept either spelling.
//! Rule 5 also accepts the output of rules 1 and 3 (`\int`, `^{…}`), since
//! they run first on the same line.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Function names promoted to LaTeX commands by rule 1.
pub const FUNCTION_NAMES: [&str; 9] = [
    "sin", "cos", "tan", "log", "ln", "lim", "sum", "prod", "int",
];

/// A superscript marker: raw `^` or its escaped form.
const SUP: &str = r"(?:\^|\\textasciicircum\{\})";
/// A subscript marker: raw `_` or its escaped form.
const SUB: &str = r"(?:_|\\_)";
/// ASCII word characters. Boundaries and whitespace in the rules are
/// ASCII too, so `sinθ` still yields `\sinθ`.
const WORD: &str = "[0-9A-Za-z_]";

/// A single ordered pattern → replacement rule.
pub struct RewriteRule {
    /// Short identifier used in logs and tests.
    pub name: &'static str,
    pattern: Regex,
    replacement: Replacement,
}

enum Replacement {
    /// A `regex` replacement template (`$1`, `${2}` …).
    Template(&'static str),
    /// Bounded integral; the upper bound may sit in either of two groups.
    Integral,
}

impl RewriteRule {
    fn template(name: &'static str, pattern: &str, template: &'static str) -> Self {
        Self {
            name,
            pattern: Regex::new(pattern).unwrap(),
            replacement: Replacement::Template(template),
        }
    }

    /// Apply this rule to every non-overlapping match in `input`.
    pub fn apply(&self, input: &str) -> String {
        match self.replacement {
            Replacement::Template(t) => self.pattern.replace_all(input, t).into_owned(),
            Replacement::Integral => self
                .pattern
                .replace_all(input, |caps: &Captures<'_>| {
                    let lower = &caps[1];
                    let upper = caps
                        .get(2)
                        .or_else(|| caps.get(3))
                        .map_or("", |m| m.as_str());
                    let integrand = &caps[4];
                    format!(r"\int_{{{lower}}}^{{{upper}}} {integrand}")
                })
                .into_owned(),
        }
    }
}

static RULES: Lazy<Vec<RewriteRule>> = Lazy::new(|| {
    vec![
        RewriteRule::template(
            "function",
            &format!(r"(?-u:\b)({})(?-u:\b)", FUNCTION_NAMES.join("|")),
            r"\${1}",
        ),
        RewriteRule::template("fraction", r"([0-9]+)/([0-9]+)", r"\frac{${1}}{${2}}"),
        RewriteRule::template(
            "exponent",
            &format!(r"({WORD}+){SUP}([0-9]+)"),
            "${1}^{${2}}",
        ),
        RewriteRule::template("sqrt", r"sqrt\(([^)]+)\)", r"\sqrt{${1}}"),
        RewriteRule {
            name: "integral",
            pattern: Regex::new(&format!(
                r"\\?int{SUB}({WORD}+)(?:\^\{{({WORD}+)\}}|{SUP}({WORD}+))(?-u:\s)*({WORD}+)"
            ))
            .unwrap(),
            replacement: Replacement::Integral,
        },
    ]
});

/// The rewrite rules in application order.
pub fn rules() -> &'static [RewriteRule] {
    &RULES
}

/// Apply every rewrite rule, in order, to a line already classified as math.
pub fn rewrite_math(line: &str) -> String {
    RULES
        .iter()
        .fold(line.to_string(), |acc, rule| rule.apply(&acc))
}
