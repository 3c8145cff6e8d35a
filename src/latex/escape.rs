//! LaTeX special-character escaping.
//!
//! Ten characters carry control meaning in LaTeX. Several replacements
//! (`\&`, `\textbackslash{}`) themselves contain a backslash, so chaining
//! `str::replace` calls would re-escape earlier output depending on the order
//! of the calls. Instead every character of the *original* input is examined
//! exactly once and its replacement is appended verbatim.

/// Replacement for a single character, or `None` when it is safe as-is.
///
/// This is the complete escape table, in the order it is documented.
pub fn escape_char(c: char) -> Option<&'static str> {
    match c {
        '&' => Some(r"\&"),
        '%' => Some(r"\%"),
        '$' => Some(r"\$"),
        '#' => Some(r"\#"),
        '_' => Some(r"\_"),
        '{' => Some(r"\{"),
        '}' => Some(r"\}"),
        '~' => Some(r"\textasciitilde{}"),
        '^' => Some(r"\textasciicircum{}"),
        '\\' => Some(r"\textbackslash{}"),
        _ => None,
    }
}

/// Escape every LaTeX special character in `text` in a single pass.
pub fn escape_latex(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 4);
    for c in text.chars() {
        match escape_char(c) {
            Some(rep) => out.push_str(rep),
            None => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_unchanged() {
        let s = "The quick brown fox 123 (ok) = 5 + 3";
        assert_eq!(escape_latex(s), s);
        assert_eq!(escape_latex(""), "");
    }

    #[test]
    fn each_special_char_maps_exactly() {
        let table = [
            ("&", r"\&"),
            ("%", r"\%"),
            ("$", r"\$"),
            ("#", r"\#"),
            ("_", r"\_"),
            ("{", r"\{"),
            ("}", r"\}"),
            ("~", r"\textasciitilde{}"),
            ("^", r"\textasciicircum{}"),
            ("\\", r"\textbackslash{}"),
        ];
        for (input, expected) in table {
            assert_eq!(escape_latex(input), expected, "escaping {input:?}");
        }
    }

    #[test]
    fn backslash_output_is_not_reescaped() {
        // A naive replace chain would turn `\&` into `\textbackslash{}&`
        // or the braces of `\textbackslash{}` into `\{\}`.
        assert_eq!(escape_latex(r"a\&b"), r"a\textbackslash{}\&b");
        assert_eq!(escape_latex("{~}"), r"\{\textasciitilde{}\}");
    }

    #[test]
    fn unicode_is_preserved() {
        assert_eq!(escape_latex("∫ x→∞ α_1"), r"∫ x→∞ α\_1");
    }
}
