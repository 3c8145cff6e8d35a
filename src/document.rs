//! Document wrapper: embed a converted LaTeX body in a compilable article.
//!
//! The body produced by [`crate::latex::LatexConverter`] is a fragment; it
//! uses `\[ … \]` and `\frac`, which need `amsmath` to compile cleanly. The
//! wrapper adds the minimal preamble so `pdflatex preview.tex` works as-is.

use crate::latex::escape_latex;
use serde::{Deserialize, Serialize};

/// Title and author shown by `\maketitle`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentOptions {
    pub title: String,
    pub author: String,
}

impl Default for DocumentOptions {
    fn default() -> Self {
        Self {
            title: "OCR to LaTeX Conversion Result".to_string(),
            author: "img2tex".to_string(),
        }
    }
}

const PREAMBLE: &str = r"\documentclass{article}
\usepackage{amsmath}
\usepackage{amssymb}
\usepackage[utf8]{inputenc}
\usepackage{graphicx}
\begin{document}
";

const POSTAMBLE: &str = r"
\end{document}
";

/// Wrap `body` between the fixed preamble and postamble.
///
/// Title and author are escaped; the body is inserted verbatim.
pub fn wrap_document(body: &str, options: &DocumentOptions) -> String {
    let mut doc = String::with_capacity(PREAMBLE.len() + body.len() + 256);
    doc.push_str(PREAMBLE);
    doc.push('\n');
    doc.push_str(&format!(r"\title{{{}}}", escape_latex(&options.title)));
    doc.push('\n');
    doc.push_str(&format!(r"\author{{{}}}", escape_latex(&options.author)));
    doc.push('\n');
    doc.push_str("\\maketitle\n\n% Converted from image\n");
    doc.push_str(body);
    doc.push('\n');
    doc.push_str(POSTAMBLE);
    doc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_body_between_begin_and_end() {
        let doc = wrap_document(r"\[ x^{2} \]", &DocumentOptions::default());
        assert!(doc.starts_with("\\documentclass{article}\n"));
        assert!(doc.contains("\\usepackage{amsmath}"));
        let begin = doc.find("\\begin{document}").unwrap();
        let body = doc.find(r"\[ x^{2} \]").unwrap();
        let end = doc.find("\\end{document}").unwrap();
        assert!(begin < body && body < end);
        assert!(doc.ends_with("\\end{document}\n"));
    }

    #[test]
    fn title_and_author_are_escaped() {
        let opts = DocumentOptions {
            title: "Notes #3 & more".into(),
            author: "A_B".into(),
        };
        let doc = wrap_document("", &opts);
        assert!(doc.contains(r"\title{Notes \#3 \& more}"));
        assert!(doc.contains(r"\author{A\_B}"));
        assert!(doc.contains("\\maketitle"));
    }

    #[test]
    fn empty_body_still_compiles_shape() {
        let doc = wrap_document("", &DocumentOptions::default());
        assert!(doc.contains("% Converted from image\n\n\n\\end{document}"));
    }
}
