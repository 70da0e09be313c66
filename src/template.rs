//! Column-substitution templates.
//!
//! A template turns one line of the interval file into an annotation string.
//! Column references use 1-based column numbers and come in two spellings:
//!
//! - `${12}` — braced, unambiguous
//! - `$12` — bare, digits run to the first non-digit
//!
//! Everything else is literal text. The default template `${1}:${2}-${3}`
//! renders an interval as `chrom:start-end`.
//!
//! # Examples
//!
//! ```
//! use vartag::template::Template;
//!
//! # fn main() -> vartag::Result<()> {
//! let template = Template::compile("${1}:${2}-${3}")?;
//! let tokens = vec!["chr1".to_string(), "100".to_string(), "200".to_string()];
//! assert_eq!(template.render(&tokens)?, "chr1:100-200");
//! # Ok(())
//! # }
//! ```
//!
//! Compilation fails up front on malformed templates, before any record is
//! processed:
//!
//! ```
//! use vartag::template::Template;
//!
//! assert!(Template::compile("${}").is_err());
//! assert!(Template::compile("${x}").is_err());
//! assert!(Template::compile("${4").is_err());
//! ```

use crate::error::{Result, VartagError};

/// One segment of a compiled template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateChunk {
    /// Verbatim text
    Literal(String),
    /// Zero-based token index (template column number minus one)
    ColumnRef(usize),
}

/// A compiled format template.
///
/// Built once per run from the format string, immutable thereafter.
/// Rendering folds over the chunk sequence in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    chunks: Vec<TemplateChunk>,
}

impl Template {
    /// Compiles a format string into a chunk sequence.
    ///
    /// An empty format compiles to a single empty literal.
    ///
    /// # Errors
    ///
    /// Returns [`VartagError::TemplateSyntax`] when a `${` has no matching
    /// `}`, when the referenced column is not a positive integer, or when a
    /// bare `$` is followed by no digits.
    pub fn compile(format: &str) -> Result<Self> {
        let syntax = |reason: &str| VartagError::TemplateSyntax {
            format: format.to_string(),
            reason: reason.to_string(),
        };

        let bytes = format.as_bytes();
        let mut chunks = Vec::new();
        let mut i = 0;

        while i < bytes.len() {
            if bytes[i] == b'$' {
                let (column, next) = if format[i..].starts_with("${") {
                    let close = format[i + 2..]
                        .find('}')
                        .ok_or_else(|| syntax("unterminated ${"))?;
                    (&format[i + 2..i + 2 + close], i + 2 + close + 1)
                } else {
                    let digits = format[i + 1..]
                        .bytes()
                        .take_while(|b| b.is_ascii_digit())
                        .count();
                    (&format[i + 1..i + 1 + digits], i + 1 + digits)
                };

                let column: usize = column
                    .trim()
                    .parse()
                    .map_err(|_| syntax("column reference is not a number"))?;
                if column < 1 {
                    return Err(syntax("column numbers start at 1"));
                }
                chunks.push(TemplateChunk::ColumnRef(column - 1));
                i = next;
            } else {
                let run = format[i..].find('$').unwrap_or(format.len() - i);
                chunks.push(TemplateChunk::Literal(format[i..i + run].to_string()));
                i += run;
            }
        }

        if chunks.is_empty() {
            chunks.push(TemplateChunk::Literal(String::new()));
        }

        Ok(Template { chunks })
    }

    /// Renders the template against one line's tokens.
    ///
    /// # Errors
    ///
    /// Returns [`VartagError::ColumnOutOfRange`] when a column reference
    /// exceeds the token count. An out-of-range reference is an error, not
    /// a silent empty string: it indicates a structural mismatch between the
    /// template and the data.
    pub fn render(&self, tokens: &[String]) -> Result<String> {
        let mut out = String::new();
        for chunk in &self.chunks {
            match chunk {
                TemplateChunk::Literal(s) => out.push_str(s),
                TemplateChunk::ColumnRef(index) => {
                    let token = tokens.get(*index).ok_or(VartagError::ColumnOutOfRange {
                        column: index + 1,
                        available: tokens.len(),
                    })?;
                    out.push_str(token);
                }
            }
        }
        Ok(out)
    }

    /// The compiled chunk sequence.
    pub fn chunks(&self) -> &[TemplateChunk] {
        &self.chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(fields: &[&str]) -> Vec<String> {
        fields.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_compile_default_template() {
        let template = Template::compile("${1}:${2}-${3}").unwrap();
        assert_eq!(
            template.chunks(),
            &[
                TemplateChunk::ColumnRef(0),
                TemplateChunk::Literal(":".to_string()),
                TemplateChunk::ColumnRef(1),
                TemplateChunk::Literal("-".to_string()),
                TemplateChunk::ColumnRef(2),
            ]
        );
    }

    #[test]
    fn test_render_round_trip() {
        let template = Template::compile("${1}:${2}-${3}").unwrap();
        let rendered = template.render(&tokens(&["chr1", "100", "200"])).unwrap();
        assert_eq!(rendered, "chr1:100-200");
    }

    #[test]
    fn test_bare_dollar_reference() {
        let template = Template::compile("gene=$4").unwrap();
        let rendered = template
            .render(&tokens(&["chr1", "100", "200", "geneA"]))
            .unwrap();
        assert_eq!(rendered, "gene=geneA");
    }

    #[test]
    fn test_bare_dollar_digits_stop_at_non_digit() {
        let template = Template::compile("$1x").unwrap();
        let rendered = template.render(&tokens(&["chr1"])).unwrap();
        assert_eq!(rendered, "chr1x");
    }

    #[test]
    fn test_empty_format_is_single_empty_literal() {
        let template = Template::compile("").unwrap();
        assert_eq!(
            template.chunks(),
            &[TemplateChunk::Literal(String::new())]
        );
        assert_eq!(template.render(&tokens(&["chr1"])).unwrap(), "");
    }

    #[test]
    fn test_literal_only() {
        let template = Template::compile("plain text").unwrap();
        assert_eq!(template.render(&[]).unwrap(), "plain text");
    }

    #[test]
    fn test_unterminated_brace_fails() {
        assert!(matches!(
            Template::compile("${4"),
            Err(VartagError::TemplateSyntax { .. })
        ));
    }

    #[test]
    fn test_empty_braces_fail() {
        assert!(matches!(
            Template::compile("${}"),
            Err(VartagError::TemplateSyntax { .. })
        ));
    }

    #[test]
    fn test_non_numeric_reference_fails() {
        assert!(matches!(
            Template::compile("${x}"),
            Err(VartagError::TemplateSyntax { .. })
        ));
    }

    #[test]
    fn test_zero_column_fails() {
        assert!(matches!(
            Template::compile("${0}"),
            Err(VartagError::TemplateSyntax { .. })
        ));
    }

    #[test]
    fn test_bare_dollar_without_digits_fails() {
        assert!(matches!(
            Template::compile("cost: $"),
            Err(VartagError::TemplateSyntax { .. })
        ));
    }

    #[test]
    fn test_render_out_of_range_is_error() {
        let template = Template::compile("${4}").unwrap();
        let err = template
            .render(&tokens(&["chr1", "100", "200"]))
            .unwrap_err();
        match err {
            VartagError::ColumnOutOfRange { column, available } => {
                assert_eq!(column, 4);
                assert_eq!(available, 3);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_whitespace_inside_braces() {
        let template = Template::compile("${ 2 }").unwrap();
        assert_eq!(template.chunks(), &[TemplateChunk::ColumnRef(1)]);
    }
}
