use std::fmt;
use std::ops::Range;

/// Source line and caret pointing at the token a parse error stopped on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorHighlight {
    /// 1-based line number.
    pub line: usize,
    /// 1-based column, in characters.
    pub column: usize,
    pub line_text: String,
}

impl ErrorHighlight {
    /// Locate `span` in `source`. Returns `None` for empty input.
    pub fn from_span(source: &str, span: Range<usize>) -> Option<Self> {
        if source.is_empty() {
            return None;
        }

        let mut offset = span.start.min(source.len());
        while !source.is_char_boundary(offset) {
            offset -= 1;
        }

        let line_start = source[..offset].rfind('\n').map_or(0, |pos| pos + 1);
        let line_end = source[offset..].find('\n').map_or(source.len(), |pos| offset + pos);

        Some(Self {
            line: source[..offset].matches('\n').count() + 1,
            column: source[line_start..offset].chars().count() + 1,
            line_text: source[line_start..line_end].trim_end_matches('\r').to_owned(),
        })
    }
}

impl fmt::Display for ErrorHighlight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Keep tabs so the caret lines up with the source line.
        let pad: String = self
            .line_text
            .chars()
            .take(self.column - 1)
            .map(|ch| if ch == '\t' { '\t' } else { ' ' })
            .collect();
        write!(f, "line {} column {}\n{}\n{pad}^", self.line, self.column, self.line_text)
    }
}
