mod composition;
mod error;
mod hierarchy;
mod metadata;
mod token_ops;
mod value;

use logos::Logos;
use std::iter::Peekable;
use std::ops::Range;

use crate::usda::token::Token;

pub use error::ErrorHighlight;

/// Parser translates a list of tokens into structured data.
pub struct Parser<'a> {
    iter: Peekable<logos::SpannedIter<'a, Token<'a>>>,
    source: &'a str,
    last_span: Option<Range<usize>>,
}

impl<'a> Parser<'a> {
    pub fn new(data: &'a str) -> Self {
        Self {
            iter: Token::lexer(data).spanned().peekable(),
            source: data,
            last_span: None,
        }
    }

    /// Location of the most recently consumed token.
    pub fn last_error_highlight(&self) -> Option<ErrorHighlight> {
        self.last_span
            .clone()
            .and_then(|span| ErrorHighlight::from_span(self.source, span))
    }
}
