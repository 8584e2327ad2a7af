use anyhow::{anyhow, ensure, Context, Result};

use crate::usda::token::{unescape, Token};

type LexResult<'source> = std::result::Result<Token<'source>, ()>;

/// Token stream operations.
impl<'a> super::Parser<'a> {
    /// Consume the next token, remembering its span for error reporting.
    #[inline]
    pub(super) fn fetch_next(&mut self) -> Result<Token<'a>> {
        let (token, span) = self.iter.next().context("Unexpected end of file")?;
        self.last_span = Some(span);
        token.map_err(|_| anyhow!("Unrecognized input"))
    }

    #[inline]
    pub(super) fn peek_next(&mut self) -> Option<&LexResult<'a>> {
        self.iter.peek().map(|(token, _)| token)
    }

    #[inline]
    pub(super) fn is_next(&mut self, expected: Token) -> bool {
        matches!(self.peek_next(), Some(Ok(t)) if *t == expected)
    }

    pub(super) fn ensure_next(&mut self, expected: Token) -> Result<()> {
        let token = self.fetch_next()?;
        ensure!(token == expected, "Unexpected token (want: {expected:?}, got {token:?})");
        Ok(())
    }

    #[inline]
    pub(super) fn ensure_pun(&mut self, value: char) -> Result<()> {
        self.ensure_next(Token::Punctuation(value))
            .with_context(|| format!("'{value}' expected"))
    }

    /// Fetch the next token, ensure it's a quoted string and decode its escapes.
    pub(super) fn fetch_str(&mut self) -> Result<String> {
        let token = self.fetch_next()?;
        token
            .clone()
            .try_as_string()
            .map(|raw| unescape(raw).into_owned())
            .ok_or_else(|| anyhow!("Unexpected token {token:?} (want String)"))
    }
}
