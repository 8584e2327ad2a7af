use anyhow::{anyhow, bail, Context, Result};
use std::fmt::Debug;
use std::str::FromStr;

use crate::usda::token::Token;

/// Array and tuple parsing functions.
impl<'a> super::super::Parser<'a> {
    /// Walk `[a, b, ...]`, delegating each element to `read_element`.
    /// A trailing comma is accepted.
    pub(in crate::usda::parser) fn parse_array_fn(
        &mut self,
        mut read_element: impl FnMut(&mut Self) -> Result<()>,
    ) -> Result<()> {
        self.ensure_pun('[').context("Array must start with [")?;

        let mut index = 0;
        loop {
            if self.is_next(Token::Punctuation(']')) {
                self.fetch_next()?;
                break;
            }

            read_element(self).with_context(|| format!("Unable to read array element {index}"))?;
            index += 1;

            match self.fetch_next()? {
                Token::Punctuation(',') => continue,
                Token::Punctuation(']') => break,
                t => bail!("Either comma or closing bracket expected after value, got: {t:?}"),
            }
        }
        Ok(())
    }

    /// Walk a parenthesized sequence such as `(a, b)` or `(offset = 1; scale = 2)`.
    pub(in crate::usda::parser) fn parse_seq_fn(
        &mut self,
        delim: char,
        mut read_element: impl FnMut(&mut Self, usize) -> Result<()>,
    ) -> Result<()> {
        self.ensure_pun('(').context("Open brace expected")?;

        let mut index = 0;
        loop {
            if self.is_next(Token::Punctuation(')')) {
                self.fetch_next()?;
                break;
            }

            read_element(self, index).with_context(|| format!("Unable to read element {index}"))?;
            index += 1;

            match self.fetch_next()? {
                Token::Punctuation(')') => break,
                Token::Punctuation(d) if d == delim => continue,
                t => bail!("Unexpected token between (): {t:?}"),
            }
        }
        Ok(())
    }

    /// Parse a fixed-size tuple `(a, b, c)`.
    pub(in crate::usda::parser) fn parse_tuple<T, const N: usize>(&mut self) -> Result<[T; N]>
    where
        T: FromStr + Debug,
        <T as FromStr>::Err: Debug,
    {
        let mut values = Vec::with_capacity(N);
        self.parse_seq_fn(',', |this, _| {
            values.push(this.parse_token::<T>()?);
            Ok(())
        })?;

        let len = values.len();
        values
            .try_into()
            .map_err(|_| anyhow!("Expected a tuple of {N} elements, got {len}"))
    }

    pub(in crate::usda::parser) fn parse_array<T>(&mut self) -> Result<Vec<T>>
    where
        T: FromStr,
        <T as FromStr>::Err: Debug,
    {
        let mut out = Vec::new();
        self.parse_array_fn(|this| {
            out.push(this.parse_token::<T>()?);
            Ok(())
        })?;
        Ok(out)
    }

    /// Parse an array of tuples, flattened.
    pub(in crate::usda::parser) fn parse_array_of_tuples<T, const N: usize>(&mut self) -> Result<Vec<T>>
    where
        T: FromStr + Debug,
        <T as FromStr>::Err: Debug,
    {
        let mut out = Vec::new();
        self.parse_array_fn(|this| {
            out.extend(this.parse_tuple::<T, N>()?);
            Ok(())
        })?;
        Ok(out)
    }

    /// Parse a matrix literal `( (..), (..), ... )` in row-major order.
    pub(in crate::usda::parser) fn parse_matrix<const N: usize>(&mut self) -> Result<Vec<f64>> {
        let mut values = Vec::with_capacity(N * N);
        let mut rows = 0;
        self.parse_seq_fn(',', |this, _| {
            values.extend(this.parse_tuple::<f64, N>()?);
            rows += 1;
            Ok(())
        })?;

        anyhow::ensure!(rows == N, "matrix{N}d literal must contain {N} rows, got {rows}");
        Ok(values)
    }
}
