use anyhow::{bail, ensure, Context, Result};
use std::collections::HashMap;

use crate::sdf;
use crate::sdf::schema::FieldKey;
use crate::usda::token::{unescape, Token};

use super::value::types::{keyword_lexeme, Type};

/// Metadata and dictionary parsing functions.
impl<'a> super::Parser<'a> {
    /// Parse the `( ... )` block attached to an attribute and stash entries on the spec.
    pub(super) fn parse_property_metadata(&mut self, spec: &mut sdf::Spec) -> Result<()> {
        self.ensure_pun('(')?;

        loop {
            let name_token = self.fetch_next()?;
            let name = match name_token {
                Token::Punctuation(')') => break,
                // A bare string is shorthand for `doc = "..."`.
                Token::String(doc) => {
                    spec.add(FieldKey::Documentation, unescape(doc).into_owned());
                    continue;
                }
                Token::Identifier(s) | Token::NamespacedIdentifier(s) => s,
                Token::Doc => FieldKey::Documentation.as_str(),
                other => match keyword_lexeme(&other) {
                    Some(lexeme) => lexeme,
                    None => bail!("Unexpected attribute metadata name token: {other:?}"),
                },
            };

            self.ensure_pun('=')?;
            let value = self
                .parse_property_metadata_value()
                .with_context(|| format!("Unable to parse attribute metadata value for {name}"))?;
            spec.add(name, value);

            if self.is_next(Token::Punctuation(',')) {
                self.fetch_next()?;
            }
        }

        Ok(())
    }

    /// Parse an untyped metadata value: scalar, string array, or dictionary.
    ///
    /// Untyped arrays are kept as strings; numbers are narrowed to `int64`
    /// when they have no fractional part.
    pub(super) fn parse_property_metadata_value(&mut self) -> Result<sdf::Value> {
        if self.is_next(Token::Punctuation('[')) {
            let mut values = Vec::new();
            self.parse_array_fn(|this| {
                let value = match this.fetch_next()? {
                    Token::String(v) => unescape(v).into_owned(),
                    Token::AssetRef(v) => v.to_owned(),
                    Token::Identifier(v) | Token::NamespacedIdentifier(v) | Token::Number(v) => v.to_owned(),
                    other => bail!("Unsupported metadata array element: {other:?}"),
                };
                values.push(value);
                Ok(())
            })?;
            return Ok(sdf::Value::StringVec(values));
        }

        if self.is_next(Token::Punctuation('{')) {
            return self.parse_dictionary();
        }

        let token = self.fetch_next()?;
        match token {
            Token::String(value) => Ok(sdf::Value::String(unescape(value).into_owned())),
            Token::AssetRef(value) => Ok(sdf::Value::AssetPath(value.to_owned())),
            Token::Identifier(value) | Token::NamespacedIdentifier(value) => Ok(sdf::Value::Token(value.to_owned())),
            Token::Number(raw) => {
                if let Ok(int) = raw.parse::<i64>() {
                    Ok(sdf::Value::Int64(int))
                } else if let Ok(float) = raw.parse::<f64>() {
                    Ok(sdf::Value::Double(float))
                } else {
                    bail!("Unable to parse numeric metadata value: {raw}");
                }
            }
            other => bail!("Unsupported metadata value token: {other:?}"),
        }
    }

    /// Parse a dictionary value from `{` to `}`.
    ///
    /// Entries are usually typed (`string[] key = [...]`); untyped entries
    /// fall back to [`parse_property_metadata_value`](Self::parse_property_metadata_value).
    pub(super) fn parse_dictionary(&mut self) -> Result<sdf::Value> {
        self.ensure_pun('{').context("Dictionary must start with {")?;

        let mut dict = HashMap::new();

        loop {
            let first = self.fetch_next()?;

            let (ty, key_token) = match first {
                Token::Punctuation('}') => break,
                Token::Dictionary => (Some(Type::Dictionary), self.fetch_next()?),
                Token::Identifier(name) => match Self::parse_data_type(name) {
                    Ok(ty) => (Some(ty), self.fetch_next()?),
                    Err(_) => (None, first),
                },
                other => (None, other),
            };

            let key = match key_token {
                Token::Identifier(s) | Token::NamespacedIdentifier(s) => s.to_owned(),
                Token::String(s) => unescape(s).into_owned(),
                other => match keyword_lexeme(&other) {
                    Some(lexeme) => lexeme.to_owned(),
                    None => bail!("Expected identifier as dictionary key, got: {other:?}"),
                },
            };

            self.ensure_pun('=')?;

            let value = match ty {
                Some(ty) => self
                    .parse_value(ty)
                    .with_context(|| format!("Unable to parse dictionary entry {key}"))?,
                None => self.parse_property_metadata_value()?,
            };
            dict.insert(key, value);

            if self.is_next(Token::Punctuation(',')) || self.is_next(Token::Punctuation(';')) {
                self.fetch_next()?;
            }
        }

        Ok(sdf::Value::Dictionary(dict))
    }

    /// Parse prim metadata up to the closing `)`.
    pub(super) fn read_prim_metadata(&mut self, spec: &mut sdf::Spec) -> Result<()> {
        loop {
            let token = self.fetch_next()?;
            if token == Token::Punctuation(')') {
                break;
            }

            self.read_prim_metadata_entry(token, spec)
                .context("Unable to parse prim metadata entry")?;
        }

        Ok(())
    }

    /// Parse a single prim metadata assignment, honoring list ops where USD allows them.
    pub(super) fn read_prim_metadata_entry(&mut self, token: Token<'a>, spec: &mut sdf::Spec) -> Result<()> {
        let (list_op, name_token) = match token {
            Token::Add | Token::Append | Token::Delete | Token::Prepend | Token::Reorder => {
                let name = self.fetch_next()?;
                (Some(token), name)
            }
            Token::String(doc) => {
                spec.add(FieldKey::Documentation, unescape(doc).into_owned());
                return Ok(());
            }
            _ => (None, token),
        };

        let name = match name_token {
            Token::Identifier(s) | Token::NamespacedIdentifier(s) => s,
            Token::Kind => FieldKey::Kind.as_str(),
            Token::References => FieldKey::References.as_str(),
            Token::Payload => FieldKey::Payload.as_str(),
            Token::CustomData => FieldKey::CustomData.as_str(),
            Token::Doc => FieldKey::Documentation.as_str(),
            other => bail!("Unexpected metadata name token: {other:?}"),
        };

        self.ensure_pun('=')?;

        match name {
            n if n == FieldKey::References.as_str() => {
                let references = self.parse_reference_list().context("Unable to parse references")?;
                let list_op = self
                    .apply_list_op(list_op, references)
                    .context("Unable to build references listOp")?;
                spec.add(FieldKey::References, sdf::Value::ReferenceListOp(list_op));
            }
            n if n == FieldKey::Payload.as_str() => {
                let payloads = self.parse_payload_list().context("Unable to parse payloads")?;
                let list_op = self
                    .apply_list_op(list_op, payloads)
                    .context("Unable to build payload listOp")?;
                spec.add(FieldKey::Payload, sdf::Value::PayloadListOp(list_op));
            }
            "apiSchemas" => {
                let values = self.parse_token_list().context("Unable to parse apiSchemas list")?;
                let list_op = self
                    .apply_list_op(list_op, values)
                    .context("Unable to build apiSchemas listOp")?;
                spec.add("apiSchemas", sdf::Value::TokenListOp(list_op));
            }
            other => {
                ensure!(list_op.is_none(), "{other} metadata does not support list ops");
                let value = match other {
                    n if n == FieldKey::Active.as_str() => sdf::Value::Bool(self.parse_bool()?),
                    n if n == FieldKey::Kind.as_str() => sdf::Value::Token(self.parse_token::<String>()?),
                    n if n == FieldKey::Documentation.as_str() => sdf::Value::String(self.fetch_str()?),
                    _ => self.parse_property_metadata_value()?,
                };
                spec.add(other, value);
            }
        }

        Ok(())
    }
}
