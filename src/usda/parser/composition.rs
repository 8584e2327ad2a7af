use anyhow::{anyhow, bail, Context, Result};
use std::collections::HashMap;

use crate::sdf;
use crate::usda::token::Token;

use super::value::types::Type;

/// Composition arc parsing functions.
impl<'a> super::Parser<'a> {
    /// Parse the optional `</prim/path>` following an asset path.
    fn parse_optional_prim_path(&mut self) -> Result<sdf::Path> {
        if !matches!(self.peek_next(), Some(Ok(Token::PathRef(..)))) {
            return Ok(sdf::Path::default());
        }

        let path = self
            .fetch_next()?
            .try_as_path_ref()
            .ok_or_else(|| anyhow!("Path reference expected"))?;
        sdf::Path::new(path)
    }

    /// Parse a reference arc: `@asset@</prim> (offset = ...; scale = ...)`.
    ///
    /// Internal references (`</prim>` with no asset) carry an empty asset path.
    pub(super) fn parse_reference(&mut self) -> Result<sdf::Reference> {
        let asset_path = match self.peek_next() {
            Some(Ok(Token::PathRef(..))) => String::new(),
            _ => self.parse_asset_path().context("Asset reference expected")?,
        };

        let mut reference = sdf::Reference {
            asset_path,
            prim_path: self.parse_optional_prim_path()?,
            layer_offset: sdf::LayerOffset::default(),
            custom_data: HashMap::new(),
        };

        if self.is_next(Token::Punctuation('(')) {
            self.parse_reference_layer_offset(&mut reference.layer_offset)
                .context("Unable to parse reference layer offset")?;
        }

        Ok(reference)
    }

    /// Parse `(offset = ...; scale = ...)` attached to sublayers and arcs.
    pub(super) fn parse_reference_layer_offset(&mut self, layer_offset: &mut sdf::LayerOffset) -> Result<()> {
        self.parse_seq_fn(';', |this, _| {
            let token = this.fetch_next()?;
            this.ensure_pun('=')?;
            let value = this.parse_value(Type::Double)?;

            match token {
                Token::Offset => {
                    layer_offset.offset = value.try_as_double().context("Expected double for offset")?;
                }
                Token::Scale => {
                    layer_offset.scale = value.try_as_double().context("Expected double for scale")?;
                }
                unexpected => bail!("Unexpected token in layer offset: {unexpected:?}"),
            }

            Ok(())
        })
    }

    /// A single reference or a `[...]` list of them.
    pub(super) fn parse_reference_list(&mut self) -> Result<Vec<sdf::Reference>> {
        self.parse_one_or_many(Self::parse_reference)
    }

    pub(super) fn parse_payload(&mut self) -> Result<sdf::Payload> {
        let asset_path = self.parse_asset_path().context("Asset reference expected for payload")?;

        let mut payload = sdf::Payload {
            asset_path,
            prim_path: self.parse_optional_prim_path()?,
            layer_offset: None,
        };

        if self.is_next(Token::Punctuation('(')) {
            let mut layer_offset = sdf::LayerOffset::default();
            self.parse_reference_layer_offset(&mut layer_offset)
                .context("Unable to parse payload layer offset")?;
            payload.layer_offset = Some(layer_offset);
        }

        Ok(payload)
    }

    pub(super) fn parse_payload_list(&mut self) -> Result<Vec<sdf::Payload>> {
        self.parse_one_or_many(Self::parse_payload)
    }

    /// Parse a list of tokens (used for various list-op metadata).
    pub(super) fn parse_token_list(&mut self) -> Result<Vec<String>> {
        if self.is_next(Token::Punctuation('[')) {
            self.parse_array()
        } else {
            Ok(vec![self.parse_token::<String>()?])
        }
    }

    /// `None` as the arc value clears the list.
    fn parse_one_or_many<T>(&mut self, mut read: impl FnMut(&mut Self) -> Result<T>) -> Result<Vec<T>> {
        if self.is_next(Token::Punctuation('[')) {
            let mut out = Vec::new();
            self.parse_array_fn(|this| {
                out.push(read(this)?);
                Ok(())
            })?;
            Ok(out)
        } else if self.is_next(Token::Identifier("None")) {
            self.fetch_next()?;
            Ok(Vec::new())
        } else {
            Ok(vec![read(self)?])
        }
    }

    /// Build a ListOp from an optional list operation token and items.
    pub(super) fn apply_list_op<T: Default + Clone + PartialEq>(
        &mut self,
        op: Option<Token<'a>>,
        items: Vec<T>,
    ) -> Result<sdf::ListOp<T>> {
        let mut list = sdf::ListOp::default();

        match op {
            None => {
                list.explicit = true;
                list.explicit_items = items;
            }
            Some(Token::Prepend) => list.prepended_items = items,
            Some(Token::Append) => list.appended_items = items,
            Some(Token::Add) => list.added_items = items,
            Some(Token::Delete) => list.deleted_items = items,
            Some(Token::Reorder) => list.ordered_items = items,
            other => bail!("Unsupported list op: {other:?}"),
        }

        Ok(list)
    }
}
