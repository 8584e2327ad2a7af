use anyhow::{anyhow, bail, ensure, Context, Result};
use std::collections::HashMap;

use crate::sdf;
use crate::sdf::schema::{ChildrenKey, FieldKey};
use crate::usda::token::{unescape, Token};

use super::value::types::{keyword_lexeme, Type};

/// Layer metadata with a fixed value type. Anything else is parsed untyped.
const KNOWN_LAYER_FIELDS: &[(&str, Type)] = &[
    (FieldKey::DefaultPrim.as_str(), Type::Token),
    (FieldKey::StartTimeCode.as_str(), Type::Double),
    (FieldKey::EndTimeCode.as_str(), Type::Double),
    (FieldKey::CustomLayerData.as_str(), Type::Dictionary),
    ("framesPerSecond", Type::Double),
    ("metersPerUnit", Type::Double),
    ("timeCodesPerSecond", Type::Double),
    ("upAxis", Type::Token),
];

/// Hierarchy parsing functions for the pseudo root, prims and attributes.
impl<'a> super::Parser<'a> {
    /// Parse the whole token stream into a flat path to spec map.
    pub fn parse(&mut self) -> Result<HashMap<sdf::Path, sdf::Spec>> {
        let mut data = HashMap::new();
        let root_path = sdf::Path::abs_root();

        let mut pseudo_root = self.read_pseudo_root().context("Unable to parse pseudo root")?;
        let mut root_children = Vec::new();

        while self.peek_next().is_some() {
            self.read_prim(&root_path, &mut root_children, &mut data)?;
        }

        pseudo_root.add(ChildrenKey::PrimChildren, sdf::Value::TokenVec(root_children));
        data.insert(root_path, pseudo_root);
        Ok(data)
    }

    /// Parse the `#usda 1.0` header and the layer metadata block.
    pub(super) fn read_pseudo_root(&mut self) -> Result<sdf::Spec> {
        let magic = self.fetch_next().context("Empty layer")?;
        let version = magic
            .clone()
            .try_as_magic()
            .ok_or_else(|| anyhow!("Text file must start with magic token, got {magic:?}"))?;
        ensure!(version == "1.0", "File must start with '#usda 1.0', got: {version:?}");

        let mut root = sdf::Spec::new(sdf::SpecType::PseudoRoot);

        if !self.is_next(Token::Punctuation('(')) {
            return Ok(root);
        }
        self.ensure_pun('(')?;

        loop {
            let next = self.fetch_next().context("Unable to fetch next layer metadata entry")?;

            match next {
                Token::Punctuation(')') => break,
                Token::String(doc) => root.add(FieldKey::Documentation, unescape(doc).into_owned()),
                Token::Doc => {
                    self.ensure_pun('=')?;
                    let doc = self.fetch_str()?;
                    root.add(FieldKey::Documentation, doc);
                }
                Token::SubLayers => {
                    self.ensure_pun('=')?;
                    let (sublayers, offsets) = self.parse_sublayers().context("Unable to parse subLayers")?;
                    root.add(FieldKey::SubLayers, sublayers);
                    root.add(FieldKey::SubLayerOffsets, offsets);
                }
                Token::Identifier(name) => {
                    self.ensure_pun('=')?;
                    let value = match KNOWN_LAYER_FIELDS.iter().find(|(known, _)| *known == name) {
                        Some((_, ty)) => self.parse_value(*ty),
                        None => self.parse_property_metadata_value(),
                    }
                    .with_context(|| format!("Unable to parse layer metadata {name}"))?;
                    root.add(name, value);
                }
                _ => bail!("Unexpected token in layer metadata: {next:?}"),
            }
        }

        Ok(root)
    }

    /// Parse a prim declaration and everything nested in its body.
    pub(super) fn read_prim(
        &mut self,
        parent_path: &sdf::Path,
        parent_children: &mut Vec<String>,
        data: &mut HashMap<sdf::Path, sdf::Spec>,
    ) -> Result<()> {
        let mut spec = sdf::Spec::new(sdf::SpecType::Prim);

        let specifier = match self.fetch_next().context("Unable to read prim specifier")? {
            Token::Def => sdf::Specifier::Def,
            Token::Over => sdf::Specifier::Over,
            Token::Class => sdf::Specifier::Class,
            other => bail!("Unexpected prim specifier: {other:?}"),
        };

        let mut name_token = self.fetch_next()?;
        if let Some(type_name) = name_token.clone().try_as_identifier() {
            spec.add(FieldKey::TypeName, sdf::Value::Token(type_name.to_owned()));
            name_token = self.fetch_next()?;
        }

        let name = name_token
            .clone()
            .try_as_string()
            .ok_or_else(|| anyhow!("Unexpected token {name_token:?} (want prim name)"))?;
        let prim_path = parent_path
            .append_path(name)
            .with_context(|| format!("Invalid prim name {name:?}"))?;
        parent_children.push(name.to_owned());

        if self.is_next(Token::Punctuation('(')) {
            self.fetch_next()?;
            self.read_prim_metadata(&mut spec)
                .with_context(|| format!("Unable to parse metadata of {prim_path}"))?;
        }

        self.ensure_pun('{').context("Prim body expected")?;

        let mut children = Vec::new();
        let mut properties = Vec::new();
        loop {
            let next = self
                .peek_next()
                .context("Unexpected end of prim body")?
                .as_ref()
                .map_err(|_| anyhow!("Unrecognized input in prim body"))?;

            match next {
                Token::Punctuation('}') => {
                    self.fetch_next()?;
                    break;
                }
                Token::Def | Token::Over | Token::Class => {
                    self.read_prim(&prim_path, &mut children, data)
                        .context("Unable to read nested prim")?;
                }
                _ => {
                    self.read_attribute(&prim_path, &mut properties, data)
                        .with_context(|| format!("Unable to read attribute of {prim_path}"))?;
                }
            }
        }

        spec.add(FieldKey::Specifier, specifier);
        spec.add(ChildrenKey::PrimChildren, sdf::Value::TokenVec(children));
        spec.add(ChildrenKey::PropertyChildren, sdf::Value::TokenVec(properties));
        data.insert(prim_path, spec);

        Ok(())
    }

    /// Parse `[custom] [uniform|varying] type name [(meta)] [= value] [(meta)]`.
    pub(super) fn read_attribute(
        &mut self,
        prim_path: &sdf::Path,
        properties: &mut Vec<String>,
        data: &mut HashMap<sdf::Path, sdf::Spec>,
    ) -> Result<()> {
        let mut spec = sdf::Spec::new(sdf::SpecType::Attribute);

        let custom = self.is_next(Token::Custom);
        if custom {
            self.fetch_next()?;
        }

        let mut variability = sdf::Variability::Varying;
        if self.is_next(Token::Varying) {
            self.fetch_next()?;
        } else if self.is_next(Token::Uniform) {
            variability = sdf::Variability::Uniform;
            self.fetch_next()?;
        }

        let type_token = self.fetch_next()?;
        let type_name = match type_token {
            Token::Identifier(s) => s,
            other => bail!("Attribute type expected, got {other:?}"),
        };
        let data_type = Self::parse_data_type(type_name)?;

        let name_token = self.fetch_next()?;
        let name = match name_token {
            Token::Identifier(s) | Token::NamespacedIdentifier(s) => s,
            _ => keyword_lexeme(&name_token)
                .ok_or_else(|| anyhow!("Unexpected token for attribute name: {name_token:?}"))?,
        };
        let path = prim_path.append_property(name)?;

        if self.is_next(Token::Punctuation('(')) {
            self.parse_property_metadata(&mut spec)
                .context("Unable to parse attribute metadata")?;
        }

        if self.is_next(Token::Punctuation('=')) {
            self.fetch_next()?;

            // `None` blocks the value; nothing is stored.
            if self.is_next(Token::Identifier("None")) {
                self.fetch_next()?;
            } else {
                let value = self
                    .parse_value(data_type)
                    .with_context(|| format!("Unable to parse {type_name} value"))?;
                spec.add(FieldKey::Default, value);
            }

            if self.is_next(Token::Punctuation('(')) {
                self.parse_property_metadata(&mut spec)
                    .context("Unable to parse attribute metadata")?;
            }
        }

        spec.add(FieldKey::Custom, custom);
        spec.add(FieldKey::Variability, variability);
        spec.add(FieldKey::TypeName, sdf::Value::Token(type_name.to_owned()));

        properties.push(name.to_owned());
        data.insert(path, spec);

        Ok(())
    }
}
