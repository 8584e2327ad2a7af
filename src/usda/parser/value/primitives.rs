use anyhow::{anyhow, bail, ensure, Context, Result};
use std::{any::type_name, borrow::Cow, str::FromStr};

use crate::sdf;
use crate::usda::token::{unescape, Token};

use super::types::Type;

/// Primitive value parsing functions.
impl<'a> super::super::Parser<'a> {
    /// Map a type name as written in the file to a [`Type`].
    ///
    /// Role types (`point3f`, `color3f`, ...) share the representation of
    /// their underlying tuple type.
    pub(in crate::usda::parser) fn parse_data_type(ty: &str) -> Result<Type> {
        let data_type = match ty {
            "bool" => Type::Bool,

            "int" | "uint" | "uchar" => Type::Int,
            "int[]" | "uint[]" | "uchar[]" => Type::IntVec,
            "int64" | "uint64" => Type::Int64,

            "float" | "half" => Type::Float,
            "float2" | "half2" | "texCoord2f" => Type::Float2,
            "float3" | "half3" | "point3f" | "normal3f" | "vector3f" | "color3f" => Type::Float3,
            "float4" | "half4" | "color4f" => Type::Float4,
            "float[]" | "half[]" => Type::FloatVec,
            "float2[]" | "texCoord2f[]" => Type::Float2Vec,
            "float3[]" | "point3f[]" | "normal3f[]" | "vector3f[]" | "color3f[]" => Type::Float3Vec,
            "float4[]" | "color4f[]" => Type::Float4Vec,

            "double" | "timecode" => Type::Double,
            "double2" | "texCoord2d" => Type::Double2,
            "double3" | "point3d" | "normal3d" | "vector3d" | "color3d" => Type::Double3,
            "double4" | "color4d" | "quatd" => Type::Double4,
            "double[]" | "timecode[]" => Type::DoubleVec,
            "double2[]" => Type::Double2Vec,
            "double3[]" | "point3d[]" | "normal3d[]" | "vector3d[]" | "color3d[]" => Type::Double3Vec,
            "double4[]" => Type::Double4Vec,
            "matrix4d" | "frame4d" => Type::Matrix4d,

            "string" => Type::String,
            "token" => Type::Token,
            "string[]" => Type::StringVec,
            "token[]" => Type::TokenVec,
            "asset" => Type::Asset,
            "asset[]" => Type::AssetVec,

            "dictionary" => Type::Dictionary,

            _ => bail!("Unsupported data type: {ty}"),
        };

        Ok(data_type)
    }

    /// Parse a single token as any `T: FromStr` (numbers, identifiers, strings).
    pub(in crate::usda::parser) fn parse_token<T: FromStr>(&mut self) -> Result<T>
    where
        <T as FromStr>::Err: std::fmt::Debug,
    {
        let token = self.fetch_next()?;
        let value_str = match token {
            Token::Number(s) | Token::Identifier(s) | Token::NamespacedIdentifier(s) => Cow::Borrowed(s),
            Token::String(s) => unescape(s),
            Token::Inf => Cow::Borrowed("inf"),
            _ => bail!("Expected a number, identifier, or string, got {token:?}"),
        };

        T::from_str(&value_str)
            .map_err(|err| anyhow!("Failed to parse {} from '{}': {:?}", type_name::<T>(), value_str, err))
    }

    /// Parse `true`/`false`, `0`/`1` or their quoted forms.
    pub(in crate::usda::parser) fn parse_bool(&mut self) -> Result<bool> {
        let token = self.fetch_next()?;
        match token {
            Token::Identifier(value) | Token::String(value) => match value {
                "true" => Ok(true),
                "false" => Ok(false),
                other => bail!("Unexpected bool literal: {other}"),
            },
            Token::Number(value) => {
                let parsed = value.parse::<f64>().context("Unable to parse numeric bool")?;
                ensure!(
                    parsed == 0.0 || parsed == 1.0,
                    "Numeric bool literals must be 0 or 1, got {value}"
                );
                Ok(parsed == 1.0)
            }
            other => bail!("Unexpected token for bool literal: {other:?}"),
        }
    }

    /// Parse an asset path `@...@`.
    pub(in crate::usda::parser) fn parse_asset_path(&mut self) -> Result<String> {
        let token = self.fetch_next()?;
        token
            .try_as_asset_ref()
            .map(str::to_owned)
            .ok_or_else(|| anyhow!("Asset reference expected"))
    }

    pub(in crate::usda::parser) fn parse_asset_path_array(&mut self) -> Result<Vec<String>> {
        let mut result = Vec::new();
        self.parse_array_fn(|this| {
            result.push(this.parse_asset_path()?);
            Ok(())
        })?;
        Ok(result)
    }

    /// Parse `subLayers` entries with their optional `(offset = ...; scale = ...)`.
    pub(in crate::usda::parser) fn parse_sublayers(&mut self) -> Result<(sdf::Value, sdf::Value)> {
        let mut sublayers = Vec::new();
        let mut sublayer_offsets = Vec::new();

        self.parse_array_fn(|this| {
            sublayers.push(this.parse_asset_path()?);

            let mut layer_offset = sdf::LayerOffset::default();
            if this.is_next(Token::Punctuation('(')) {
                this.parse_reference_layer_offset(&mut layer_offset)
                    .context("Unable to parse sublayer offset")?;
            }
            sublayer_offsets.push(layer_offset);
            Ok(())
        })?;

        Ok((
            sdf::Value::StringVec(sublayers),
            sdf::Value::LayerOffsetVec(sublayer_offsets),
        ))
    }
}
