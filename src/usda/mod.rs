//! Reader for the `.usda` text format.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::ar::LayerMetadata;
use crate::sdf;
use crate::sdf::schema::FieldKey;

pub mod parser;
mod token;

/// A parsed text layer: a flat map from scene path to spec.
#[derive(Debug, Default)]
pub struct TextReader {
    data: HashMap<sdf::Path, sdf::Spec>,
}

impl TextReader {
    /// Read and parse a layer from disk.
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path).with_context(|| format!("Unable to read {}", path.display()))?;
        Self::from_data(&data).with_context(|| format!("Unable to parse {}", path.display()))
    }

    /// Parse a layer from in-memory text.
    pub fn from_data(data: &str) -> Result<Self> {
        let mut parser = parser::Parser::new(data);
        match parser.parse() {
            Ok(data) => Ok(Self { data }),
            Err(err) => Err(match parser.last_error_highlight() {
                Some(highlight) => err.context(format!("Parse error at {highlight}")),
                None => err,
            }),
        }
    }

    /// The pseudo root spec holding layer metadata.
    pub fn pseudo_root(&self) -> Option<&sdf::Spec> {
        self.data.get(&sdf::Path::abs_root())
    }

    pub fn specs(&self) -> &HashMap<sdf::Path, sdf::Spec> {
        &self.data
    }

    pub fn into_specs(self) -> HashMap<sdf::Path, sdf::Spec> {
        self.data
    }
}

/// Custom layer data lookups read `customLayerData` on the pseudo root.
impl LayerMetadata for TextReader {
    fn metadata_array(&self, key: &str) -> Option<Vec<String>> {
        self.pseudo_root()?
            .get(FieldKey::CustomLayerData)?
            .try_as_dictionary_ref()?
            .get(key)?
            .as_string_slice()
            .map(<[String]>::to_vec)
    }
}
