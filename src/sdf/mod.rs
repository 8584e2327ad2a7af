//! Scene description foundations: the data model layers are read into.
//!
//! A layer is a flat map from [`Path`] to [`Spec`]; every spec carries a bag of
//! named fields holding [`Value`]s.

mod path;
pub mod schema;

use anyhow::Result;
use std::collections::HashMap;
use strum::EnumTryAs;

pub use path::Path;

/// Shorthand for [`Path::new`].
pub fn path(path: &str) -> Result<Path> {
    Path::new(path)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecType {
    PseudoRoot,
    Prim,
    Attribute,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Specifier {
    Def,
    Over,
    Class,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Variability {
    #[default]
    Varying,
    Uniform,
}

/// Time offset and scale applied to a sublayer, reference or payload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerOffset {
    pub offset: f64,
    pub scale: f64,
}

impl Default for LayerOffset {
    fn default() -> Self {
        Self {
            offset: 0.0,
            scale: 1.0,
        }
    }
}

/// A reference arc: `@asset@</prim>`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reference {
    /// Asset identifier as authored; empty for internal references.
    pub asset_path: String,
    /// Target prim; empty means the default prim of the referenced layer.
    pub prim_path: Path,
    pub layer_offset: LayerOffset,
    pub custom_data: HashMap<String, Value>,
}

/// A payload arc. Composed like a reference, loaded on demand by full USD.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Payload {
    pub asset_path: String,
    pub prim_path: Path,
    pub layer_offset: Option<LayerOffset>,
}

/// List editing operation as authored in a single layer.
#[derive(Debug, Clone, PartialEq)]
pub struct ListOp<T> {
    pub explicit: bool,
    pub explicit_items: Vec<T>,
    pub added_items: Vec<T>,
    pub prepended_items: Vec<T>,
    pub appended_items: Vec<T>,
    pub deleted_items: Vec<T>,
    pub ordered_items: Vec<T>,
}

impl<T> Default for ListOp<T> {
    fn default() -> Self {
        Self {
            explicit: false,
            explicit_items: Vec::new(),
            added_items: Vec::new(),
            prepended_items: Vec::new(),
            appended_items: Vec::new(),
            deleted_items: Vec::new(),
            ordered_items: Vec::new(),
        }
    }
}

impl<T: Clone + PartialEq> ListOp<T> {
    /// Apply this (stronger) list op on top of the items produced by weaker layers.
    pub fn apply(&self, weaker: &[T]) -> Vec<T> {
        if self.explicit {
            return self.explicit_items.clone();
        }

        let mut items: Vec<T> = weaker
            .iter()
            .filter(|item| {
                !self.deleted_items.contains(item)
                    && !self.prepended_items.contains(item)
                    && !self.appended_items.contains(item)
            })
            .cloned()
            .collect();

        for item in &self.added_items {
            if !items.contains(item) {
                items.push(item.clone());
            }
        }

        let mut out = self.prepended_items.clone();
        out.append(&mut items);
        out.extend(self.appended_items.iter().cloned());
        out
    }

    /// Items this list op produces on its own.
    pub fn items(&self) -> Vec<T> {
        self.apply(&[])
    }

    /// Combine with a weaker opinion into a single explicit list op.
    pub fn compose_over(&self, weaker: &ListOp<T>) -> ListOp<T> {
        ListOp {
            explicit: true,
            explicit_items: self.apply(&weaker.items()),
            ..Default::default()
        }
    }
}

/// Field value.
#[derive(Debug, Clone, PartialEq, EnumTryAs)]
pub enum Value {
    Bool(bool),
    Int(i32),
    Int64(i64),
    Float(f32),
    Double(f64),

    String(String),
    Token(String),
    AssetPath(String),

    IntVec(Vec<i32>),
    FloatVec(Vec<f32>),
    DoubleVec(Vec<f64>),
    StringVec(Vec<String>),
    TokenVec(Vec<String>),

    Dictionary(HashMap<String, Value>),

    ReferenceListOp(ListOp<Reference>),
    PayloadListOp(ListOp<Payload>),
    TokenListOp(ListOp<String>),

    LayerOffsetVec(Vec<LayerOffset>),
    Specifier(Specifier),
    Variability(Variability),
}

impl Value {
    /// Borrow string-like payloads (string, token and asset values).
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) | Value::Token(s) | Value::AssetPath(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow string or token arrays.
    pub fn as_string_slice(&self) -> Option<&[String]> {
        match self {
            Value::StringVec(v) | Value::TokenVec(v) => Some(v),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Double(value)
    }
}

impl From<Vec<String>> for Value {
    fn from(value: Vec<String>) -> Self {
        Value::StringVec(value)
    }
}

impl From<Vec<LayerOffset>> for Value {
    fn from(value: Vec<LayerOffset>) -> Self {
        Value::LayerOffsetVec(value)
    }
}

/// A single scene description entry: its type and its fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Spec {
    pub ty: SpecType,
    pub fields: HashMap<String, Value>,
}

impl Spec {
    pub fn new(ty: SpecType) -> Self {
        Self {
            ty,
            fields: HashMap::new(),
        }
    }

    /// Insert or overwrite a field.
    pub fn add(&mut self, key: impl AsRef<str>, value: impl Into<Value>) {
        self.fields.insert(key.as_ref().to_owned(), value.into());
    }

    pub fn get(&self, key: impl AsRef<str>) -> Option<&Value> {
        self.fields.get(key.as_ref())
    }
}

impl From<Specifier> for Value {
    fn from(value: Specifier) -> Self {
        Value::Specifier(value)
    }
}

impl From<Variability> for Value {
    fn from(value: Variability) -> Self {
        Value::Variability(value)
    }
}
