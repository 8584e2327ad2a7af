pub mod arrays;
pub mod primitives;
pub mod types;

use anyhow::Result;

use crate::sdf;
pub use types::Type;

/// Value parsing dispatcher.
impl<'a> super::Parser<'a> {
    /// Decode a typed value.
    ///
    /// Tuple types (`double3`, `color3f`, ...) are stored flattened in the
    /// matching array value.
    pub(super) fn parse_value(&mut self, ty: Type) -> Result<sdf::Value> {
        let value = match ty {
            Type::Bool => sdf::Value::Bool(self.parse_bool()?),

            Type::Int => sdf::Value::Int(self.parse_token()?),
            Type::IntVec => sdf::Value::IntVec(self.parse_array()?),
            Type::Int64 => sdf::Value::Int64(self.parse_token()?),

            Type::Float => sdf::Value::Float(self.parse_token()?),
            Type::Float2 => sdf::Value::FloatVec(self.parse_tuple::<f32, 2>()?.into()),
            Type::Float3 => sdf::Value::FloatVec(self.parse_tuple::<f32, 3>()?.into()),
            Type::Float4 => sdf::Value::FloatVec(self.parse_tuple::<f32, 4>()?.into()),
            Type::FloatVec => sdf::Value::FloatVec(self.parse_array()?),
            Type::Float2Vec => sdf::Value::FloatVec(self.parse_array_of_tuples::<f32, 2>()?),
            Type::Float3Vec => sdf::Value::FloatVec(self.parse_array_of_tuples::<f32, 3>()?),
            Type::Float4Vec => sdf::Value::FloatVec(self.parse_array_of_tuples::<f32, 4>()?),

            Type::Double => sdf::Value::Double(self.parse_token()?),
            Type::Double2 => sdf::Value::DoubleVec(self.parse_tuple::<f64, 2>()?.into()),
            Type::Double3 => sdf::Value::DoubleVec(self.parse_tuple::<f64, 3>()?.into()),
            Type::Double4 => sdf::Value::DoubleVec(self.parse_tuple::<f64, 4>()?.into()),
            Type::DoubleVec => sdf::Value::DoubleVec(self.parse_array()?),
            Type::Double2Vec => sdf::Value::DoubleVec(self.parse_array_of_tuples::<f64, 2>()?),
            Type::Double3Vec => sdf::Value::DoubleVec(self.parse_array_of_tuples::<f64, 3>()?),
            Type::Double4Vec => sdf::Value::DoubleVec(self.parse_array_of_tuples::<f64, 4>()?),
            Type::Matrix4d => sdf::Value::DoubleVec(self.parse_matrix::<4>()?),

            Type::String => sdf::Value::String(self.fetch_str()?),
            Type::Token => sdf::Value::Token(self.fetch_str()?),
            Type::StringVec => sdf::Value::StringVec(self.parse_array()?),
            Type::TokenVec => sdf::Value::TokenVec(self.parse_array()?),
            Type::Asset => sdf::Value::AssetPath(self.parse_asset_path()?),
            Type::AssetVec => sdf::Value::StringVec(self.parse_asset_path_array()?),

            Type::Dictionary => self.parse_dictionary()?,
        };

        Ok(value)
    }
}
