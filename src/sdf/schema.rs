//! Well-known field names stored on specs.

/// Field keys shared by layer, prim and property specs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKey {
    Active,
    AssetInfo,
    Custom,
    CustomData,
    CustomLayerData,
    Default,
    DefaultPrim,
    Documentation,
    EndTimeCode,
    Kind,
    Payload,
    References,
    Specifier,
    StartTimeCode,
    SubLayerOffsets,
    SubLayers,
    TypeName,
    Variability,
}

impl FieldKey {
    pub const fn as_str(self) -> &'static str {
        match self {
            FieldKey::Active => "active",
            FieldKey::AssetInfo => "assetInfo",
            FieldKey::Custom => "custom",
            FieldKey::CustomData => "customData",
            FieldKey::CustomLayerData => "customLayerData",
            FieldKey::Default => "default",
            FieldKey::DefaultPrim => "defaultPrim",
            FieldKey::Documentation => "documentation",
            FieldKey::EndTimeCode => "endTimeCode",
            FieldKey::Kind => "kind",
            FieldKey::Payload => "payload",
            FieldKey::References => "references",
            FieldKey::Specifier => "specifier",
            FieldKey::StartTimeCode => "startTimeCode",
            FieldKey::SubLayerOffsets => "subLayerOffsets",
            FieldKey::SubLayers => "subLayers",
            FieldKey::TypeName => "typeName",
            FieldKey::Variability => "variability",
        }
    }
}

impl AsRef<str> for FieldKey {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// Fields listing the children of a spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChildrenKey {
    PrimChildren,
    PropertyChildren,
}

impl ChildrenKey {
    pub const fn as_str(self) -> &'static str {
        match self {
            ChildrenKey::PrimChildren => "primChildren",
            ChildrenKey::PropertyChildren => "properties",
        }
    }
}

impl AsRef<str> for ChildrenKey {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}
