use crate::usda::token::Token;

/// Value types understood by the text reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Type {
    Bool,

    Int,
    IntVec,
    Int64,

    Float,
    Float2,
    Float3,
    Float4,
    FloatVec,
    Float2Vec,
    Float3Vec,
    Float4Vec,

    Double,
    Double2,
    Double3,
    Double4,
    DoubleVec,
    Double2Vec,
    Double3Vec,
    Double4Vec,
    Matrix4d,

    String,
    StringVec,
    Token,
    TokenVec,
    Asset,
    AssetVec,

    Dictionary,
}

/// Source spelling of keyword tokens, so keywords can double as names.
pub fn keyword_lexeme(token: &Token) -> Option<&'static str> {
    let lexeme = match token {
        Token::Add => "add",
        Token::Append => "append",
        Token::Class => "class",
        Token::Custom => "custom",
        Token::CustomData => "customData",
        Token::Def => "def",
        Token::Delete => "delete",
        Token::Dictionary => "dictionary",
        Token::Doc => "doc",
        Token::Kind => "kind",
        Token::Offset => "offset",
        Token::Over => "over",
        Token::Payload => "payload",
        Token::Prepend => "prepend",
        Token::References => "references",
        Token::Reorder => "reorder",
        Token::Scale => "scale",
        Token::SubLayers => "subLayers",
        Token::Uniform => "uniform",
        Token::Varying => "varying",
        _ => return None,
    };
    Some(lexeme)
}
