//! Lexer for the `.usda` text format.

use std::borrow::Cow;

use logos::Logos;
use strum::EnumTryAs;

fn inner<'a>(lex: &logos::Lexer<'a, Token<'a>>, quote_len: usize) -> &'a str {
    let s = lex.slice();
    &s[quote_len..s.len() - quote_len]
}

/// Decode backslash escapes in the body of a string literal.
///
/// Unknown escapes are kept verbatim, backslash included.
pub fn unescape(raw: &str) -> Cow<'_, str> {
    if !raw.contains('\\') {
        return Cow::Borrowed(raw);
    }

    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }

        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some(c @ ('\\' | '"' | '\'')) => out.push(c),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }

    Cow::Owned(out)
}

#[derive(Logos, Debug, Clone, PartialEq, EnumTryAs)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r"#[^\n]*")]
pub enum Token<'a> {
    /// `#usda 1.0` header; carries the version.
    #[regex(r"#usda[^\n]*", |lex| lex.slice()[5..].trim(), priority = 10)]
    Magic(&'a str),

    #[regex(r#""([^"\\\n]|\\.)*""#, |lex| inner(lex, 1))]
    #[regex(r#"'([^'\\\n]|\\.)*'"#, |lex| inner(lex, 1))]
    #[regex(r#""""([^"]|"[^"]|""[^"])*""""#, |lex| inner(lex, 3))]
    String(&'a str),

    #[regex(r"@[^@\n]*@", |lex| inner(lex, 1))]
    AssetRef(&'a str),

    #[regex(r"<[^<>\n]*>", |lex| inner(lex, 1))]
    PathRef(&'a str),

    #[regex(r"[-+]?([0-9]+(\.[0-9]*)?|\.[0-9]+)([eE][-+]?[0-9]+)?", |lex| lex.slice())]
    #[token("-inf", |lex| lex.slice())]
    #[token("nan", |lex| lex.slice())]
    Number(&'a str),

    #[token("inf")]
    Inf,

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*(\[\])?", |lex| lex.slice())]
    Identifier(&'a str),

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*(:[A-Za-z_][A-Za-z0-9_]*)+", |lex| lex.slice())]
    NamespacedIdentifier(&'a str),

    #[regex(r"[(){}\[\]=,;]", |lex| lex.slice().chars().next())]
    Punctuation(char),

    // Keywords
    #[token("add")]
    Add,
    #[token("append")]
    Append,
    #[token("class")]
    Class,
    #[token("custom")]
    Custom,
    #[token("customData")]
    CustomData,
    #[token("def")]
    Def,
    #[token("delete")]
    Delete,
    #[token("dictionary")]
    Dictionary,
    #[token("doc")]
    Doc,
    #[token("kind")]
    Kind,
    #[token("offset")]
    Offset,
    #[token("over")]
    Over,
    #[token("payload")]
    Payload,
    #[token("prepend")]
    Prepend,
    #[token("references")]
    References,
    #[token("reorder")]
    Reorder,
    #[token("scale")]
    Scale,
    #[token("subLayers")]
    SubLayers,
    #[token("uniform")]
    Uniform,
    #[token("varying")]
    Varying,
}
