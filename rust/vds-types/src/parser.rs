//! Parser for the textual type grammar found in table metadata:
//!
//! ```text
//! type := ['!'] ( 'Boolean' | 'Int32' | 'Int64' | 'Float32' | 'Float64' | 'String'
//!               | 'Array' '[' type ']' | 'Set' '[' type ']'
//!               | 'Struct' '{' [ ident ':' type [','] ]* '}' | 'Empty'
//!               | 'Call' | 'Locus' '(' ident ')' | 'AltAllele' | 'Variant' '(' ident ')' )
//! ```
//!
//! A leading `!` marks the type as required.

use vds_common::{Result, error::Error};

use crate::{
    registry::TypeRegistry,
    type_def::{Field, TypeId},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Keyword {
    Boolean,
    Int32,
    Int64,
    Float32,
    Float64,
    String,
    Array,
    Set,
    Struct,
    Empty,
    Call,
    Locus,
    AltAllele,
    Variant,
}

impl Keyword {
    fn lookup(word: &str) -> Option<Keyword> {
        let kw = match word {
            "Boolean" => Keyword::Boolean,
            "Int32" => Keyword::Int32,
            "Int64" => Keyword::Int64,
            "Float32" => Keyword::Float32,
            "Float64" => Keyword::Float64,
            "String" => Keyword::String,
            "Array" => Keyword::Array,
            "Set" => Keyword::Set,
            "Struct" => Keyword::Struct,
            "Empty" => Keyword::Empty,
            "Call" => Keyword::Call,
            "Locus" => Keyword::Locus,
            "AltAllele" => Keyword::AltAllele,
            "Variant" => Keyword::Variant,
            _ => return None,
        };
        Some(kw)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Keyword(Keyword),
    Ident(String),
    Punct(char),
    End,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Keyword(kw) => format!("{kw:?}"),
            Token::Ident(name) => name.clone(),
            Token::Punct(c) => c.to_string(),
            Token::End => "end of input".to_string(),
        }
    }
}

struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    /// Byte position where the most recently lexed token starts.
    token_start: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Lexer<'a> {
        Lexer {
            input,
            pos: 0,
            token_start: 0,
        }
    }

    fn next_token(&mut self) -> Token {
        let rest = &self.input[self.pos..];
        let trimmed = rest.trim_start();
        self.pos += rest.len() - trimmed.len();
        self.token_start = self.pos;

        let Some(c) = trimmed.chars().next() else {
            return Token::End;
        };
        if c.is_ascii_alphabetic() || c == '_' {
            let len = trimmed
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .unwrap_or(trimmed.len());
            let word = &trimmed[..len];
            self.pos += len;
            return match Keyword::lookup(word) {
                Some(kw) => Token::Keyword(kw),
                None => Token::Ident(word.to_string()),
            };
        }
        self.pos += c.len_utf8();
        Token::Punct(c)
    }

    fn expect_punct(&mut self, expected: char) -> Result<()> {
        match self.next_token() {
            Token::Punct(c) if c == expected => Ok(()),
            found => Err(self.error(&found, format!("expected '{expected}'"))),
        }
    }

    fn expect_ident(&mut self) -> Result<String> {
        match self.next_token() {
            Token::Ident(name) => Ok(name),
            found => Err(self.error(&found, "expected identifier")),
        }
    }

    fn error(&self, found: &Token, message: impl Into<String>) -> Error {
        Error::parse(self.token_start, found.describe(), message)
    }
}

/// Parses one complete type from `text`, interning it (and every nested type)
/// into `registry`.
pub fn parse_type(registry: &mut TypeRegistry, text: &str) -> Result<TypeId> {
    let mut lexer = Lexer::new(text);
    let ty = parse_one(registry, &mut lexer)?;
    match lexer.next_token() {
        Token::End => Ok(ty),
        found => Err(lexer.error(&found, "expected end of input")),
    }
}

fn parse_one(registry: &mut TypeRegistry, lexer: &mut Lexer) -> Result<TypeId> {
    let mut token = lexer.next_token();
    let required = token == Token::Punct('!');
    if required {
        token = lexer.next_token();
    }

    let Token::Keyword(keyword) = token else {
        return Err(lexer.error(&token, "expected type"));
    };
    let ty = match keyword {
        Keyword::Boolean => registry.boolean(required),
        Keyword::Int32 => registry.int32(required),
        Keyword::Int64 => registry.int64(required),
        Keyword::Float32 => registry.float32(required),
        Keyword::Float64 => registry.float64(required),
        Keyword::String => registry.string(required),
        Keyword::Call => registry.call(required),
        Keyword::AltAllele => registry.alt_allele(required),
        Keyword::Empty => registry.empty_struct(required),
        Keyword::Array | Keyword::Set => {
            lexer.expect_punct('[')?;
            let element = parse_one(registry, lexer)?;
            lexer.expect_punct(']')?;
            if keyword == Keyword::Array {
                registry.array_type(element, required)
            } else {
                registry.set_type(element, required)
            }
        }
        Keyword::Locus | Keyword::Variant => {
            lexer.expect_punct('(')?;
            let genome_reference = lexer.expect_ident()?;
            lexer.expect_punct(')')?;
            if keyword == Keyword::Locus {
                registry.locus_type(&genome_reference, required)
            } else {
                registry.variant_type(&genome_reference, required)
            }
        }
        Keyword::Struct => {
            let fields = parse_fields(registry, lexer)?;
            registry.struct_type(fields, required)
        }
    };
    Ok(ty)
}

fn parse_fields(registry: &mut TypeRegistry, lexer: &mut Lexer) -> Result<Vec<Field>> {
    lexer.expect_punct('{')?;
    let mut fields: Vec<Field> = Vec::new();
    let mut token = lexer.next_token();
    while let Token::Ident(name) = token {
        if fields.iter().any(|f| f.name == name) {
            return Err(lexer.error(&Token::Ident(name), "duplicate field name"));
        }
        lexer.expect_punct(':')?;
        let ty = parse_one(registry, lexer)?;
        fields.push(Field::new(name, ty));

        token = lexer.next_token();
        if token == Token::Punct(',') {
            token = lexer.next_token();
        }
    }
    if token != Token::Punct('}') {
        return Err(lexer.error(&token, "expected '}'"));
    }
    Ok(fields)
}

#[cfg(test)]
mod tests {
    use vds_common::error::ErrorKind;

    use crate::{Kind, TypeRegistry};

    #[test]
    fn test_parse_scalars_and_required_marker() {
        let mut registry = TypeRegistry::new();
        assert_eq!(registry.parse("Int32").unwrap(), registry.int32(false));
        assert_eq!(registry.parse("!Int32").unwrap(), registry.int32(true));
        assert_eq!(registry.parse("  ! Float64 ").unwrap(), registry.float64(true));
        assert_eq!(registry.parse("Call").unwrap(), registry.call(false));
        assert_eq!(registry.parse("!AltAllele").unwrap(), registry.alt_allele(true));
    }

    #[test]
    fn test_parse_nested() {
        let mut registry = TypeRegistry::new();
        let id = registry.parse("Struct{a: !Int32, b: Array[Float64] c: Set[String]}").unwrap();
        let ty = registry.ty(id);
        assert_eq!(ty.kind(), Kind::Struct);
        assert!(!ty.required());
        let names = ty.fields().iter().map(|f| f.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, ["a", "b", "c"]);
        assert_eq!(ty.field_type(1).unwrap().kind(), Kind::Array);
        assert_eq!(ty.field_type(2).unwrap().kind(), Kind::Set);
        assert_eq!(
            ty.field_type(2).unwrap().element().unwrap().kind(),
            Kind::String
        );
    }

    #[test]
    fn test_parse_domain_types() {
        let mut registry = TypeRegistry::new();
        let locus = registry.parse("!Locus(GRCh37)").unwrap();
        assert_eq!(registry.ty(locus).genome_reference(), Some("GRCh37"));
        assert!(registry.ty(locus).required());

        let variant = registry.parse("Variant(GRCh38)").unwrap();
        assert_eq!(registry.ty(variant).kind(), Kind::Variant);

        let empty = registry.parse("Empty").unwrap();
        assert_eq!(empty, registry.parse("Struct{}").unwrap());
    }

    #[test]
    fn test_parse_errors_report_position_and_token() {
        let mut registry = TypeRegistry::new();
        let err = registry.parse("Array[Int32").unwrap_err();
        match err.kind() {
            ErrorKind::Parse {
                position, token, ..
            } => {
                assert_eq!(*position, 11);
                assert_eq!(token, "end of input");
            }
            other => panic!("unexpected kind {other:?}"),
        }

        let err = registry.parse("Struct{a: Int33}").unwrap_err();
        match err.kind() {
            ErrorKind::Parse {
                position, token, ..
            } => {
                assert_eq!(*position, 10);
                assert_eq!(token, "Int33");
            }
            other => panic!("unexpected kind {other:?}"),
        }

        assert!(registry.parse("Int32 Int64").is_err());
        assert!(registry.parse("Locus(37)").is_err());
        assert!(registry.parse("Struct{a: Int32, a: Int64}").is_err());
        assert!(registry.parse("").is_err());
    }
}
