//! C function declaration parser.
//!
//! Covers the declarations a flat C library interface uses: base and stdint
//! scalar types, `const` qualifiers, and pointers. Function pointers, arrays,
//! structs, and variadic parameter lists are rejected.

use serde::{Serialize, Serializer};

use crate::error::{FfiError, Result};

/// A C type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CType {
    Void,
    Char,
    SignedChar,
    UnsignedChar,
    Short,
    UnsignedShort,
    Int,
    UnsignedInt,
    Long,
    UnsignedLong,
    LongLong,
    UnsignedLongLong,
    Float,
    Double,
    Bool,
    // stdint
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    SizeT,
    /// Pointer to another type.
    Pointer(Box<CType>),
    /// Const-qualified type.
    Const(Box<CType>),
}

impl CType {
    pub fn pointer_to(inner: CType) -> Self {
        CType::Pointer(Box::new(inner))
    }

    pub fn const_of(inner: CType) -> Self {
        CType::Const(Box::new(inner))
    }

    pub fn is_void(&self) -> bool {
        matches!(self, CType::Void)
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self.strip_const(), CType::Pointer(_))
    }

    /// Strip outer const qualifiers.
    pub fn strip_const(&self) -> &CType {
        match self {
            CType::Const(inner) => inner.strip_const(),
            other => other,
        }
    }

    fn keyword(&self) -> Option<&'static str> {
        let kw = match self {
            CType::Void => "void",
            CType::Char => "char",
            CType::SignedChar => "signed char",
            CType::UnsignedChar => "unsigned char",
            CType::Short => "short",
            CType::UnsignedShort => "unsigned short",
            CType::Int => "int",
            CType::UnsignedInt => "unsigned int",
            CType::Long => "long",
            CType::UnsignedLong => "unsigned long",
            CType::LongLong => "long long",
            CType::UnsignedLongLong => "unsigned long long",
            CType::Float => "float",
            CType::Double => "double",
            CType::Bool => "_Bool",
            CType::Int8 => "int8_t",
            CType::Int16 => "int16_t",
            CType::Int32 => "int32_t",
            CType::Int64 => "int64_t",
            CType::UInt8 => "uint8_t",
            CType::UInt16 => "uint16_t",
            CType::UInt32 => "uint32_t",
            CType::UInt64 => "uint64_t",
            CType::SizeT => "size_t",
            CType::Pointer(_) | CType::Const(_) => return None,
        };
        Some(kw)
    }
}

impl std::fmt::Display for CType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CType::Pointer(inner) => write!(f, "{inner}*"),
            // A const pointer is written east-const: `uint8_t* const`.
            CType::Const(inner) if inner.is_pointer() => write!(f, "{inner} const"),
            CType::Const(inner) => write!(f, "const {inner}"),
            scalar => f.write_str(scalar.keyword().unwrap_or("?")),
        }
    }
}

impl Serialize for CType {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A function parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CParam {
    /// Parameter type.
    #[serde(rename = "type")]
    pub param_type: CType,
    /// Parameter name (empty when unnamed).
    pub name: String,
}

impl CParam {
    pub fn new(param_type: CType, name: impl Into<String>) -> Self {
        CParam {
            param_type,
            name: name.into(),
        }
    }
}

/// A C function declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CSignature {
    /// Function name.
    pub name: String,
    /// Return type.
    pub return_type: CType,
    /// Parameters, in order.
    pub parameters: Vec<CParam>,
}

impl CSignature {
    pub fn new(return_type: CType, name: impl Into<String>, parameters: Vec<CParam>) -> Self {
        CSignature {
            name: name.into(),
            return_type,
            parameters,
        }
    }

    /// Parse a single declaration; a trailing `;` is accepted.
    ///
    /// ```
    /// use faest_ffi::csig::{CSignature, CType};
    /// let sig = CSignature::parse("void faest_128f_clear_private_key(uint8_t* key);").unwrap();
    /// assert_eq!(sig.return_type, CType::Void);
    /// assert_eq!(sig.parameters.len(), 1);
    /// ```
    pub fn parse(input: &str) -> Result<Self> {
        let tokens = tokenize(input)?;
        let mut p = Parser { tokens, pos: 0 };

        let (return_type, name) = p.declaration()?;
        let name = name.ok_or_else(|| invalid("missing function name"))?;
        p.expect(Token::LParen)?;
        let parameters = p.parameter_list()?;
        p.expect(Token::RParen)?;
        p.eat(Token::Semi);
        if let Some(tok) = p.peek() {
            return Err(invalid(format!("unexpected {tok} after ')'")));
        }

        Ok(CSignature {
            name,
            return_type,
            parameters,
        })
    }

    /// Same name, return type, and parameter types. Parameter names are not
    /// part of a function's type.
    pub fn same_shape(&self, other: &CSignature) -> bool {
        self.name == other.name
            && self.return_type == other.return_type
            && self.parameters.len() == other.parameters.len()
            && self
                .parameters
                .iter()
                .zip(&other.parameters)
                .all(|(a, b)| a.param_type == b.param_type)
    }
}

impl std::fmt::Display for CSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}(", self.return_type, self.name)?;
        if self.parameters.is_empty() {
            f.write_str("void")?;
        }
        for (i, param) in self.parameters.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", param.param_type)?;
            if !param.name.is_empty() {
                write!(f, " {}", param.name)?;
            }
        }
        f.write_str(")")
    }
}

fn invalid(detail: impl Into<String>) -> FfiError {
    FfiError::InvalidCSignature {
        detail: detail.into(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    Ident(&'a str),
    Star,
    Comma,
    LParen,
    RParen,
    Semi,
}

impl std::fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Ident(s) => write!(f, "'{s}'"),
            Token::Star => f.write_str("'*'"),
            Token::Comma => f.write_str("','"),
            Token::LParen => f.write_str("'('"),
            Token::RParen => f.write_str("')'"),
            Token::Semi => f.write_str("';'"),
        }
    }
}

fn tokenize(input: &str) -> Result<Vec<Token<'_>>> {
    let mut tokens = Vec::new();
    let mut rest = input.trim_start();
    while let Some(c) = rest.chars().next() {
        let tok = match c {
            '*' => Token::Star,
            ',' => Token::Comma,
            '(' => Token::LParen,
            ')' => Token::RParen,
            ';' => Token::Semi,
            c if c.is_ascii_alphabetic() || c == '_' => {
                let end = rest
                    .find(|ch: char| !(ch.is_ascii_alphanumeric() || ch == '_'))
                    .unwrap_or(rest.len());
                tokens.push(Token::Ident(&rest[..end]));
                rest = rest[end..].trim_start();
                continue;
            }
            '.' if rest.starts_with("...") => {
                return Err(invalid("variadic functions are not supported"));
            }
            other => return Err(invalid(format!("unexpected character '{other}'"))),
        };
        tokens.push(tok);
        rest = rest[c.len_utf8()..].trim_start();
    }
    if tokens.is_empty() {
        return Err(invalid("empty signature"));
    }
    Ok(tokens)
}

struct Parser<'a> {
    tokens: Vec<Token<'a>>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<Token<'a>> {
        self.tokens.get(self.pos).copied()
    }

    fn eat(&mut self, tok: Token<'_>) -> bool {
        if self.peek() == Some(tok) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, tok: Token<'_>) -> Result<()> {
        match self.peek() {
            Some(found) if found == tok => {
                self.pos += 1;
                Ok(())
            }
            Some(found) => Err(invalid(format!("expected {tok}, found {found}"))),
            None => Err(invalid(format!("expected {tok}, found end of input"))),
        }
    }

    /// `specifiers (* const?)* name?`
    fn declaration(&mut self) -> Result<(CType, Option<String>)> {
        let mut words = Vec::new();
        let mut is_const = false;
        while let Some(Token::Ident(word)) = self.peek() {
            if word == "const" {
                is_const = true;
            } else if is_specifier(word) {
                words.push(word);
            } else {
                break;
            }
            self.pos += 1;
        }

        if words.is_empty() {
            return Err(match self.peek() {
                Some(Token::Ident(word)) => invalid(format!("unknown type '{word}'")),
                Some(tok) => invalid(format!("expected type, found {tok}")),
                None => invalid("expected type"),
            });
        }
        let mut ty = resolve_specifiers(&words)?;
        if is_const {
            ty = CType::const_of(ty);
        }

        while self.eat(Token::Star) {
            ty = CType::pointer_to(ty);
            if self.eat(Token::Ident("const")) {
                ty = CType::const_of(ty);
            }
        }

        let name = match self.peek() {
            Some(Token::Ident(name)) => {
                self.pos += 1;
                Some(name.to_string())
            }
            _ => None,
        };
        Ok((ty, name))
    }

    fn parameter_list(&mut self) -> Result<Vec<CParam>> {
        if self.peek() == Some(Token::RParen) {
            return Ok(Vec::new());
        }
        // `(void)`
        if self.peek() == Some(Token::Ident("void"))
            && self.tokens.get(self.pos + 1) == Some(&Token::RParen)
        {
            self.pos += 1;
            return Ok(Vec::new());
        }

        let mut params = Vec::new();
        loop {
            let (param_type, name) = self.declaration()?;
            if param_type.is_void() {
                return Err(invalid("'void' parameter must stand alone"));
            }
            params.push(CParam::new(param_type, name.unwrap_or_default()));
            if !self.eat(Token::Comma) {
                return Ok(params);
            }
        }
    }
}

fn is_specifier(word: &str) -> bool {
    matches!(
        word,
        "void"
            | "char"
            | "short"
            | "int"
            | "long"
            | "signed"
            | "unsigned"
            | "float"
            | "double"
            | "_Bool"
            | "bool"
            | "size_t"
            | "int8_t"
            | "int16_t"
            | "int32_t"
            | "int64_t"
            | "uint8_t"
            | "uint16_t"
            | "uint32_t"
            | "uint64_t"
    )
}

/// Combine a run of type specifier keywords into one type.
fn resolve_specifiers(words: &[&str]) -> Result<CType> {
    let mut unsigned = false;
    let mut signed = false;
    let mut short = false;
    let mut longs = 0;
    let mut base: Option<&str> = None;

    for &word in words {
        match word {
            "unsigned" => unsigned = true,
            "signed" => signed = true,
            "short" => short = true,
            "long" => longs += 1,
            other => {
                if let Some(prev) = base {
                    return Err(invalid(format!("conflicting types '{prev}' and '{other}'")));
                }
                base = Some(other);
            }
        }
    }

    if unsigned && signed {
        return Err(invalid("both 'signed' and 'unsigned'"));
    }
    let modified = unsigned || signed || short || longs > 0;

    let ty = match base {
        None if !modified => return Err(invalid("expected type")),
        None | Some("int") => match (short, longs) {
            (true, 0) if unsigned => CType::UnsignedShort,
            (true, 0) => CType::Short,
            (false, 0) if unsigned => CType::UnsignedInt,
            (false, 0) => CType::Int,
            (false, 1) if unsigned => CType::UnsignedLong,
            (false, 1) => CType::Long,
            (false, 2) if unsigned => CType::UnsignedLongLong,
            (false, 2) => CType::LongLong,
            _ => return Err(invalid("invalid integer type")),
        },
        Some("char") if !short && longs == 0 => {
            if unsigned {
                CType::UnsignedChar
            } else if signed {
                CType::SignedChar
            } else {
                CType::Char
            }
        }
        Some(other) if modified => {
            return Err(invalid(format!("'{other}' does not take size or sign modifiers")))
        }
        Some("void") => CType::Void,
        Some("float") => CType::Float,
        Some("double") => CType::Double,
        Some("_Bool" | "bool") => CType::Bool,
        Some("size_t") => CType::SizeT,
        Some("int8_t") => CType::Int8,
        Some("int16_t") => CType::Int16,
        Some("int32_t") => CType::Int32,
        Some("int64_t") => CType::Int64,
        Some("uint8_t") => CType::UInt8,
        Some("uint16_t") => CType::UInt16,
        Some("uint32_t") => CType::UInt32,
        Some("uint64_t") => CType::UInt64,
        Some(other) => return Err(invalid(format!("unknown type '{other}'"))),
    };
    Ok(ty)
}
