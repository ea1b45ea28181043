// Tokens of the symbolic expression syntax

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    LeftParen,
    RightParen,

    // Atoms
    Symbol(String),
    Integer(i64),
    Real(f64),
    String(String),

    Eof,
}

impl Token {
    /// Short description used in syntax errors
    pub fn describe(&self) -> String {
        match self {
            Token::LeftParen => "'('".to_string(),
            Token::RightParen => "')'".to_string(),
            Token::Symbol(s) => format!("symbol {}", s),
            Token::Integer(n) => format!("integer {}", n),
            Token::Real(x) => format!("real {}", x),
            Token::String(s) => format!("string {:?}", s),
            Token::Eof => "end of input".to_string(),
        }
    }
}

/// Symbols that read as literals rather than names
pub const TRUE: &str = "true";
pub const FALSE: &str = "false";
pub const NIL: &str = "nil";

/// Characters that end a bare atom
pub fn is_delimiter(c: char) -> bool {
    c.is_whitespace() || matches!(c, '(' | ')' | '"' | ';')
}

/// Whether `text` lexes back as a single symbol token
pub fn is_symbol(text: &str) -> bool {
    !text.is_empty() && !text.chars().any(is_delimiter) && !looks_numeric(text)
}

/// Whether `text` is a symbol usable as a variable name
pub fn is_variable_name(text: &str) -> bool {
    is_symbol(text) && !matches!(text, TRUE | FALSE | NIL)
}

/// Numbers start with a digit, optionally after a sign or a leading dot
pub fn looks_numeric(text: &str) -> bool {
    let body = text
        .strip_prefix('-')
        .or_else(|| text.strip_prefix('+'))
        .unwrap_or(text);
    let body = body.strip_prefix('.').unwrap_or(body);
    body.chars().next().is_some_and(|c| c.is_ascii_digit())
}
