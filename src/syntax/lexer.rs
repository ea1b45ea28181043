// Lexer for the symbolic expression syntax

use super::token::{is_delimiter, looks_numeric, Token};
use crate::expression::{ExpressionError, ExpressionResult};

pub struct Lexer {
    input: Vec<char>,
    position: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            input: input.chars().collect(),
            position: 0,
        }
    }

    /// Get the next token from the input, with the offset it starts at
    pub fn next_token(&mut self) -> ExpressionResult<(Token, usize)> {
        self.skip_whitespace_and_comments();

        let start = self.position;
        let Some(c) = self.current() else {
            return Ok((Token::Eof, start));
        };

        let token = match c {
            '(' => {
                self.advance();
                Token::LeftParen
            }
            ')' => {
                self.advance();
                Token::RightParen
            }
            '"' => self.read_string()?,
            _ => self.read_atom()?,
        };

        Ok((token, start))
    }

    /// Tokenize the whole input, ending with `Eof`
    pub fn tokenize(mut self) -> ExpressionResult<Vec<(Token, usize)>> {
        let mut tokens = Vec::new();
        loop {
            let (token, offset) = self.next_token()?;
            let done = token == Token::Eof;
            tokens.push((token, offset));
            if done {
                return Ok(tokens);
            }
        }
    }

    fn current(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    /// Skip whitespace and `;` line comments
    fn skip_whitespace_and_comments(&mut self) {
        while let Some(ch) = self.current() {
            if ch.is_whitespace() {
                self.advance();
            } else if ch == ';' {
                while let Some(ch) = self.current() {
                    self.advance();
                    if ch == '\n' {
                        break;
                    }
                }
            } else {
                break;
            }
        }
    }

    /// Read a double-quoted string literal
    fn read_string(&mut self) -> ExpressionResult<Token> {
        let start = self.position;
        self.advance(); // opening quote

        let mut value = String::new();
        loop {
            match self.current() {
                None => {
                    return Err(ExpressionError::syntax_at(
                        "unterminated string literal",
                        start,
                    ))
                }
                Some('"') => {
                    self.advance();
                    return Ok(Token::String(value));
                }
                Some('\\') => {
                    let escape_at = self.position;
                    self.advance();
                    let escaped = match self.current() {
                        Some('n') => '\n',
                        Some('t') => '\t',
                        Some('r') => '\r',
                        Some('"') => '"',
                        Some('\\') => '\\',
                        Some('/') => '/',
                        Some('u') => {
                            self.advance();
                            value.push(self.read_unicode_escape(escape_at)?);
                            continue;
                        }
                        Some(other) => {
                            return Err(ExpressionError::syntax_at(
                                format!("unknown escape \\{}", other),
                                escape_at,
                            ))
                        }
                        None => {
                            return Err(ExpressionError::syntax_at(
                                "unterminated string literal",
                                start,
                            ))
                        }
                    };
                    value.push(escaped);
                    self.advance();
                }
                Some(ch) => {
                    value.push(ch);
                    self.advance();
                }
            }
        }
    }

    /// Four hex digits following `\u`
    fn read_unicode_escape(&mut self, escape_at: usize) -> ExpressionResult<char> {
        let end = self.position + 4;
        let digits: String = self
            .input
            .get(self.position..end)
            .map(|s| s.iter().collect())
            .unwrap_or_default();
        let code = u32::from_str_radix(&digits, 16)
            .ok()
            .filter(|_| digits.len() == 4)
            .and_then(char::from_u32)
            .ok_or_else(|| ExpressionError::syntax_at("invalid \\u escape", escape_at))?;
        self.position = end;
        Ok(code)
    }

    /// Read a bare atom and classify it as a number or a symbol
    fn read_atom(&mut self) -> ExpressionResult<Token> {
        let start = self.position;
        while let Some(ch) = self.current() {
            if is_delimiter(ch) {
                break;
            }
            self.advance();
        }
        let text: String = self.input[start..self.position].iter().collect();

        if !looks_numeric(&text) {
            return Ok(Token::Symbol(text));
        }
        if let Ok(n) = text.parse::<i64>() {
            return Ok(Token::Integer(n));
        }
        if text.chars().all(|c| c.is_ascii_digit() || c == '-' || c == '+') {
            return Err(ExpressionError::syntax_at(
                format!("integer literal {} out of range", text),
                start,
            ));
        }
        match text.parse::<f64>() {
            Ok(x) if x.is_finite() => Ok(Token::Real(x)),
            _ => Err(ExpressionError::syntax_at(
                format!("malformed number {}", text),
                start,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<Token> {
        Lexer::new(input)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|(t, _)| t)
            .collect()
    }

    #[test]
    fn test_basic_tokens() {
        assert_eq!(
            tokens("(+ 1 2.5 \"a\")"),
            vec![
                Token::LeftParen,
                Token::Symbol("+".to_string()),
                Token::Integer(1),
                Token::Real(2.5),
                Token::String("a".to_string()),
                Token::RightParen,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_token_offsets() {
        let offsets: Vec<usize> = Lexer::new("(f  \"a\")")
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|(_, offset)| offset)
            .collect();
        assert_eq!(offsets, vec![0, 1, 4, 7, 8]);
    }

    #[test]
    fn test_numbers_and_signs() {
        assert_eq!(
            tokens("-3 -2.0 - 1e3 .5"),
            vec![
                Token::Integer(-3),
                Token::Real(-2.0),
                Token::Symbol("-".to_string()),
                Token::Real(1000.0),
                Token::Real(0.5),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(
            tokens(r#""a\"b\\c\nA""#),
            vec![Token::String("a\"b\\c\nA".to_string()), Token::Eof]
        );
    }

    #[test]
    fn test_comments_and_whitespace() {
        assert_eq!(
            tokens("; leading comment\n  (f\t0) ; trailing"),
            vec![
                Token::LeftParen,
                Token::Symbol("f".to_string()),
                Token::Integer(0),
                Token::RightParen,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_lexical_errors() {
        assert!(Lexer::new("\"open").tokenize().is_err());
        assert!(Lexer::new(r#""\q""#).tokenize().is_err());
        assert!(Lexer::new("99999999999999999999").tokenize().is_err());
        assert!(Lexer::new("1e999").tokenize().is_err());
        assert!(Lexer::new("12abc").tokenize().is_err());
    }
}
