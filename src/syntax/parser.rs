// Parser for the symbolic expression syntax

use super::lexer::Lexer;
use super::token::{is_variable_name, Token, FALSE, NIL, TRUE};
use super::{FIELD_HEAD, LET_HEAD, VAR_HEAD};
use crate::expression::{Expression, ExpressionError, ExpressionResult, FieldKey, FieldRef};

pub struct Parser {
    tokens: Vec<(Token, usize)>,
    position: usize,
}

impl Parser {
    pub fn new(input: &str) -> ExpressionResult<Self> {
        Ok(Parser {
            tokens: Lexer::new(input).tokenize()?,
            position: 0,
        })
    }

    /// Parse exactly one expression spanning the whole input
    pub fn parse(&mut self) -> ExpressionResult<Expression> {
        let expr = self.parse_expression()?;
        match self.current() {
            Token::Eof => Ok(expr),
            other => Err(ExpressionError::syntax_at(
                format!("unexpected {} after expression", other.describe()),
                self.offset(),
            )),
        }
    }

    fn current(&self) -> &Token {
        self.tokens
            .get(self.position)
            .map(|(t, _)| t)
            .unwrap_or(&Token::Eof)
    }

    fn offset(&self) -> usize {
        self.tokens
            .get(self.position)
            .or_else(|| self.tokens.last())
            .map(|(_, o)| *o)
            .unwrap_or(0)
    }

    fn next(&mut self) -> Token {
        let token = self.current().clone();
        if self.position < self.tokens.len() {
            self.position += 1;
        }
        token
    }

    fn unexpected(&self, token: &Token, offset: usize, expecting: &str) -> ExpressionError {
        let message = match token {
            Token::Eof => format!("unexpected end of input, {} expected", expecting),
            other => format!("expected {}, found {}", expecting, other.describe()),
        };
        ExpressionError::syntax_at(message, offset)
    }

    fn expect_right_paren(&mut self, form: &str) -> ExpressionResult<()> {
        let offset = self.offset();
        match self.next() {
            Token::RightParen => Ok(()),
            other => Err(self.unexpected(&other, offset, &format!("')' closing {}", form))),
        }
    }

    fn parse_expression(&mut self) -> ExpressionResult<Expression> {
        let offset = self.offset();
        match self.next() {
            Token::Integer(n) => Ok(Expression::int(n)),
            Token::Real(x) => Ok(Expression::real(x)),
            Token::String(s) => Ok(Expression::text(s)),
            Token::Symbol(s) => Ok(match s.as_str() {
                TRUE => Expression::bool(true),
                FALSE => Expression::bool(false),
                NIL => Expression::nil(),
                _ => Expression::Var(s),
            }),
            Token::LeftParen => self.parse_list(offset),
            other => Err(self.unexpected(&other, offset, "an expression")),
        }
    }

    /// Parse a list after its opening parenthesis
    fn parse_list(&mut self, open_offset: usize) -> ExpressionResult<Expression> {
        let head = match self.next() {
            Token::Symbol(s) => s,
            Token::RightParen => {
                return Err(ExpressionError::syntax_at("empty list", open_offset))
            }
            other => {
                return Err(self.unexpected(&other, open_offset, "a symbol at the head of a list"))
            }
        };

        match head.as_str() {
            FIELD_HEAD => self.parse_field(),
            VAR_HEAD => self.parse_var(),
            LET_HEAD => self.parse_let(),
            _ => {
                let mut args = Vec::new();
                while !matches!(self.current(), Token::RightParen | Token::Eof) {
                    args.push(self.parse_expression()?);
                }
                self.expect_right_paren(&head)?;
                Ok(Expression::Call { name: head, args })
            }
        }
    }

    /// `(f key)` or `(f key shift)`
    fn parse_field(&mut self) -> ExpressionResult<Expression> {
        let offset = self.offset();
        let key = match self.next() {
            Token::Integer(n) if n >= 0 => FieldKey::Column(n as usize),
            Token::String(s) => FieldKey::Id(s),
            other => {
                return Err(self.unexpected(
                    &other,
                    offset,
                    "a column number or field id in field reference",
                ))
            }
        };

        let shift = match self.current() {
            Token::Integer(n) => Some(*n),
            _ => None,
        };
        if shift.is_some() {
            self.next();
        }

        self.expect_right_paren("field reference")?;
        Ok(Expression::Field(FieldRef { key, shift }))
    }

    /// `(var x)` or `(var "x")`
    fn parse_var(&mut self) -> ExpressionResult<Expression> {
        let offset = self.offset();
        let name = match self.next() {
            Token::Symbol(s) | Token::String(s) if is_variable_name(&s) => s,
            other => return Err(self.unexpected(&other, offset, "a variable name")),
        };
        self.expect_right_paren("variable reference")?;
        Ok(Expression::Var(name))
    }

    /// `(let (name expr ...) body)`
    fn parse_let(&mut self) -> ExpressionResult<Expression> {
        let offset = self.offset();
        match self.next() {
            Token::LeftParen => {}
            other => return Err(self.unexpected(&other, offset, "'(' opening let bindings")),
        }

        let mut bindings = Vec::new();
        loop {
            let offset = self.offset();
            match self.next() {
                Token::RightParen => break,
                Token::Symbol(name) if is_variable_name(&name) => {
                    if matches!(self.current(), Token::RightParen) {
                        return Err(ExpressionError::syntax_at(
                            format!("let binding {} has no value", name),
                            offset,
                        ));
                    }
                    let value = self.parse_expression()?;
                    bindings.push((name, value));
                }
                other => return Err(self.unexpected(&other, offset, "a binding name")),
            }
        }

        let body = self.parse_expression()?;
        self.expect_right_paren("let")?;
        Ok(Expression::Let {
            bindings,
            body: Box::new(body),
        })
    }
}

/// Parse symbolic syntax into an expression
pub fn parse_symbolic(input: &str) -> ExpressionResult<Expression> {
    Parser::new(input)?.parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::ErrorKind;

    #[test]
    fn test_parse_literals() {
        assert_eq!(parse_symbolic("42").unwrap(), Expression::int(42));
        assert_eq!(parse_symbolic("4.0").unwrap(), Expression::real(4.0));
        assert_eq!(parse_symbolic("\"hi\"").unwrap(), Expression::text("hi"));
        assert_eq!(parse_symbolic("true").unwrap(), Expression::bool(true));
        assert_eq!(parse_symbolic("nil").unwrap(), Expression::nil());
    }

    #[test]
    fn test_parse_call() {
        let expr = parse_symbolic("(+ 1 (* 2 3))").unwrap();
        assert_eq!(
            expr,
            Expression::call(
                "+",
                vec![
                    Expression::int(1),
                    Expression::call("*", vec![Expression::int(2), Expression::int(3)]),
                ]
            )
        );
    }

    #[test]
    fn test_parse_field_refs() {
        assert_eq!(parse_symbolic("(f 0)").unwrap(), Expression::column(0));
        assert_eq!(
            parse_symbolic("(f \"000001\")").unwrap(),
            Expression::field("000001")
        );
        assert_eq!(
            parse_symbolic("(f \"000001\" -1)").unwrap(),
            Expression::Field(FieldRef::id("000001").shifted(-1))
        );
        assert!(parse_symbolic("(f)").is_err());
        assert!(parse_symbolic("(f -1)").is_err());
        assert!(parse_symbolic("(f 0 1 2)").is_err());
        assert!(parse_symbolic("(f (+ 1 2))").is_err());
    }

    #[test]
    fn test_parse_let() {
        let expr = parse_symbolic("(let (x (f 0) y 2) (+ x y))").unwrap();
        assert_eq!(
            expr,
            Expression::let_in(
                vec![("x", Expression::column(0)), ("y", Expression::int(2))],
                Expression::call("+", vec![Expression::var("x"), Expression::var("y")]),
            )
        );
        assert_eq!(parse_symbolic("(var \"x\")").unwrap(), Expression::var("x"));

        assert!(parse_symbolic("(let (x) x)").is_err());
        assert!(parse_symbolic("(let (1 2) 3)").is_err());
        assert!(parse_symbolic("(let x 1)").is_err());
    }

    #[test]
    fn test_syntax_errors() {
        for input in ["(+ 1 2", "(+ 1 2))", "()", "((f 0) 1)", ")", "", "(1 2)"] {
            let err = parse_symbolic(input).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Syntax, "input {:?}", input);
        }
    }

    #[test]
    fn test_whitespace_insignificant() {
        assert_eq!(
            parse_symbolic("  (\n+\t1   2 )  ").unwrap(),
            parse_symbolic("(+ 1 2)").unwrap()
        );
    }
}
