// Printing expressions back to symbolic syntax

use std::fmt::{self, Write};

use super::token::{FALSE, NIL, TRUE};
use super::{FIELD_HEAD, LET_HEAD};
use crate::expression::{Expression, FieldKey, FieldRef, Literal};

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Literal(lit) => write_literal(f, lit),
            Expression::Field(FieldRef { key, shift }) => {
                write!(f, "({} ", FIELD_HEAD)?;
                match key {
                    FieldKey::Column(c) => write!(f, "{}", c)?,
                    FieldKey::Id(id) => write_string(f, id)?,
                }
                if let Some(shift) = shift {
                    write!(f, " {}", shift)?;
                }
                f.write_char(')')
            }
            Expression::Var(name) => f.write_str(name),
            Expression::Call { name, args } => {
                write!(f, "({}", name)?;
                for arg in args {
                    write!(f, " {}", arg)?;
                }
                f.write_char(')')
            }
            Expression::Let { bindings, body } => {
                write!(f, "({} (", LET_HEAD)?;
                for (i, (name, value)) in bindings.iter().enumerate() {
                    if i > 0 {
                        f.write_char(' ')?;
                    }
                    write!(f, "{} {}", name, value)?;
                }
                write!(f, ") {})", body)
            }
        }
    }
}

fn write_literal(f: &mut fmt::Formatter<'_>, lit: &Literal) -> fmt::Result {
    match lit {
        Literal::Nil => f.write_str(NIL),
        Literal::Boolean(true) => f.write_str(TRUE),
        Literal::Boolean(false) => f.write_str(FALSE),
        Literal::Int(n) => write!(f, "{}", n),
        // Debug keeps a decimal point or exponent, so reals read back as reals
        Literal::Real(x) => write!(f, "{:?}", x),
        Literal::Text(s) => write_string(f, s),
    }
}

fn write_string(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_char('"')?;
    for c in s.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\t' => f.write_str("\\t")?,
            '\r' => f.write_str("\\r")?,
            c if c.is_control() => write!(f, "\\u{:04x}", c as u32)?,
            c => f.write_char(c)?,
        }
    }
    f.write_char('"')
}
