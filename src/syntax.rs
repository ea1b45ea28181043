// Surface syntaxes: symbolic text and JSON trees, both mapping onto the same
// expression AST.

pub mod json;
pub mod lexer;
pub mod parser;
pub mod printer;
pub mod token;

pub use json::{from_json_tree, to_json_tree};
pub use lexer::Lexer;
pub use parser::{parse_symbolic, Parser};
pub use token::Token;

use crate::expression::ExpressionResult;

/// Reserved list heads
pub const FIELD_HEAD: &str = "f";
pub const VAR_HEAD: &str = "var";
pub const LET_HEAD: &str = "let";

/// Whether a name is taken by a syntactic form and cannot name a primitive
pub fn is_reserved(name: &str) -> bool {
    matches!(name, FIELD_HEAD | VAR_HEAD | LET_HEAD)
}

/// Convert symbolic text to a JSON tree
pub fn lisp_to_json(text: &str) -> ExpressionResult<serde_json::Value> {
    Ok(to_json_tree(&parse_symbolic(text)?))
}

/// Convert a JSON tree to symbolic text
pub fn json_to_lisp(tree: &serde_json::Value) -> ExpressionResult<String> {
    Ok(from_json_tree(tree)?.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_round_trips() {
        let texts = [
            "(+ 1 2)",
            "(f 0)",
            "(f \"000001\")",
            "(if (missing? (f \"000000\")) 0.5 (/ (f 0) 2))",
            "(let (x 1 y (+ x 1)) (* x y))",
            "(str \"a\\nb\" true nil)",
            "(avg-window (f \"000003\") -2 0)",
        ];
        for text in texts {
            let expr = parse_symbolic(text).unwrap();
            let tree = lisp_to_json(text).unwrap();
            assert_eq!(from_json_tree(&tree).unwrap(), expr);
            assert_eq!(parse_symbolic(&json_to_lisp(&tree).unwrap()).unwrap(), expr);
            assert_eq!(json_to_lisp(&tree).unwrap(), text);
        }
    }

    #[test]
    fn test_conversions() {
        assert_eq!(lisp_to_json("(f 0)").unwrap(), json!(["f", 0]));
        assert_eq!(
            lisp_to_json("(f \"000001\")").unwrap(),
            json!(["f", "000001"])
        );
        assert_eq!(json_to_lisp(&json!(["+", 1, 2])).unwrap(), "(+ 1 2)");
        assert!(lisp_to_json("(+ 1").is_err());
        assert!(json_to_lisp(&json!([3, 1])).is_err());
    }

    #[test]
    fn test_reserved() {
        assert!(is_reserved("f"));
        assert!(is_reserved("let"));
        assert!(!is_reserved("+"));
    }
}
