use serde::{Deserialize, Serialize};

/// An operand entered on the keypad
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// A number typed or computed by the caller
    Value(f64),
    /// A named variable, resolved when the program is evaluated
    Variable(String),
}

/// One recorded entry of a program
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// An operand
    Operand(Literal),
    /// The symbol of an operation from [`OPERATIONS`](crate::OPERATIONS)
    Operation(String),
}

/// Persisted form of a token: a bare number or a bare string.
///
/// Strings are told apart on load by looking them up in the operation table:
/// known symbols are operations, anything else is a variable name.
///
/// ```
/// use keycalc::Primitive;
///
/// let program = vec![Primitive::Number(7.0), Primitive::Text("+".into())];
/// assert_eq!(serde_json::to_string(&program).unwrap(), r#"[7.0,"+"]"#);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Primitive {
    /// A numeric operand
    Number(f64),
    /// An operation symbol or a variable name
    Text(String),
}

impl From<&Token> for Primitive {
    fn from(token: &Token) -> Self {
        match *token {
            Token::Operand(Literal::Value(value)) => Self::Number(value),
            Token::Operand(Literal::Variable(ref name)) => Self::Text(name.clone()),
            Token::Operation(ref symbol) => Self::Text(symbol.clone()),
        }
    }
}

impl From<Primitive> for Token {
    fn from(primitive: Primitive) -> Self {
        match primitive {
            Primitive::Number(value) => Self::Operand(Literal::Value(value)),
            Primitive::Text(text) if crate::operation::OPERATIONS.contains_key(&text) => {
                Self::Operation(text)
            }
            Primitive::Text(name) => Self::Operand(Literal::Variable(name)),
        }
    }
}
