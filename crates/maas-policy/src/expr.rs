//! A small CEL predicate IR with a `to_source()` renderer. This control
//! plane only ever emits CEL text for an external authorization/rate-limit
//! engine to evaluate (§4.4/§4.5); there is no evaluator here.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Eq,
    Ne,
    And,
    Or,
}

/// CEL expression tree. Only the node kinds the auth/rate-limit policy
/// builders actually need: literals, identifiers, field/index access,
/// `!`/`==`/`!=`/`&&`/`||`, function calls (`split`, `exists`, `join`), and
/// `all`/`any` groupings that render as parenthesized `&&`/`||` chains.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Expr {
    Bool(bool),
    Int(i64),
    String(String),
    Ident(String),
    Field(Box<Expr>, String),
    Index(Box<Expr>, Box<Expr>),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Call(String, Vec<Expr>),
    /// A receiver method call, `receiver.method(args)` — CEL's
    /// `list.exists(x, pred)` / `string.split(sep)` macro syntax.
    MethodCall(Box<Expr>, String, Vec<Expr>),
    /// A lambda body used inside `exists(var, body)`-style calls; rendered
    /// bare since CEL comprehensions take an identifier and an expression,
    /// not a full closure syntax.
    Lambda(String, Box<Expr>),
    /// Conjunction over a list of sub-expressions, rendered
    /// `(a && b && c)`; empty list renders `true`.
    All(Vec<Expr>),
    /// Disjunction over a list of sub-expressions, rendered
    /// `(a || b || c)`; empty list renders `false`.
    Any(Vec<Expr>),
}

impl Expr {
    #[must_use]
    pub fn string(s: impl Into<String>) -> Self {
        Self::String(s.into())
    }

    #[must_use]
    pub fn ident(s: impl Into<String>) -> Self {
        Self::Ident(s.into())
    }

    #[must_use]
    pub fn field(base: Expr, field: impl Into<String>) -> Self {
        Self::Field(Box::new(base), field.into())
    }

    #[must_use]
    pub fn eq(lhs: Expr, rhs: Expr) -> Self {
        Self::Binary(BinaryOp::Eq, Box::new(lhs), Box::new(rhs))
    }

    #[must_use]
    pub fn ne(lhs: Expr, rhs: Expr) -> Self {
        Self::Binary(BinaryOp::Ne, Box::new(lhs), Box::new(rhs))
    }

    #[must_use]
    pub fn and(lhs: Expr, rhs: Expr) -> Self {
        Self::Binary(BinaryOp::And, Box::new(lhs), Box::new(rhs))
    }

    #[must_use]
    pub fn or(lhs: Expr, rhs: Expr) -> Self {
        Self::Binary(BinaryOp::Or, Box::new(lhs), Box::new(rhs))
    }

    #[must_use]
    pub fn not(self) -> Self {
        Self::Unary(UnaryOp::Not, Box::new(self))
    }

    #[must_use]
    pub fn method_call(self, name: impl Into<String>, args: Vec<Expr>) -> Self {
        Self::MethodCall(Box::new(self), name.into(), args)
    }

    /// Renders the CEL text embedded verbatim into an emitted policy spec.
    #[must_use]
    pub fn to_source(&self) -> String {
        match self {
            Self::Bool(b) => b.to_string(),
            Self::Int(n) => n.to_string(),
            Self::String(s) => format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\"")),
            Self::Ident(name) => name.clone(),
            Self::Field(base, field) => format!("{}.{}", base.to_source(), field),
            Self::Index(base, index) => format!("{}[{}]", base.to_source(), index.to_source()),
            Self::Unary(UnaryOp::Not, expr) => format!("!{}", expr.to_source()),
            Self::Binary(op, lhs, rhs) => {
                let symbol = match op {
                    BinaryOp::Eq => "==",
                    BinaryOp::Ne => "!=",
                    BinaryOp::And => "&&",
                    BinaryOp::Or => "||",
                };
                format!("({} {} {})", lhs.to_source(), symbol, rhs.to_source())
            }
            Self::Call(name, args) => {
                let inner = args
                    .iter()
                    .map(Expr::to_source)
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{name}({inner})")
            }
            Self::MethodCall(base, name, args) => {
                let inner = args
                    .iter()
                    .map(Expr::to_source)
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{}.{}({})", base.to_source(), name, inner)
            }
            Self::Lambda(var, body) => format!("{var}, {}", body.to_source()),
            Self::All(exprs) => {
                if exprs.is_empty() {
                    return "true".to_owned();
                }
                let inner = exprs
                    .iter()
                    .map(Expr::to_source)
                    .collect::<Vec<_>>()
                    .join(" && ");
                format!("({inner})")
            }
            Self::Any(exprs) => {
                if exprs.is_empty() {
                    return "false".to_owned();
                }
                let inner = exprs
                    .iter()
                    .map(Expr::to_source)
                    .collect::<Vec<_>>()
                    .join(" || ");
                format!("({inner})")
            }
        }
    }
}
