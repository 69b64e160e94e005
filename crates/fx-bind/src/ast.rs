//! Already-parsed expression nodes consumed by the binder.
//!
//! The tokenizer/parser is an external collaborator; it hands the semantic
//! core nodes that already identify variable/function names and carry the
//! source [`Span`] used for diagnostics.

use fx_model::Span;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
}

/// Scalar literal as delivered by the parser.
#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
    Number(f64),
    Text(String),
    Boolean(bool),
}

/// An expression node with its source span.
#[derive(Clone, Debug, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ExprKind {
    Literal(Literal),
    /// A bare identifier, resolved through the symbol environment.
    Ident(String),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Multi-branch conditional: `(condition, value)` arms plus an optional
    /// trailing else value. All value branches unify to the result type.
    If {
        arms: Vec<(Expr, Expr)>,
        else_value: Option<Box<Expr>>,
    },
    Call {
        namespace: String,
        name: String,
        args: Vec<Expr>,
    },
    /// Field access on a record-typed base expression.
    Field {
        base: Box<Expr>,
        name: String,
    },
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn number(n: f64, span: Span) -> Self {
        Self::new(ExprKind::Literal(Literal::Number(n)), span)
    }

    pub fn text(s: impl Into<String>, span: Span) -> Self {
        Self::new(ExprKind::Literal(Literal::Text(s.into())), span)
    }

    pub fn boolean(b: bool, span: Span) -> Self {
        Self::new(ExprKind::Literal(Literal::Boolean(b)), span)
    }

    pub fn ident(name: impl Into<String>, span: Span) -> Self {
        Self::new(ExprKind::Ident(name.into()), span)
    }

    pub fn binary(op: BinaryOp, left: Expr, right: Expr, span: Span) -> Self {
        Self::new(
            ExprKind::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            span,
        )
    }

    pub fn neg(operand: Expr, span: Span) -> Self {
        Self::new(
            ExprKind::Unary {
                op: UnaryOp::Neg,
                operand: Box::new(operand),
            },
            span,
        )
    }
}
