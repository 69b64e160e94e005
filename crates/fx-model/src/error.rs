use std::fmt;

use serde::{Deserialize, Serialize};

/// Half-open byte range into the original formula source text.
///
/// Spans are produced by the (external) parser and carried through binding and
/// evaluation so every diagnostic can point back at the offending expression.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Classification of a failure surfaced to formula authors.
///
/// All kinds except [`ErrorKind::InternalContract`] are user-triggerable and
/// flow through evaluation as [`ErrorValue`]s rather than aborting it.
/// `InternalContract` exists purely as an assertion against programmer error;
/// supported language features must never produce it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// An opaque value's runtime kind does not match the requested type.
    TypeMismatch,
    /// A numeric result is non-finite, or an index falls outside its bound.
    OutOfRange,
    /// A string failed the strict date/time literal grammar.
    DateParse,
    /// A value of the wrong shape for an operation (e.g. non-array where an
    /// array is required).
    InvalidUsage,
    /// Name resolution failed; surfaced as a binder diagnostic, not a crash.
    UnresolvedIdentifier,
    /// An unreachable code path was reached. Never user-facing.
    InternalContract,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::TypeMismatch => "type-mismatch",
            ErrorKind::OutOfRange => "out-of-range",
            ErrorKind::DateParse => "date-parse",
            ErrorKind::InvalidUsage => "invalid-usage",
            ErrorKind::UnresolvedIdentifier => "unresolved-identifier",
            ErrorKind::InternalContract => "internal-contract-violation",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error-diagnostic value: what went wrong, where, and which kind.
///
/// These are ordinary values in the runtime; any operation consuming one
/// yields another error (the `Error` type is absorbing).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorValue {
    pub kind: ErrorKind,
    pub message: String,
    pub span: Span,
}

impl ErrorValue {
    pub fn new(kind: ErrorKind, message: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            message: message.into(),
            span,
        }
    }

    pub fn type_mismatch(message: impl Into<String>, span: Span) -> Self {
        Self::new(ErrorKind::TypeMismatch, message, span)
    }

    pub fn out_of_range(message: impl Into<String>, span: Span) -> Self {
        Self::new(ErrorKind::OutOfRange, message, span)
    }

    pub fn date_parse(message: impl Into<String>, span: Span) -> Self {
        Self::new(ErrorKind::DateParse, message, span)
    }

    pub fn invalid_usage(message: impl Into<String>, span: Span) -> Self {
        Self::new(ErrorKind::InvalidUsage, message, span)
    }

    pub fn unresolved(name: &str, span: Span) -> Self {
        Self::new(
            ErrorKind::UnresolvedIdentifier,
            format!("name '{name}' is not defined"),
            span,
        )
    }

    /// Marks a code path that supported language features must never reach.
    ///
    /// Trips a debug assertion so defects are caught in tests; in release the
    /// violation still surfaces as a (non-user-facing) error value instead of
    /// a silent wrong result.
    pub fn internal(message: impl Into<String>, span: Span) -> Self {
        let message = message.into();
        debug_assert!(false, "internal contract violation: {message}");
        Self::new(ErrorKind::InternalContract, message, span)
    }
}

impl fmt::Display for ErrorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} (at {})", self.kind, self.message, self.span)
    }
}

impl std::error::Error for ErrorValue {}
