#![forbid(unsafe_code)]
#![deny(unreachable_patterns)]

//! `fx-model` defines the shared value/type model for the fx formula language.
//!
//! The crate is intentionally self-contained so it can be reused by:
//! - the semantic core (name resolution, type binding) in `fx-bind`
//! - the expression evaluator
//! - host/IPC boundaries via `serde` where the types are wire-safe
//!
//! It covers the semantic type grammar ([`DType`]), the closed set of typed
//! runtime values ([`Value`]), error-diagnostic values ([`ErrorValue`]), the
//! strict date/time literal grammar (see [`datetime`]), and the opaque
//! schema-less value interface ([`UntypedValue`]) that the untyped bridge in
//! `fx-bind` implements.

pub mod datetime;
mod error;
mod types;
mod untyped;
mod value;

pub use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
pub use error::{ErrorKind, ErrorValue, Span};
pub use types::{
    DType, EnumMember, EnumSymbol, OptionSetType, RecordShape, RESULT_COLUMN, VALUE_COLUMN,
};
pub use untyped::{UntypedKind, UntypedRef, UntypedValue};
pub use uuid::Uuid;
pub use value::{parse_guid, Record, Table, Value};
