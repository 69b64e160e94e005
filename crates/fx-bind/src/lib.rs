#![forbid(unsafe_code)]
#![deny(unreachable_patterns)]

//! `fx-bind` is the semantic core of the fx formula language: it resolves
//! identifiers against a layered, versioned symbol environment, determines
//! the static type of every expression (operator overloads, implicit
//! coercions, table/record shape propagation), and bridges schema-less host
//! data into the typed value system.
//!
//! The crate deliberately excludes lexing/parsing (it consumes already-parsed
//! [`Expr`] nodes) and the general-purpose evaluator; both are external
//! collaborators that exchange [`fx_model`] values and diagnostics with this
//! core.
//!
//! ## Concurrency
//!
//! Scopes and enum stores are built single-threaded during configuration and
//! then shared read-only across concurrent binding/evaluation sessions; see
//! [`SymbolTable`] for the builder/view split. The only parallel fan-out in
//! the core is the per-row transform over schema-less arrays
//! ([`untyped::for_each_row`]), which runs on a crate-local Rayon pool when
//! the `parallel` feature is enabled.

mod ast;
pub mod binder;
pub mod binding;
mod parallel;
pub mod untyped;

pub use ast::{BinaryOp, Expr, ExprKind, Literal, UnaryOp};
pub use binder::{BindResult, Binder};
pub use binding::{
    Binding, BindingKind, DisplayNameProvider, EnumBuilder, EnumStore, EnvironmentSymbol,
    EnvironmentSymbolKind, EnvironmentSymbols, FunctionSignature, Scope, ScopeResolver,
    SymbolError, SymbolTable, TablePropagation,
};
pub use untyped::JsonValue;
