//! Layered name resolution: bindings, the scope chain, and the external
//! symbol layers (environment entities, display-name translation, the
//! derived-scope override hook).

mod enum_store;
mod scope;

pub use enum_store::{EnumBuilder, EnumStore};
pub use scope::{Scope, SymbolTable};

use fx_model::{DType, RecordShape};

/// The resolved meaning of a name. Immutable once produced by a lookup;
/// lookups build bindings transiently and the environment caches nothing
/// (callers may cache keyed on [`Scope::version_hash`]).
#[derive(Clone, Debug, PartialEq)]
pub struct Binding {
    pub name: String,
    pub kind: BindingKind,
    pub dtype: DType,
    /// Originating path through the environment (e.g. a data-source path for
    /// external entities). Empty for plain locals.
    pub path: Vec<String>,
    /// Position of the entity within its originating store (insertion order
    /// for locals, provider order for environment entities, snapshot order
    /// for enums).
    pub entity_index: usize,
    /// User-facing label, when it differs from the logical name.
    pub display_name: Option<String>,
}

/// What a name denotes.
///
/// The variant set is closed on purpose: resolver code matches it
/// exhaustively with no wildcard arm, so adding a kind is a compile-checked
/// change everywhere a binding is consumed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BindingKind {
    Variable,
    Function,
    OptionSet,
    Enum,
}

impl Binding {
    pub(crate) fn variable(name: impl Into<String>, dtype: DType, entity_index: usize) -> Self {
        Self {
            name: name.into(),
            kind: BindingKind::Variable,
            dtype,
            path: Vec::new(),
            entity_index,
            display_name: None,
        }
    }
}

/// Duplicate-name and related failures from the mutable builder.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SymbolError {
    #[error("name '{0}' is already defined in this scope")]
    Duplicate(String),
}

/// An external entity exposed through the host's environment-symbols store.
#[derive(Clone, Debug, PartialEq)]
pub struct EnvironmentSymbol {
    /// Stable logical name (the store key).
    pub name: String,
    pub kind: EnvironmentSymbolKind,
    /// Position within the provider's entity collection.
    pub index: usize,
}

/// Kind of an environment entity.
///
/// Closed set; the resolver matches it exhaustively so an unsupported kind is
/// a compile error rather than a silent wrong binding.
#[derive(Clone, Debug, PartialEq)]
pub enum EnvironmentSymbolKind {
    /// An option set, exposing its semantic type.
    OptionSet(DType),
    /// A tabular data source with the given row shape.
    DataSource(RecordShape),
}

/// Host-provided store of external entities (option sets, data sources).
///
/// Keys are logical names; display-name translation happens in the resolver
/// via [`DisplayNameProvider`], not here.
pub trait EnvironmentSymbols: Send + Sync {
    fn entity(&self, logical_name: &str) -> Option<EnvironmentSymbol>;
}

/// Bidirectional display-name ↔ logical-name translation consumed during
/// name resolution.
pub trait DisplayNameProvider: Send + Sync {
    fn logical_name(&self, display_name: &str) -> Option<String>;
    fn display_name(&self, logical_name: &str) -> Option<String>;
}

/// Override hook for specialized scopes (e.g. one backed by a record type).
///
/// Consulted before any other resolution layer; a `Some` return wins
/// immediately.
pub trait ScopeResolver: Send + Sync {
    fn lookup_override(&self, name: &str) -> Option<Binding>;
}

/// How a function's result type is derived from its arguments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TablePropagation {
    /// Result is the declared return type; no table propagation.
    None,
    /// Filter/count-style: the result table keeps the row type of the table
    /// argument at `arg` unchanged.
    PreserveRows { arg: usize },
    /// Scalar transform lifted over a single extracted column: the result is
    /// a single-column table of the declared (scalar) return type, keeping
    /// the source column's name when it has one.
    LiftColumn { arg: usize },
    /// Aggregate/diff over multiple table arguments, broadcast positionally;
    /// the result column takes the canonical label unless the inputs agree on
    /// a natural name.
    Broadcast,
}

/// A registered function: namespace, invariant and optional localized name,
/// parameter/return types, and the result-shape rule the binder applies.
#[derive(Clone, Debug, PartialEq)]
pub struct FunctionSignature {
    pub namespace: String,
    pub name: String,
    pub localized_name: Option<String>,
    pub param_types: Vec<DType>,
    pub return_type: DType,
    pub propagation: TablePropagation,
}

impl FunctionSignature {
    pub fn new(
        namespace: impl Into<String>,
        name: impl Into<String>,
        param_types: Vec<DType>,
        return_type: DType,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            localized_name: None,
            param_types,
            return_type,
            propagation: TablePropagation::None,
        }
    }

    pub fn with_localized_name(mut self, localized: impl Into<String>) -> Self {
        self.localized_name = Some(localized.into());
        self
    }

    pub fn with_propagation(mut self, propagation: TablePropagation) -> Self {
        self.propagation = propagation;
        self
    }

    /// Name match used by [`Scope::lookup_functions`]: the locale-invariant
    /// name, or the localized one (falling back to the invariant name when no
    /// localization was registered).
    pub(crate) fn matches_name(&self, name: &str, locale_invariant: bool) -> bool {
        if locale_invariant {
            self.name == name
        } else {
            self.localized_name.as_deref().unwrap_or(&self.name) == name
        }
    }
}
