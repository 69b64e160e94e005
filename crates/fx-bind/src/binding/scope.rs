//! The scope chain: a parent-linked tree of name→binding layers with a
//! recomputed-on-demand version hash for mutation detection.
//!
//! Two cooperating types implement the builder/view split:
//! - [`SymbolTable`] holds the mutation capability (add variables/functions/
//!   enums, attach external layers). Every successful mutation bumps an
//!   atomic version counter.
//! - [`Scope`] is the shared read-only view handed to binding/evaluation
//!   sessions. It aliases the builder's node, so mutations made during the
//!   configuration window remain observable through [`Scope::version_hash`];
//!   once a scope is published to concurrent readers the caller must stop
//!   mutating. The interior locks exist for soundness, not as a
//!   synchronization protocol.
//!
//! Parent references are shared and never exclusive; composition flattens to
//! a list (never a nested chain) so version-hash combination stays finite and
//! deterministic. Cycles are unrepresentable: a node's parent/members are
//! fixed at construction.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

use ahash::AHashMap;
use smallvec::SmallVec;

use fx_model::{DType, EnumSymbol, RecordShape};

use super::{
    Binding, BindingKind, DisplayNameProvider, EnumBuilder, EnumStore, EnvironmentSymbol,
    EnvironmentSymbolKind, EnvironmentSymbols, FunctionSignature, ScopeResolver, SymbolError,
};

const HASH_SEED: u64 = 0xcbf2_9ce4_8422_2325;
const HASH_PRIME: u64 = 0x0000_0100_0000_01b3;

/// FNV-1a-style word combine: cheap, order-sensitive, and it changes whenever
/// any combined counter changes.
fn combine(hash: u64, value: u64) -> u64 {
    (hash ^ value).wrapping_mul(HASH_PRIME)
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

struct ScopeNode {
    parent: Option<Scope>,
    /// Non-empty only for composed scopes, which carry no layers of their
    /// own: lookups walk the members in order, first match wins.
    composed: SmallVec<[Scope; 4]>,
    locals: RwLock<AHashMap<String, Binding>>,
    functions: RwLock<Vec<Arc<FunctionSignature>>>,
    enums: RwLock<EnumStore>,
    symbols: RwLock<Option<Arc<dyn EnvironmentSymbols>>>,
    display_names: RwLock<Option<Arc<dyn DisplayNameProvider>>>,
    hook: RwLock<Option<Arc<dyn ScopeResolver>>>,
    version: AtomicU64,
}

impl ScopeNode {
    fn empty(parent: Option<Scope>, composed: SmallVec<[Scope; 4]>) -> Self {
        Self {
            parent,
            composed,
            locals: RwLock::new(AHashMap::new()),
            functions: RwLock::new(Vec::new()),
            enums: RwLock::new(EnumStore::default()),
            symbols: RwLock::new(None),
            display_names: RwLock::new(None),
            hook: RwLock::new(None),
            version: AtomicU64::new(0),
        }
    }

    fn bump_version(&self) {
        self.version.fetch_add(1, Ordering::AcqRel);
    }
}

/// Shared read-only view of a scope chain. Cheap to clone; safe to read from
/// any number of concurrent sessions once configuration is finished.
#[derive(Clone)]
pub struct Scope {
    node: Arc<ScopeNode>,
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("version_hash", &self.version_hash())
            .field("composed", &self.node.composed.len())
            .finish()
    }
}

impl Scope {
    /// A scope with one `Variable` binding per field of the record shape.
    pub fn from_shape(shape: &RecordShape) -> Scope {
        let mut table = SymbolTable::new();
        for (name, dtype) in shape.fields() {
            if table.add_variable(name, dtype.clone()).is_err() {
                // Field names are unique within a RecordShape.
                debug_assert!(false, "duplicate field '{name}' in record shape");
            }
        }
        table.scope()
    }

    /// A read-only scope that resolves against `scopes` in argument order,
    /// first match wins. Composing an already-composed scope splices its
    /// members rather than nesting, so the flattened list stays a list.
    pub fn compose<I: IntoIterator<Item = Scope>>(scopes: I) -> Scope {
        let mut members: SmallVec<[Scope; 4]> = SmallVec::new();
        for scope in scopes {
            if scope.node.composed.is_empty() {
                members.push(scope);
            } else {
                members.extend(scope.node.composed.iter().cloned());
            }
        }
        Scope {
            node: Arc::new(ScopeNode::empty(None, members)),
        }
    }

    /// Resolves a name to its binding.
    ///
    /// Per scope the order is strict: override hook, then local bindings,
    /// then the environment-symbols store (through display-name translation),
    /// then a linear scan of the enum snapshot by invariant name. A local
    /// miss falls back to the parent chain, so child-local names shadow
    /// ancestors. An overall miss is not an error; the caller surfaces it as
    /// an unresolved-identifier diagnostic.
    pub fn lookup(&self, name: &str) -> Option<Binding> {
        if !self.node.composed.is_empty() {
            return self.node.composed.iter().find_map(|s| s.lookup(name));
        }
        if let Some(binding) = self.lookup_here(name) {
            return Some(binding);
        }
        match &self.node.parent {
            Some(parent) => parent.lookup(name),
            None => {
                log::trace!("unresolved identifier '{name}'");
                None
            }
        }
    }

    fn lookup_here(&self, name: &str) -> Option<Binding> {
        // 1. Derived-scope override hook.
        let hook = read(&self.node.hook).clone();
        if let Some(hook) = hook {
            if let Some(binding) = hook.lookup_override(name) {
                return Some(binding);
            }
        }
        // 2. Local bindings.
        if let Some(binding) = read(&self.node.locals).get(name) {
            return Some(binding.clone());
        }
        // 3. Environment symbols, via display/logical translation.
        if let Some(binding) = self.lookup_environment(name) {
            return Some(binding);
        }
        // 4. Enum snapshot, scanned by invariant name.
        let snapshot = read(&self.node.enums).snapshot();
        snapshot
            .iter()
            .enumerate()
            .find(|(_, sym)| sym.name == name)
            .map(|(index, sym)| Binding {
                name: sym.name.clone(),
                kind: BindingKind::Enum,
                dtype: DType::Enum(Arc::clone(sym)),
                path: Vec::new(),
                entity_index: index,
                display_name: None,
            })
    }

    fn lookup_environment(&self, name: &str) -> Option<Binding> {
        let symbols = read(&self.node.symbols).clone()?;
        let display = read(&self.node.display_names).clone();
        if let Some(provider) = &display {
            if let Some(logical) = provider.logical_name(name) {
                // The queried name is a display name: resolve by the
                // translated logical name and report the display name on the
                // binding.
                if let Some(entity) = symbols.entity(&logical) {
                    return Some(entity_binding(entity, Some(name.to_string())));
                }
            }
        }
        // The queried name may be a logical name directly; attach its display
        // name, if any, alongside.
        let entity = symbols.entity(name)?;
        let display_name = display.as_ref().and_then(|p| p.display_name(name));
        Some(entity_binding(entity, display_name))
    }

    /// Registered functions matching the namespace exactly and the
    /// locale-invariant or localized name, selected by the flag. Walks the
    /// chain (composed members in order, then parents), own matches first.
    pub fn lookup_functions(
        &self,
        namespace: &str,
        name: &str,
        locale_invariant: bool,
    ) -> Vec<Arc<FunctionSignature>> {
        let mut out = Vec::new();
        self.collect_functions(namespace, name, locale_invariant, &mut out);
        out
    }

    fn collect_functions(
        &self,
        namespace: &str,
        name: &str,
        locale_invariant: bool,
        out: &mut Vec<Arc<FunctionSignature>>,
    ) {
        if !self.node.composed.is_empty() {
            for member in &self.node.composed {
                member.collect_functions(namespace, name, locale_invariant, out);
            }
            return;
        }
        out.extend(
            read(&self.node.functions)
                .iter()
                .filter(|sig| sig.namespace == namespace && sig.matches_name(name, locale_invariant))
                .cloned(),
        );
        if let Some(parent) = &self.node.parent {
            parent.collect_functions(namespace, name, locale_invariant, out);
        }
    }

    /// Fingerprint of this scope and everything it resolves through: its own
    /// counter combined with the recursively combined hashes of its parent
    /// and composed members.
    ///
    /// Recomputed on every call, never cached, so any ancestor mutation is
    /// visible immediately without explicit propagation. Callers use it as an
    /// invalidation key for cached bind results.
    pub fn version_hash(&self) -> u64 {
        let mut hash = combine(HASH_SEED, self.node.version.load(Ordering::Acquire));
        if let Some(parent) = &self.node.parent {
            hash = combine(hash, parent.version_hash());
        }
        for member in &self.node.composed {
            hash = combine(hash, member.version_hash());
        }
        hash
    }

    /// The enum snapshot visible from this scope (own store only; composed
    /// scopes have none).
    pub fn enum_snapshot(&self) -> Arc<[Arc<EnumSymbol>]> {
        read(&self.node.enums).snapshot()
    }
}

/// Mutable builder for a scope. All mutation goes through here; the read-only
/// [`Scope`] views it publishes share the same underlying node, so version
/// changes stay observable during the configuration window.
pub struct SymbolTable {
    node: Arc<ScopeNode>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    pub fn new() -> Self {
        Self {
            node: Arc::new(ScopeNode::empty(None, SmallVec::new())),
        }
    }

    pub fn with_parent(parent: Scope) -> Self {
        Self {
            node: Arc::new(ScopeNode::empty(Some(parent), SmallVec::new())),
        }
    }

    /// Publishes the shared read-only view.
    pub fn scope(&self) -> Scope {
        Scope {
            node: Arc::clone(&self.node),
        }
    }

    pub fn version_hash(&self) -> u64 {
        self.scope().version_hash()
    }

    /// Adds a variable binding; fails if the name already exists locally.
    pub fn add_variable(&mut self, name: &str, dtype: DType) -> Result<(), SymbolError> {
        let mut locals = write(&self.node.locals);
        if locals.contains_key(name) {
            return Err(SymbolError::Duplicate(name.to_string()));
        }
        let entity_index = locals.len();
        locals.insert(
            name.to_string(),
            Binding::variable(name, dtype, entity_index),
        );
        drop(locals);
        self.node.bump_version();
        Ok(())
    }

    /// Registers a function. A signature whose return or parameter types
    /// reference enum types also registers those enums with this scope's
    /// enum store.
    pub fn add_function(&mut self, sig: FunctionSignature) {
        let mut referenced = Vec::new();
        collect_enums(&sig.return_type, &mut referenced);
        for param in &sig.param_types {
            collect_enums(param, &mut referenced);
        }
        if !referenced.is_empty() {
            let enums = read(&self.node.enums);
            for sym in referenced {
                enums.register(sym);
            }
        }
        write(&self.node.functions).push(Arc::new(sig));
        self.node.bump_version();
    }

    /// Registers an enum with this scope's enum store.
    pub fn add_enum(&mut self, symbol: Arc<EnumSymbol>) {
        read(&self.node.enums).register(symbol);
        self.node.bump_version();
    }

    /// Swaps the enum store's builder reference (invalidating its snapshot
    /// cache when the reference actually changes).
    pub fn replace_enum_builder(&mut self, builder: Arc<Mutex<EnumBuilder>>) {
        write(&self.node.enums).replace_builder(builder);
        self.node.bump_version();
    }

    pub fn set_environment_symbols(&mut self, provider: Arc<dyn EnvironmentSymbols>) {
        *write(&self.node.symbols) = Some(provider);
        self.node.bump_version();
    }

    pub fn set_display_names(&mut self, provider: Arc<dyn DisplayNameProvider>) {
        *write(&self.node.display_names) = Some(provider);
        self.node.bump_version();
    }

    pub fn set_resolver_hook(&mut self, hook: Arc<dyn ScopeResolver>) {
        *write(&self.node.hook) = Some(hook);
        self.node.bump_version();
    }
}

/// Builds the binding for an environment entity.
///
/// Exhaustive on purpose: adding an entity kind must be handled here
/// explicitly (compile-checked) instead of falling through to a wrong binding.
fn entity_binding(entity: EnvironmentSymbol, display_name: Option<String>) -> Binding {
    let (kind, dtype) = match entity.kind {
        EnvironmentSymbolKind::OptionSet(dtype) => (BindingKind::OptionSet, dtype),
        EnvironmentSymbolKind::DataSource(shape) => (BindingKind::Variable, DType::Table(shape)),
    };
    Binding {
        path: vec!["environment".to_string(), entity.name.clone()],
        name: entity.name,
        kind,
        dtype,
        entity_index: entity.index,
        display_name,
    }
}

/// Collects every enum type referenced by a type, including through table and
/// record shapes.
fn collect_enums(dtype: &DType, out: &mut Vec<Arc<EnumSymbol>>) {
    match dtype {
        DType::Enum(sym) => out.push(Arc::clone(sym)),
        DType::Table(shape) | DType::Record(shape) => {
            for (_, field) in shape.fields() {
                collect_enums(field, out);
            }
        }
        DType::OptionSet(os) => collect_enums(&os.member_type, out),
        DType::Number
        | DType::Text
        | DType::Boolean
        | DType::Date
        | DType::Time
        | DType::DateTime
        | DType::Error
        | DType::Untyped => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fx_model::Value;
    use pretty_assertions::assert_eq;

    #[test]
    fn duplicate_variable_is_rejected() {
        let mut table = SymbolTable::new();
        table.add_variable("x", DType::Number).unwrap();
        assert_eq!(
            table.add_variable("x", DType::Text),
            Err(SymbolError::Duplicate("x".to_string()))
        );
    }

    #[test]
    fn child_shadows_ancestor() {
        let mut root = SymbolTable::new();
        root.add_variable("x", DType::Number).unwrap();
        root.add_variable("y", DType::Text).unwrap();

        let mut child = SymbolTable::with_parent(root.scope());
        child.add_variable("x", DType::Boolean).unwrap();

        let scope = child.scope();
        assert_eq!(scope.lookup("x").unwrap().dtype, DType::Boolean);
        assert_eq!(scope.lookup("y").unwrap().dtype, DType::Text);
        assert_eq!(scope.lookup("z"), None);
    }

    #[test]
    fn root_mutation_changes_every_descendant_hash() {
        let mut root = SymbolTable::new();
        let mid = SymbolTable::with_parent(root.scope());
        let leaf = SymbolTable::with_parent(mid.scope());

        let before_mid = mid.version_hash();
        let before_leaf = leaf.version_hash();

        root.add_variable("x", DType::Number).unwrap();

        assert_ne!(mid.version_hash(), before_mid);
        assert_ne!(leaf.version_hash(), before_leaf);
        // Recomputed on demand: repeated queries agree until the next change.
        assert_eq!(leaf.version_hash(), leaf.version_hash());
    }

    #[test]
    fn composed_hash_tracks_member_mutations() {
        let mut a = SymbolTable::new();
        let b = SymbolTable::new();
        let composed = Scope::compose([a.scope(), b.scope()]);

        let before = composed.version_hash();
        a.add_variable("x", DType::Number).unwrap();
        assert_ne!(composed.version_hash(), before);
    }

    #[test]
    fn compose_flattens_nested_composition() {
        let mut a = SymbolTable::new();
        a.add_variable("a", DType::Number).unwrap();
        let mut b = SymbolTable::new();
        b.add_variable("b", DType::Number).unwrap();
        let mut c = SymbolTable::new();
        c.add_variable("c", DType::Number).unwrap();

        let inner = Scope::compose([a.scope(), b.scope()]);
        let outer = Scope::compose([inner, c.scope()]);

        assert!(outer.lookup("a").is_some());
        assert!(outer.lookup("b").is_some());
        assert!(outer.lookup("c").is_some());
    }

    #[test]
    fn function_registration_registers_referenced_enums() {
        let color = Arc::new(
            EnumSymbol::new("Color", DType::Number).with_member("red", "Red", Value::Number(1.0)),
        );
        let mut table = SymbolTable::new();
        table.add_function(FunctionSignature::new(
            "",
            "ColorOf",
            vec![DType::Text],
            DType::Enum(Arc::clone(&color)),
        ));

        let binding = table.scope().lookup("Color").expect("enum registered");
        assert_eq!(binding.kind, BindingKind::Enum);
        assert_eq!(binding.dtype, DType::Enum(color));
    }
}
