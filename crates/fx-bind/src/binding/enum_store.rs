//! Registry of named enumeration types.
//!
//! Registrations accumulate in a mutable [`EnumBuilder`]; consumers read an
//! immutable snapshot that is materialized lazily on first access and cached.
//! The cache is invalidated only by replacing the builder *reference*; late
//! mutations of an already-snapshotted builder are deliberately invisible, so
//! a published snapshot stays stable for the lifetime of its scope.

use std::sync::{Arc, Mutex, OnceLock};

use fx_model::EnumSymbol;

/// Accumulates enum registrations. Duplicate invariant names are ignored
/// (first registration wins).
#[derive(Debug, Default)]
pub struct EnumBuilder {
    symbols: Vec<Arc<EnumSymbol>>,
}

impl EnumBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, symbol: Arc<EnumSymbol>) {
        if !self.symbols.iter().any(|s| s.name == symbol.name) {
            self.symbols.push(symbol);
        }
    }

    pub fn with_symbol(mut self, symbol: EnumSymbol) -> Self {
        self.add(Arc::new(symbol));
        self
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    fn materialize(&self) -> Arc<[Arc<EnumSymbol>]> {
        self.symbols.clone().into()
    }
}

/// Snapshot-caching view over a shared [`EnumBuilder`].
#[derive(Debug)]
pub struct EnumStore {
    builder: Arc<Mutex<EnumBuilder>>,
    snapshot: OnceLock<Arc<[Arc<EnumSymbol>]>>,
}

impl Default for EnumStore {
    fn default() -> Self {
        Self::new(Arc::new(Mutex::new(EnumBuilder::new())))
    }
}

impl EnumStore {
    pub fn new(builder: Arc<Mutex<EnumBuilder>>) -> Self {
        Self {
            builder,
            snapshot: OnceLock::new(),
        }
    }

    /// The shared builder behind this store.
    pub fn builder(&self) -> &Arc<Mutex<EnumBuilder>> {
        &self.builder
    }

    /// Registers a symbol with the underlying builder.
    ///
    /// Invisible to any snapshot already taken; see the module docs.
    pub fn register(&self, symbol: Arc<EnumSymbol>) {
        self.builder
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .add(symbol);
    }

    /// Immutable snapshot of the registered enums, materialized on first call
    /// and identical (same backing allocation) on every call thereafter.
    pub fn snapshot(&self) -> Arc<[Arc<EnumSymbol>]> {
        self.snapshot
            .get_or_init(|| {
                self.builder
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner())
                    .materialize()
            })
            .clone()
    }

    /// Swaps in a new builder, dropping the cached snapshot, but only when
    /// the reference actually changes; re-setting the same builder keeps the
    /// existing snapshot.
    pub fn replace_builder(&mut self, builder: Arc<Mutex<EnumBuilder>>) {
        if !Arc::ptr_eq(&self.builder, &builder) {
            self.builder = builder;
            self.snapshot = OnceLock::new();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fx_model::{DType, Value};
    use pretty_assertions::assert_eq;

    fn color() -> EnumSymbol {
        EnumSymbol::new("Color", DType::Number).with_member("red", "Red", Value::Number(1.0))
    }

    #[test]
    fn snapshot_is_stable_across_calls_and_late_mutation() {
        let builder = Arc::new(Mutex::new(EnumBuilder::new().with_symbol(color())));
        let store = EnumStore::new(Arc::clone(&builder));

        let first = store.snapshot();
        assert_eq!(first.len(), 1);

        // A mutation after the snapshot does not refresh the cache.
        builder
            .lock()
            .unwrap()
            .add(Arc::new(EnumSymbol::new("Align", DType::Text)));
        let second = store.snapshot();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.len(), 1);
    }

    #[test]
    fn replacing_the_builder_reference_invalidates_the_snapshot() {
        let mut store = EnumStore::default();
        assert_eq!(store.snapshot().len(), 0);

        let replacement = Arc::new(Mutex::new(EnumBuilder::new().with_symbol(color())));
        store.replace_builder(replacement);
        let snap = store.snapshot();
        assert_eq!(snap.len(), 1);
        assert_eq!(snap[0].name, "Color");
    }

    #[test]
    fn resetting_the_same_builder_keeps_the_snapshot() {
        let builder = Arc::new(Mutex::new(EnumBuilder::new().with_symbol(color())));
        let mut store = EnumStore::new(Arc::clone(&builder));
        let first = store.snapshot();
        store.replace_builder(builder);
        assert!(Arc::ptr_eq(&first, &store.snapshot()));
    }

    #[test]
    fn duplicate_registration_keeps_first() {
        let mut builder = EnumBuilder::new();
        builder.add(Arc::new(color()));
        builder.add(Arc::new(EnumSymbol::new("Color", DType::Text)));
        assert_eq!(builder.len(), 1);
        assert_eq!(builder.materialize()[0].member_type, DType::Number);
    }
}
