use std::sync::Arc;

use fx_bind::{
    Binding, BindingKind, DisplayNameProvider, EnvironmentSymbol, EnvironmentSymbolKind,
    EnvironmentSymbols, FunctionSignature, Scope, ScopeResolver, SymbolTable,
};
use fx_model::{DType, EnumSymbol, RecordShape, Value};
use pretty_assertions::assert_eq;

struct StaticSymbols(Vec<EnvironmentSymbol>);

impl EnvironmentSymbols for StaticSymbols {
    fn entity(&self, logical_name: &str) -> Option<EnvironmentSymbol> {
        self.0.iter().find(|e| e.name == logical_name).cloned()
    }
}

struct StaticDisplay(Vec<(&'static str, &'static str)>);

impl DisplayNameProvider for StaticDisplay {
    fn logical_name(&self, display_name: &str) -> Option<String> {
        self.0
            .iter()
            .find_map(|(logical, display)| (*display == display_name).then(|| logical.to_string()))
    }

    fn display_name(&self, logical_name: &str) -> Option<String> {
        self.0
            .iter()
            .find_map(|(logical, display)| (*logical == logical_name).then(|| display.to_string()))
    }
}

struct FixedHook(Binding);

impl ScopeResolver for FixedHook {
    fn lookup_override(&self, name: &str) -> Option<Binding> {
        (name == self.0.name).then(|| self.0.clone())
    }
}

fn option_set(name: &str, index: usize) -> EnvironmentSymbol {
    EnvironmentSymbol {
        name: name.to_string(),
        kind: EnvironmentSymbolKind::OptionSet(DType::Number),
        index,
    }
}

/// A name present in every layer must resolve via the earliest one, layer by
/// layer: hook, then locals, then environment symbols, then the enum scan.
#[test]
fn resolution_order_is_hook_locals_environment_enums() {
    let name = "Status";

    let mut table = SymbolTable::new();
    table.add_variable(name, DType::Text).unwrap();
    table.set_environment_symbols(Arc::new(StaticSymbols(vec![option_set(name, 0)])));
    table.add_enum(Arc::new(EnumSymbol::new(name, DType::Number)));

    // All four layers populated: the hook wins.
    let hook_binding = Binding {
        name: name.to_string(),
        kind: BindingKind::Variable,
        dtype: DType::Boolean,
        path: Vec::new(),
        entity_index: 0,
        display_name: None,
    };
    table.set_resolver_hook(Arc::new(FixedHook(hook_binding.clone())));
    assert_eq!(table.scope().lookup(name), Some(hook_binding));

    // Without the hook: locals win over environment symbols and enums.
    let mut table = SymbolTable::new();
    table.add_variable(name, DType::Text).unwrap();
    table.set_environment_symbols(Arc::new(StaticSymbols(vec![option_set(name, 0)])));
    table.add_enum(Arc::new(EnumSymbol::new(name, DType::Number)));
    let binding = table.scope().lookup(name).unwrap();
    assert_eq!(binding.kind, BindingKind::Variable);
    assert_eq!(binding.dtype, DType::Text);

    // Without locals: environment symbols win over the enum scan.
    let mut table = SymbolTable::new();
    table.set_environment_symbols(Arc::new(StaticSymbols(vec![option_set(name, 0)])));
    table.add_enum(Arc::new(EnumSymbol::new(name, DType::Number)));
    let binding = table.scope().lookup(name).unwrap();
    assert_eq!(binding.kind, BindingKind::OptionSet);

    // Enum store only: resolved via the snapshot scan.
    let mut table = SymbolTable::new();
    table.add_enum(Arc::new(EnumSymbol::new(name, DType::Number)));
    let binding = table.scope().lookup(name).unwrap();
    assert_eq!(binding.kind, BindingKind::Enum);
}

#[test]
fn compose_prefers_the_earlier_scope() {
    let mut a = SymbolTable::new();
    a.add_variable("x", DType::Number).unwrap();
    let mut b = SymbolTable::new();
    b.add_variable("x", DType::Text).unwrap();
    b.add_variable("only_b", DType::Boolean).unwrap();

    let composed = Scope::compose([a.scope(), b.scope()]);
    assert_eq!(composed.lookup("x").unwrap().dtype, DType::Number);
    assert_eq!(composed.lookup("only_b").unwrap().dtype, DType::Boolean);
    assert_eq!(composed.lookup("missing"), None);
}

#[test]
fn display_name_query_resolves_through_the_logical_name() {
    let mut table = SymbolTable::new();
    table.set_environment_symbols(Arc::new(StaticSymbols(vec![option_set("opt_color", 3)])));
    table.set_display_names(Arc::new(StaticDisplay(vec![("opt_color", "Color Choice")])));
    let scope = table.scope();

    // Queried by display name: the store is keyed by the *found* logical
    // name, and the binding reports the display name used for the query.
    let binding = scope.lookup("Color Choice").unwrap();
    assert_eq!(binding.name, "opt_color");
    assert_eq!(binding.kind, BindingKind::OptionSet);
    assert_eq!(binding.entity_index, 3);
    assert_eq!(binding.display_name.as_deref(), Some("Color Choice"));

    // Queried by logical name: the display name is reported alongside.
    let binding = scope.lookup("opt_color").unwrap();
    assert_eq!(binding.name, "opt_color");
    assert_eq!(binding.display_name.as_deref(), Some("Color Choice"));
}

#[test]
fn data_source_entities_bind_as_table_variables() {
    let shape = RecordShape::new()
        .with_field("id", DType::Number)
        .with_field("name", DType::Text);
    let mut table = SymbolTable::new();
    table.set_environment_symbols(Arc::new(StaticSymbols(vec![EnvironmentSymbol {
        name: "Accounts".to_string(),
        kind: EnvironmentSymbolKind::DataSource(shape.clone()),
        index: 0,
    }])));

    let binding = table.scope().lookup("Accounts").unwrap();
    assert_eq!(binding.kind, BindingKind::Variable);
    assert_eq!(binding.dtype, DType::Table(shape));
}

#[test]
fn from_shape_binds_each_field_as_a_variable() {
    let shape = RecordShape::new()
        .with_field("Price", DType::Number)
        .with_field("Name", DType::Text);
    let scope = Scope::from_shape(&shape);

    assert_eq!(scope.lookup("Price").unwrap().dtype, DType::Number);
    assert_eq!(scope.lookup("Name").unwrap().dtype, DType::Text);
    assert_eq!(scope.lookup("Name").unwrap().entity_index, 1);
    assert_eq!(scope.lookup("Other"), None);
}

#[test]
fn lookup_functions_filters_by_namespace_and_name_kind() {
    let mut table = SymbolTable::new();
    table.add_function(
        FunctionSignature::new("Text", "Upper", vec![DType::Text], DType::Text)
            .with_localized_name("Majuscule"),
    );
    table.add_function(FunctionSignature::new(
        "Math",
        "Upper",
        vec![DType::Number],
        DType::Number,
    ));
    let scope = table.scope();

    let hits = scope.lookup_functions("Text", "Upper", true);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].namespace, "Text");

    // Localized lookup by the localized name only.
    assert_eq!(scope.lookup_functions("Text", "Majuscule", false).len(), 1);
    assert_eq!(scope.lookup_functions("Text", "Majuscule", true).len(), 0);

    // Namespace must match exactly.
    assert_eq!(scope.lookup_functions("", "Upper", true).len(), 0);
}

#[test]
fn functions_are_visible_through_the_parent_chain() {
    let mut root = SymbolTable::new();
    root.add_function(FunctionSignature::new(
        "",
        "Sum",
        vec![DType::Number, DType::Number],
        DType::Number,
    ));
    let child = SymbolTable::with_parent(root.scope());
    assert_eq!(child.scope().lookup_functions("", "Sum", true).len(), 1);
}

#[test]
fn published_view_observes_builder_mutations_through_the_hash() {
    let mut table = SymbolTable::new();
    let published = table.scope();
    let before = published.version_hash();

    table.add_variable("late", DType::Number).unwrap();

    assert_ne!(published.version_hash(), before);
    assert_eq!(published.lookup("late").unwrap().dtype, DType::Number);
}

#[test]
fn enum_binding_carries_the_snapshot_symbol() {
    let sym = Arc::new(
        EnumSymbol::new("Align", DType::Text).with_member("al_left", "Left", Value::from("left")),
    );
    let mut table = SymbolTable::new();
    table.add_enum(Arc::clone(&sym));

    let binding = table.scope().lookup("Align").unwrap();
    assert_eq!(binding.kind, BindingKind::Enum);
    assert_eq!(binding.dtype, DType::Enum(sym));
    assert_eq!(binding.entity_index, 0);
}
