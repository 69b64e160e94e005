//! Pure type algebra: operator overload resolution, conditional unification,
//! and table/record shape propagation.
//!
//! Everything here is a function of operand types only. `Error` is absorbing:
//! an `Error` operand yields `Error` from every rule.

use fx_model::{DType, RecordShape, RESULT_COLUMN, VALUE_COLUMN};

/// Booleans participate in arithmetic through the implicit widening to
/// `Number`.
fn is_numeric(ty: &DType) -> bool {
    matches!(ty, DType::Number | DType::Boolean)
}

/// Result type of `left + right`.
///
/// `+` over date kinds is commutative only with `Number`; the remaining
/// date-kind pairings are directional (`DateTime + Time` is a shift,
/// `Time + DateTime` has no overload).
pub fn add_result(left: &DType, right: &DType) -> DType {
    if left.is_error() || right.is_error() {
        return DType::Error;
    }
    match (left, right) {
        (l, r) if is_numeric(l) && is_numeric(r) => DType::Number,
        (DType::DateTime, DType::Number) | (DType::Number, DType::DateTime) => DType::DateTime,
        (DType::DateTime, DType::Time) => DType::DateTime,
        (DType::Date, DType::Number) | (DType::Number, DType::Date) => DType::Date,
        (DType::Date, DType::Time) => DType::DateTime,
        (DType::Time, DType::Date) => DType::DateTime,
        (DType::Time, DType::Number) | (DType::Number, DType::Time) => DType::Time,
        // No overload: DateTime+DateTime, DateTime+Date, Date+Date,
        // Time+Time, Time+DateTime, and every non-scalar pairing.
        _ => DType::Error,
    }
}

/// Result type of `left - right`.
pub fn sub_result(left: &DType, right: &DType) -> DType {
    if left.is_error() || right.is_error() {
        return DType::Error;
    }
    match (left, right) {
        (l, r) if is_numeric(l) && is_numeric(r) => DType::Number,
        // Whole-unit differences.
        (DType::DateTime, DType::DateTime)
        | (DType::DateTime, DType::Date)
        | (DType::Date, DType::DateTime)
        | (DType::Date, DType::Date)
        | (DType::Time, DType::Time) => DType::Number,
        // Shifts by a number of units.
        (DType::DateTime, DType::Number) | (DType::Number, DType::DateTime) => DType::DateTime,
        (DType::Date, DType::Number) | (DType::Number, DType::Date) => DType::Date,
        (DType::Time, DType::Number) | (DType::Number, DType::Time) => DType::Time,
        // No overload: DateTime-Time, Date-Time, Time-DateTime, Time-Date.
        _ => DType::Error,
    }
}

/// Result type of unary negation.
pub fn negate_result(ty: &DType) -> DType {
    match ty {
        ty if is_numeric(ty) => DType::Number,
        DType::Date | DType::Time | DType::DateTime => ty.clone(),
        _ => DType::Error,
    }
}

/// Rank in the scalar coercion lattice `Boolean ⊂ Number ⊂ Text`.
fn lattice_rank(ty: &DType) -> Option<u8> {
    match ty {
        DType::Boolean => Some(0),
        DType::Number => Some(1),
        DType::Text => Some(2),
        _ => None,
    }
}

/// Common type for the value branches of a multi-branch conditional.
///
/// All-equal branches keep their type (tables/records by exact shape
/// equality). Mixed scalar branches widen along the coercion lattice to the
/// widest branch type. Anything else (a table mixed with a scalar, a date
/// mixed with a number) has no common coercion target and yields `Error`.
pub fn unify_branches(branches: &[DType]) -> DType {
    debug_assert!(!branches.is_empty(), "conditional with no value branches");
    let Some(first) = branches.first() else {
        return DType::Error;
    };
    if branches.iter().any(DType::is_error) {
        return DType::Error;
    }
    if branches.iter().all(|b| b == first) {
        return first.clone();
    }
    let mut widest = first.clone();
    let mut widest_rank = match lattice_rank(first) {
        Some(rank) => rank,
        None => return DType::Error,
    };
    for branch in &branches[1..] {
        match lattice_rank(branch) {
            Some(rank) if rank > widest_rank => {
                widest_rank = rank;
                widest = branch.clone();
            }
            Some(_) => {}
            None => return DType::Error,
        }
    }
    widest
}

/// Filter/count-style propagation: the result table keeps the input's row
/// type, unchanged.
pub fn filter_shape(table: &DType) -> DType {
    match table {
        DType::Error => DType::Error,
        DType::Table(shape) => DType::Table(shape.clone()),
        _ => DType::Error,
    }
}

/// A scalar transform lifted over a single extracted column: single-column
/// result table of the scalar output type. The source column's name is
/// preserved when it has one; a bare scalar column gets the canonical
/// placeholder label.
pub fn lift_column(column: &DType, out_scalar: &DType) -> DType {
    match column {
        DType::Error => DType::Error,
        DType::Table(shape) if shape.len() == 1 => {
            let (name, _) = shape.fields().next().unwrap_or((VALUE_COLUMN, out_scalar));
            DType::Table(RecordShape::single_column(name, out_scalar.clone()))
        }
        DType::Table(_) => DType::Error,
        _ => DType::Table(RecordShape::single_column(VALUE_COLUMN, out_scalar.clone())),
    }
}

/// Aggregate/diff over multiple table arguments, broadcast positionally. The
/// result is a single-column table; when every input is a single column and
/// they agree on a name, that name is kept, otherwise the canonical "Result"
/// label is used.
pub fn broadcast_shape(inputs: &[DType], out_scalar: &DType) -> DType {
    if inputs.is_empty() || inputs.iter().any(DType::is_error) {
        return DType::Error;
    }
    let mut shapes = Vec::with_capacity(inputs.len());
    for input in inputs {
        match input {
            DType::Table(shape) => shapes.push(shape),
            _ => return DType::Error,
        }
    }
    // A "natural" name exists only when every input is a single column and
    // they all agree on its name.
    let mut names = shapes.iter().map(|shape| {
        (shape.len() == 1)
            .then(|| shape.fields().next())
            .flatten()
            .map(|(name, _)| name)
    });
    let natural = match names.next().flatten() {
        Some(first) if names.all(|n| n == Some(first)) => Some(first),
        _ => None,
    };
    DType::Table(RecordShape::single_column(
        natural.unwrap_or(RESULT_COLUMN),
        out_scalar.clone(),
    ))
}
