//! Array-shaped bridge operations: indexing, array-to-table conversion, and
//! the concurrent per-row transform.

use fx_model::{
    ErrorValue, Record, Span, Table, UntypedKind, UntypedValue, Value, VALUE_COLUMN,
};

fn require_array(value: &dyn UntypedValue, span: Span) -> Option<Value> {
    if value.kind() == UntypedKind::Array {
        return None;
    }
    Some(Value::Error(ErrorValue::invalid_usage(
        format!("an array is required, got a {} value", value.kind()),
        span,
    )))
}

/// The cell a source element contributes: null and missing elements map to
/// `Blank`, everything else stays an opaque value of the same bridge type.
fn element_cell(value: &dyn UntypedValue, index: usize) -> Value {
    match value.index(index) {
        Some(element) if element.kind() != UntypedKind::Null => Value::Untyped(element),
        _ => Value::Blank,
    }
}

/// 1-based element access.
///
/// Both bounds are checked here: zero and negative indexes are out of range,
/// as is anything past the last element.
pub fn index_value(value: &dyn UntypedValue, index: i64, span: Span) -> Value {
    if let Some(miss) = require_array(value, span) {
        return miss;
    }
    let len = value.len().unwrap_or(0);
    if index < 1 || (index - 1) as usize >= len {
        return Value::Error(ErrorValue::out_of_range(
            format!("index {index} is outside 1..={len}"),
            span,
        ));
    }
    element_cell(value, (index - 1) as usize)
}

/// Converts an array-kind value to a table with one row per element, each row
/// a single-field record under the canonical column label.
pub fn to_table(value: &dyn UntypedValue, span: Span) -> Value {
    if let Some(miss) = require_array(value, span) {
        return miss;
    }
    let len = value.len().unwrap_or(0);
    let rows = (0..len)
        .map(|i| Record::single(VALUE_COLUMN, element_cell(value, i)))
        .collect();
    Value::Table(Table::new(rows))
}

/// Applies `transform` to every element of an array-kind value and assembles
/// the results as a table, one row per source element, in original element
/// order.
///
/// Each element is wrapped as a single-field record (exactly as [`to_table`]
/// does) before the transform sees it. Rows are dispatched as independent
/// tasks on the crate-local thread pool, all rows before any result is
/// consumed, and the single join blocks only this caller; the indexed
/// reassembly makes the output order independent of completion order.
///
/// A row whose transform fails keeps its slot and carries the failure as an
/// error value in that row; sibling rows are never dropped, reordered, or
/// aborted.
pub fn for_each_row<F>(value: &dyn UntypedValue, span: Span, transform: F) -> Value
where
    F: Fn(usize, &Record) -> Value + Send + Sync,
{
    if let Some(miss) = require_array(value, span) {
        return miss;
    }
    let len = value.len().unwrap_or(0);
    let rows: Vec<Record> = (0..len)
        .map(|i| Record::single(VALUE_COLUMN, element_cell(value, i)))
        .collect();
    log::trace!("per-row transform over {len} rows");
    let results = map_rows(&rows, &transform);
    Value::Table(Table::new(
        results
            .into_iter()
            .map(|result| Record::single(VALUE_COLUMN, result))
            .collect(),
    ))
}

/// Batches below this size run sequentially; the pool dispatch costs more
/// than it saves.
#[cfg(all(feature = "parallel", not(target_arch = "wasm32")))]
const PAR_ROW_MIN: usize = 16;

#[cfg(all(feature = "parallel", not(target_arch = "wasm32")))]
fn map_rows<F>(rows: &[Record], transform: &F) -> Vec<Value>
where
    F: Fn(usize, &Record) -> Value + Send + Sync,
{
    use rayon::prelude::*;

    if rows.len() < PAR_ROW_MIN {
        return map_rows_sequential(rows, transform);
    }
    match crate::parallel::row_pool() {
        Some(pool) => pool.install(|| {
            rows.par_iter()
                .enumerate()
                .map(|(i, row)| transform(i, row))
                .collect()
        }),
        None => map_rows_sequential(rows, transform),
    }
}

#[cfg(not(all(feature = "parallel", not(target_arch = "wasm32"))))]
fn map_rows<F>(rows: &[Record], transform: &F) -> Vec<Value>
where
    F: Fn(usize, &Record) -> Value + Send + Sync,
{
    map_rows_sequential(rows, transform)
}

fn map_rows_sequential<F>(rows: &[Record], transform: &F) -> Vec<Value>
where
    F: Fn(usize, &Record) -> Value + Send + Sync,
{
    rows.iter()
        .enumerate()
        .map(|(i, row)| transform(i, row))
        .collect()
}
