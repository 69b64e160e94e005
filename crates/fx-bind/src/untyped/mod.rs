//! The untyped-value bridge: converts opaque, schema-less host data into
//! typed values and table shapes.
//!
//! Every conversion demands that the opaque value's reported runtime kind
//! exactly match the requested type; a miss produces a type-mismatch error
//! *value* (never a panic), which then flows through the value system like
//! any other error. Date/time conversions layer the strict literal grammar of
//! [`fx_model::datetime`] on top of the kind check and fail with the distinct
//! date-parsing kind.

mod transform;

pub use transform::{for_each_row, index_value, to_table};

use std::sync::Arc;

use fx_model::{
    datetime, parse_guid, ErrorValue, Span, UntypedKind, UntypedRef, UntypedValue, Value,
};

/// Schema-less value backed by a parsed JSON document.
///
/// Children handed out by [`UntypedValue::index`]/[`UntypedValue::field`] are
/// detached subtrees wrapped as the same bridge type, so a table conversion
/// or per-row fan-out can move them across threads freely.
#[derive(Clone, Debug)]
pub struct JsonValue {
    value: Arc<serde_json::Value>,
}

impl JsonValue {
    pub fn new(value: serde_json::Value) -> Self {
        Self {
            value: Arc::new(value),
        }
    }

    /// Parses a JSON document into a bridge value.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        Ok(Self::new(serde_json::from_str(text)?))
    }

    /// The shared handle form used inside [`Value::Untyped`].
    pub fn into_ref(self) -> UntypedRef {
        Arc::new(self)
    }
}

impl From<serde_json::Value> for JsonValue {
    fn from(value: serde_json::Value) -> Self {
        Self::new(value)
    }
}

impl UntypedValue for JsonValue {
    fn kind(&self) -> UntypedKind {
        match &*self.value {
            serde_json::Value::Null => UntypedKind::Null,
            serde_json::Value::Bool(_) => UntypedKind::Boolean,
            serde_json::Value::Number(_) => UntypedKind::Number,
            serde_json::Value::String(_) => UntypedKind::Text,
            serde_json::Value::Array(_) => UntypedKind::Array,
            serde_json::Value::Object(_) => UntypedKind::Object,
        }
    }

    fn as_f64(&self) -> Option<f64> {
        self.value.as_f64()
    }

    fn as_str(&self) -> Option<&str> {
        self.value.as_str()
    }

    fn as_bool(&self) -> Option<bool> {
        self.value.as_bool()
    }

    fn len(&self) -> Option<usize> {
        self.value.as_array().map(Vec::len)
    }

    fn index(&self, index: usize) -> Option<UntypedRef> {
        let element = self.value.as_array()?.get(index)?;
        Some(JsonValue::new(element.clone()).into_ref())
    }

    fn field(&self, name: &str) -> Option<UntypedRef> {
        let field = self.value.as_object()?.get(name)?;
        Some(JsonValue::new(field.clone()).into_ref())
    }
}

fn kind_mismatch(expected: UntypedKind, got: UntypedKind, span: Span) -> Value {
    Value::Error(ErrorValue::type_mismatch(
        format!("expected a {expected} value, got {got}"),
        span,
    ))
}

/// Converts a number-kind value to a typed number. Non-finite results
/// (not-a-number, infinities) are rejected as out-of-range rather than
/// leaking into arithmetic.
pub fn to_number(value: &dyn UntypedValue, span: Span) -> Value {
    if value.kind() != UntypedKind::Number {
        return kind_mismatch(UntypedKind::Number, value.kind(), span);
    }
    match value.as_f64() {
        Some(n) if n.is_finite() => Value::Number(n),
        Some(_) => Value::Error(ErrorValue::out_of_range("numeric value is not finite", span)),
        None => Value::Error(ErrorValue::internal(
            "number-kind value yielded no number",
            span,
        )),
    }
}

pub fn to_text(value: &dyn UntypedValue, span: Span) -> Value {
    if value.kind() != UntypedKind::Text {
        return kind_mismatch(UntypedKind::Text, value.kind(), span);
    }
    match value.as_str() {
        Some(s) => Value::Text(s.to_string()),
        None => Value::Error(ErrorValue::internal("text-kind value yielded no text", span)),
    }
}

pub fn to_boolean(value: &dyn UntypedValue, span: Span) -> Value {
    if value.kind() != UntypedKind::Boolean {
        return kind_mismatch(UntypedKind::Boolean, value.kind(), span);
    }
    match value.as_bool() {
        Some(b) => Value::Boolean(b),
        None => Value::Error(ErrorValue::internal(
            "boolean-kind value yielded no boolean",
            span,
        )),
    }
}

/// Text-kind value holding a strict date/date-time literal, truncated to its
/// date part.
pub fn to_date(value: &dyn UntypedValue, span: Span) -> Value {
    match text_content(value, span) {
        Ok(s) => match datetime::parse_date_or_datetime(s) {
            Ok((dt, _)) => Value::Date(dt.date()),
            Err(err) => Value::Error(ErrorValue::date_parse(err.to_string(), span)),
        },
        Err(miss) => miss,
    }
}

/// Text-kind value holding a strict date/date-time literal.
pub fn to_datetime(value: &dyn UntypedValue, span: Span) -> Value {
    match text_content(value, span) {
        Ok(s) => match datetime::parse_date_or_datetime(s) {
            Ok((dt, _)) => Value::DateTime(dt),
            Err(err) => Value::Error(ErrorValue::date_parse(err.to_string(), span)),
        },
        Err(miss) => miss,
    }
}

/// Text-kind value holding exactly `HH:MM:SS.fff`.
pub fn to_time(value: &dyn UntypedValue, span: Span) -> Value {
    match text_content(value, span) {
        Ok(s) => match datetime::parse_time(s) {
            Ok(t) => Value::Time(t),
            Err(err) => Value::Error(ErrorValue::date_parse(err.to_string(), span)),
        },
        Err(miss) => miss,
    }
}

/// Text-kind value holding a GUID in the canonical hyphenated form (see
/// [`parse_guid`]); braced, bare-hex, and URN renditions are rejected.
pub fn to_guid(value: &dyn UntypedValue, span: Span) -> Value {
    match text_content(value, span) {
        Ok(s) => match parse_guid(s) {
            Some(guid) => Value::Guid(guid),
            None => Value::Error(ErrorValue::invalid_usage(
                format!("'{s}' is not a valid GUID"),
                span,
            )),
        },
        Err(miss) => miss,
    }
}

fn text_content(value: &dyn UntypedValue, span: Span) -> Result<&str, Value> {
    if value.kind() != UntypedKind::Text {
        return Err(kind_mismatch(UntypedKind::Text, value.kind(), span));
    }
    value.as_str().ok_or_else(|| {
        Value::Error(ErrorValue::internal("text-kind value yielded no text", span))
    })
}
