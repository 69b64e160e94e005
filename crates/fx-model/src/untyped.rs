use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Runtime kind reported by a schema-less value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UntypedKind {
    Number,
    Text,
    Boolean,
    Array,
    Object,
    Null,
}

impl fmt::Display for UntypedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UntypedKind::Number => "number",
            UntypedKind::Text => "text",
            UntypedKind::Boolean => "boolean",
            UntypedKind::Array => "array",
            UntypedKind::Object => "object",
            UntypedKind::Null => "null",
        };
        f.write_str(s)
    }
}

/// An opaque, externally supplied value carrying its own runtime kind.
///
/// This is the seam between schema-less host data (parsed structured text,
/// service payloads, ...) and the statically typed value system. Accessors
/// return `None` when they do not apply to the value's kind; the bridge in
/// `fx-bind` turns such misses into typed error values.
pub trait UntypedValue: fmt::Debug + Send + Sync {
    fn kind(&self) -> UntypedKind;

    fn as_f64(&self) -> Option<f64> {
        None
    }

    fn as_str(&self) -> Option<&str> {
        None
    }

    fn as_bool(&self) -> Option<bool> {
        None
    }

    /// Element count; `None` unless the kind is `Array`.
    fn len(&self) -> Option<usize> {
        None
    }

    /// Zero-based element access; `None` unless the kind is `Array` and the
    /// index is in bounds.
    fn index(&self, _index: usize) -> Option<UntypedRef> {
        None
    }

    /// Nested access by field name; `None` unless the kind is `Object` and
    /// the field exists.
    fn field(&self, _name: &str) -> Option<UntypedRef> {
        None
    }
}

/// Shared handle to an opaque value. Cheap to clone and to hand across the
/// per-row fan-out.
pub type UntypedRef = Arc<dyn UntypedValue>;
