use std::fmt;
use std::sync::Arc;

use crate::value::Value;

/// Canonical column label for single-column tables synthesized by the type
/// system (e.g. lifting a scalar transform over an extracted column, or
/// wrapping schema-less array elements as rows).
pub const VALUE_COLUMN: &str = "Value";

/// Canonical column label for result tables produced by multi-table
/// aggregate/diff functions when no input column provides a natural name.
pub const RESULT_COLUMN: &str = "Result";

/// The semantic type of an expression or value.
///
/// `Error` is a terminal "poison" type: any operation with an `Error` operand
/// yields `Error`. `Untyped` is the static type of schema-less values bridged
/// in at runtime; it participates in no operator overloads and must be
/// converted explicitly.
#[derive(Clone, Debug, PartialEq)]
pub enum DType {
    Number,
    Text,
    Boolean,
    Date,
    Time,
    DateTime,
    /// A table whose rows share the given record shape.
    Table(RecordShape),
    Record(RecordShape),
    Error,
    Untyped,
    OptionSet(Arc<OptionSetType>),
    Enum(Arc<EnumSymbol>),
}

impl DType {
    pub fn is_error(&self) -> bool {
        matches!(self, DType::Error)
    }

    /// True for the date-kind scalars that participate in date arithmetic.
    pub fn is_chronological(&self) -> bool {
        matches!(self, DType::Date | DType::Time | DType::DateTime)
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DType::Number => f.write_str("Number"),
            DType::Text => f.write_str("Text"),
            DType::Boolean => f.write_str("Boolean"),
            DType::Date => f.write_str("Date"),
            DType::Time => f.write_str("Time"),
            DType::DateTime => f.write_str("DateTime"),
            DType::Table(shape) => write!(f, "Table({shape})"),
            DType::Record(shape) => write!(f, "Record({shape})"),
            DType::Error => f.write_str("Error"),
            DType::Untyped => f.write_str("Untyped"),
            DType::OptionSet(os) => write!(f, "OptionSet({})", os.entity_name),
            DType::Enum(e) => write!(f, "Enum({})", e.name),
        }
    }
}

/// Ordered field-name → type mapping describing a record (or table row).
///
/// Field names are unique; field order is the author-visible column order and
/// participates in equality.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RecordShape {
    fields: Vec<(String, DType)>,
}

impl RecordShape {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a shape with a single column.
    pub fn single_column(name: impl Into<String>, dtype: DType) -> Self {
        Self {
            fields: vec![(name.into(), dtype)],
        }
    }

    /// Appends a field; replaces the type of an existing field of the same
    /// name rather than introducing a duplicate.
    pub fn with_field(mut self, name: impl Into<String>, dtype: DType) -> Self {
        let name = name.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, t)) => *t = dtype,
            None => self.fields.push((name, dtype)),
        }
        self
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &DType)> {
        self.fields.iter().map(|(n, t)| (n.as_str(), t))
    }

    pub fn get(&self, name: &str) -> Option<&DType> {
        self.fields
            .iter()
            .find_map(|(n, t)| (n == name).then_some(t))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl fmt::Display for RecordShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, dtype)) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}: {dtype}")?;
        }
        Ok(())
    }
}

impl FromIterator<(String, DType)> for RecordShape {
    fn from_iter<I: IntoIterator<Item = (String, DType)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::new(), |shape, (n, t)| shape.with_field(n, t))
    }
}

/// Type of an externally defined option set (an environment entity).
///
/// The entity itself lives behind the host's environment-symbols interface;
/// the type grammar only needs its stable name and member type.
#[derive(Clone, Debug, PartialEq)]
pub struct OptionSetType {
    pub entity_name: String,
    pub member_type: DType,
}

/// A named enumeration: an invariant name, a member type, and the
/// display-name ↔ logical-name ↔ value mapping for its members.
#[derive(Clone, Debug, PartialEq)]
pub struct EnumSymbol {
    pub name: String,
    pub member_type: DType,
    members: Vec<EnumMember>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EnumMember {
    pub logical_name: String,
    pub display_name: String,
    pub value: Value,
}

impl EnumSymbol {
    pub fn new(name: impl Into<String>, member_type: DType) -> Self {
        Self {
            name: name.into(),
            member_type,
            members: Vec::new(),
        }
    }

    pub fn with_member(
        mut self,
        logical_name: impl Into<String>,
        display_name: impl Into<String>,
        value: Value,
    ) -> Self {
        self.members.push(EnumMember {
            logical_name: logical_name.into(),
            display_name: display_name.into(),
            value,
        });
        self
    }

    pub fn members(&self) -> &[EnumMember] {
        &self.members
    }

    pub fn value_of_logical(&self, logical_name: &str) -> Option<&Value> {
        self.members
            .iter()
            .find_map(|m| (m.logical_name == logical_name).then_some(&m.value))
    }

    pub fn logical_of_display(&self, display_name: &str) -> Option<&str> {
        self.members
            .iter()
            .find_map(|m| (m.display_name == display_name).then_some(m.logical_name.as_str()))
    }

    pub fn display_of_logical(&self, logical_name: &str) -> Option<&str> {
        self.members
            .iter()
            .find_map(|m| (m.logical_name == logical_name).then_some(m.display_name.as_str()))
    }
}
