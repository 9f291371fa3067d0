//! Host-side value model exchanged with the TreePPL runtime.
//!
//! A [`Value`] is either a scalar, a numeric vector, a shaped matrix, a
//! heterogeneous list, an untagged mapping, or a [`Tagged`] variant carrying a
//! tag and named fields. Field order is preserved so that wire output is
//! reproducible.

use indexmap::IndexMap;

use crate::errors::{ErrorInfo, TpplError};

/// Wire key carrying the tag of a tagged variant.
pub const CONSTRUCTOR_KEY: &str = "__constructor__";
/// Wire key carrying the row-major data of a matrix.
pub const DATA_KEY: &str = "__data__";
/// Wire key carrying the `[rows, cols]` shape of a matrix.
pub const SHAPE_KEY: &str = "__shape__";

/// Keys that may never be used as field or mapping keys.
pub const RESERVED_KEYS: [&str; 3] = [CONSTRUCTOR_KEY, DATA_KEY, SHAPE_KEY];

/// Returns true when `name` collides with a reserved wire key.
pub fn is_reserved_key(name: &str) -> bool {
    RESERVED_KEYS.contains(&name)
}

/// Ordered field mapping used by tagged variants and plain mappings.
pub type Fields = IndexMap<String, Value>;

/// Structured value exchanged with the runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// The unit value, `null` on the wire.
    Unit,
    /// Boolean scalar.
    Bool(bool),
    /// Integer scalar.
    Int(i64),
    /// Real scalar.
    Real(f64),
    /// String scalar.
    Str(String),
    /// One-dimensional numeric array.
    Vector(Vec<f64>),
    /// Two-dimensional numeric array with an explicit shape.
    Matrix(Matrix),
    /// Sequence holding at least one non-numeric element. Built with
    /// [`Value::list`].
    List(List),
    /// Untagged mapping.
    Map(Fields),
    /// Tagged variant with named fields.
    Tagged(Tagged),
}

impl Value {
    /// Builds a sequence value, folding all-numeric items into a vector.
    ///
    /// All-numeric JSON arrays decode as [`Value::Vector`], so this is the only
    /// way to build a [`Value::List`].
    pub fn list(items: Vec<Value>) -> Value {
        if items.iter().all(Value::is_number) {
            Value::Vector(items.iter().filter_map(Value::as_real).collect())
        } else {
            Value::List(List(items))
        }
    }

    /// Returns true for integer and real scalars.
    pub fn is_number(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Real(_))
    }

    /// Returns the numeric content of an integer or real scalar.
    pub fn as_real(&self) -> Option<f64> {
        match self {
            Value::Int(value) => Some(*value as f64),
            Value::Real(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the tagged payload, if any.
    pub fn as_tagged(&self) -> Option<&Tagged> {
        match self {
            Value::Tagged(tagged) => Some(tagged),
            _ => None,
        }
    }

    /// Returns the tag of a tagged value.
    pub fn tag(&self) -> Option<&str> {
        self.as_tagged().map(Tagged::tag)
    }

    /// Looks up a named field of a tagged value or plain mapping.
    pub fn field(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Tagged(tagged) => tagged.field(name),
            Value::Map(fields) => fields.get(name),
            _ => None,
        }
    }

    /// Short name of the value kind used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Unit => "unit",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Real(_) => "real",
            Value::Str(_) => "string",
            Value::Vector(_) => "vector",
            Value::Matrix(_) => "matrix",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Tagged(_) => "tagged",
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Real(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl From<Vec<f64>> for Value {
    fn from(value: Vec<f64>) -> Self {
        Value::Vector(value)
    }
}

impl From<Matrix> for Value {
    fn from(value: Matrix) -> Self {
        Value::Matrix(value)
    }
}

impl From<Tagged> for Value {
    fn from(value: Tagged) -> Self {
        Value::Tagged(value)
    }
}

/// Items of a [`Value::List`]; at least one of them is not a number.
#[derive(Debug, Clone, PartialEq)]
pub struct List(Vec<Value>);

impl List {
    /// Items in order.
    pub fn items(&self) -> &[Value] {
        &self.0
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; empty sequences are vectors.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Takes the items out.
    pub fn into_items(self) -> Vec<Value> {
        self.0
    }
}

/// Row-major numeric matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// Creates a matrix from row-major data, checking `data.len() == rows * cols`.
    pub fn new(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self, TpplError> {
        let expected = rows.checked_mul(cols).ok_or_else(|| {
            TpplError::Shape(
                ErrorInfo::new("matrix-shape-overflow", "matrix shape overflows usize")
                    .with_context("rows", rows.to_string())
                    .with_context("cols", cols.to_string()),
            )
        })?;
        if data.len() != expected {
            return Err(TpplError::Shape(
                ErrorInfo::new(
                    "matrix-shape-mismatch",
                    "matrix data length does not match rows * cols",
                )
                .with_context("rows", rows.to_string())
                .with_context("cols", cols.to_string())
                .with_context("len", data.len().to_string()),
            ));
        }
        Ok(Self { rows, cols, data })
    }

    /// Creates a matrix from a slice of equally sized rows.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self, TpplError> {
        let cols = rows.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(rows.len() * cols);
        for (idx, row) in rows.iter().enumerate() {
            if row.len() != cols {
                return Err(TpplError::Shape(
                    ErrorInfo::new("matrix-ragged-rows", "matrix rows differ in length")
                        .with_context("row", idx.to_string())
                        .with_context("expected", cols.to_string())
                        .with_context("found", row.len().to_string()),
                ));
            }
            data.extend_from_slice(row);
        }
        Self::new(rows.len(), cols, data)
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// `(rows, cols)` pair.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Row-major data.
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Element at `(row, col)`.
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row < self.rows && col < self.cols {
            self.data.get(row * self.cols + col).copied()
        } else {
            None
        }
    }

    /// Borrowed view of one row.
    pub fn row(&self, row: usize) -> Option<&[f64]> {
        if row < self.rows {
            Some(&self.data[row * self.cols..(row + 1) * self.cols])
        } else {
            None
        }
    }
}

/// Tagged variant: a tag plus ordered named fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Tagged {
    tag: String,
    fields: Fields,
}

impl Tagged {
    /// Creates a tagged value, rejecting reserved field names.
    pub fn new(tag: impl Into<String>, fields: Fields) -> Result<Self, TpplError> {
        let tag = tag.into();
        if let Some(name) = fields.keys().find(|name| is_reserved_key(name)) {
            return Err(TpplError::InvalidField(
                ErrorInfo::new("reserved-field", "field name collides with a reserved wire key")
                    .with_context("tag", tag.clone())
                    .with_context("field", name.clone()),
            ));
        }
        Ok(Self { tag, fields })
    }

    /// Creates a tagged value from `(name, value)` pairs.
    pub fn from_pairs<I, K>(tag: impl Into<String>, pairs: I) -> Result<Self, TpplError>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let fields = pairs
            .into_iter()
            .map(|(name, value)| (name.into(), value))
            .collect();
        Self::new(tag, fields)
    }

    /// Tag identifying the variant.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Ordered fields.
    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    /// Field lookup by name.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Splits the value into its tag and fields.
    pub fn into_parts(self) -> (String, Fields) {
        (self.tag, self.fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_lists_fold_into_vectors() {
        let folded = Value::list(vec![Value::Int(1), Value::Real(2.5)]);
        assert_eq!(folded, Value::Vector(vec![1.0, 2.5]));
        assert_eq!(Value::list(Vec::new()), Value::Vector(Vec::new()));

        let mixed = Value::list(vec![Value::Int(1), Value::Bool(true)]);
        assert!(matches!(mixed, Value::List(items) if items.len() == 2));
        assert_eq!(
            Value::list(vec![Value::Int(1)]),
            Value::Vector(vec![1.0])
        );
    }

    #[test]
    fn matrix_rows_are_row_major() {
        let matrix = Matrix::from_rows(&[vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]).unwrap();
        assert_eq!(matrix.shape(), (2, 3));
        assert_eq!(matrix.get(1, 0), Some(4.0));
        assert_eq!(matrix.row(0), Some(&[1.0, 2.0, 3.0][..]));
        assert_eq!(matrix.get(2, 0), None);
    }

    #[test]
    fn matrix_rejects_mismatched_length() {
        let err = Matrix::new(2, 3, vec![0.0; 5]).unwrap_err();
        assert_eq!(err.info().code, "matrix-shape-mismatch");
        let err = Matrix::from_rows(&[vec![1.0], vec![1.0, 2.0]]).unwrap_err();
        assert_eq!(err.info().code, "matrix-ragged-rows");
    }

    #[test]
    fn tagged_rejects_reserved_field_names() {
        let err = Tagged::from_pairs("Leaf", [(CONSTRUCTOR_KEY, Value::Real(0.0))]).unwrap_err();
        assert_eq!(err.info().code, "reserved-field");
    }
}
