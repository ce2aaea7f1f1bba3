use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

use super::error::{DataLoadError, QueryError};
use super::loader::LoadReport;

// ---------------------------------------------------------------------------
// Value – a single typed cell
// ---------------------------------------------------------------------------

/// A typed cell value. Using `BTreeSet` downstream so `Value` must be `Ord`.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Integer(i64),
    Float(f64),
    String(String),
}

// -- Manual Eq/Ord so we can put Value in BTreeSet --
// Floats are compared by `total_cmp`: NaN equals NaN and -0.0 differs
// from 0.0, matching the bit-based `Hash` below.

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        use Value::*;
        fn discriminant(v: &Value) -> u8 {
            match v {
                Null => 0,
                Integer(_) => 1,
                Float(_) => 2,
                String(_) => 3,
            }
        }
        match (self, other) {
            (Null, Null) => Ordering::Equal,
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (String(a), String(b)) => a.cmp(b),
            _ => discriminant(self).cmp(&discriminant(other)),
        }
    }
}

impl std::hash::Hash for Value {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::String(s) => s.hash(state),
            Value::Integer(i) => i.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::Null => {}
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{s}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Null => write!(f, "<null>"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl Value {
    /// Interpret the value as an `f64` for charting and numeric comparison.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Ordering used by range predicates.
    ///
    /// Integers and floats compare numerically across kinds, strings compare
    /// lexically. Null, NaN and mixed text/number pairs are incomparable.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (a, b) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        }
    }
}

// ---------------------------------------------------------------------------
// Schema – ordered, uniquely named, typed columns
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    String,
    Integer,
    Float,
}

impl ColumnType {
    pub fn is_numeric(self) -> bool {
        matches!(self, ColumnType::Integer | ColumnType::Float)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: String,
    pub ty: ColumnType,
}

/// Column layout of a dataset, checked once at load time.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    columns: Vec<ColumnDef>,
    index: HashMap<String, usize>,
}

impl Schema {
    /// Build a schema, rejecting duplicate column names.
    pub fn new(columns: Vec<ColumnDef>) -> Result<Self, DataLoadError> {
        let mut index = HashMap::with_capacity(columns.len());
        for (i, col) in columns.iter().enumerate() {
            if index.insert(col.name.clone(), i).is_some() {
                return Err(DataLoadError::DuplicateColumn(col.name.clone()));
            }
        }
        Ok(Schema { columns, index })
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Position of a column, or [`QueryError::ColumnNotFound`].
    pub fn index_of(&self, name: &str) -> Result<usize, QueryError> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| QueryError::ColumnNotFound(name.to_string()))
    }

    pub fn column_type(&self, name: &str) -> Result<ColumnType, QueryError> {
        Ok(self.columns[self.index_of(name)?].ty)
    }

    /// Fail with [`DataLoadError::MissingColumn`] for the first absent name.
    pub fn require<'a>(
        &self,
        names: impl IntoIterator<Item = &'a str>,
    ) -> Result<(), DataLoadError> {
        for name in names {
            if !self.contains(name) {
                return Err(DataLoadError::MissingColumn(name.to_string()));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Row / Dataset
// ---------------------------------------------------------------------------

/// One row; `values[i]` belongs to schema column `i`.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub values: Vec<Value>,
}

impl Row {
    pub fn get(&self, index: usize) -> &Value {
        &self.values[index]
    }
}

/// The full loaded table. Immutable once built.
#[derive(Debug, Clone)]
pub struct Dataset {
    schema: Schema,
    rows: Vec<Row>,
    report: LoadReport,
}

impl Dataset {
    /// Assemble a dataset, checking that every row is as wide as the schema.
    pub fn new(schema: Schema, rows: Vec<Row>, report: LoadReport) -> Result<Self, DataLoadError> {
        if let Some((index, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, r)| r.values.len() != schema.len())
        {
            return Err(DataLoadError::InvalidRecord {
                index,
                reason: format!(
                    "expected {} fields but found {}",
                    schema.len(),
                    row.values.len()
                ),
            });
        }
        Ok(Dataset { schema, rows, report })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> &Row {
        &self.rows[index]
    }

    pub fn report(&self) -> &LoadReport {
        &self.report
    }

    /// Value at (row, column name).
    #[cfg(test)]
    pub fn value(&self, row: usize, column: &str) -> Result<&Value, QueryError> {
        let col = self.schema.index_of(column)?;
        Ok(self.rows[row].get(col))
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn def(name: &str, ty: ColumnType) -> ColumnDef {
        ColumnDef {
            name: name.to_string(),
            ty,
        }
    }

    #[test]
    fn test_schema_rejects_duplicate_names() {
        let err = Schema::new(vec![
            def("City", ColumnType::String),
            def("City", ColumnType::Integer),
        ])
        .unwrap_err();
        assert!(matches!(err, DataLoadError::DuplicateColumn(name) if name == "City"));
    }

    #[test]
    fn test_schema_lookup() {
        let schema = Schema::new(vec![
            def("City", ColumnType::String),
            def("Year", ColumnType::Integer),
        ])
        .unwrap();
        assert_eq!(schema.index_of("Year"), Ok(1));
        assert_eq!(schema.column_type("City"), Ok(ColumnType::String));
        assert_eq!(
            schema.index_of("Country"),
            Err(QueryError::ColumnNotFound("Country".to_string()))
        );
        assert!(matches!(
            schema.require(["City", "Salary"]),
            Err(DataLoadError::MissingColumn(name)) if name == "Salary"
        ));
    }

    #[test]
    fn test_value_numeric_compare_crosses_kinds() {
        assert_eq!(
            Value::Integer(2).compare(&Value::Float(1.5)),
            Some(Ordering::Greater)
        );
        assert_eq!(Value::Null.compare(&Value::Integer(1)), None);
        assert_eq!(Value::from("a").compare(&Value::Integer(1)), None);
        assert_eq!(Value::from("a").compare(&Value::from("b")), Some(Ordering::Less));
    }

    #[test]
    fn test_value_total_order() {
        let mut values = vec![
            Value::from("b"),
            Value::Float(1.0),
            Value::Null,
            Value::Integer(3),
            Value::from("a"),
        ];
        values.sort();
        assert_eq!(
            values,
            vec![
                Value::Null,
                Value::Integer(3),
                Value::Float(1.0),
                Value::from("a"),
                Value::from("b"),
            ]
        );
    }

    #[test]
    fn test_float_equality_agrees_with_order() {
        let nan = Value::Float(f64::NAN);
        assert_eq!(nan, nan.clone());
        assert_eq!(nan.cmp(&Value::Float(f64::NAN)), Ordering::Equal);
        assert_ne!(Value::Float(-0.0), Value::Float(0.0));
        assert_eq!(Value::Float(1.5), Value::Float(1.5));
        // Exact: no cross-kind equality even when numerically equal.
        assert_ne!(Value::Integer(1), Value::Float(1.0));

        let set: std::collections::BTreeSet<Value> =
            [f64::NAN, 1.5, f64::NAN, -0.0, 0.0, 1.5].into_iter().map(Value::Float).collect();
        assert_eq!(set.len(), 4);
    }

    #[test]
    fn test_dataset_rejects_ragged_rows() {
        let schema = Schema::new(vec![
            def("City", ColumnType::String),
            def("Year", ColumnType::Integer),
        ])
        .unwrap();
        let rows = vec![Row {
            values: vec![Value::from("Lagos")],
        }];
        assert!(Dataset::new(schema, rows, LoadReport::default()).is_err());
    }
}
