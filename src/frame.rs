//! Columnar view over flattened records.
//!
//! Records coming out of a walk do not share a fixed schema: branches of an
//! irregular tree produce different column sets. The frame takes the union of
//! all columns in the order they were first seen and fills the gaps with nulls.

use ahash::AHashSet;
use arrow2::array::{Array, BooleanArray, Float64Array, Int64Array, Utf8Array};
use arrow2::chunk::Chunk;
use arrow2::datatypes::{DataType, Field, Schema};
use serde_json::Value;
use tracing::debug;

use crate::error::Result;
use crate::Record;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Int64,
    Float64,
    Boolean,
    Utf8,
}

impl ColumnKind {
    /// Narrowest kind that holds every non-null value. Integers mixed with
    /// floats widen to floats; any other mix falls back to text.
    fn infer<'a>(values: impl Iterator<Item = &'a Value>) -> Self {
        let mut kind = None;

        for value in values {
            let seen = match value {
                Value::Null => continue,
                Value::Bool(_) => ColumnKind::Boolean,
                Value::Number(n) if n.is_i64() => ColumnKind::Int64,
                Value::Number(_) => ColumnKind::Float64,
                Value::String(_) | Value::Array(_) | Value::Object(_) => return ColumnKind::Utf8,
            };

            kind = Some(match (kind, seen) {
                (None, seen) => seen,
                (Some(current), seen) if current == seen => current,
                (Some(ColumnKind::Int64), ColumnKind::Float64)
                | (Some(ColumnKind::Float64), ColumnKind::Int64) => ColumnKind::Float64,
                _ => return ColumnKind::Utf8,
            });
        }

        kind.unwrap_or(ColumnKind::Utf8)
    }

    fn data_type(self) -> DataType {
        match self {
            ColumnKind::Int64 => DataType::Int64,
            ColumnKind::Float64 => DataType::Float64,
            ColumnKind::Boolean => DataType::Boolean,
            ColumnKind::Utf8 => DataType::Utf8,
        }
    }
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Column names in depth-first discovery order.
pub fn discover_columns(records: &[Record]) -> Vec<String> {
    let mut seen = AHashSet::new();
    let mut columns = Vec::new();

    for record in records {
        for name in record.keys() {
            if seen.insert(name.as_str()) {
                columns.push(name.clone());
            }
        }
    }

    columns
}

/// Records laid out as typed arrow arrays.
#[derive(Debug, Clone)]
pub struct Frame {
    schema: Schema,
    chunk: Chunk<Box<dyn Array>>,
    rows: usize,
}

impl Frame {
    pub fn from_records(records: &[Record]) -> Result<Self> {
        let columns = discover_columns(records);

        // ─────────────────────────────────────────────
        // Pick a type per column, then build its array
        // ─────────────────────────────────────────────
        let mut fields = Vec::with_capacity(columns.len());
        let mut arrays: Vec<Box<dyn Array>> = Vec::with_capacity(columns.len());

        for name in &columns {
            let cells = || records.iter().map(|r| r.get(name.as_str()));
            let kind = ColumnKind::infer(cells().flatten());

            macro_rules! build {
                ($array:ty, $extract:expr) => {{
                    let array: $array = cells().map(|cell| cell.and_then($extract)).collect();
                    array.boxed()
                }};
            }

            let array = match kind {
                ColumnKind::Int64 => build!(Int64Array, Value::as_i64),
                ColumnKind::Float64 => build!(Float64Array, Value::as_f64),
                ColumnKind::Boolean => build!(BooleanArray, Value::as_bool),
                ColumnKind::Utf8 => build!(Utf8Array<i32>, text),
            };

            fields.push(Field::new(name.as_str(), kind.data_type(), true));
            arrays.push(array);
        }

        let chunk = Chunk::try_new(arrays)?;
        debug!(rows = records.len(), columns = columns.len(), "built frame");

        Ok(Self {
            schema: Schema::from(fields),
            chunk,
            rows: records.len(),
        })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn chunk(&self) -> &Chunk<Box<dyn Array>> {
        &self.chunk
    }

    pub fn num_rows(&self) -> usize {
        self.rows
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.schema.fields.iter().map(|f| f.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&dyn Array> {
        let idx = self.schema.fields.iter().position(|f| f.name == name)?;
        Some(self.chunk.arrays()[idx].as_ref())
    }

    /// First `n` rows (or all of them when there are fewer).
    pub fn head(&self, n: usize) -> Frame {
        let n = n.min(self.rows);
        let arrays = self.chunk.arrays().iter().map(|a| a.sliced(0, n)).collect();

        Frame {
            schema: self.schema.clone(),
            chunk: Chunk::new(arrays),
            rows: n,
        }
    }

    /// Render as a text table.
    pub fn to_table_string(&self) -> String {
        let names = self.column_names();
        arrow2::io::print::write(std::slice::from_ref(&self.chunk), names.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow2::array::PrimitiveArray;
    use serde_json::json;

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn infers_narrowest_kind() {
        let ints = [json!(1), json!(null), json!(-3)];
        let mixed = [json!(1), json!(2.5)];
        let bools = [json!(true), json!(false)];
        let odd = [json!(1), json!("a")];

        assert_eq!(ColumnKind::infer(ints.iter()), ColumnKind::Int64);
        assert_eq!(ColumnKind::infer(mixed.iter()), ColumnKind::Float64);
        assert_eq!(ColumnKind::infer(bools.iter()), ColumnKind::Boolean);
        assert_eq!(ColumnKind::infer(odd.iter()), ColumnKind::Utf8);
        assert_eq!(ColumnKind::infer([json!(null)].iter()), ColumnKind::Utf8);
    }

    #[test]
    fn missing_cells_become_nulls() {
        let records = vec![
            record(json!({"g": "a", "m": 1})),
            record(json!({"g": "b", "extra": "x", "m": 2})),
        ];

        let frame = Frame::from_records(&records).unwrap();

        assert_eq!(frame.column_names(), vec!["g", "m", "extra"]);
        assert_eq!(frame.num_rows(), 2);

        let extra = frame.column("extra").unwrap();
        assert_eq!(extra.data_type(), &DataType::Utf8);
        assert!(extra.is_null(0));
        assert!(!extra.is_null(1));

        let m = frame
            .column("m")
            .unwrap()
            .as_any()
            .downcast_ref::<PrimitiveArray<i64>>()
            .unwrap();
        assert_eq!(m.values().as_slice(), &[1, 2]);
    }

    #[test]
    fn head_truncates_rows() {
        let records: Vec<Record> = (0..5).map(|i| record(json!({"n": i}))).collect();
        let frame = Frame::from_records(&records).unwrap();

        assert_eq!(frame.head(2).num_rows(), 2);
        assert_eq!(frame.head(2).chunk().len(), 2);
        assert_eq!(frame.head(50).num_rows(), 5);
    }

    #[test]
    fn table_string_has_headers_and_values() {
        let records = vec![record(json!({"PROJECT": "FC", "REGISTRATIONS": 12}))];
        let table = Frame::from_records(&records).unwrap().to_table_string();

        assert!(table.contains("PROJECT"));
        assert!(table.contains("REGISTRATIONS"));
        assert!(table.contains("FC"));
        assert!(table.contains("12"));
    }

    #[test]
    fn empty_input_builds_empty_frame() {
        let frame = Frame::from_records(&[]).unwrap();
        assert_eq!(frame.num_rows(), 0);
        assert!(frame.column_names().is_empty());
    }
}
