// sentri-core/src/domain/dataset/mod.rs

mod columnar;
pub mod filter;
pub mod value;

pub use filter::RowFilter;
pub use value::{Value, ValueKey};

use chrono::NaiveDate;
use duckdb::arrow::array::ArrayRef;
use duckdb::arrow::compute::concat_batches;
use duckdb::arrow::datatypes::{Field, Schema, SchemaRef};
use duckdb::arrow::error::ArrowError;
use duckdb::arrow::record_batch::{RecordBatch, RecordBatchOptions};
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::domain::error::DomainError;

/// In-memory table handed to the check engine, backed by one Arrow `RecordBatch`.
///
/// Checks receive it read-only and work on their own lowercase copy.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    batch: RecordBatch,
}

impl Default for Dataset {
    fn default() -> Self {
        Self {
            batch: RecordBatch::new_empty(Arc::new(Schema::empty())),
        }
    }
}

impl From<ArrowError> for DomainError {
    fn from(e: ArrowError) -> Self {
        DomainError::Dataset(e.to_string())
    }
}

impl Dataset {
    pub fn from_batch(batch: RecordBatch) -> Self {
        Self { batch }
    }

    /// Concatenates query output into one batch.
    pub fn from_batches(schema: SchemaRef, batches: &[RecordBatch]) -> Result<Self, DomainError> {
        Ok(Self::from_batch(concat_batches(&schema, batches)?))
    }

    /// Builds a dataset from named scalar columns. Column types are inferred
    /// from the values.
    pub fn new(columns: Vec<(String, Vec<Value>)>) -> Result<Self, DomainError> {
        let rows = columns.first().map_or(0, |(_, v)| v.len());
        let mut fields: Vec<Field> = Vec::with_capacity(columns.len());
        let mut arrays: Vec<ArrayRef> = Vec::with_capacity(columns.len());

        for (name, values) in columns {
            if values.len() != rows {
                return Err(DomainError::Dataset(format!(
                    "column '{}' has {} rows, expected {}",
                    name,
                    values.len(),
                    rows
                )));
            }
            if fields.iter().any(|f| f.name() == &name) {
                return Err(DomainError::Dataset(format!("duplicate column '{name}'")));
            }
            let array = columnar::to_array(&values);
            fields.push(Field::new(name, array.data_type().clone(), true));
            arrays.push(array);
        }

        Self::assemble(fields, arrays, rows)
    }

    /// Builds a dataset from row-major records.
    pub fn from_rows(names: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self, DomainError> {
        let mut columns: Vec<Vec<Value>> = vec![Vec::with_capacity(rows.len()); names.len()];
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != names.len() {
                return Err(DomainError::Dataset(format!(
                    "row {} has {} values, expected {}",
                    i,
                    row.len(),
                    names.len()
                )));
            }
            for (col, value) in columns.iter_mut().zip(row) {
                col.push(value);
            }
        }
        Self::new(names.into_iter().zip(columns).collect())
    }

    fn assemble(fields: Vec<Field>, arrays: Vec<ArrayRef>, rows: usize) -> Result<Self, DomainError> {
        let options = RecordBatchOptions::new().with_row_count(Some(rows));
        let batch = RecordBatch::try_new_with_options(Arc::new(Schema::new(fields)), arrays, &options)?;
        Ok(Self::from_batch(batch))
    }

    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.batch
            .schema_ref()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.batch
            .schema_ref()
            .fields()
            .iter()
            .position(|f| f.name() == name)
    }

    /// The Arrow array behind `name`.
    pub fn array(&self, name: &str) -> Option<&ArrayRef> {
        self.column_index(name).map(|i| self.batch.column(i))
    }

    /// Cells of `name` as scalar values.
    pub fn column(&self, name: &str) -> Option<Vec<Value>> {
        self.array(name).map(columnar::to_values)
    }

    /// Cell dates of `name`, `None` where a cell is null or not a date.
    pub fn dates(&self, name: &str) -> Option<Vec<Option<NaiveDate>>> {
        self.array(name).map(columnar::to_dates)
    }

    /// Copy with lowercase column names. On a case collision the first column wins.
    pub fn to_lowercase_columns(&self) -> Result<Self, DomainError> {
        let schema = self.batch.schema_ref();
        let mut fields: Vec<Field> = Vec::with_capacity(schema.fields().len());
        let mut arrays = Vec::with_capacity(schema.fields().len());
        for (field, array) in schema.fields().iter().zip(self.batch.columns()) {
            let lower = field.name().to_lowercase();
            if fields.iter().any(|f| f.name() == &lower) {
                tracing::warn!(column = %field.name(), "Duplicate column after lowercasing, keeping first");
                continue;
            }
            fields.push(field.as_ref().clone().with_name(lower));
            arrays.push(array.clone());
        }
        Self::assemble(fields, arrays, self.num_rows())
    }

    /// Distinct parseable dates of `date_col`, ascending.
    pub fn distinct_dates(&self, date_col: &str) -> Vec<NaiveDate> {
        self.dates(date_col)
            .unwrap_or_default()
            .into_iter()
            .flatten()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Row indices whose `date_col` equals `date`.
    pub fn rows_on(&self, date_col: &str, date: NaiveDate) -> Vec<usize> {
        self.dates(date_col)
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .filter(|(_, d)| *d == Some(date))
            .map(|(i, _)| i)
            .collect()
    }
}
