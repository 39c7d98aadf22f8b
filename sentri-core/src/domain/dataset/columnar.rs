// sentri-core/src/domain/dataset/columnar.rs

// Conversions between Arrow arrays and the scalar `Value` view used by checks.

use chrono::NaiveDate;
use duckdb::arrow::array::{
    Array, ArrayRef, AsArray, BooleanArray, Date32Array, Float64Array, Int64Array, StringArray,
};
use duckdb::arrow::compute::cast;
use duckdb::arrow::datatypes::{DataType, Date32Type, Float64Type, Int64Type};
use duckdb::arrow::util::display::array_value_to_string;
use std::sync::Arc;

use super::Value;

/// Reads every cell of `array` as a [`Value`].
///
/// Integers widen to `Int`, floats and decimals to `Float`, temporal types
/// truncate to `Date`. Anything else is rendered as text.
pub(super) fn to_values(array: &ArrayRef) -> Vec<Value> {
    match array.data_type() {
        DataType::Null => vec![Value::Null; array.len()],
        DataType::Boolean => {
            let a = array.as_boolean();
            cells(a, |i| Value::Bool(a.value(i)))
        }
        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32 => match cast(array, &DataType::Int64) {
            Ok(wide) => {
                let a = wide.as_primitive::<Int64Type>();
                cells(a, |i| Value::Int(a.value(i)))
            }
            Err(_) => rendered(array),
        },
        DataType::UInt64
        | DataType::Float16
        | DataType::Float32
        | DataType::Float64
        | DataType::Decimal128(..)
        | DataType::Decimal256(..) => match cast(array, &DataType::Float64) {
            Ok(wide) => {
                let a = wide.as_primitive::<Float64Type>();
                cells(a, |i| Value::Float(a.value(i)))
            }
            Err(_) => rendered(array),
        },
        DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View => {
            match cast(array, &DataType::Utf8) {
                Ok(text) => {
                    let a = text.as_string::<i32>();
                    cells(a, |i| Value::Text(a.value(i).to_string()))
                }
                Err(_) => rendered(array),
            }
        }
        DataType::Date32 | DataType::Date64 | DataType::Timestamp(..) => {
            match cast(array, &DataType::Date32) {
                Ok(days) => {
                    let a = days.as_primitive::<Date32Type>();
                    cells(a, |i| a.value_as_date(i).map_or(Value::Null, Value::Date))
                }
                Err(_) => rendered(array),
            }
        }
        _ => rendered(array),
    }
}

fn cells(array: &dyn Array, read: impl Fn(usize) -> Value) -> Vec<Value> {
    (0..array.len())
        .map(|i| if array.is_null(i) { Value::Null } else { read(i) })
        .collect()
}

fn rendered(array: &ArrayRef) -> Vec<Value> {
    cells(array.as_ref(), |i| {
        array_value_to_string(array, i).map_or(Value::Null, Value::Text)
    })
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Kind {
    Bool,
    Int,
    Float,
    Date,
    Text,
}

fn kind_of(value: &Value) -> Option<Kind> {
    match value {
        Value::Null => None,
        Value::Bool(_) => Some(Kind::Bool),
        Value::Int(_) => Some(Kind::Int),
        Value::Float(_) => Some(Kind::Float),
        Value::Date(_) => Some(Kind::Date),
        Value::Text(_) => Some(Kind::Text),
    }
}

/// Builds one Arrow column from scalar values.
///
/// The type is inferred from the non-null cells: ints mixed with floats
/// become `Float64`, any other mix becomes `Utf8`. An all-null column is `Utf8`.
pub(super) fn to_array(values: &[Value]) -> ArrayRef {
    let kind = values
        .iter()
        .filter_map(kind_of)
        .reduce(|acc, k| match (acc, k) {
            (a, b) if a == b => a,
            (Kind::Int, Kind::Float) | (Kind::Float, Kind::Int) => Kind::Float,
            _ => Kind::Text,
        })
        .unwrap_or(Kind::Text);

    match kind {
        Kind::Bool => Arc::new(BooleanArray::from(
            values
                .iter()
                .map(|v| match v {
                    Value::Bool(b) => Some(*b),
                    _ => None,
                })
                .collect::<Vec<_>>(),
        )),
        Kind::Int => Arc::new(Int64Array::from(
            values
                .iter()
                .map(|v| match v {
                    Value::Int(i) => Some(*i),
                    _ => None,
                })
                .collect::<Vec<_>>(),
        )),
        Kind::Float => Arc::new(Float64Array::from(
            values
                .iter()
                .map(|v| match v {
                    Value::Int(i) => Some(*i as f64),
                    Value::Float(f) => Some(*f),
                    _ => None,
                })
                .collect::<Vec<_>>(),
        )),
        Kind::Date => Arc::new(Date32Array::from(
            values
                .iter()
                .map(|v| match v {
                    Value::Date(d) => Some(Date32Type::from_naive_date(*d)),
                    _ => None,
                })
                .collect::<Vec<_>>(),
        )),
        Kind::Text => Arc::new(StringArray::from(
            values
                .iter()
                .map(|v| (!matches!(v, Value::Null)).then(|| v.to_string()))
                .collect::<Vec<_>>(),
        )),
    }
}

/// Cell dates of a column: `Date` values and ISO text, `None` elsewhere.
pub(super) fn to_dates(array: &ArrayRef) -> Vec<Option<NaiveDate>> {
    to_values(array).iter().map(Value::as_date).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use duckdb::arrow::array::TimestampSecondArray;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn test_mixed_numbers_widen_to_float() {
        let array = to_array(&[Value::Int(1), Value::Float(2.5), Value::Null]);
        assert_eq!(array.data_type(), &DataType::Float64);
        assert_eq!(
            to_values(&array),
            [Value::Float(1.0), Value::Float(2.5), Value::Null]
        );
    }

    #[test]
    fn test_incompatible_mix_is_text() {
        let array = to_array(&[Value::Int(1), Value::from("x")]);
        assert_eq!(array.data_type(), &DataType::Utf8);
        assert_eq!(to_values(&array), [Value::from("1"), Value::from("x")]);
    }

    #[test]
    fn test_dates_survive_arrow() {
        let array = to_array(&[Value::Date(day(3)), Value::Null]);
        assert_eq!(array.data_type(), &DataType::Date32);
        assert_eq!(to_values(&array), [Value::Date(day(3)), Value::Null]);
    }

    #[test]
    fn test_timestamps_truncate_to_dates() {
        let array: ArrayRef = Arc::new(TimestampSecondArray::from(vec![Some(1_704_067_200), None]));
        assert_eq!(to_dates(&array), [Some(day(1)), None]);
    }

    #[test]
    fn test_unsigned_and_small_ints_widen() {
        let array: ArrayRef = Arc::new(duckdb::arrow::array::UInt8Array::from(vec![7u8]));
        assert_eq!(to_values(&array), [Value::Int(7)]);
        let array: ArrayRef = Arc::new(duckdb::arrow::array::UInt64Array::from(vec![7u64]));
        assert_eq!(to_values(&array), [Value::Float(7.0)]);
    }
}
