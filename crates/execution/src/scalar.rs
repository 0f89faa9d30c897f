//! Owned scalar values, their total order, and arrow conversions.

use std::cmp::Ordering;
use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, BinaryArray, BinaryBuilder, BooleanArray, BooleanBuilder, Float32Array,
    Float32Builder, Float64Array, Float64Builder, Int32Array, Int32Builder, Int64Array,
    Int64Builder, StringArray, StringBuilder, new_null_array,
};
use arrow_schema::DataType;
use kestrel_common::{KestrelError, Result};
use kestrel_planner::{LiteralValue, NullOrdering, SortDirection};

/// One field value of a [`crate::Row`].
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    /// SQL NULL of any type.
    Null,
    /// Boolean value.
    Boolean(bool),
    /// 32-bit signed integer.
    Int32(i32),
    /// 64-bit signed integer.
    Int64(i64),
    /// 32-bit float.
    Float32(f32),
    /// 64-bit float.
    Float64(f64),
    /// UTF-8 string.
    Utf8(String),
    /// Raw bytes.
    Binary(Vec<u8>),
}

impl ScalarValue {
    /// Whether this value is SQL NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, ScalarValue::Null)
    }

    /// Whether this value may be stored in a column of type `dt`.
    ///
    /// NULL fits every type.
    pub fn fits(&self, dt: &DataType) -> bool {
        matches!(
            (self, dt),
            (ScalarValue::Null, _)
                | (ScalarValue::Boolean(_), DataType::Boolean)
                | (ScalarValue::Int32(_), DataType::Int32)
                | (ScalarValue::Int64(_), DataType::Int64)
                | (ScalarValue::Float32(_), DataType::Float32)
                | (ScalarValue::Float64(_), DataType::Float64)
                | (ScalarValue::Utf8(_), DataType::Utf8)
                | (ScalarValue::Binary(_), DataType::Binary)
        )
    }

    /// Compare two non-null values of compatible types.
    ///
    /// Integers compare exactly, mixed int/float compare as `f64`, and NaN
    /// sorts above every other float. Values of unrelated types fall back to a
    /// fixed type rank so the order stays total.
    pub fn cmp_non_null(&self, other: &Self) -> Ordering {
        use ScalarValue::*;
        match (self, other) {
            (Int32(x), Int32(y)) => x.cmp(y),
            (Int64(x), Int64(y)) => x.cmp(y),
            (Int32(x), Int64(y)) => i64::from(*x).cmp(y),
            (Int64(x), Int32(y)) => x.cmp(&i64::from(*y)),
            (Float32(x), Float32(y)) => cmp_f64(f64::from(*x), f64::from(*y)),
            (Utf8(x), Utf8(y)) => x.cmp(y),
            (Binary(x), Binary(y)) => x.cmp(y),
            (Boolean(x), Boolean(y)) => x.cmp(y),
            (a, b) => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => cmp_f64(x, y),
                _ => a.type_rank().cmp(&b.type_rank()),
            },
        }
    }

    /// Compare under a sort direction and null placement.
    ///
    /// `Less` means `self` is emitted before `other`.
    pub fn cmp_collated(
        &self,
        other: &Self,
        direction: SortDirection,
        nulls: NullOrdering,
    ) -> Ordering {
        match (self.is_null(), other.is_null()) {
            (true, true) => Ordering::Equal,
            (true, false) => match nulls {
                NullOrdering::First => Ordering::Less,
                NullOrdering::Last => Ordering::Greater,
            },
            (false, true) => match nulls {
                NullOrdering::First => Ordering::Greater,
                NullOrdering::Last => Ordering::Less,
            },
            (false, false) => {
                let ord = self.cmp_non_null(other);
                if direction.is_asc() { ord } else { ord.reverse() }
            }
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            ScalarValue::Int32(v) => Some(f64::from(*v)),
            ScalarValue::Int64(v) => Some(*v as f64),
            ScalarValue::Float32(v) => Some(f64::from(*v)),
            ScalarValue::Float64(v) => Some(*v),
            _ => None,
        }
    }

    fn type_rank(&self) -> u8 {
        match self {
            ScalarValue::Null => 0,
            ScalarValue::Boolean(_) => 1,
            ScalarValue::Int32(_)
            | ScalarValue::Int64(_)
            | ScalarValue::Float32(_)
            | ScalarValue::Float64(_) => 2,
            ScalarValue::Utf8(_) => 3,
            ScalarValue::Binary(_) => 4,
        }
    }
}

impl From<&LiteralValue> for ScalarValue {
    fn from(v: &LiteralValue) -> Self {
        match v {
            LiteralValue::Int32(x) => ScalarValue::Int32(*x),
            LiteralValue::Int64(x) => ScalarValue::Int64(*x),
            LiteralValue::Float32(x) => ScalarValue::Float32(*x),
            LiteralValue::Float64(x) => ScalarValue::Float64(*x),
            LiteralValue::Utf8(x) => ScalarValue::Utf8(x.clone()),
            LiteralValue::Binary(x) => ScalarValue::Binary(x.clone()),
            LiteralValue::Boolean(x) => ScalarValue::Boolean(*x),
            LiteralValue::Null => ScalarValue::Null,
        }
    }
}

/// Total order over `f64` with every NaN equal and greater than any number.
pub fn cmp_f64(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.total_cmp(&b),
    }
}

/// Read one slot of an arrow array as an owned scalar.
pub fn scalar_from_array(array: &ArrayRef, row: usize) -> Result<ScalarValue> {
    if array.is_null(row) {
        return Ok(ScalarValue::Null);
    }
    match array.data_type() {
        DataType::Null => Ok(ScalarValue::Null),
        DataType::Boolean => Ok(ScalarValue::Boolean(
            downcast::<BooleanArray>(array, "BooleanArray")?.value(row),
        )),
        DataType::Int32 => Ok(ScalarValue::Int32(
            downcast::<Int32Array>(array, "Int32Array")?.value(row),
        )),
        DataType::Int64 => Ok(ScalarValue::Int64(
            downcast::<Int64Array>(array, "Int64Array")?.value(row),
        )),
        DataType::Float32 => Ok(ScalarValue::Float32(
            downcast::<Float32Array>(array, "Float32Array")?.value(row),
        )),
        DataType::Float64 => Ok(ScalarValue::Float64(
            downcast::<Float64Array>(array, "Float64Array")?.value(row),
        )),
        DataType::Utf8 => Ok(ScalarValue::Utf8(
            downcast::<StringArray>(array, "StringArray")?
                .value(row)
                .to_string(),
        )),
        DataType::Binary => Ok(ScalarValue::Binary(
            downcast::<BinaryArray>(array, "BinaryArray")?
                .value(row)
                .to_vec(),
        )),
        other => Err(KestrelError::Unsupported(format!(
            "row conversion for column type {other:?}"
        ))),
    }
}

/// Build an arrow array of type `dt` from scalars.
pub fn scalars_to_array(values: &[ScalarValue], dt: &DataType) -> Result<ArrayRef> {
    match dt {
        DataType::Null => Ok(new_null_array(dt, values.len())),
        DataType::Boolean => {
            let mut b = BooleanBuilder::with_capacity(values.len());
            for v in values {
                match v {
                    ScalarValue::Boolean(x) => b.append_value(*x),
                    ScalarValue::Null => b.append_null(),
                    other => return Err(type_mismatch("Boolean", other)),
                }
            }
            Ok(Arc::new(b.finish()))
        }
        DataType::Int32 => {
            let mut b = Int32Builder::with_capacity(values.len());
            for v in values {
                match v {
                    ScalarValue::Int32(x) => b.append_value(*x),
                    ScalarValue::Null => b.append_null(),
                    other => return Err(type_mismatch("Int32", other)),
                }
            }
            Ok(Arc::new(b.finish()))
        }
        DataType::Int64 => {
            let mut b = Int64Builder::with_capacity(values.len());
            for v in values {
                match v {
                    ScalarValue::Int64(x) => b.append_value(*x),
                    ScalarValue::Int32(x) => b.append_value(i64::from(*x)),
                    ScalarValue::Null => b.append_null(),
                    other => return Err(type_mismatch("Int64", other)),
                }
            }
            Ok(Arc::new(b.finish()))
        }
        DataType::Float32 => {
            let mut b = Float32Builder::with_capacity(values.len());
            for v in values {
                match v {
                    ScalarValue::Float32(x) => b.append_value(*x),
                    ScalarValue::Null => b.append_null(),
                    other => return Err(type_mismatch("Float32", other)),
                }
            }
            Ok(Arc::new(b.finish()))
        }
        DataType::Float64 => {
            let mut b = Float64Builder::with_capacity(values.len());
            for v in values {
                match v {
                    ScalarValue::Float64(x) => b.append_value(*x),
                    ScalarValue::Float32(x) => b.append_value(f64::from(*x)),
                    ScalarValue::Int64(x) => b.append_value(*x as f64),
                    ScalarValue::Int32(x) => b.append_value(f64::from(*x)),
                    ScalarValue::Null => b.append_null(),
                    other => return Err(type_mismatch("Float64", other)),
                }
            }
            Ok(Arc::new(b.finish()))
        }
        DataType::Utf8 => {
            let mut b = StringBuilder::with_capacity(values.len(), values.len() * 8);
            for v in values {
                match v {
                    ScalarValue::Utf8(x) => b.append_value(x),
                    ScalarValue::Null => b.append_null(),
                    other => return Err(type_mismatch("Utf8", other)),
                }
            }
            Ok(Arc::new(b.finish()))
        }
        DataType::Binary => {
            let mut b = BinaryBuilder::with_capacity(values.len(), values.len() * 8);
            for v in values {
                match v {
                    ScalarValue::Binary(x) => b.append_value(x),
                    ScalarValue::Null => b.append_null(),
                    other => return Err(type_mismatch("Binary", other)),
                }
            }
            Ok(Arc::new(b.finish()))
        }
        other => Err(KestrelError::Unsupported(format!(
            "array construction for column type {other:?}"
        ))),
    }
}

fn downcast<'a, A: 'static>(array: &'a ArrayRef, name: &str) -> Result<&'a A> {
    array
        .as_any()
        .downcast_ref::<A>()
        .ok_or_else(|| KestrelError::Execution(format!("expected {name}")))
}

fn type_mismatch(target: &str, value: &ScalarValue) -> KestrelError {
    KestrelError::Execution(format!(
        "type mismatch while building {target} array from {value:?}"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nan_sorts_above_numbers() {
        let nan = ScalarValue::Float64(f64::NAN);
        let big = ScalarValue::Float64(f64::INFINITY);
        assert_eq!(nan.cmp_non_null(&big), Ordering::Greater);
        assert_eq!(nan.cmp_non_null(&ScalarValue::Float64(f64::NAN)), Ordering::Equal);
    }

    #[test]
    fn collated_compare_places_nulls_independent_of_direction() {
        let one = ScalarValue::Int64(1);
        let two = ScalarValue::Int64(2);
        let null = ScalarValue::Null;

        assert_eq!(
            one.cmp_collated(&two, SortDirection::Desc, NullOrdering::Last),
            Ordering::Greater
        );
        assert_eq!(
            null.cmp_collated(&two, SortDirection::Desc, NullOrdering::Last),
            Ordering::Greater
        );
        assert_eq!(
            null.cmp_collated(&one, SortDirection::Asc, NullOrdering::First),
            Ordering::Less
        );
    }

    #[test]
    fn mixed_integer_widths_compare_exactly() {
        let a = ScalarValue::Int32(7);
        let b = ScalarValue::Int64(i64::from(i32::MAX) + 1);
        assert_eq!(a.cmp_non_null(&b), Ordering::Less);
    }

    #[test]
    fn array_conversion_keeps_nulls() {
        let values = vec![
            ScalarValue::Utf8("a".to_string()),
            ScalarValue::Null,
            ScalarValue::Utf8("c".to_string()),
        ];
        let arr = scalars_to_array(&values, &DataType::Utf8).expect("build");
        assert_eq!(arr.null_count(), 1);
        assert_eq!(scalar_from_array(&arr, 1).expect("read"), ScalarValue::Null);
        assert_eq!(
            scalar_from_array(&arr, 2).expect("read"),
            ScalarValue::Utf8("c".to_string())
        );
    }

    #[test]
    fn array_conversion_rejects_foreign_values() {
        let err = scalars_to_array(&[ScalarValue::Utf8("x".to_string())], &DataType::Int32)
            .expect_err("mismatch");
        assert!(err.to_string().contains("Int32"));
    }
}
