//! Element types a distinct executor can retain, and how they are read from arrow.

use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, BinaryArray, Float32Array, Float64Array, Int32Array, Int64Array, ListArray,
    StringArray,
};
use arrow_schema::DataType;
use kestrel_common::{KestrelError, Result};

use crate::collation::TotalOrder;
use crate::membership::MembershipKey;
use crate::scalar::ScalarValue;

/// A scalar type with a distinct executor implementation.
pub trait DistinctValue: TotalOrder + MembershipKey + Clone + Send + Sync + 'static {
    /// Arrow type of a single-valued column of this element.
    fn data_type() -> DataType;

    /// Every slot of `array` as stored, ignoring validity.
    ///
    /// Null slots yield whatever placeholder the array holds (zero, empty
    /// string); callers consult the null buffer when they care.
    fn raw_values(array: &dyn Array) -> Result<Vec<Self>>;

    /// Owned scalar for publication.
    fn into_scalar(self) -> ScalarValue;
}

fn downcast<'a, A: Array + 'static>(array: &'a dyn Array, expected: &str) -> Result<&'a A> {
    array.as_any().downcast_ref::<A>().ok_or_else(|| {
        KestrelError::Execution(format!(
            "distinct input expected {expected}, got {:?}",
            array.data_type()
        ))
    })
}

impl DistinctValue for i32 {
    fn data_type() -> DataType {
        DataType::Int32
    }

    fn raw_values(array: &dyn Array) -> Result<Vec<Self>> {
        Ok(downcast::<Int32Array>(array, "Int32")?.values().to_vec())
    }

    fn into_scalar(self) -> ScalarValue {
        ScalarValue::Int32(self)
    }
}

impl DistinctValue for i64 {
    fn data_type() -> DataType {
        DataType::Int64
    }

    fn raw_values(array: &dyn Array) -> Result<Vec<Self>> {
        Ok(downcast::<Int64Array>(array, "Int64")?.values().to_vec())
    }

    fn into_scalar(self) -> ScalarValue {
        ScalarValue::Int64(self)
    }
}

impl DistinctValue for f32 {
    fn data_type() -> DataType {
        DataType::Float32
    }

    fn raw_values(array: &dyn Array) -> Result<Vec<Self>> {
        Ok(downcast::<Float32Array>(array, "Float32")?.values().to_vec())
    }

    fn into_scalar(self) -> ScalarValue {
        ScalarValue::Float32(self)
    }
}

impl DistinctValue for f64 {
    fn data_type() -> DataType {
        DataType::Float64
    }

    fn raw_values(array: &dyn Array) -> Result<Vec<Self>> {
        Ok(downcast::<Float64Array>(array, "Float64")?.values().to_vec())
    }

    fn into_scalar(self) -> ScalarValue {
        ScalarValue::Float64(self)
    }
}

impl DistinctValue for String {
    fn data_type() -> DataType {
        DataType::Utf8
    }

    fn raw_values(array: &dyn Array) -> Result<Vec<Self>> {
        let a = downcast::<StringArray>(array, "Utf8")?;
        Ok((0..a.len()).map(|i| a.value(i).to_string()).collect())
    }

    fn into_scalar(self) -> ScalarValue {
        ScalarValue::Utf8(self)
    }
}

impl DistinctValue for Vec<u8> {
    fn data_type() -> DataType {
        DataType::Binary
    }

    fn raw_values(array: &dyn Array) -> Result<Vec<Self>> {
        let a = downcast::<BinaryArray>(array, "Binary")?;
        Ok((0..a.len()).map(|i| a.value(i).to_vec()).collect())
    }

    fn into_scalar(self) -> ScalarValue {
        ScalarValue::Binary(self)
    }
}

/// Flatten one input column into admission order.
///
/// `None` marks a null to be counted. Single-valued columns report nulls only
/// when `null_handling` is on; otherwise the stored placeholder is admitted as
/// a value. Multi-valued (`List`) columns admit every non-null element of
/// every non-null row and never report nulls.
pub(crate) fn read_column<V: DistinctValue>(
    array: &ArrayRef,
    null_handling: bool,
) -> Result<Vec<Option<V>>> {
    if let DataType::List(_) = array.data_type() {
        let list = downcast::<ListArray>(array.as_ref(), "List")?;
        let mut out = Vec::with_capacity(list.values().len());
        for row in 0..list.len() {
            if list.is_null(row) {
                continue;
            }
            let items: Arc<dyn Array> = list.value(row);
            let raw = V::raw_values(items.as_ref())?;
            out.extend(
                raw.into_iter()
                    .enumerate()
                    .filter(|(idx, _)| items.is_valid(*idx))
                    .map(|(_, v)| Some(v)),
            );
        }
        return Ok(out);
    }

    let raw = V::raw_values(array.as_ref())?;
    let nulls = if null_handling {
        array.logical_nulls()
    } else {
        None
    };
    Ok(match nulls {
        Some(nulls) => raw
            .into_iter()
            .enumerate()
            .map(|(idx, v)| if nulls.is_null(idx) { None } else { Some(v) })
            .collect(),
        None => raw.into_iter().map(Some).collect(),
    })
}
