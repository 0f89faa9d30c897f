use arrow::array::ArrayRef;
use arrow_schema::DataType;
use kestrel_common::Result;

use crate::scalar::{ScalarValue, scalars_to_array};

/// Published result of a distinct executor.
#[derive(Debug, Clone, PartialEq)]
pub struct DistinctTable {
    /// Element type of [`Self::values`].
    pub data_type: DataType,
    /// Distinct values in publication order, the null (if any) included.
    pub values: Vec<ScalarValue>,
    /// Whether a null was observed with null handling enabled.
    pub has_null: bool,
}

impl DistinctTable {
    /// Number of published rows.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether nothing is published.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The values as one arrow column.
    pub fn to_array(&self) -> Result<ArrayRef> {
        scalars_to_array(&self.values, &self.data_type)
    }
}
