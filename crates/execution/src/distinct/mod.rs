//! Single-column DISTINCT executors.
//!
//! One generic implementation per mode (ordered / unordered) is instantiated
//! for every supported [`DistinctValue`] by [`create_distinct_executor`].

mod order_by;
mod table;
mod unordered;
mod value;

use arrow::array::ArrayRef;
use arrow_schema::DataType;
use kestrel_common::{KestrelError, Result};
use kestrel_planner::{NullOrdering, SortDirection};

pub use order_by::OrderedDistinctExecutor;
pub use table::DistinctTable;
pub use unordered::UnorderedDistinctExecutor;
pub use value::DistinctValue;

/// Retains distinct values of one column across input batches.
pub trait DistinctExecutor: Send {
    /// Admit every value of `input`.
    ///
    /// Returns `true` once further input cannot change the result.
    fn process(&mut self, input: &ArrayRef) -> Result<bool>;

    /// Whether a null was observed with null handling enabled.
    fn has_null(&self) -> bool;

    /// Number of retained non-null values.
    fn num_values(&self) -> usize;

    /// Element type of the published values.
    fn data_type(&self) -> DataType;

    /// Publish the retained values. Leaves the executor empty.
    fn finish(&mut self) -> DistinctTable;
}

/// ORDER BY of a distinct executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DistinctOrder {
    /// Keep the values sorting first under this direction.
    pub direction: SortDirection,
    /// Placement of the null row in the published result.
    pub nulls: NullOrdering,
}

/// Construction parameters shared by every distinct executor.
#[derive(Debug, Clone, Copy)]
pub struct DistinctOptions {
    /// Ordering, or `None` for first-seen retention.
    pub order: Option<DistinctOrder>,
    /// Max published rows, null included. Must be positive.
    pub limit: usize,
    /// Count nulls separately instead of admitting stored placeholders.
    pub null_handling_enabled: bool,
    /// Cap on eager allocation.
    pub max_initial_capacity: usize,
}

/// Build the executor for a column of `input_type`.
///
/// `List` columns are multi-valued; the executor is chosen by element type.
pub fn create_distinct_executor(
    input_type: &DataType,
    options: DistinctOptions,
) -> Result<Box<dyn DistinctExecutor>> {
    let value_type = match input_type {
        DataType::List(field) => field.data_type(),
        other => other,
    };
    match value_type {
        DataType::Int32 => Ok(boxed::<i32>(options)),
        DataType::Int64 => Ok(boxed::<i64>(options)),
        DataType::Float32 => Ok(boxed::<f32>(options)),
        DataType::Float64 => Ok(boxed::<f64>(options)),
        DataType::Utf8 => Ok(boxed::<String>(options)),
        DataType::Binary => Ok(boxed::<Vec<u8>>(options)),
        other => Err(KestrelError::Unsupported(format!(
            "distinct over column type {other:?}"
        ))),
    }
}

fn boxed<V: DistinctValue>(options: DistinctOptions) -> Box<dyn DistinctExecutor> {
    match options.order {
        Some(order) => Box::new(OrderedDistinctExecutor::<V>::new(
            order.direction,
            order.nulls,
            options.limit,
            options.null_handling_enabled,
            options.max_initial_capacity,
        )),
        None => Box::new(UnorderedDistinctExecutor::<V>::new(
            options.limit,
            options.null_handling_enabled,
            options.max_initial_capacity,
        )),
    }
}
