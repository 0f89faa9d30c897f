use arrow::array::ArrayRef;
use arrow_schema::DataType;
use kestrel_common::Result;
use kestrel_planner::{NullOrdering, SortDirection};

use super::DistinctExecutor;
use super::table::DistinctTable;
use super::value::{DistinctValue, read_column};
use crate::collation::ValueCollator;
use crate::membership::HashMembership;
use crate::ranking_queue::BoundedRankingQueue;
use crate::retention::TopKRetainer;
use crate::scalar::ScalarValue;

/// Distinct with ORDER BY: keeps the `limit` best distinct values.
///
/// Once a null has been counted one slot stays reserved for it, so later
/// admissions see `limit - 1` live slots. Values already retained at that
/// point are kept until [`DistinctExecutor::finish`] trims the worst.
pub struct OrderedDistinctExecutor<V: DistinctValue> {
    retainer: TopKRetainer<V, ValueCollator, HashMembership<V>>,
    nulls: NullOrdering,
    limit: usize,
    null_handling: bool,
    has_null: bool,
}

impl<V: DistinctValue> OrderedDistinctExecutor<V> {
    /// # Panics
    /// When `limit` is zero.
    pub fn new(
        direction: SortDirection,
        nulls: NullOrdering,
        limit: usize,
        null_handling: bool,
        max_initial_capacity: usize,
    ) -> Self {
        let initial = limit.min(max_initial_capacity);
        let queue = BoundedRankingQueue::new(limit, initial, ValueCollator::new(direction));
        Self {
            retainer: TopKRetainer::new(queue, HashMembership::with_capacity(initial)),
            nulls,
            limit,
            null_handling,
            has_null: false,
        }
    }

    fn live_slots(&self) -> usize {
        self.limit - usize::from(self.has_null)
    }
}

impl<V: DistinctValue> DistinctExecutor for OrderedDistinctExecutor<V> {
    fn process(&mut self, input: &ArrayRef) -> Result<bool> {
        for value in read_column::<V>(input, self.null_handling)? {
            match value {
                Some(v) => {
                    let slots = self.live_slots();
                    self.retainer.admit(v, slots);
                }
                None => self.has_null = true,
            }
        }
        Ok(false)
    }

    fn has_null(&self) -> bool {
        self.has_null
    }

    fn num_values(&self) -> usize {
        self.retainer.len()
    }

    fn data_type(&self) -> DataType {
        V::data_type()
    }

    fn finish(&mut self) -> DistinctTable {
        let mut best_first = self.retainer.drain_best_first(0);
        best_first.truncate(self.live_slots());
        let mut values: Vec<ScalarValue> = best_first.into_iter().map(V::into_scalar).collect();
        if self.has_null {
            match self.nulls {
                NullOrdering::First => values.insert(0, ScalarValue::Null),
                NullOrdering::Last => values.push(ScalarValue::Null),
            }
        }
        DistinctTable {
            data_type: V::data_type(),
            values,
            has_null: self.has_null,
        }
    }
}
