use arrow::array::ArrayRef;
use arrow_schema::DataType;
use kestrel_common::Result;

use super::DistinctExecutor;
use super::table::DistinctTable;
use super::value::{DistinctValue, read_column};
use crate::membership::{HashMembership, Membership};
use crate::scalar::ScalarValue;

/// Distinct without ORDER BY: the first `limit` distinct values win.
///
/// No ranking and no replacement. Insertion order is published as is, the
/// null (if any) last.
pub struct UnorderedDistinctExecutor<V: DistinctValue> {
    values: Vec<V>,
    membership: HashMembership<V>,
    limit: usize,
    null_handling: bool,
    has_null: bool,
}

impl<V: DistinctValue> UnorderedDistinctExecutor<V> {
    /// # Panics
    /// When `limit` is zero.
    pub fn new(limit: usize, null_handling: bool, max_initial_capacity: usize) -> Self {
        assert!(limit > 0, "distinct limit must be positive");
        let initial = limit.min(max_initial_capacity);
        Self {
            values: Vec::with_capacity(initial),
            membership: HashMembership::with_capacity(initial),
            limit,
            null_handling,
            has_null: false,
        }
    }

    fn live_slots(&self) -> usize {
        self.limit - usize::from(self.has_null)
    }

    fn satisfied(&self) -> bool {
        self.values.len() >= self.live_slots()
    }
}

impl<V: DistinctValue> DistinctExecutor for UnorderedDistinctExecutor<V> {
    fn process(&mut self, input: &ArrayRef) -> Result<bool> {
        for value in read_column::<V>(input, self.null_handling)? {
            match value {
                Some(v) => {
                    if self.membership.contains(&v) {
                        continue;
                    }
                    if self.values.len() < self.live_slots() {
                        self.membership.insert(&v);
                        self.values.push(v);
                    }
                }
                None => self.has_null = true,
            }
            if self.satisfied() {
                return Ok(true);
            }
        }
        Ok(self.satisfied())
    }

    fn has_null(&self) -> bool {
        self.has_null
    }

    fn num_values(&self) -> usize {
        self.values.len()
    }

    fn data_type(&self) -> DataType {
        V::data_type()
    }

    fn finish(&mut self) -> DistinctTable {
        let keep = self.live_slots();
        let mut values: Vec<ScalarValue> = std::mem::take(&mut self.values)
            .into_iter()
            .take(keep)
            .map(V::into_scalar)
            .collect();
        if self.has_null {
            values.push(ScalarValue::Null);
        }
        DistinctTable {
            data_type: V::data_type(),
            values,
            has_null: self.has_null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::StringArray;
    use std::sync::Arc;

    #[test]
    fn first_distinct_values_win_in_arrival_order() {
        let mut ex = UnorderedDistinctExecutor::<String>::new(3, false, 16);
        let input: ArrayRef = Arc::new(StringArray::from(vec!["b", "a", "b", "c", "d"]));
        assert!(ex.process(&input).expect("process"));
        let table = ex.finish();
        assert_eq!(
            table.values,
            vec![
                ScalarValue::Utf8("b".to_string()),
                ScalarValue::Utf8("a".to_string()),
                ScalarValue::Utf8("c".to_string()),
            ]
        );
    }

    #[test]
    fn null_counts_toward_satisfaction() {
        let mut ex = UnorderedDistinctExecutor::<String>::new(2, true, 16);
        let input: ArrayRef = Arc::new(StringArray::from(vec![Some("x"), None]));
        assert!(ex.process(&input).expect("process"));
        let table = ex.finish();
        assert_eq!(
            table.values,
            vec![ScalarValue::Utf8("x".to_string()), ScalarValue::Null]
        );
        assert!(table.has_null);
    }

    #[test]
    fn unsatisfied_until_limit_reached() {
        let mut ex = UnorderedDistinctExecutor::<String>::new(5, false, 16);
        let input: ArrayRef = Arc::new(StringArray::from(vec!["a", "a", "b"]));
        assert!(!ex.process(&input).expect("process"));
        assert_eq!(ex.num_values(), 2);
    }
}
