//! Comparators that rank retained elements.
//!
//! Retention structures never see a sort direction directly; they consume a
//! [`Preference`], where `Greater` means "more worth keeping". The collators
//! here translate planner collations into that form.

use std::cmp::Ordering;

use arrow_schema::SchemaRef;
use kestrel_common::{KestrelError, Result};
use kestrel_planner::{CollationKey, SortDirection};

use crate::block::Row;
use crate::scalar::{ScalarValue, cmp_f64};

/// Keep-ranking over elements of type `T`.
///
/// `prefer(a, b) == Greater` means `a` should be kept over `b`. Must be a
/// total order.
pub trait Preference<T>: Send {
    /// Rank `a` against `b`.
    fn prefer(&self, a: &T, b: &T) -> Ordering;
}

/// Natural total order of a scalar element type.
pub trait TotalOrder {
    /// Compare two non-null values.
    fn total_cmp(&self, other: &Self) -> Ordering;
}

impl TotalOrder for i32 {
    fn total_cmp(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }
}

impl TotalOrder for i64 {
    fn total_cmp(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }
}

impl TotalOrder for f32 {
    fn total_cmp(&self, other: &Self) -> Ordering {
        cmp_f64(f64::from(*self), f64::from(*other))
    }
}

impl TotalOrder for f64 {
    fn total_cmp(&self, other: &Self) -> Ordering {
        cmp_f64(*self, *other)
    }
}

impl TotalOrder for String {
    fn total_cmp(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }
}

impl TotalOrder for Vec<u8> {
    fn total_cmp(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }
}

impl TotalOrder for ScalarValue {
    fn total_cmp(&self, other: &Self) -> Ordering {
        self.cmp_non_null(other)
    }
}

/// Single-key collator used by distinct-with-order-by.
///
/// ASC keeps the smallest values, DESC the largest.
#[derive(Debug, Clone, Copy)]
pub struct ValueCollator {
    direction: SortDirection,
}

impl ValueCollator {
    /// Collator keeping values that sort first under `direction`.
    pub fn new(direction: SortDirection) -> Self {
        Self { direction }
    }

    /// Emission order: `Less` means `a` is published before `b`.
    pub fn order<V: TotalOrder>(&self, a: &V, b: &V) -> Ordering {
        let ord = a.total_cmp(b);
        if self.direction.is_asc() { ord } else { ord.reverse() }
    }
}

impl<V: TotalOrder> Preference<V> for ValueCollator {
    fn prefer(&self, a: &V, b: &V) -> Ordering {
        self.order(b, a)
    }
}

/// Multi-key row collator used by sort-with-limit.
#[derive(Debug, Clone)]
pub struct RowCollator {
    keys: Vec<CollationKey>,
}

impl RowCollator {
    /// Build a collator, checking every key addresses a column of `schema`.
    pub fn try_new(keys: Vec<CollationKey>, schema: &SchemaRef) -> Result<Self> {
        let width = schema.fields().len();
        if let Some(bad) = keys.iter().find(|k| k.column >= width) {
            return Err(KestrelError::Planning(format!(
                "collation key column {} out of range for {width}-column input",
                bad.column
            )));
        }
        Ok(Self { keys })
    }

    /// Sort keys in priority order.
    pub fn keys(&self) -> &[CollationKey] {
        &self.keys
    }

    /// Emission order: `Less` means `a` is published before `b`.
    pub fn order(&self, a: &Row, b: &Row) -> Ordering {
        for key in &self.keys {
            let ord = a[key.column].cmp_collated(&b[key.column], key.direction, key.nulls);
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }
}

impl Preference<Row> for RowCollator {
    fn prefer(&self, a: &Row, b: &Row) -> Ordering {
        self.order(b, a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow_schema::{DataType, Field, Schema};
    use kestrel_planner::NullOrdering;
    use std::sync::Arc;

    #[test]
    fn asc_value_collator_prefers_smaller() {
        let c = ValueCollator::new(SortDirection::Asc);
        assert_eq!(c.prefer(&1_i64, &3_i64), Ordering::Greater);
        assert_eq!(c.prefer(&3.0_f64, &1.0_f64), Ordering::Less);
        assert_eq!(c.prefer(&2_i32, &2_i32), Ordering::Equal);
    }

    #[test]
    fn desc_value_collator_prefers_larger() {
        let c = ValueCollator::new(SortDirection::Desc);
        assert_eq!(
            c.prefer(&"b".to_string(), &"a".to_string()),
            Ordering::Greater
        );
        assert_eq!(c.order(&9.0_f64, &5.0_f64), Ordering::Less);
    }

    #[test]
    fn row_collator_breaks_ties_on_later_keys() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("a", DataType::Int64, true),
            Field::new("b", DataType::Utf8, true),
        ]));
        let c = RowCollator::try_new(vec![CollationKey::asc(0), CollationKey::desc(1)], &schema)
            .expect("collator");
        let r1 = vec![ScalarValue::Int64(1), ScalarValue::Utf8("x".to_string())];
        let r2 = vec![ScalarValue::Int64(1), ScalarValue::Utf8("y".to_string())];
        let r3 = vec![ScalarValue::Null, ScalarValue::Utf8("z".to_string())];

        assert_eq!(c.order(&r2, &r1), Ordering::Less);
        assert_eq!(c.order(&r1, &r3), Ordering::Less);
        assert_eq!(c.prefer(&r2, &r1), Ordering::Greater);
    }

    #[test]
    fn row_collator_honors_nulls_first() {
        let schema = Arc::new(Schema::new(vec![Field::new("a", DataType::Int64, true)]));
        let c = RowCollator::try_new(
            vec![CollationKey::asc(0).with_nulls(NullOrdering::First)],
            &schema,
        )
        .expect("collator");
        let null = vec![ScalarValue::Null];
        let one = vec![ScalarValue::Int64(1)];
        assert_eq!(c.order(&null, &one), Ordering::Less);
    }

    #[test]
    fn out_of_range_key_is_a_planning_error() {
        let schema = Arc::new(Schema::new(vec![Field::new("a", DataType::Int64, true)]));
        let err = RowCollator::try_new(vec![CollationKey::asc(3)], &schema).expect_err("range");
        assert!(matches!(err, KestrelError::Planning(_)));
    }
}
