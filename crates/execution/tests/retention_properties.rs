use std::collections::HashSet;
use std::sync::Arc;

use arrow::array::{ArrayRef, Int32Array};
use arrow_schema::{DataType, Field, Schema, SchemaRef};
use kestrel_common::EngineConfig;
use kestrel_execution::{
    Block, DistinctOptions, DistinctOrder, Row, ScalarValue, SortRetentionExecutor,
    create_distinct_executor,
};
use kestrel_planner::{CollationKey, NullOrdering, SortDirection};
use proptest::prelude::*;

fn schema() -> SchemaRef {
    Arc::new(Schema::new(vec![Field::new("v", DataType::Int64, true)]))
}

fn arb_direction() -> impl Strategy<Value = SortDirection> {
    prop_oneof![Just(SortDirection::Asc), Just(SortDirection::Desc)]
}

fn sorted(values: &[i64], direction: SortDirection) -> Vec<i64> {
    let mut out = values.to_vec();
    out.sort_unstable();
    if !direction.is_asc() {
        out.reverse();
    }
    out
}

fn page_values(block: Block) -> Vec<i64> {
    match block {
        Block::Data(data) => data
            .into_rows()
            .expect("rows")
            .into_iter()
            .map(|r| match r[0] {
                ScalarValue::Int64(v) => v,
                ref other => panic!("unexpected {other:?}"),
            })
            .collect(),
        Block::EndOfStream => Vec::new(),
        other => panic!("unexpected block {:?}", other.kind()),
    }
}

fn rows(values: &[i64]) -> Vec<Row> {
    values.iter().map(|v| vec![ScalarValue::Int64(*v)]).collect()
}

fn sort_executor(
    direction: SortDirection,
    fetch: i64,
    offset: i64,
    input_sorted: bool,
) -> SortRetentionExecutor {
    let key = match direction {
        SortDirection::Asc => CollationKey::asc(0),
        SortDirection::Desc => CollationKey::desc(0),
    };
    SortRetentionExecutor::try_new(
        schema(),
        vec![key],
        fetch,
        offset,
        input_sorted,
        &EngineConfig::default(),
    )
    .expect("executor")
}

fn int_column(values: &[Option<i32>]) -> ArrayRef {
    Arc::new(Int32Array::from(values.to_vec()))
}

fn distinct_reference(values: &[i32], direction: SortDirection, keep: usize) -> Vec<i32> {
    let mut seen = HashSet::new();
    let mut out: Vec<i32> = values.iter().copied().filter(|v| seen.insert(*v)).collect();
    out.sort_unstable();
    if !direction.is_asc() {
        out.reverse();
    }
    out.truncate(keep);
    out
}

proptest! {
    #[test]
    fn sort_page_matches_sort_then_truncate(
        values in prop::collection::vec(-50_i64..50, 0..120),
        fetch in 1_i64..20,
        offset in 0_i64..12,
        direction in arb_direction(),
        chunk in 1_usize..9,
    ) {
        let mut ex = sort_executor(direction, fetch, offset, false);
        for part in values.chunks(chunk) {
            ex.admit_rows(rows(part)).expect("admit");
            prop_assert!(ex.retained() <= ex.rows_to_keep());
        }
        let expected: Vec<i64> = sorted(&values, direction)
            .into_iter()
            .skip(offset as usize)
            .take(fetch as usize)
            .collect();
        let expected_len = (values.len() as i64 - offset).clamp(0, fetch) as usize;
        prop_assert_eq!(expected.len(), expected_len);
        prop_assert_eq!(page_values(ex.produce_final_page()), expected);
        prop_assert!(matches!(ex.produce_final_page(), Block::EndOfStream));
    }

    #[test]
    fn positional_and_ranked_paths_agree(
        values in prop::collection::vec(-20_i64..20, 0..80),
        fetch in 1_i64..15,
        offset in 0_i64..6,
        direction in arb_direction(),
    ) {
        let ordered = sorted(&values, direction);
        let mut fast = sort_executor(direction, fetch, offset, true);
        fast.admit_rows(rows(&ordered)).expect("admit");
        let mut general = sort_executor(direction, fetch, offset, false);
        general.admit_rows(rows(&values)).expect("admit");
        prop_assert!(fast.is_positional());
        prop_assert!(!general.is_positional());
        prop_assert_eq!(
            page_values(fast.produce_final_page()),
            page_values(general.produce_final_page())
        );
    }

    #[test]
    fn ordered_distinct_keeps_true_top_k(
        values in prop::collection::vec(-30_i32..30, 0..150),
        limit in 1_usize..12,
        direction in arb_direction(),
    ) {
        let options = DistinctOptions {
            order: Some(DistinctOrder { direction, nulls: NullOrdering::Last }),
            limit,
            null_handling_enabled: false,
            max_initial_capacity: 4,
        };
        let mut ex = create_distinct_executor(&DataType::Int32, options).expect("executor");
        for part in values.chunks(7) {
            let column: Vec<Option<i32>> = part.iter().copied().map(Some).collect();
            ex.process(&int_column(&column)).expect("process");
            prop_assert!(ex.num_values() <= limit);
        }
        let table = ex.finish();
        let published: Vec<i32> = table
            .values
            .iter()
            .map(|v| match v {
                ScalarValue::Int32(x) => *x,
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        let unique: HashSet<i32> = published.iter().copied().collect();
        prop_assert_eq!(unique.len(), published.len());
        prop_assert_eq!(published, distinct_reference(&values, direction, limit));
    }

    #[test]
    fn null_accounting_trims_to_limit(
        values in prop::collection::vec(prop::option::weighted(0.8, -10_i32..10), 0..80),
        limit in 1_usize..8,
        direction in arb_direction(),
    ) {
        let options = DistinctOptions {
            order: Some(DistinctOrder { direction, nulls: NullOrdering::Last }),
            limit,
            null_handling_enabled: true,
            max_initial_capacity: 16,
        };
        let mut ex = create_distinct_executor(&DataType::Int32, options).expect("executor");
        ex.process(&int_column(&values)).expect("process");

        let saw_null = values.iter().any(Option::is_none);
        prop_assert_eq!(ex.has_null(), saw_null);

        let table = ex.finish();
        prop_assert!(table.len() <= limit);
        let non_null: Vec<i32> = values.iter().flatten().copied().collect();
        let mut expected: Vec<ScalarValue> =
            distinct_reference(&non_null, direction, limit - usize::from(saw_null))
                .into_iter()
                .map(ScalarValue::Int32)
                .collect();
        if saw_null {
            expected.push(ScalarValue::Null);
        }
        prop_assert_eq!(table.values, expected);
    }
}
