use std::sync::Arc;
use std::sync::atomic::Ordering;

use arrow::array::{Array, Float64Array, Int64Array, Int64Builder, ListBuilder};
use arrow::record_batch::RecordBatch;
use arrow_schema::{DataType, Field, Schema, SchemaRef};
use kestrel_common::{EngineConfig, KestrelError, OpChainId, QueryId, StageId};
use kestrel_execution::{
    Block, DataBlock, DistinctOperator, OpChainContext, Operator, ScalarValue,
    SharedOpChainContext, ValuesOperator,
};
use kestrel_planner::{Expr, NullOrdering, OrderByExpr, SortDirection};

fn ctx() -> SharedOpChainContext {
    Arc::new(OpChainContext::new(
        OpChainId {
            query_id: QueryId(11),
            stage_id: StageId(2),
            instance: 1,
        },
        EngineConfig::default(),
    ))
}

fn doubles(values: &[f64]) -> Block {
    let schema: SchemaRef = Arc::new(Schema::new(vec![Field::new("x", DataType::Float64, true)]));
    let batch = RecordBatch::try_new(schema, vec![Arc::new(Float64Array::from(values.to_vec()))])
        .expect("batch");
    Block::Data(DataBlock::from_batch(batch))
}

fn single_column(block: Block) -> Vec<ScalarValue> {
    match block {
        Block::Data(data) => data
            .into_rows()
            .expect("rows")
            .into_iter()
            .map(|mut r| r.remove(0))
            .collect(),
        other => panic!("expected data, got {:?}", other.kind()),
    }
}

#[test]
fn desc_distinct_publishes_top_three() {
    let schema: SchemaRef = Arc::new(Schema::new(vec![Field::new("x", DataType::Float64, true)]));
    let input = ValuesOperator::scripted(
        schema,
        vec![
            doubles(&[2.0, 5.0, 2.0]),
            Block::NoOp,
            doubles(&[9.0, 1.0, 9.0]),
            Block::EndOfStream,
        ],
    );
    let key = Expr::column_ref("x", 0);
    let order = OrderByExpr::new(key.clone(), SortDirection::Desc);
    let mut op = DistinctOperator::try_new(Box::new(input), &key, Some(&order), 3, false, ctx())
        .expect("distinct");

    assert!(matches!(op.next_block(), Block::NoOp));
    assert_eq!(
        single_column(op.next_block()),
        vec![
            ScalarValue::Float64(9.0),
            ScalarValue::Float64(5.0),
            ScalarValue::Float64(2.0)
        ]
    );
    assert!(matches!(op.next_block(), Block::EndOfStream));
    assert_eq!(op.schema().field(0).name(), "x");
}

#[test]
fn null_reserves_slot_under_asc() {
    let schema: SchemaRef = Arc::new(Schema::new(vec![Field::new("n", DataType::Int64, true)]));
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![Arc::new(Int64Array::from(vec![None, Some(3), Some(7), Some(1)]))],
    )
    .expect("batch");
    let input = ValuesOperator::scripted(
        schema,
        vec![Block::Data(DataBlock::from_batch(batch)), Block::EndOfStream],
    );
    let key = Expr::Column("n".to_string());
    let order = OrderByExpr::new(key.clone(), SortDirection::Asc);
    let mut op = DistinctOperator::try_new(Box::new(input), &key, Some(&order), 2, true, ctx())
        .expect("distinct");

    let page = op.next_block();
    assert!(op.retention().has_null());
    assert_eq!(
        single_column(page),
        vec![ScalarValue::Int64(1), ScalarValue::Null]
    );
}

#[test]
fn nulls_first_ordering_places_null_first() {
    let schema: SchemaRef = Arc::new(Schema::new(vec![Field::new("n", DataType::Int64, true)]));
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![Arc::new(Int64Array::from(vec![Some(4), None, Some(8)]))],
    )
    .expect("batch");
    let input = ValuesOperator::scripted(schema, vec![Block::Data(DataBlock::from_batch(batch))]);
    let key = Expr::column_ref("n", 0);
    let mut order = OrderByExpr::new(key.clone(), SortDirection::Desc);
    order.nulls = NullOrdering::First;
    let mut op = DistinctOperator::try_new(Box::new(input), &key, Some(&order), 5, true, ctx())
        .expect("distinct");
    assert_eq!(
        single_column(op.next_block()),
        vec![ScalarValue::Null, ScalarValue::Int64(8), ScalarValue::Int64(4)]
    );
}

#[test]
fn satisfied_unordered_distinct_still_drains_upstream() {
    let schema: SchemaRef = Arc::new(Schema::new(vec![Field::new("x", DataType::Float64, true)]));
    let input = ValuesOperator::scripted(
        schema,
        vec![
            doubles(&[1.0, 2.0]),
            doubles(&[3.0]),
            doubles(&[4.0]),
            Block::EndOfStream,
        ],
    );
    let pulls = input.pull_counter();
    let key = Expr::column_ref("x", 0);
    let mut op =
        DistinctOperator::try_new(Box::new(input), &key, None, 2, false, ctx()).expect("distinct");

    assert_eq!(
        single_column(op.next_block()),
        vec![ScalarValue::Float64(1.0), ScalarValue::Float64(2.0)]
    );
    assert_eq!(pulls.load(Ordering::Relaxed), 4);
    assert_eq!(op.stats().rows_in, 4);
}

#[test]
fn multi_valued_rows_contribute_every_element() {
    let mut builder = ListBuilder::new(Int64Builder::new());
    builder.values().append_value(5);
    builder.values().append_value(3);
    builder.append(true);
    builder.values().append_value(5);
    builder.values().append_null();
    builder.append(true);
    builder.values().append_value(8);
    builder.append(true);
    let list = builder.finish();
    let schema: SchemaRef = Arc::new(Schema::new(vec![Field::new(
        "tags",
        list.data_type().clone(),
        true,
    )]));
    let batch = RecordBatch::try_new(schema.clone(), vec![Arc::new(list)]).expect("batch");
    let input = ValuesOperator::scripted(schema, vec![Block::Data(DataBlock::from_batch(batch))]);
    let key = Expr::column_ref("tags", 0);
    let order = OrderByExpr::new(key.clone(), SortDirection::Asc);
    let mut op = DistinctOperator::try_new(Box::new(input), &key, Some(&order), 10, true, ctx())
        .expect("distinct");

    assert_eq!(op.schema().field(0).data_type(), &DataType::Int64);
    assert_eq!(
        single_column(op.next_block()),
        vec![
            ScalarValue::Int64(3),
            ScalarValue::Int64(5),
            ScalarValue::Int64(8)
        ]
    );
}

#[test]
fn order_by_on_other_expression_is_rejected() {
    let schema: SchemaRef = Arc::new(Schema::new(vec![
        Field::new("a", DataType::Int64, true),
        Field::new("b", DataType::Int64, true),
    ]));
    let input = ValuesOperator::scripted(schema, vec![]);
    let order = OrderByExpr::new(Expr::column_ref("b", 1), SortDirection::Asc);
    let err = DistinctOperator::try_new(
        Box::new(input),
        &Expr::column_ref("a", 0),
        Some(&order),
        3,
        false,
        ctx(),
    )
    .err();
    assert!(matches!(err, Some(KestrelError::Planning(_))));
}

#[test]
fn empty_input_ends_without_rows() {
    let schema: SchemaRef = Arc::new(Schema::new(vec![Field::new("x", DataType::Float64, true)]));
    let input = ValuesOperator::scripted(schema, vec![Block::EndOfStream]);
    let key = Expr::column_ref("x", 0);
    let mut op =
        DistinctOperator::try_new(Box::new(input), &key, None, 4, true, ctx()).expect("distinct");
    assert!(matches!(op.next_block(), Block::EndOfStream));
}
