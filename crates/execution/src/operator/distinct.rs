use std::sync::Arc;

use arrow::record_batch::RecordBatch;
use arrow_schema::{Field, Schema, SchemaRef};
use kestrel_common::{KestrelError, Result};
use kestrel_planner::{Expr, OrderByExpr};

use super::shell::{BlockRetention, RetentionOperator};
use super::BoxedOperator;
use crate::block::{Block, DataBlock};
use crate::context::SharedOpChainContext;
use crate::distinct::{DistinctExecutor, DistinctOptions, DistinctOrder, create_distinct_executor};
use crate::expressions::{PhysicalExpr, compile_expr};

/// Single-column DISTINCT operator, optionally ordered.
pub type DistinctOperator = RetentionOperator<DistinctRetention>;

/// Evaluates the distinct key per block and feeds a [`DistinctExecutor`].
pub struct DistinctRetention {
    key: Arc<dyn PhysicalExpr>,
    executor: Box<dyn DistinctExecutor>,
    schema: SchemaRef,
    ordered: bool,
    limit: usize,
    drained: bool,
}

impl DistinctRetention {
    /// Number of retained non-null values.
    pub fn num_values(&self) -> usize {
        self.executor.num_values()
    }

    /// Whether a null has been counted.
    pub fn has_null(&self) -> bool {
        self.executor.has_null()
    }
}

impl BlockRetention for DistinctRetention {
    fn output_schema(&self) -> SchemaRef {
        self.schema.clone()
    }

    fn admit_block(&mut self, block: DataBlock) -> Result<bool> {
        let batch = block.to_record_batch()?;
        let column = self.key.evaluate(&batch)?;
        self.executor.process(&column)
    }

    fn produce_final_page(&mut self) -> Result<Block> {
        if self.drained {
            return Ok(Block::EndOfStream);
        }
        self.drained = true;
        let table = self.executor.finish();
        if table.is_empty() {
            return Ok(Block::EndOfStream);
        }
        let batch = RecordBatch::try_new(self.schema.clone(), vec![table.to_array()?])
            .map_err(|e| KestrelError::Execution(format!("distinct page failed: {e}")))?;
        Ok(Block::Data(DataBlock::from_batch(batch)))
    }

    fn describe(&self) -> String {
        format!(
            "{}, limit={}, ordered={}",
            self.schema.field(0).name(),
            self.limit,
            self.ordered
        )
    }
}

impl RetentionOperator<DistinctRetention> {
    /// Distinct values of `expr` over `input`.
    ///
    /// `order_by`, when present, must order by `expr` itself.
    pub fn try_new(
        input: BoxedOperator,
        expr: &Expr,
        order_by: Option<&OrderByExpr>,
        limit: usize,
        null_handling_enabled: bool,
        ctx: SharedOpChainContext,
    ) -> Result<Self> {
        if limit == 0 {
            return Err(KestrelError::Planning(
                "distinct limit must be positive".to_string(),
            ));
        }
        if let Some(order_by) = order_by {
            if &order_by.expr != expr {
                return Err(KestrelError::Planning(format!(
                    "distinct order-by {:?} differs from distinct key {:?}",
                    order_by.expr, expr
                )));
            }
        }
        let key = compile_expr(expr, &input.schema())?;
        let options = DistinctOptions {
            order: order_by.map(|o| DistinctOrder {
                direction: o.direction,
                nulls: o.nulls,
            }),
            limit,
            null_handling_enabled,
            max_initial_capacity: ctx.config.max_initial_capacity,
        };
        let executor = create_distinct_executor(&key.data_type(), options)?;
        let schema = Arc::new(Schema::new(vec![Field::new(
            output_name(expr),
            executor.data_type(),
            true,
        )]));
        let retention = DistinctRetention {
            key,
            executor,
            schema,
            ordered: order_by.is_some(),
            limit,
            drained: false,
        };
        Ok(Self::with_executor("DISTINCT", input, retention, ctx))
    }
}

fn output_name(expr: &Expr) -> String {
    match expr {
        Expr::Column(name) | Expr::ColumnRef { name, .. } => name.clone(),
        Expr::Cast { expr, .. } => output_name(expr),
        Expr::Literal(_) => "literal".to_string(),
    }
}
