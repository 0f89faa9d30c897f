//! Lowering of physical plans into operator trees.

use std::sync::Arc;

use kestrel_common::{EngineConfig, OpChainId, Result};
use kestrel_execution::{
    BoxedOperator, DistinctOperator, OpChainContext, SharedOpChainContext,
    SortOperator, ValuesOperator,
};
use kestrel_planner::PhysicalPlan;
use tracing::debug;

use crate::opchain::OpChain;

/// Build the op-chain `id` executing `plan`.
pub fn build_op_chain(id: OpChainId, plan: &PhysicalPlan, config: EngineConfig) -> Result<OpChain> {
    config.validate()?;
    let ctx = Arc::new(OpChainContext::new(id, config));
    let root = build_operator(plan, &ctx)?;
    debug!(op_chain_id = %id, root = root.name(), "op-chain built");
    Ok(OpChain::new(ctx, root))
}

/// Build the operator tree for `plan`, children first.
pub fn build_operator(plan: &PhysicalPlan, ctx: &SharedOpChainContext) -> Result<BoxedOperator> {
    match plan {
        PhysicalPlan::Values(values) => Ok(Box::new(ValuesOperator::try_from_literals(
            Arc::new(values.schema.clone()),
            &values.rows,
            ctx.config.batch_size_rows,
        )?)),
        PhysicalPlan::Sort(sort) => {
            let input = build_operator(&sort.input, ctx)?;
            Ok(Box::new(SortOperator::try_new(
                input,
                sort.collation.clone(),
                sort.fetch,
                sort.offset,
                sort.input_sorted,
                ctx.clone(),
            )?))
        }
        PhysicalPlan::Distinct(distinct) => {
            let input = build_operator(&distinct.input, ctx)?;
            let null_handling = distinct
                .null_handling_enabled
                .unwrap_or(ctx.config.null_handling_enabled);
            Ok(Box::new(DistinctOperator::try_new(
                input,
                &distinct.expr,
                distinct.order_by.as_ref(),
                distinct.limit,
                null_handling,
                ctx.clone(),
            )?))
        }
    }
}
