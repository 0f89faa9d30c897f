use arrow_schema::SchemaRef;
use kestrel_common::Result;
use kestrel_planner::CollationKey;

use super::shell::{BlockRetention, RetentionOperator};
use super::BoxedOperator;
use crate::block::{Block, DataBlock};
use crate::context::SharedOpChainContext;
use crate::sort::SortRetentionExecutor;

/// Sort-with-limit/offset operator.
pub type SortOperator = RetentionOperator<SortRetentionExecutor>;

impl BlockRetention for SortRetentionExecutor {
    fn output_schema(&self) -> SchemaRef {
        self.schema().clone()
    }

    fn admit_block(&mut self, block: DataBlock) -> Result<bool> {
        self.admit_rows(block.into_rows()?)
    }

    fn produce_final_page(&mut self) -> Result<Block> {
        Ok(SortRetentionExecutor::produce_final_page(self))
    }

    fn describe(&self) -> String {
        format!(
            "keep={}, path={}",
            self.rows_to_keep(),
            if self.is_positional() { "positional" } else { "ranked" }
        )
    }
}

impl RetentionOperator<SortRetentionExecutor> {
    /// Sort `input` by `collation`, publishing `fetch` rows after `offset`.
    pub fn try_new(
        input: BoxedOperator,
        collation: Vec<CollationKey>,
        fetch: i64,
        offset: i64,
        input_sorted: bool,
        ctx: SharedOpChainContext,
    ) -> Result<Self> {
        let executor = SortRetentionExecutor::try_new(
            input.schema(),
            collation,
            fetch,
            offset,
            input_sorted,
            &ctx.config,
        )?;
        Ok(Self::with_executor("SORT", input, executor, ctx))
    }
}
