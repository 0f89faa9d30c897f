//! Sort-with-limit/offset retention over full rows.

use arrow_schema::SchemaRef;
use kestrel_common::{EngineConfig, Result};
use kestrel_planner::CollationKey;
use tracing::debug;

use crate::block::{Block, DataBlock, Row, check_row};
use crate::collation::RowCollator;
use crate::membership::NoMembership;
use crate::ranking_queue::BoundedRankingQueue;
use crate::retention::TopKRetainer;

enum RowHolder {
    /// Input already in final order: keep a positional prefix.
    Positional(Vec<Row>),
    /// Keep the best rows under the collation.
    Ranked(TopKRetainer<Row, RowCollator, NoMembership>),
}

/// Keeps the first `fetch + offset` rows of the collated stream and publishes
/// the page after `offset` once the input ends.
///
/// With an empty collation, or input the planner marked as sorted, rows are
/// truncated by arrival position; otherwise they compete in a bounded ranking
/// queue. Both paths publish the same page for input in collation order.
pub struct SortRetentionExecutor {
    schema: SchemaRef,
    offset: usize,
    rows_to_keep: usize,
    holder: RowHolder,
    drained: bool,
}

impl SortRetentionExecutor {
    /// `fetch <= 0` keeps up to `config.default_holder_capacity` rows; a
    /// negative `offset` is treated as zero.
    pub fn try_new(
        schema: SchemaRef,
        collation: Vec<CollationKey>,
        fetch: i64,
        offset: i64,
        input_sorted: bool,
        config: &EngineConfig,
    ) -> Result<Self> {
        let offset = usize::try_from(offset).unwrap_or(0);
        let rows_to_keep = match usize::try_from(fetch) {
            Ok(fetch) if fetch > 0 => fetch.saturating_add(offset),
            _ => config.default_holder_capacity,
        };
        let initial = rows_to_keep.min(config.max_initial_capacity);
        let holder = if collation.is_empty() || input_sorted {
            RowHolder::Positional(Vec::with_capacity(initial))
        } else {
            let collator = RowCollator::try_new(collation, &schema)?;
            let queue = BoundedRankingQueue::new(rows_to_keep, initial, collator);
            RowHolder::Ranked(TopKRetainer::new(queue, NoMembership))
        };
        debug!(
            rows_to_keep,
            offset,
            positional = matches!(holder, RowHolder::Positional(_)),
            "sort retention configured"
        );
        Ok(Self {
            schema,
            offset,
            rows_to_keep,
            holder,
            drained: false,
        })
    }

    /// Output schema (same as input).
    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    /// Upper bound on retained rows.
    pub fn rows_to_keep(&self) -> usize {
        self.rows_to_keep
    }

    /// Rows currently retained.
    pub fn retained(&self) -> usize {
        match &self.holder {
            RowHolder::Positional(rows) => rows.len(),
            RowHolder::Ranked(retainer) => retainer.len(),
        }
    }

    /// Whether the positional fast path is in use.
    pub fn is_positional(&self) -> bool {
        matches!(self.holder, RowHolder::Positional(_))
    }

    /// Offer a batch of rows.
    ///
    /// Returns `true` when no later row can change the result (positional
    /// holder full).
    pub fn admit_rows(&mut self, rows: Vec<Row>) -> Result<bool> {
        match &mut self.holder {
            RowHolder::Positional(kept) => {
                let headroom = self.rows_to_keep.saturating_sub(kept.len());
                for row in rows.into_iter().take(headroom) {
                    check_row(&self.schema, &row)?;
                    kept.push(row);
                }
                Ok(kept.len() >= self.rows_to_keep)
            }
            RowHolder::Ranked(retainer) => {
                for row in rows {
                    check_row(&self.schema, &row)?;
                    retainer.admit(row, self.rows_to_keep);
                }
                Ok(false)
            }
        }
    }

    /// Publish the page after the offset. Later calls return end-of-stream.
    pub fn produce_final_page(&mut self) -> Block {
        if self.drained {
            return Block::EndOfStream;
        }
        self.drained = true;
        let page = match &mut self.holder {
            RowHolder::Positional(kept) => {
                let mut kept = std::mem::take(kept);
                if kept.len() > self.offset {
                    kept.split_off(self.offset)
                } else {
                    Vec::new()
                }
            }
            RowHolder::Ranked(retainer) => retainer.drain_best_first(self.offset),
        };
        debug!(rows = page.len(), offset = self.offset, "sort page produced");
        if page.is_empty() {
            Block::EndOfStream
        } else {
            Block::Data(DataBlock::from_rows(self.schema.clone(), page))
        }
    }
}
