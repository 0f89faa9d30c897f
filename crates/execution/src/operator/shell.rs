use std::sync::Arc;
use std::time::{Duration, Instant};

use arrow_schema::SchemaRef;
use kestrel_common::metrics::OperatorStats;
use kestrel_common::{KestrelError, Result};
use tracing::{debug, warn};

use super::{BoxedOperator, Operator};
use crate::block::{Block, DataBlock};
use crate::context::SharedOpChainContext;

/// Retention state driven by a [`RetentionOperator`].
pub trait BlockRetention: Send {
    /// Schema of the final page.
    fn output_schema(&self) -> SchemaRef;

    /// Admit every row of one DATA block.
    ///
    /// Returns `true` when later input cannot change the result; the shell
    /// then keeps draining upstream without admitting.
    fn admit_block(&mut self, block: DataBlock) -> Result<bool>;

    /// Publish the final page, or end-of-stream when it is empty.
    fn produce_final_page(&mut self) -> Result<Block>;

    /// Details appended to the operator name in explain output.
    fn describe(&self) -> String;
}

/// Lifecycle of a [`RetentionOperator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellState {
    /// Pulling input into the retention state.
    Collecting,
    /// Upstream ended; the next pull publishes the page.
    ReadyToDrain,
    /// Page published; only end-of-stream from now on.
    Drained,
}

/// Streaming shell around a [`BlockRetention`].
///
/// Pulls upstream until it ends, suspends on NO_OP, latches the first error
/// (upstream or local) and re-emits it forever, and publishes the page exactly
/// once.
pub struct RetentionOperator<R: BlockRetention> {
    name: &'static str,
    input: BoxedOperator,
    retention: R,
    ctx: SharedOpChainContext,
    state: ShellState,
    latched: Option<Arc<KestrelError>>,
    satisfied: bool,
    stats: OperatorStats,
    busy: Duration,
}

impl<R: BlockRetention> RetentionOperator<R> {
    /// Wrap `retention` fed by `input`.
    pub fn with_executor(
        name: &'static str,
        input: BoxedOperator,
        retention: R,
        ctx: SharedOpChainContext,
    ) -> Self {
        Self {
            name,
            input,
            retention,
            ctx,
            state: ShellState::Collecting,
            latched: None,
            satisfied: false,
            stats: OperatorStats::default(),
            busy: Duration::ZERO,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ShellState {
        self.state
    }

    /// Counters accumulated so far.
    pub fn stats(&self) -> OperatorStats {
        self.stats
    }

    /// The wrapped retention state.
    pub fn retention(&self) -> &R {
        &self.retention
    }

    fn latch(&mut self, err: Arc<KestrelError>) -> Block {
        self.latched = Some(err.clone());
        Block::Error(err)
    }

    fn pull(&mut self) -> Block {
        loop {
            match self.state {
                ShellState::Drained => return Block::EndOfStream,
                ShellState::ReadyToDrain => return self.drain(),
                ShellState::Collecting => {}
            }
            match self.input.next_block() {
                Block::Data(data) => {
                    self.stats.blocks_in += 1;
                    self.stats.rows_in += data.num_rows() as u64;
                    if self.satisfied {
                        continue;
                    }
                    match self.retention.admit_block(data) {
                        Ok(satisfied) => {
                            if satisfied {
                                debug!(
                                    op_chain_id = %self.ctx.id,
                                    operator = self.name,
                                    "retention satisfied; discarding further input"
                                );
                            }
                            self.satisfied = satisfied;
                        }
                        Err(err) => {
                            warn!(
                                op_chain_id = %self.ctx.id,
                                operator = self.name,
                                error = %err,
                                "admission failed"
                            );
                            return self.latch(Arc::new(err));
                        }
                    }
                }
                Block::NoOp => return Block::NoOp,
                Block::EndOfStream => {
                    debug!(
                        op_chain_id = %self.ctx.id,
                        operator = self.name,
                        rows_in = self.stats.rows_in,
                        "upstream finished; draining"
                    );
                    self.state = ShellState::ReadyToDrain;
                }
                Block::Error(err) => {
                    warn!(
                        op_chain_id = %self.ctx.id,
                        operator = self.name,
                        error = %err,
                        "upstream error"
                    );
                    return self.latch(err);
                }
            }
        }
    }

    fn drain(&mut self) -> Block {
        self.state = ShellState::Drained;
        let block = match self.retention.produce_final_page() {
            Ok(block) => block,
            Err(err) => {
                warn!(
                    op_chain_id = %self.ctx.id,
                    operator = self.name,
                    error = %err,
                    "final page failed"
                );
                return self.latch(Arc::new(err));
            }
        };
        if let Block::Data(data) = &block {
            self.stats.blocks_out += 1;
            self.stats.rows_out += data.num_rows() as u64;
        }
        debug!(
            op_chain_id = %self.ctx.id,
            operator = self.name,
            rows_out = self.stats.rows_out,
            "final page produced"
        );
        self.ctx.metrics.record_operator(
            &self.ctx.id.query_id.to_string(),
            self.ctx.id.stage_id.0,
            self.name,
            self.stats,
            self.busy.as_secs_f64(),
        );
        block
    }
}

impl<R: BlockRetention> Operator for RetentionOperator<R> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn schema(&self) -> SchemaRef {
        self.retention.output_schema()
    }

    fn next_block(&mut self) -> Block {
        if let Some(err) = &self.latched {
            return Block::Error(err.clone());
        }
        let started = Instant::now();
        let block = self.pull();
        self.busy += started.elapsed();
        block
    }

    fn cancel(&mut self) {
        if self.latched.is_none() && self.state != ShellState::Drained {
            debug!(op_chain_id = %self.ctx.id, operator = self.name, "cancelled");
            self.latched = Some(Arc::new(KestrelError::Cancelled(format!(
                "operator {} of op-chain {}",
                self.name, self.ctx.id
            ))));
        }
        self.input.cancel();
    }

    fn children(&self) -> Vec<&dyn Operator> {
        vec![self.input.as_ref()]
    }

    fn describe(&self) -> String {
        format!("{}({})", self.name, self.retention.describe())
    }
}
