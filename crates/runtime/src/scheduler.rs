//! Cooperative op-chain scheduler.
//!
//! Each submitted chain runs as a tokio task holding one worker slot. The
//! task polls the chain's root in a loop; on a NO_OP block it releases its
//! slot and yields back to the runtime, so other chains progress on the same
//! slots while it is suspended.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use arrow::record_batch::RecordBatch;
use kestrel_common::{EngineConfig, KestrelError, MetricsRegistry, OpChainId, Result};
use kestrel_execution::{Block, DataBlock};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, error, info, info_span};

use crate::opchain::{CancelHandle, OpChain};

/// How a chain finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpChainOutcome {
    /// Root reached end-of-stream.
    Completed,
    /// Root produced an error block.
    Failed,
    /// Cancellation was requested before the chain finished.
    Cancelled,
}

impl OpChainOutcome {
    fn label(self) -> &'static str {
        match self {
            OpChainOutcome::Completed => "ok",
            OpChainOutcome::Failed => "error",
            OpChainOutcome::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OpChainOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Final state of one chain run.
#[derive(Debug)]
pub struct OpChainResult {
    pub id: OpChainId,
    pub outcome: OpChainOutcome,
    /// DATA blocks emitted by the root; empty unless the chain completed.
    pub blocks: Vec<DataBlock>,
    /// Terminal error of a failed or cancelled chain.
    pub error: Option<Arc<KestrelError>>,
    /// Times the chain yielded on NO_OP.
    pub noop_yields: u64,
}

impl OpChainResult {
    /// Collected output as arrow batches, or the chain's error.
    pub fn into_batches(self) -> Result<Vec<RecordBatch>> {
        if let Some(err) = self.error {
            return Err(kestrel_execution::stream::unshare(err));
        }
        self.blocks.iter().map(DataBlock::to_record_batch).collect()
    }

    /// Total rows across collected blocks.
    pub fn num_rows(&self) -> usize {
        self.blocks.iter().map(DataBlock::num_rows).sum()
    }
}

/// A chain running on the scheduler.
pub struct ScheduledOpChain {
    id: OpChainId,
    cancel: CancelHandle,
    handle: JoinHandle<OpChainResult>,
}

impl ScheduledOpChain {
    pub fn id(&self) -> OpChainId {
        self.id
    }

    /// Request cancellation; the chain stops at its next poll.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Wait for the chain to finish.
    pub async fn join(self) -> Result<OpChainResult> {
        self.handle
            .await
            .map_err(|e| KestrelError::Execution(format!("op-chain {} task failed: {e}", self.id)))
    }
}

/// Runs op-chains with at most `worker_slots` polled concurrently.
#[derive(Clone)]
pub struct OpChainScheduler {
    slots: Arc<Semaphore>,
    running: Arc<AtomicU64>,
    metrics: MetricsRegistry,
}

impl OpChainScheduler {
    /// Scheduler reporting to the process-global metrics registry.
    pub fn new(config: &EngineConfig) -> Self {
        Self::with_metrics(config, kestrel_common::metrics::global_metrics().clone())
    }

    pub fn with_metrics(config: &EngineConfig, metrics: MetricsRegistry) -> Self {
        Self {
            slots: Arc::new(Semaphore::new(config.worker_slots.max(1))),
            running: Arc::new(AtomicU64::new(0)),
            metrics,
        }
    }

    /// Free worker slots.
    pub fn available_slots(&self) -> usize {
        self.slots.available_permits()
    }

    /// Spawn `chain` on the current tokio runtime.
    pub fn submit(&self, chain: OpChain) -> ScheduledOpChain {
        let id = chain.id();
        let cancel = chain.cancel_handle();
        let span = info_span!(
            "opchain",
            op_chain_id = %id,
            query_id = %id.query_id,
            stage_id = id.stage_id.0
        );
        let scheduler = self.clone();
        let handle = tokio::spawn(async move { scheduler.drive(chain).await }.instrument(span));
        ScheduledOpChain { id, cancel, handle }
    }

    /// Submit `chain` and wait for it.
    pub async fn run(&self, chain: OpChain) -> Result<OpChainResult> {
        self.submit(chain).join().await
    }

    async fn drive(&self, mut chain: OpChain) -> OpChainResult {
        let id = chain.id();
        let query_id = id.query_id.to_string();
        let stage_id = id.stage_id.0;

        let mut permit = match self.acquire_slot().await {
            Ok(permit) => permit,
            Err(err) => {
                return self.finish(id, OpChainOutcome::Failed, Vec::new(), Some(Arc::new(err)), 0);
            }
        };
        let running = self.running.fetch_add(1, Ordering::AcqRel) + 1;
        self.metrics.set_opchain_running(&query_id, stage_id, running);
        debug!("op-chain started");

        let mut blocks = Vec::new();
        let mut noop_yields = 0_u64;
        let (outcome, error) = loop {
            match chain.poll_root() {
                Block::Data(data) => blocks.push(data),
                Block::NoOp => {
                    noop_yields += 1;
                    self.metrics.inc_opchain_noop_yields(&query_id, stage_id);
                    // A suspended chain does not occupy a worker slot.
                    drop(permit);
                    tokio::task::yield_now().await;
                    permit = match self.acquire_slot().await {
                        Ok(permit) => permit,
                        Err(err) => break (OpChainOutcome::Failed, Some(Arc::new(err))),
                    };
                }
                Block::EndOfStream => break (OpChainOutcome::Completed, None),
                Block::Error(err) => {
                    let outcome = if matches!(err.as_ref(), KestrelError::Cancelled(_)) {
                        OpChainOutcome::Cancelled
                    } else {
                        OpChainOutcome::Failed
                    };
                    break (outcome, Some(err));
                }
            }
        };
        if outcome != OpChainOutcome::Completed {
            blocks.clear();
        }

        let running = self.running.fetch_sub(1, Ordering::AcqRel) - 1;
        self.metrics.set_opchain_running(&query_id, stage_id, running);
        self.finish(id, outcome, blocks, error, noop_yields)
    }

    async fn acquire_slot(&self) -> Result<OwnedSemaphorePermit> {
        self.slots
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| KestrelError::Execution(format!("failed to acquire worker slot: {e}")))
    }

    fn finish(
        &self,
        id: OpChainId,
        outcome: OpChainOutcome,
        blocks: Vec<DataBlock>,
        error: Option<Arc<KestrelError>>,
        noop_yields: u64,
    ) -> OpChainResult {
        self.metrics
            .inc_opchain_finished(&id.query_id.to_string(), id.stage_id.0, outcome.label());
        match &error {
            Some(err) if outcome == OpChainOutcome::Failed => {
                error!(error = %err, noop_yields, "op-chain failed");
            }
            _ => {
                let rows: usize = blocks.iter().map(DataBlock::num_rows).sum();
                info!(%outcome, rows, noop_yields, "op-chain finished");
            }
        }
        OpChainResult {
            id,
            outcome,
            blocks,
            error,
            noop_yields,
        }
    }
}
