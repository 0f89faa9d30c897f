//! Op-chain execution context.

use std::sync::Arc;

use kestrel_common::{EngineConfig, MetricsRegistry, OpChainId};

/// Per op-chain state shared by every operator of the chain.
#[derive(Debug, Clone)]
pub struct OpChainContext {
    /// Chain identity, used as metric and log labels.
    pub id: OpChainId,

    /// Engine knobs the operators were built with.
    pub config: EngineConfig,

    /// Registry operator stats are reported to.
    pub metrics: MetricsRegistry,
}

impl OpChainContext {
    /// Context reporting to the process-global metrics registry.
    pub fn new(id: OpChainId, config: EngineConfig) -> Self {
        Self {
            id,
            config,
            metrics: kestrel_common::metrics::global_metrics().clone(),
        }
    }
}

/// Context handle held by each operator.
pub type SharedOpChainContext = Arc<OpChainContext>;
