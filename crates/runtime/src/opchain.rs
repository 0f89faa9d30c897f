//! One schedulable operator chain.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use kestrel_common::OpChainId;
use kestrel_execution::{Block, BoxedOperator, SharedOpChainContext};

/// Best-effort cancellation flag shared between a chain and its owner.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    cancelled: Arc<AtomicBool>,
}

impl CancelHandle {
    /// Ask the scheduler to stop polling the chain.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Root operator of one query stage instance plus its context.
pub struct OpChain {
    context: SharedOpChainContext,
    root: BoxedOperator,
    cancel: CancelHandle,
}

impl OpChain {
    pub fn new(context: SharedOpChainContext, root: BoxedOperator) -> Self {
        Self {
            context,
            root,
            cancel: CancelHandle::default(),
        }
    }

    pub fn id(&self) -> OpChainId {
        self.context.id
    }

    pub fn context(&self) -> &SharedOpChainContext {
        &self.context
    }

    /// Handle that cancels this chain from another task.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Pull one block from the root.
    ///
    /// Once cancellation is requested the operator tree is cancelled and the
    /// root answers with its latched cancellation error.
    pub fn poll_root(&mut self) -> Block {
        if self.cancel.is_cancelled() {
            self.root.cancel();
        }
        self.root.next_block()
    }

    pub fn explain(&self) -> String {
        self.root.explain()
    }
}
