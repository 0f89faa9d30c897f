#![deny(missing_docs)]

//! Bounded top-K retention and the pull-based operators built on it.
//!
//! Architecture role:
//! - scalar/row/block data model exchanged between operators
//! - collators, bounded ranking queue and membership sets
//! - distinct and sort retention executors
//! - operator trait, streaming operator shell and leaf sources
//!
//! Key modules:
//! - [`ranking_queue`]
//! - [`retention`]
//! - [`distinct`]
//! - [`sort`]
//! - [`operator`]
//! - [`stream`]

pub mod block;
pub mod collation;
pub mod context;
pub mod distinct;
pub mod expressions;
pub mod membership;
pub mod operator;
pub mod ranking_queue;
pub mod retention;
pub mod scalar;
pub mod sort;
pub mod stream;

// Re-export only what you want at the crate root (no globs).
pub use block::{Block, BlockContainer, BlockKind, DataBlock, Row};
pub use collation::{Preference, RowCollator, ValueCollator};
pub use context::{OpChainContext, SharedOpChainContext};
pub use distinct::{
    DistinctExecutor, DistinctOptions, DistinctOrder, DistinctTable, create_distinct_executor,
};
pub use expressions::{PhysicalExpr, compile_expr};
pub use operator::{
    BoxedOperator, DistinctOperator, Operator, RetentionOperator, ShellState, SortOperator,
    ValuesOperator,
};
pub use ranking_queue::BoundedRankingQueue;
pub use retention::{Admission, TopKRetainer};
pub use scalar::ScalarValue;
pub use sort::SortRetentionExecutor;
pub use stream::{BlockStream, RecordBatchStream, SendableRecordBatchStream};
