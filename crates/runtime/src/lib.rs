//! Op-chain construction and cooperative scheduling.
//!
//! Architecture role:
//! - lowers a stage's [`kestrel_planner::PhysicalPlan`] into an operator tree
//! - polls op-chains on a bounded tokio worker pool, yielding on NO_OP
//!
//! Key modules:
//! - [`builder`]
//! - [`opchain`]
//! - [`scheduler`]

pub mod builder;
pub mod opchain;
pub mod scheduler;

pub use builder::{build_op_chain, build_operator};
pub use opchain::{CancelHandle, OpChain};
pub use scheduler::{OpChainOutcome, OpChainResult, OpChainScheduler, ScheduledOpChain};
