//! Planner-facing interface types consumed by the execution layer.
//!
//! The SQL planner/optimizer itself lives outside this workspace; this crate
//! only carries what it hands to a query stage: expressions, collations and
//! the serializable physical plan of one stage.

pub mod collation;
pub mod expr;
pub mod physical_plan;

pub use collation::*;
pub use expr::*;
pub use physical_plan::*;
