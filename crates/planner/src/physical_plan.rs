use crate::collation::{Collation, OrderByExpr};
use crate::expr::{Expr, LiteralValue};
use arrow_schema::Schema;
use serde::{Deserialize, Serialize};

/// The physical operator graph of one query stage.
///
/// Each node becomes one operator of an op-chain; the root is polled by the
/// stage scheduler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PhysicalPlan {
    /// Literal rows (leaf).
    Values(ValuesExec),
    /// Sort with limit/offset.
    Sort(SortExec),
    /// Single-column distinct, optionally ordered.
    Distinct(DistinctExec),
}

impl PhysicalPlan {
    /// Returns direct child operators.
    pub fn children(&self) -> Vec<&PhysicalPlan> {
        match self {
            PhysicalPlan::Values(_) => vec![],
            PhysicalPlan::Sort(x) => vec![x.input.as_ref()],
            PhysicalPlan::Distinct(x) => vec![x.input.as_ref()],
        }
    }
}

/// Literal row source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValuesExec {
    /// Output schema.
    pub schema: Schema,
    /// Rows in emission order; each row must match `schema` in width.
    pub rows: Vec<Vec<LiteralValue>>,
}

/// Sort-with-limit/offset operator.
///
/// Contract:
/// - `fetch <= 0` means "no limit"; the stage keeps at most the engine's
///   default holder capacity.
/// - negative `offset` is treated as zero.
/// - `input_sorted` asserts the input already arrives in collation order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SortExec {
    /// Sort keys; empty means plain limit/offset truncation.
    pub collation: Collation,
    /// Rows to return after the offset.
    pub fetch: i64,
    /// Rows to skip from the start of the ordered result.
    pub offset: i64,
    /// Whether the input is already globally sorted.
    #[serde(default)]
    pub input_sorted: bool,
    /// Input plan.
    pub input: Box<PhysicalPlan>,
}

/// Single-column DISTINCT with optional ORDER BY on the same expression.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistinctExec {
    /// Distinct key.
    pub expr: Expr,
    /// Optional ordering; its expression must equal `expr`.
    pub order_by: Option<OrderByExpr>,
    /// Max distinct values to return (nulls included).
    pub limit: usize,
    /// Per-node override of the engine null-handling default.
    #[serde(default)]
    pub null_handling_enabled: Option<bool>,
    /// Input plan.
    pub input: Box<PhysicalPlan>,
}
