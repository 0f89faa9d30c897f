//! Sort collation descriptors produced by the planner.

use serde::{Deserialize, Serialize};

use crate::expr::Expr;

/// Requested sort direction for one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn is_asc(self) -> bool {
        matches!(self, SortDirection::Asc)
    }
}

/// Placement of nulls relative to non-null values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NullOrdering {
    First,
    Last,
}

impl NullOrdering {
    /// Default placement: nulls sort as the largest value.
    pub fn default_for(direction: SortDirection) -> Self {
        match direction {
            SortDirection::Asc => NullOrdering::Last,
            SortDirection::Desc => NullOrdering::First,
        }
    }
}

/// One `(key, direction, null-ordering)` entry of a row collation.
///
/// Keys address input columns positionally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollationKey {
    pub column: usize,
    pub direction: SortDirection,
    pub nulls: NullOrdering,
}

impl CollationKey {
    pub fn asc(column: usize) -> Self {
        Self {
            column,
            direction: SortDirection::Asc,
            nulls: NullOrdering::default_for(SortDirection::Asc),
        }
    }

    pub fn desc(column: usize) -> Self {
        Self {
            column,
            direction: SortDirection::Desc,
            nulls: NullOrdering::default_for(SortDirection::Desc),
        }
    }

    pub fn with_nulls(mut self, nulls: NullOrdering) -> Self {
        self.nulls = nulls;
        self
    }
}

/// Ordered list of row sort keys. Empty means unordered retention.
pub type Collation = Vec<CollationKey>;

/// ORDER BY attached to a single-column DISTINCT.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderByExpr {
    pub expr: Expr,
    pub direction: SortDirection,
    pub nulls: NullOrdering,
}

impl OrderByExpr {
    pub fn new(expr: Expr, direction: SortDirection) -> Self {
        Self {
            expr,
            direction,
            nulls: NullOrdering::default_for(direction),
        }
    }
}
