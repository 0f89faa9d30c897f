use arrow_schema::DataType;
use serde::{Deserialize, Serialize};

/// Scalar expression evaluated once per input batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// Unresolved column name; resolved against the input schema at compile time.
    Column(String),
    /// Column resolved by the planner to a positional index.
    ColumnRef { name: String, index: usize },
    Literal(LiteralValue),
    Cast {
        expr: Box<Expr>,
        to_type: DataType,
    },
}

impl Expr {
    /// Shorthand for a resolved column reference.
    pub fn column_ref(name: impl Into<String>, index: usize) -> Self {
        Self::ColumnRef {
            name: name.into(),
            index,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LiteralValue {
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    Utf8(String),
    Binary(Vec<u8>),
    Boolean(bool),
    Null,
}
