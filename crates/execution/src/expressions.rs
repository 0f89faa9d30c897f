//! Expression compilation and evaluation for execution operators.
//!
//! Input contract:
//! - the planner resolves columns to `ColumnRef`;
//! - an unresolved `Column` is looked up by name as a fallback.
//!
//! Output contract:
//! - each evaluation returns an `ArrayRef` aligned to input batch row count.

use std::sync::Arc;

use arrow::array::ArrayRef;
use arrow::compute::kernels::cast::cast;
use arrow::record_batch::RecordBatch;
use arrow_schema::{DataType, SchemaRef};
use kestrel_common::{KestrelError, Result};
use kestrel_planner::{Expr, LiteralValue};

use crate::scalar::{ScalarValue, scalars_to_array};

/// Executable expression.
pub trait PhysicalExpr: Send + Sync {
    /// Static output data type of this expression.
    fn data_type(&self) -> DataType;
    /// Evaluate the expression for every row in `batch`.
    fn evaluate(&self, batch: &RecordBatch) -> Result<ArrayRef>;
}

/// Compile a planner expression against `input_schema`.
pub fn compile_expr(expr: &Expr, input_schema: &SchemaRef) -> Result<Arc<dyn PhysicalExpr>> {
    match expr {
        Expr::ColumnRef { name, index } => {
            let field = input_schema.fields().get(*index).ok_or_else(|| {
                KestrelError::Planning(format!(
                    "column '{name}' index {index} out of range for {}-column input",
                    input_schema.fields().len()
                ))
            })?;
            Ok(Arc::new(ColumnExpr {
                index: *index,
                dt: field.data_type().clone(),
            }))
        }
        Expr::Column(name) => {
            let idx = input_schema
                .fields()
                .iter()
                .position(|f| f.name() == name)
                .ok_or_else(|| {
                    KestrelError::Planning(format!("unknown column in execution: {name}"))
                })?;
            let dt = input_schema.field(idx).data_type().clone();
            Ok(Arc::new(ColumnExpr { index: idx, dt }))
        }
        Expr::Literal(v) => Ok(Arc::new(LiteralExpr {
            v: ScalarValue::from(v),
            dt: literal_type(v),
        })),
        Expr::Cast { expr, to_type } => {
            let inner = compile_expr(expr, input_schema)?;
            Ok(Arc::new(CastExpr {
                inner,
                to_type: to_type.clone(),
            }))
        }
    }
}

struct ColumnExpr {
    index: usize,
    dt: DataType,
}

impl PhysicalExpr for ColumnExpr {
    fn data_type(&self) -> DataType {
        self.dt.clone()
    }

    fn evaluate(&self, batch: &RecordBatch) -> Result<ArrayRef> {
        Ok(batch.column(self.index).clone())
    }
}

struct LiteralExpr {
    v: ScalarValue,
    dt: DataType,
}

impl PhysicalExpr for LiteralExpr {
    fn data_type(&self) -> DataType {
        self.dt.clone()
    }

    fn evaluate(&self, batch: &RecordBatch) -> Result<ArrayRef> {
        scalars_to_array(&vec![self.v.clone(); batch.num_rows()], &self.dt)
    }
}

struct CastExpr {
    inner: Arc<dyn PhysicalExpr>,
    to_type: DataType,
}

impl PhysicalExpr for CastExpr {
    fn data_type(&self) -> DataType {
        self.to_type.clone()
    }

    fn evaluate(&self, batch: &RecordBatch) -> Result<ArrayRef> {
        let arr = self.inner.evaluate(batch)?;
        cast(&arr, &self.to_type).map_err(|e| KestrelError::Execution(format!("cast failed: {e}")))
    }
}

fn literal_type(v: &LiteralValue) -> DataType {
    match v {
        LiteralValue::Int32(_) => DataType::Int32,
        LiteralValue::Int64(_) => DataType::Int64,
        LiteralValue::Float32(_) => DataType::Float32,
        LiteralValue::Float64(_) => DataType::Float64,
        LiteralValue::Utf8(_) => DataType::Utf8,
        LiteralValue::Binary(_) => DataType::Binary,
        LiteralValue::Boolean(_) => DataType::Boolean,
        LiteralValue::Null => DataType::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Array, Float64Array, Int32Array, StringArray};
    use arrow_schema::{Field, Schema};

    fn batch() -> RecordBatch {
        let schema = Arc::new(Schema::new(vec![
            Field::new("a", DataType::Int32, true),
            Field::new("s", DataType::Utf8, true),
        ]));
        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Int32Array::from(vec![1, 2])),
                Arc::new(StringArray::from(vec!["x", "y"])),
            ],
        )
        .expect("batch")
    }

    #[test]
    fn column_by_name_resolves_index() {
        let b = batch();
        let e = compile_expr(&Expr::Column("s".to_string()), b.schema_ref()).expect("compile");
        assert_eq!(e.data_type(), DataType::Utf8);
        assert_eq!(e.evaluate(&b).expect("eval").len(), 2);
    }

    #[test]
    fn cast_widens_int_to_double() {
        let b = batch();
        let expr = Expr::Cast {
            expr: Box::new(Expr::column_ref("a", 0)),
            to_type: DataType::Float64,
        };
        let out = compile_expr(&expr, b.schema_ref())
            .expect("compile")
            .evaluate(&b)
            .expect("eval");
        let f = out
            .as_any()
            .downcast_ref::<Float64Array>()
            .expect("float64");
        assert_eq!(f.value(1), 2.0);
    }

    #[test]
    fn literal_repeats_per_row() {
        let b = batch();
        let e = compile_expr(&Expr::Literal(LiteralValue::Int64(7)), b.schema_ref())
            .expect("compile");
        assert_eq!(e.evaluate(&b).expect("eval").len(), 2);
    }

    #[test]
    fn out_of_range_column_ref_is_planning_error() {
        let b = batch();
        let err = compile_expr(&Expr::column_ref("z", 9), b.schema_ref()).err();
        assert!(matches!(err, Some(KestrelError::Planning(_))));
    }
}
