//! Blocks exchanged between operators of an op-chain.
//!
//! Every pull returns exactly one [`Block`]; its kind tells the consumer
//! whether to process rows, yield, fail, or finish.

use std::sync::Arc;

use arrow::record_batch::RecordBatch;
use arrow_schema::SchemaRef;
use kestrel_common::{KestrelError, Result};

use crate::scalar::{ScalarValue, scalar_from_array, scalars_to_array};

/// Fixed-width sequence of field values sharing the stream's schema.
pub type Row = Vec<ScalarValue>;

/// Kind tag of a [`Block`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// Rows are available.
    Data,
    /// Upstream has nothing ready yet; the consumer must yield.
    NoOp,
    /// Terminal failure.
    Error,
    /// Terminal end of stream.
    EndOfStream,
}

/// One unit of transfer between operators.
#[derive(Debug, Clone)]
pub enum Block {
    /// A finite batch of rows.
    Data(DataBlock),
    /// Nothing ready; re-poll later.
    NoOp,
    /// Terminal failure, shared so it can be re-emitted.
    Error(Arc<KestrelError>),
    /// Terminal end of stream.
    EndOfStream,
}

impl Block {
    /// Wrap an error as a terminal error block.
    pub fn error(err: KestrelError) -> Self {
        Block::Error(Arc::new(err))
    }

    /// Kind tag of this block.
    pub fn kind(&self) -> BlockKind {
        match self {
            Block::Data(_) => BlockKind::Data,
            Block::NoOp => BlockKind::NoOp,
            Block::Error(_) => BlockKind::Error,
            Block::EndOfStream => BlockKind::EndOfStream,
        }
    }

    /// Whether this block ends the stream (error or end-of-stream).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Block::Error(_) | Block::EndOfStream)
    }

    /// Number of rows carried; zero for non-data blocks.
    pub fn num_rows(&self) -> usize {
        match self {
            Block::Data(data) => data.num_rows(),
            _ => 0,
        }
    }
}

/// Physical layout of a data block payload.
#[derive(Debug, Clone)]
pub enum BlockContainer {
    /// Row-major owned scalars.
    Rows(Vec<Row>),
    /// Columnar arrow batch.
    Columnar(RecordBatch),
}

/// DATA payload: rows plus the schema they conform to.
#[derive(Debug, Clone)]
pub struct DataBlock {
    schema: SchemaRef,
    container: BlockContainer,
}

impl DataBlock {
    /// Build a row-major block.
    ///
    /// # Panics
    /// When a row's width differs from the schema's; that is a bug in the
    /// producing operator, not a data condition.
    pub fn from_rows(schema: SchemaRef, rows: Vec<Row>) -> Self {
        for row in &rows {
            assert_row_width(&schema, row);
        }
        Self {
            schema,
            container: BlockContainer::Rows(rows),
        }
    }

    /// Build a columnar block from an arrow batch.
    pub fn from_batch(batch: RecordBatch) -> Self {
        Self {
            schema: batch.schema(),
            container: BlockContainer::Columnar(batch),
        }
    }

    /// Schema shared by all rows.
    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    /// Payload layout.
    pub fn container(&self) -> &BlockContainer {
        &self.container
    }

    /// Number of rows.
    pub fn num_rows(&self) -> usize {
        match &self.container {
            BlockContainer::Rows(rows) => rows.len(),
            BlockContainer::Columnar(batch) => batch.num_rows(),
        }
    }

    /// Consume the block into owned rows, converting columnar payloads.
    pub fn into_rows(self) -> Result<Vec<Row>> {
        match self.container {
            BlockContainer::Rows(rows) => Ok(rows),
            BlockContainer::Columnar(batch) => {
                let mut rows = Vec::with_capacity(batch.num_rows());
                for idx in 0..batch.num_rows() {
                    let row = batch
                        .columns()
                        .iter()
                        .map(|col| scalar_from_array(col, idx))
                        .collect::<Result<Row>>()?;
                    rows.push(row);
                }
                Ok(rows)
            }
        }
    }

    /// Columnar view of the payload, converting row-major payloads.
    pub fn to_record_batch(&self) -> Result<RecordBatch> {
        match &self.container {
            BlockContainer::Columnar(batch) => Ok(batch.clone()),
            BlockContainer::Rows(rows) => rows_to_batch(&self.schema, rows),
        }
    }
}

/// Transpose rows into an arrow batch of `schema`.
pub fn rows_to_batch(schema: &SchemaRef, rows: &[Row]) -> Result<RecordBatch> {
    let mut cols = vec![Vec::<ScalarValue>::with_capacity(rows.len()); schema.fields().len()];
    for row in rows {
        for (idx, value) in row.iter().enumerate() {
            cols[idx].push(value.clone());
        }
    }
    let arrays = cols
        .iter()
        .enumerate()
        .map(|(idx, col)| scalars_to_array(col, schema.field(idx).data_type()))
        .collect::<Result<Vec<_>>>()?;
    RecordBatch::try_new(schema.clone(), arrays)
        .map_err(|e| KestrelError::Execution(format!("row block to batch failed: {e}")))
}

/// Check that every field of `row` matches the schema's declared type.
///
/// Width mismatches panic (producer bug); type mismatches are data-dependent
/// and surface as [`KestrelError::Execution`].
pub fn check_row(schema: &SchemaRef, row: &Row) -> Result<()> {
    assert_row_width(schema, row);
    for (value, field) in row.iter().zip(schema.fields()) {
        if !value.fits(field.data_type()) {
            return Err(KestrelError::Execution(format!(
                "column '{}' expects {:?}, got {value:?}",
                field.name(),
                field.data_type()
            )));
        }
    }
    Ok(())
}

fn assert_row_width(schema: &SchemaRef, row: &Row) {
    assert_eq!(
        row.len(),
        schema.fields().len(),
        "row width must equal schema width"
    );
}
