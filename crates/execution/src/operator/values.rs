use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use arrow_schema::SchemaRef;
use kestrel_common::{KestrelError, Result};
use kestrel_planner::LiteralValue;

use super::Operator;
use crate::block::{Block, DataBlock, Row, check_row};
use crate::scalar::ScalarValue;

/// Leaf operator replaying a fixed sequence of blocks.
///
/// The first terminal block (error or end-of-stream) is repeated on every
/// later pull. A script without a terminal block ends with end-of-stream,
/// unless [`Self::then_pending`] keeps it answering NO_OP.
pub struct ValuesOperator {
    schema: SchemaRef,
    script: VecDeque<Block>,
    terminal: Option<Block>,
    pending_tail: bool,
    pulls: Arc<AtomicUsize>,
}

impl ValuesOperator {
    /// Replay `blocks` in order.
    pub fn scripted(schema: SchemaRef, blocks: Vec<Block>) -> Self {
        Self {
            schema,
            script: blocks.into(),
            terminal: None,
            pending_tail: false,
            pulls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Emit `rows` as DATA blocks of at most `batch_size` rows.
    pub fn from_rows(schema: SchemaRef, rows: Vec<Row>, batch_size: usize) -> Self {
        let batch_size = batch_size.max(1);
        let mut blocks = Vec::with_capacity(rows.len().div_ceil(batch_size));
        let mut rows = rows.into_iter().peekable();
        while rows.peek().is_some() {
            let chunk: Vec<Row> = rows.by_ref().take(batch_size).collect();
            blocks.push(Block::Data(DataBlock::from_rows(schema.clone(), chunk)));
        }
        Self::scripted(schema, blocks)
    }

    /// Build from planner literals, validating width and types.
    pub fn try_from_literals(
        schema: SchemaRef,
        rows: &[Vec<LiteralValue>],
        batch_size: usize,
    ) -> Result<Self> {
        let width = schema.fields().len();
        let mut out = Vec::with_capacity(rows.len());
        for (idx, literals) in rows.iter().enumerate() {
            if literals.len() != width {
                return Err(KestrelError::Planning(format!(
                    "values row {idx} has {} fields, schema has {width}",
                    literals.len()
                )));
            }
            let row: Row = literals.iter().map(ScalarValue::from).collect();
            check_row(&schema, &row)
                .map_err(|e| KestrelError::Planning(format!("values row {idx}: {e}")))?;
            out.push(row);
        }
        Ok(Self::from_rows(schema, out, batch_size))
    }

    /// Answer NO_OP forever once the script is exhausted.
    pub fn then_pending(mut self) -> Self {
        self.pending_tail = true;
        self
    }

    /// Shared count of `next_block` calls.
    pub fn pull_counter(&self) -> Arc<AtomicUsize> {
        self.pulls.clone()
    }
}

impl Operator for ValuesOperator {
    fn name(&self) -> &'static str {
        "VALUES"
    }

    fn schema(&self) -> SchemaRef {
        self.schema.clone()
    }

    fn next_block(&mut self) -> Block {
        self.pulls.fetch_add(1, Ordering::Relaxed);
        if let Some(terminal) = &self.terminal {
            return terminal.clone();
        }
        match self.script.pop_front() {
            Some(block) => {
                if block.is_terminal() {
                    self.terminal = Some(block.clone());
                }
                block
            }
            None if self.pending_tail => Block::NoOp,
            None => {
                self.terminal = Some(Block::EndOfStream);
                Block::EndOfStream
            }
        }
    }

    fn cancel(&mut self) {
        if self.terminal.is_none() {
            self.terminal = Some(Block::error(KestrelError::Cancelled(
                "values source".to_string(),
            )));
        }
    }

    fn children(&self) -> Vec<&dyn Operator> {
        vec![]
    }

    fn describe(&self) -> String {
        format!("VALUES(blocks={})", self.script.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow_schema::{DataType, Field, Schema};

    fn schema() -> SchemaRef {
        Arc::new(Schema::new(vec![Field::new("v", DataType::Int64, true)]))
    }

    #[test]
    fn rows_are_chunked_then_end_repeats() {
        let rows = (0..5).map(|v| vec![ScalarValue::Int64(v)]).collect();
        let mut op = ValuesOperator::from_rows(schema(), rows, 2);
        let sizes: Vec<usize> = (0..3).map(|_| op.next_block().num_rows()).collect();
        assert_eq!(sizes, vec![2, 2, 1]);
        assert!(matches!(op.next_block(), Block::EndOfStream));
        assert!(matches!(op.next_block(), Block::EndOfStream));
        assert_eq!(op.pull_counter().load(Ordering::Relaxed), 5);
    }

    #[test]
    fn literal_width_mismatch_is_planning_error() {
        let err = ValuesOperator::try_from_literals(
            schema(),
            &[vec![LiteralValue::Int64(1), LiteralValue::Int64(2)]],
            8,
        )
        .err();
        assert!(matches!(err, Some(KestrelError::Planning(_))));
    }

    #[test]
    fn cancel_after_end_keeps_end_of_stream() {
        let mut op = ValuesOperator::scripted(schema(), vec![]);
        assert!(matches!(op.next_block(), Block::EndOfStream));
        op.cancel();
        assert!(matches!(op.next_block(), Block::EndOfStream));

        let mut pending = ValuesOperator::scripted(schema(), vec![]).then_pending();
        pending.cancel();
        assert!(matches!(pending.next_block(), Block::Error(_)));
    }

    #[test]
    fn pending_tail_never_ends() {
        let mut op = ValuesOperator::scripted(schema(), vec![]).then_pending();
        assert!(matches!(op.next_block(), Block::NoOp));
        assert!(matches!(op.next_block(), Block::NoOp));
    }
}
