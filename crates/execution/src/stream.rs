//! Record-batch stream view of an operator chain.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use arrow::record_batch::RecordBatch;
use arrow_schema::SchemaRef;
use futures::Stream;
use kestrel_common::{KestrelError, Result};

use crate::block::Block;
use crate::operator::BoxedOperator;

/// A stream of RecordBatches that also knows its output schema.
pub trait RecordBatchStream: Stream<Item = Result<RecordBatch>> + Send {
    /// Output schema for every batch yielded by this stream.
    fn schema(&self) -> SchemaRef;
}

/// The standard "stream you can hand to an async consumer".
pub type SendableRecordBatchStream = Pin<Box<dyn RecordBatchStream>>;

/// Adapts the root operator of a chain into a [`RecordBatchStream`].
///
/// DATA blocks become items, NO_OP wakes the task and returns `Pending` so the
/// executor re-polls after other work, ERROR becomes one `Err` item and
/// END_OF_STREAM ends the stream.
pub struct BlockStream {
    root: BoxedOperator,
    schema: SchemaRef,
    done: bool,
}

impl BlockStream {
    /// Wrap `root`; its schema becomes the stream schema.
    pub fn new(root: BoxedOperator) -> Self {
        let schema = root.schema();
        Self {
            root,
            schema,
            done: false,
        }
    }

    /// Boxed, pinned form.
    pub fn boxed(root: BoxedOperator) -> SendableRecordBatchStream {
        Box::pin(Self::new(root))
    }
}

impl RecordBatchStream for BlockStream {
    fn schema(&self) -> SchemaRef {
        self.schema.clone()
    }
}

impl Stream for BlockStream {
    type Item = Result<RecordBatch>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.done {
            return Poll::Ready(None);
        }
        loop {
            match self.root.next_block() {
                Block::Data(data) => {
                    if data.num_rows() == 0 {
                        continue;
                    }
                    return Poll::Ready(Some(data.to_record_batch()));
                }
                Block::NoOp => {
                    cx.waker().wake_by_ref();
                    return Poll::Pending;
                }
                Block::Error(err) => {
                    self.done = true;
                    return Poll::Ready(Some(Err(unshare(err))));
                }
                Block::EndOfStream => {
                    self.done = true;
                    return Poll::Ready(None);
                }
            }
        }
    }
}

/// Take the error out of a block, rebuilding it when still shared.
///
/// The variant is kept; a shared IO error keeps its kind and message but
/// loses its source chain.
pub fn unshare(err: Arc<KestrelError>) -> KestrelError {
    Arc::try_unwrap(err).unwrap_or_else(|shared| match shared.as_ref() {
        KestrelError::Cancelled(msg) => KestrelError::Cancelled(msg.clone()),
        KestrelError::InvalidConfig(msg) => KestrelError::InvalidConfig(msg.clone()),
        KestrelError::Planning(msg) => KestrelError::Planning(msg.clone()),
        KestrelError::Execution(msg) => KestrelError::Execution(msg.clone()),
        KestrelError::Unsupported(msg) => KestrelError::Unsupported(msg.clone()),
        KestrelError::Io(e) => KestrelError::Io(std::io::Error::new(e.kind(), e.to_string())),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operator::ValuesOperator;
    use crate::scalar::ScalarValue;
    use arrow_schema::{DataType, Field, Schema};
    use futures::StreamExt;

    fn schema() -> SchemaRef {
        Arc::new(Schema::new(vec![Field::new("v", DataType::Int64, true)]))
    }

    #[tokio::test]
    async fn noop_blocks_are_retried_transparently() {
        let data = crate::block::DataBlock::from_rows(schema(), vec![vec![ScalarValue::Int64(1)]]);
        let root = ValuesOperator::scripted(
            schema(),
            vec![Block::NoOp, Block::Data(data), Block::NoOp, Block::EndOfStream],
        );
        let batches: Vec<_> = BlockStream::new(Box::new(root)).collect().await;
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].as_ref().expect("batch").num_rows(), 1);
    }

    #[test]
    fn shared_io_error_keeps_its_variant() {
        let err = Arc::new(KestrelError::Io(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "segment truncated",
        )));
        let _held = err.clone();
        match unshare(err) {
            KestrelError::Io(e) => {
                assert_eq!(e.kind(), std::io::ErrorKind::UnexpectedEof);
                assert!(e.to_string().contains("segment truncated"));
            }
            other => panic!("expected io error, got {other}"),
        }
    }

    #[tokio::test]
    async fn error_block_ends_stream_with_err() {
        let root = ValuesOperator::scripted(
            schema(),
            vec![Block::error(KestrelError::Execution("boom".to_string()))],
        );
        let mut stream = BlockStream::boxed(Box::new(root));
        let first = stream.next().await.expect("item");
        assert!(matches!(first, Err(KestrelError::Execution(_))));
        assert!(stream.next().await.is_none());
    }
}
