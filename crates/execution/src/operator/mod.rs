//! Pull-based operators of an op-chain.
//!
//! Every operator answers [`Operator::next_block`] with exactly one block and
//! never blocks: when its input has nothing ready it returns
//! [`Block::NoOp`](crate::Block::NoOp) and the scheduler re-polls later.

mod distinct;
mod shell;
mod sort;
mod values;

use arrow_schema::SchemaRef;

use crate::block::Block;

pub use distinct::{DistinctOperator, DistinctRetention};
pub use shell::{BlockRetention, RetentionOperator, ShellState};
pub use sort::SortOperator;
pub use values::ValuesOperator;

/// A physical operator instance polled by its consumer.
pub trait Operator: Send {
    /// Short operator name used in logs, metrics and explain output.
    fn name(&self) -> &'static str;

    /// Schema of every DATA block this operator emits.
    fn schema(&self) -> SchemaRef;

    /// Produce the next block. Callable indefinitely; terminal blocks repeat.
    fn next_block(&mut self) -> Block;

    /// Abandon this operator and its inputs. Later pulls yield a cancelled error.
    fn cancel(&mut self);

    /// Direct inputs.
    fn children(&self) -> Vec<&dyn Operator>;

    /// One-line description for explain output.
    fn describe(&self) -> String {
        self.name().to_string()
    }

    /// Indented operator tree rooted here.
    fn explain(&self) -> String {
        let mut out = String::new();
        explain_into(self, 0, &mut out);
        out
    }
}

/// Owned dynamically dispatched operator.
pub type BoxedOperator = Box<dyn Operator>;

fn explain_into<O: Operator + ?Sized>(op: &O, depth: usize, out: &mut String) {
    out.push_str(&"  ".repeat(depth));
    out.push_str(&op.describe());
    out.push('\n');
    for child in op.children() {
        explain_into(child, depth + 1, out);
    }
}
