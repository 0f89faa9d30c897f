//! Top-K retention shared by the distinct and sort executors.

use crate::collation::Preference;
use crate::membership::Membership;
use crate::ranking_queue::BoundedRankingQueue;

/// Outcome of offering one element to a [`TopKRetainer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// An equal element is already retained.
    Duplicate,
    /// Inserted into a free slot.
    Inserted,
    /// Inserted after evicting the previous worst element.
    Replaced,
    /// Not better than the current worst element.
    Rejected,
}

/// Keeps the K most preferred elements of an unbounded stream.
///
/// Combines a [`BoundedRankingQueue`] with a [`Membership`] policy; the two
/// always hold the same elements.
pub struct TopKRetainer<T, P, M>
where
    P: Preference<T> + Clone,
    M: Membership<T>,
{
    queue: BoundedRankingQueue<T, P>,
    membership: M,
}

impl<T, P, M> TopKRetainer<T, P, M>
where
    P: Preference<T> + Clone,
    M: Membership<T>,
{
    /// Retainer over `queue` starting with an empty `membership`.
    pub fn new(queue: BoundedRankingQueue<T, P>, membership: M) -> Self {
        Self { queue, membership }
    }

    /// Number of retained elements.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether nothing is retained.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Hard upper bound on retained elements.
    pub fn capacity(&self) -> usize {
        self.queue.capacity()
    }

    /// Offer `value` with at most `live_slots` slots available for growth.
    ///
    /// Duplicates are ignored before any ranking, so the first occurrence of
    /// a value keeps its slot. With the slots taken, `value` replaces the
    /// worst element only when it ranks strictly better.
    pub fn admit(&mut self, value: T, live_slots: usize) -> Admission {
        if self.membership.contains(&value) {
            return Admission::Duplicate;
        }
        if !self.queue.would_admit(&value, live_slots) {
            return Admission::Rejected;
        }
        self.membership.insert(&value);
        match self.queue.admit_unchecked(value, live_slots) {
            Some(evicted) => {
                self.membership.remove(&evicted);
                Admission::Replaced
            }
            None => Admission::Inserted,
        }
    }

    /// Remove everything, best first, skipping the `skip_best` leading elements.
    pub fn drain_best_first(&mut self, skip_best: usize) -> Vec<T> {
        let out = self.queue.drain_best_first(skip_best);
        for value in &out {
            self.membership.remove(value);
        }
        out
    }
}
