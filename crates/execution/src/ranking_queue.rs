//! Fixed-capacity priority queue exposing its worst retained element.

use std::cmp::Ordering;
use std::collections::VecDeque;

use binary_heap_plus::BinaryHeap;
use compare::Compare;

use crate::collation::Preference;

/// Heap order that puts the least preferred element on top.
struct WorstOnTop<P>(P);

impl<T, P: Preference<T>> Compare<T> for WorstOnTop<P> {
    fn compare(&self, l: &T, r: &T) -> Ordering {
        self.0.prefer(r, l)
    }
}

/// Bounded top-K structure: keeps at most `capacity` elements, the most
/// preferred ones seen so far.
///
/// The root of the underlying heap is always the worst retained element, so
/// a candidate is tested against one element and admitted in O(log K).
/// Ties never displace: once full, a candidate must rank strictly better than
/// the worst element.
pub struct BoundedRankingQueue<T, P: Preference<T> + Clone> {
    heap: BinaryHeap<T, WorstOnTop<P>>,
    preference: P,
    capacity: usize,
}

impl<T, P: Preference<T> + Clone> BoundedRankingQueue<T, P> {
    /// Create a queue holding at most `capacity` elements.
    ///
    /// `initial_capacity` caps eager allocation for large limits.
    ///
    /// # Panics
    /// When `capacity` is zero.
    pub fn new(capacity: usize, initial_capacity: usize, preference: P) -> Self {
        assert!(capacity > 0, "ranking queue capacity must be positive");
        let reserve = capacity.min(initial_capacity.max(1));
        Self {
            heap: BinaryHeap::from_vec_cmp(
                Vec::with_capacity(reserve),
                WorstOnTop(preference.clone()),
            ),
            preference,
            capacity,
        }
    }

    /// Maximum number of retained elements.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of retained elements.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Whether nothing is retained.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Ranking used by this queue.
    pub fn preference(&self) -> &P {
        &self.preference
    }

    /// Current least preferred element, if any.
    pub fn peek_worst(&self) -> Option<&T> {
        self.heap.peek()
    }

    /// Remove and return the least preferred element.
    pub fn pop_worst(&mut self) -> Option<T> {
        self.heap.pop()
    }

    /// Whether `value` would be retained if at most `limit` slots were live.
    ///
    /// `limit` may be below [`Self::capacity`] (a reserved slot); it never
    /// shrinks what is already retained.
    pub fn would_admit(&self, value: &T, limit: usize) -> bool {
        if self.heap.len() < limit.min(self.capacity) {
            return true;
        }
        match self.heap.peek() {
            Some(worst) => self.preference().prefer(value, worst) == Ordering::Greater,
            None => false,
        }
    }

    /// Insert `value`, first evicting the worst element when `limit` live
    /// slots are already taken. Returns the evicted element.
    ///
    /// Callers must check [`Self::would_admit`] first.
    pub fn admit_unchecked(&mut self, value: T, limit: usize) -> Option<T> {
        let evicted = if self.heap.len() >= limit.min(self.capacity) {
            self.heap.pop()
        } else {
            None
        };
        self.heap.push(value);
        debug_assert!(self.heap.len() <= self.capacity);
        evicted
    }

    /// Admit `value` if there is room or it beats the current worst.
    pub fn try_admit(&mut self, value: T) -> bool {
        if !self.would_admit(&value, self.capacity) {
            return false;
        }
        self.admit_unchecked(value, self.capacity);
        true
    }

    /// Empty the queue, returning retained elements best first.
    ///
    /// The `skip_best` most preferred elements (an offset into the ordered
    /// result) are dropped. Elements come off the heap worst first, so each
    /// one is prepended to the output and popping stops once only the skipped
    /// elements remain.
    pub fn drain_best_first(&mut self, skip_best: usize) -> Vec<T> {
        let mut out = VecDeque::with_capacity(self.heap.len().saturating_sub(skip_best));
        while self.heap.len() > skip_best {
            match self.heap.pop() {
                Some(value) => out.push_front(value),
                None => break,
            }
        }
        while self.heap.pop().is_some() {}
        out.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collation::ValueCollator;
    use kestrel_planner::SortDirection;

    fn desc_queue(capacity: usize) -> BoundedRankingQueue<i64, ValueCollator> {
        BoundedRankingQueue::new(capacity, 16, ValueCollator::new(SortDirection::Desc))
    }

    #[test]
    fn keeps_largest_under_desc() {
        let mut q = desc_queue(3);
        for v in [5, 1, 9, 1, 7, 3] {
            q.try_admit(v);
            assert!(q.len() <= 3);
        }
        assert_eq!(q.peek_worst(), Some(&5));
        assert_eq!(q.drain_best_first(0), vec![9, 7, 5]);
        assert!(q.is_empty());
    }

    #[test]
    fn equal_rank_does_not_displace_when_full() {
        let mut q = desc_queue(2);
        assert!(q.try_admit(4));
        assert!(q.try_admit(4));
        assert!(!q.try_admit(4));
        assert!(q.try_admit(5));
        assert_eq!(q.drain_best_first(0), vec![5, 4]);
    }

    #[test]
    fn drain_skips_leading_offset() {
        let mut q = BoundedRankingQueue::new(4, 4, ValueCollator::new(SortDirection::Asc));
        for v in [8_i64, 2, 6, 4, 10] {
            q.try_admit(v);
        }
        assert_eq!(q.drain_best_first(1), vec![4, 6, 8]);
        assert!(q.is_empty());
    }

    #[test]
    fn reduced_limit_blocks_growth_but_keeps_contents() {
        let mut q = desc_queue(3);
        q.try_admit(1);
        q.try_admit(2);
        q.try_admit(3);
        assert!(!q.would_admit(&0, 2));
        assert!(q.would_admit(&4, 2));
        assert_eq!(q.admit_unchecked(4, 2), Some(1));
        assert_eq!(q.len(), 3);
    }

    #[test]
    fn zero_limit_admits_nothing_into_empty_queue() {
        let q = desc_queue(1);
        assert!(!q.would_admit(&42, 0));
    }

    #[test]
    #[should_panic(expected = "capacity must be positive")]
    fn zero_capacity_is_rejected() {
        let _ = desc_queue(0);
    }
}
