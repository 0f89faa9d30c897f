//! Uniqueness tracking for retained elements.

use std::collections::HashSet;
use std::hash::Hash;

/// Hashable identity of a retained element.
pub trait MembershipKey {
    /// Key type; equal keys mean duplicate elements.
    type Key: Hash + Eq + Send;

    /// Identity of this element.
    fn membership_key(&self) -> Self::Key;
}

/// Tracks which elements are currently retained.
pub trait Membership<T>: Send {
    /// Whether an equal element is retained.
    fn contains(&self, value: &T) -> bool;
    /// Record `value` as retained.
    fn insert(&mut self, value: &T);
    /// Forget an evicted element.
    fn remove(&mut self, value: &T);
}

/// Hash-set membership used by distinct retention.
#[derive(Debug)]
pub struct HashMembership<T: MembershipKey> {
    keys: HashSet<T::Key>,
}

impl<T: MembershipKey> HashMembership<T> {
    /// Empty set with room for `capacity` keys.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            keys: HashSet::with_capacity(capacity),
        }
    }

    /// Number of tracked keys.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether no key is tracked.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl<T: MembershipKey> Membership<T> for HashMembership<T> {
    fn contains(&self, value: &T) -> bool {
        self.keys.contains(&value.membership_key())
    }

    fn insert(&mut self, value: &T) {
        self.keys.insert(value.membership_key());
    }

    fn remove(&mut self, value: &T) {
        self.keys.remove(&value.membership_key());
    }
}

/// Pass-through membership for row retention, where duplicates are legal.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoMembership;

impl<T> Membership<T> for NoMembership {
    fn contains(&self, _value: &T) -> bool {
        false
    }

    fn insert(&mut self, _value: &T) {}

    fn remove(&mut self, _value: &T) {}
}

impl MembershipKey for i32 {
    type Key = i32;

    fn membership_key(&self) -> i32 {
        *self
    }
}

impl MembershipKey for i64 {
    type Key = i64;

    fn membership_key(&self) -> i64 {
        *self
    }
}

// All NaN payloads collapse to one key so NaN is distinct exactly once.
impl MembershipKey for f32 {
    type Key = u32;

    fn membership_key(&self) -> u32 {
        if self.is_nan() {
            f32::NAN.to_bits()
        } else {
            self.to_bits()
        }
    }
}

impl MembershipKey for f64 {
    type Key = u64;

    fn membership_key(&self) -> u64 {
        if self.is_nan() {
            f64::NAN.to_bits()
        } else {
            self.to_bits()
        }
    }
}

impl MembershipKey for String {
    type Key = String;

    fn membership_key(&self) -> String {
        self.clone()
    }
}

impl MembershipKey for Vec<u8> {
    type Key = Vec<u8>;

    fn membership_key(&self) -> Vec<u8> {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nan_payloads_share_one_key() {
        let quiet = f64::NAN;
        let other = f64::from_bits(f64::NAN.to_bits() ^ 1);
        assert!(other.is_nan());
        assert_eq!(quiet.membership_key(), other.membership_key());
    }

    #[test]
    fn hash_membership_tracks_insert_and_remove() {
        let mut m = HashMembership::<String>::with_capacity(4);
        m.insert(&"a".to_string());
        assert!(m.contains(&"a".to_string()));
        m.remove(&"a".to_string());
        assert!(m.is_empty());
    }

    #[test]
    fn no_membership_never_reports_duplicates() {
        let mut m = NoMembership;
        Membership::<i64>::insert(&mut m, &1);
        assert!(!Membership::<i64>::contains(&m, &1));
    }
}
