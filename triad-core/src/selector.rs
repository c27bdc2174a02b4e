//! Bounded top-K selection.
//!
//! [`TopSelector`] retains the K entries with the largest comparison value
//! seen so far, displacing the current worst entry on each accepted
//! insertion. K is small relative to the number of candidates, so a plain
//! slot array with O(K) insertion beats a heap here and keeps the
//! comparator a zero-cost generic parameter.

use std::cmp::Ordering;

use smallvec::SmallVec;
use triad_types::SelectorError;

/// Slot counts up to this stay on the stack.
const INLINE_SLOTS: usize = 8;

/// Fixed-capacity collection of the top K entries by comparison value.
///
/// Slots start out holding `Default` key/value pairs, which lose every
/// comparison against real entries until displaced. Keys are not
/// deduplicated: inserting the same key twice occupies two slots.
///
/// The displacement algorithm is carried over from the legacy collection
/// this type replaces, including its tie handling: the guard scan and the
/// worst-slot recompute both resolve equal values in favor of the lowest
/// slot index. Downstream ordering of equal-count results depends on that,
/// so it is preserved rather than replaced with a stable comparator.
pub struct TopSelector<K, V, C> {
    slots: SmallVec<[(K, V); INLINE_SLOTS]>,
    cmp: C,
    worst: usize,
}

impl<K, V, C> TopSelector<K, V, C>
where
    K: Default,
    V: Default,
    C: Fn(&V, &V) -> Ordering,
{
    /// Creates a selector with `capacity` slots and a total-order comparator.
    ///
    /// # Errors
    ///
    /// Returns `SelectorError::InvalidCapacity` if `capacity` is zero.
    pub fn new(capacity: usize, cmp: C) -> Result<Self, SelectorError> {
        if capacity == 0 {
            return Err(SelectorError::InvalidCapacity);
        }

        let mut slots = SmallVec::with_capacity(capacity);
        for _ in 0..capacity {
            slots.push((K::default(), V::default()));
        }

        Ok(Self {
            slots,
            cmp,
            worst: 0,
        })
    }

    /// Attempts to place `(key, value)` among the current top K.
    ///
    /// Rejects (returning `false`, without mutation) unless the value is
    /// strictly greater than the value at the tracked worst slot. On
    /// acceptance the worst slot is displaced and the worst index is
    /// recomputed by a full scan, first minimum winning.
    pub fn insert(&mut self, key: K, value: V) -> bool {
        if (self.cmp)(&value, &self.slots[self.worst].1) != Ordering::Greater {
            return false;
        }

        // Legacy guard scan: find the first slot the candidate does not
        // lose to. The candidate already beat the worst slot, so a match
        // exists at or before `self.worst`; the displaced slot is always
        // the tracked worst one.
        for i in 0..self.slots.len() {
            if (self.cmp)(&value, &self.slots[i].1) != Ordering::Less {
                self.slots[self.worst] = (key, value);
                break;
            }
        }

        self.recompute_worst();
        true
    }

    /// Index of the slot currently holding the smallest tracked value.
    #[inline(always)]
    #[must_use]
    pub fn worst_index(&self) -> usize {
        self.worst
    }

    /// Number of slots; fixed at construction.
    #[inline(always)]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Iterates the slots in index order, still-default slots included.
    ///
    /// The iterator is lazy and restartable; it never mutates the selector.
    pub fn snapshot(&self) -> impl Iterator<Item = (&K, &V)> + '_ {
        self.slots.iter().map(|(k, v)| (k, v))
    }

    fn recompute_worst(&mut self) {
        let mut worst = 0;
        for i in 1..self.slots.len() {
            if (self.cmp)(&self.slots[worst].1, &self.slots[i].1) == Ordering::Greater {
                worst = i;
            }
        }
        self.worst = worst;
    }
}
