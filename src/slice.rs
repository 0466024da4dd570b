//! Slice: an ordered sequence behind one reader/writer lock.
//!
//! Shared mode: `load`, `len`, `is_empty`, `contains` and the snapshot
//! taken by `range`. Everything else takes the lock exclusively.
//! `update_range` and `exclusive` keep it for the whole callback.
//!
//! The lock is `parking_lot::RwLock`, which is not reentrant. A callback
//! that calls any method on the same `Slice` (and an equality probe that
//! does so during `compare_and_swap`/`compare_and_delete`) deadlocks the
//! calling thread. There is no timeout. Debug builds log an error just
//! before that happens; see `reentrancy`.
//!
//! Elements evicted by `store`, `clear`, `remove`, `compare_and_swap` and
//! `compare_and_delete` are dropped after the lock is released, so their
//! `Drop` may use the slice. Elements replaced inside `update_range` or
//! `exclusive` are dropped under the lock.

use crate::matcher::{Matcher, Native, Resolved};
use crate::reentrancy::DebugReentrancy;
use core::fmt;
use parking_lot::RwLock;

/// Lock-guarded sequence. `M` decides element equality for
/// `contains`, `compare_and_swap` and `compare_and_delete`.
pub struct Slice<E, M = Native> {
    items: RwLock<Vec<E>>,
    matcher: M,
    reentrancy: DebugReentrancy,
}

/// Slice whose searches go through the equality resolution engine.
pub type AnySlice<E> = Slice<E, Resolved>;

impl<E, M: Default> Slice<E, M> {
    pub fn new() -> Self {
        Self::with_matcher(Vec::new(), M::default())
    }

    /// Take ownership of `values` as the initial contents.
    pub fn from_vec(values: Vec<E>) -> Self {
        Self::with_matcher(values, M::default())
    }
}

impl<E: Clone, M: Default> Slice<E, M> {
    /// Initial contents copied from `values`.
    pub fn from_slice(values: &[E]) -> Self {
        Self::from_vec(values.to_vec())
    }
}

impl<E, M> Slice<E, M> {
    pub fn with_matcher(values: Vec<E>, matcher: M) -> Self {
        Self {
            items: RwLock::new(values),
            matcher,
            reentrancy: DebugReentrancy::new(),
        }
    }

    pub fn matcher(&self) -> &M {
        &self.matcher
    }

    pub fn into_inner(self) -> Vec<E> {
        self.items.into_inner()
    }

    pub fn len(&self) -> usize {
        self.reentrancy.check("len");
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.reentrancy.check("is_empty");
        self.items.read().is_empty()
    }

    /// Empty the slice and return what it held.
    pub fn load_and_delete(&self) -> Vec<E> {
        self.reentrancy.check("load_and_delete");
        core::mem::take(&mut *self.items.write())
    }

    /// Remove the element at `pos`. False, with no change, if out of bounds.
    pub fn remove(&self, pos: usize) -> bool {
        self.reentrancy.check("remove");
        let removed = {
            let mut items = self.items.write();
            if pos >= items.len() {
                return false;
            }
            items.remove(pos)
        };
        drop(removed);
        true
    }

    /// Append `values` at the end, in iteration order.
    pub fn append<I: IntoIterator<Item = E>>(&self, values: I) {
        self.reentrancy.check("append");
        let values: Vec<E> = values.into_iter().collect();
        if values.is_empty() {
            return;
        }
        self.items.write().extend(values);
    }

    /// Insert `values` at the front, keeping their iteration order.
    pub fn prepend<I: IntoIterator<Item = E>>(&self, values: I) {
        self.reentrancy.check("prepend");
        let mut front: Vec<E> = values.into_iter().collect();
        if front.is_empty() {
            return;
        }
        let mut items = self.items.write();
        front.append(&mut *items);
        *items = front;
    }

    /// Remove and return the last element.
    pub fn pop(&self) -> Option<E> {
        self.reentrancy.check("pop");
        self.items.write().pop()
    }

    /// Remove and return the first element.
    pub fn shift(&self) -> Option<E> {
        self.reentrancy.check("shift");
        let mut items = self.items.write();
        if items.is_empty() {
            return None;
        }
        Some(items.remove(0))
    }

    pub fn clear(&self) {
        self.reentrancy.check("clear");
        let old = core::mem::take(&mut *self.items.write());
        drop(old);
    }

    /// Visit elements in order with the lock held exclusively for the whole
    /// traversal. `Some(new)` replaces the element and continues; `None`
    /// stops without touching it.
    ///
    /// `visit` must not call into this slice: the thread would deadlock.
    pub fn update_range<F>(&self, mut visit: F)
    where
        F: FnMut(usize, &E) -> Option<E>,
    {
        self.reentrancy.check("update_range");
        let mut items = self.items.write();
        let _g = self.reentrancy.enter();
        for (pos, slot) in items.iter_mut().enumerate() {
            match visit(pos, &*slot) {
                Some(new) => *slot = new,
                None => break,
            }
        }
    }

    /// Run `action` with direct access to the underlying vector while the
    /// lock is held exclusively.
    ///
    /// `action` must not call into this slice: the thread would deadlock.
    pub fn exclusive<R, F>(&self, action: F) -> R
    where
        F: FnOnce(&mut Vec<E>) -> R,
    {
        self.reentrancy.check("exclusive");
        let mut items = self.items.write();
        let _g = self.reentrancy.enter();
        action(&mut *items)
    }
}

impl<E: Clone, M> Slice<E, M> {
    /// An independent copy of the contents.
    pub fn load(&self) -> Vec<E> {
        self.reentrancy.check("load");
        self.items.read().clone()
    }

    /// Replace the contents with a copy of `values`.
    pub fn store(&self, values: &[E]) {
        self.reentrancy.check("store");
        let fresh = values.to_vec();
        let old = core::mem::replace(&mut *self.items.write(), fresh);
        drop(old);
    }

    /// Visit a snapshot in order until `visit` returns false.
    ///
    /// The lock is only held while the snapshot is taken; changes made
    /// meanwhile by other callers are not seen by this traversal.
    pub fn range<F>(&self, mut visit: F)
    where
        F: FnMut(usize, E) -> bool,
    {
        for (pos, val) in self.load().into_iter().enumerate() {
            if !visit(pos, val) {
                break;
            }
        }
    }
}

impl<E: Clone, M: Matcher<E>> Slice<E, M> {
    /// Index of the first element matching `value`, probing with `value`
    /// as the receiver. Scans a snapshot, so no probe runs under the lock.
    pub fn contains(&self, value: &E) -> Option<usize> {
        self.load()
            .iter()
            .position(|elem| self.matcher.matches(value, elem))
    }
}

impl<E, M: Matcher<E>> Slice<E, M> {
    /// Replace the first element matching `old` (stored element as the
    /// probe receiver) with `new`.
    pub fn compare_and_swap(&self, old: &E, new: E) -> bool {
        self.reentrancy.check("compare_and_swap");
        let replaced = {
            let mut items = self.items.write();
            let _g = self.reentrancy.enter();
            match items.iter().position(|elem| self.matcher.matches(elem, old)) {
                Some(pos) => core::mem::replace(&mut items[pos], new),
                None => return false,
            }
        };
        drop(replaced);
        true
    }

    /// Remove the first element matching `old`.
    pub fn compare_and_delete(&self, old: &E) -> bool {
        self.reentrancy.check("compare_and_delete");
        let removed = {
            let mut items = self.items.write();
            let _g = self.reentrancy.enter();
            match items.iter().position(|elem| self.matcher.matches(elem, old)) {
                Some(pos) => items.remove(pos),
                None => return false,
            }
        };
        drop(removed);
        true
    }
}

impl<E, M: Default> Default for Slice<E, M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E, M: Default> From<Vec<E>> for Slice<E, M> {
    fn from(values: Vec<E>) -> Self {
        Self::from_vec(values)
    }
}

impl<E, M: Default> FromIterator<E> for Slice<E, M> {
    fn from_iter<I: IntoIterator<Item = E>>(iter: I) -> Self {
        Self::from_vec(iter.into_iter().collect())
    }
}

/// Clones a snapshot of the contents into a new, independently locked slice.
impl<E: Clone, M: Clone> Clone for Slice<E, M> {
    fn clone(&self) -> Self {
        Self::with_matcher(self.load(), self.matcher.clone())
    }
}

impl<E: fmt::Debug, M> fmt::Debug for Slice<E, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let items = self.items.read();
        f.debug_struct("Slice").field("items", &*items).finish()
    }
}
