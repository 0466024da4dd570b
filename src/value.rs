//! Single-value wrappers, each behind one exclusive lock.

use core::fmt;
use core::ops::Add;
use parking_lot::Mutex;

/// An optional value guarded by a mutex. `load` reports absence until
/// something is stored.
pub struct Value<T> {
    slot: Mutex<Option<T>>,
}

impl<T> Value<T> {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    pub fn with_value(value: T) -> Self {
        Self {
            slot: Mutex::new(Some(value)),
        }
    }

    pub fn store(&self, value: T) {
        let old = self.slot.lock().replace(value);
        drop(old);
    }

    /// Store `value` and return the previous one.
    pub fn swap(&self, value: T) -> Option<T> {
        self.slot.lock().replace(value)
    }

    /// Take the value out, leaving the wrapper empty.
    pub fn load_and_delete(&self) -> Option<T> {
        self.slot.lock().take()
    }

    pub fn is_present(&self) -> bool {
        self.slot.lock().is_some()
    }

    pub fn into_inner(self) -> Option<T> {
        self.slot.into_inner()
    }
}

impl<T: Clone> Value<T> {
    pub fn load(&self) -> Option<T> {
        self.slot.lock().clone()
    }
}

impl<T: PartialEq> Value<T> {
    /// Store `new` if the current value equals `old`. An absent value never
    /// matches.
    pub fn compare_and_swap(&self, old: &T, new: T) -> bool {
        let mut slot = self.slot.lock();
        match slot.as_mut() {
            Some(cur) if *cur == *old => {
                *cur = new;
                true
            }
            _ => false,
        }
    }
}

impl<T> Default for Value<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for Value<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Value").field("value", &*self.slot.lock()).finish()
    }
}

/// A numeric `Value` with in-place addition.
pub struct Numeric<T> {
    value: Value<T>,
}

impl<T> Numeric<T> {
    pub fn new() -> Self {
        Self { value: Value::new() }
    }

    pub fn with_value(value: T) -> Self {
        Self {
            value: Value::with_value(value),
        }
    }

    pub fn store(&self, value: T) {
        self.value.store(value)
    }

    pub fn swap(&self, value: T) -> Option<T> {
        self.value.swap(value)
    }

    pub fn load_and_delete(&self) -> Option<T> {
        self.value.load_and_delete()
    }

    pub fn is_present(&self) -> bool {
        self.value.is_present()
    }
}

impl<T: Copy> Numeric<T> {
    pub fn load(&self) -> Option<T> {
        *self.value.slot.lock()
    }
}

impl<T: PartialEq> Numeric<T> {
    pub fn compare_and_swap(&self, old: &T, new: T) -> bool {
        self.value.compare_and_swap(old, new)
    }
}

impl<T: Copy + Default + Add<Output = T>> Numeric<T> {
    /// Add `delta` and return the new value. An absent value counts as
    /// `T::default()` and becomes present.
    pub fn add(&self, delta: T) -> T {
        let mut slot = self.value.slot.lock();
        let next = (*slot).unwrap_or_default() + delta;
        *slot = Some(next);
        next
    }
}

impl<T> Default for Numeric<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for Numeric<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Numeric")
            .field("value", &*self.value.slot.lock())
            .finish()
    }
}
