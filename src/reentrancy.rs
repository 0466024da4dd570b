//! Debug-only reentrancy detector.
//!
//! Containers keep their lock held while user code runs: `exclusive` and
//! `update_range` callbacks, and equality probes during a compare-and-swap
//! scan. The lock is not reentrant, so calling back into the same container
//! from there deadlocks. That stays true here; this tracker only records
//! which thread is inside such a section and, in debug builds, logs an
//! error when that thread enters the container again, right before it
//! blocks for good. In release builds it compiles to a zero-cost no-op.

#[cfg(not(debug_assertions))]
use core::marker::PhantomData;
#[cfg(debug_assertions)]
use std::thread::{self, ThreadId};

/// Per-instance tracker. Embed it in a container, wrap callback sections
/// in `let _g = self.reentrancy.enter();` and call `check` at every
/// public entry point.
#[derive(Debug, Default)]
pub struct DebugReentrancy {
    #[cfg(debug_assertions)]
    holder: parking_lot::Mutex<Option<ThreadId>>,
}

impl DebugReentrancy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the current thread as running user code under the container lock.
    #[inline]
    pub fn enter(&self) -> ReentrancyGuard<'_> {
        #[cfg(debug_assertions)]
        {
            let prev = self.holder.lock().replace(thread::current().id());
            ReentrancyGuard { owner: self, prev }
        }

        #[cfg(not(debug_assertions))]
        {
            ReentrancyGuard { _z: PhantomData }
        }
    }

    /// Report a reentrant call of `op` from inside a guarded section.
    #[inline]
    pub fn check(&self, op: &'static str) {
        #[cfg(debug_assertions)]
        {
            if self.is_held_by_current() {
                tracing::error!(
                    op,
                    "reentrant call from a callback holding this container's lock; \
                     the calling thread will deadlock"
                );
            }
        }
        #[cfg(not(debug_assertions))]
        let _ = op;
    }

    /// True if the current thread is inside a guarded section. Always
    /// false in release builds.
    pub fn is_held_by_current(&self) -> bool {
        #[cfg(debug_assertions)]
        {
            *self.holder.lock() == Some(thread::current().id())
        }

        #[cfg(not(debug_assertions))]
        {
            false
        }
    }
}

/// RAII guard returned by `DebugReentrancy::enter`.
pub struct ReentrancyGuard<'a> {
    #[cfg(debug_assertions)]
    owner: &'a DebugReentrancy,
    #[cfg(debug_assertions)]
    prev: Option<ThreadId>,
    #[cfg(not(debug_assertions))]
    _z: PhantomData<&'a ()>,
}

impl<'a> Drop for ReentrancyGuard<'a> {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        {
            *self.owner.holder.lock() = self.prev.take();
        }
    }
}

/// Run `f` and count the error events it logs on this thread.
#[cfg(all(test, debug_assertions))]
pub(crate) fn count_errors<R>(f: impl FnOnce() -> R) -> (R, usize) {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tracing_subscriber::layer::{Context, SubscriberExt};

    struct Errors(Arc<AtomicUsize>);

    impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for Errors {
        fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
            if *event.metadata().level() == tracing::Level::ERROR {
                self.0.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    let seen = Arc::new(AtomicUsize::new(0));
    let subscriber = tracing_subscriber::registry().with(Errors(Arc::clone(&seen)));
    let out = tracing::subscriber::with_default(subscriber, f);
    (out, seen.load(Ordering::Relaxed))
}
