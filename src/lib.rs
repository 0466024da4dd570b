//! mutex-kit: lock-wrapped containers with configurable element equality.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: a sequence container that is safe to share between threads and
//!   can search by value even when the element type has no usable `==`.
//! - Layers:
//!   - `strategy`: the process-wide `Strategy` knob (`Lax`, `LaxMarshal`,
//!     `Marshal`, `Reflect`) held in an atomic `StrategyCell`.
//!   - `probes`: capability traits (`Equal`, `Compare`, `Hash64`,
//!     `MarshalJson`, ...) plus the `Probes` registry trait through which a
//!     type says which of them it supports, per value.
//!   - `deep`: structural equality over a serde rendering of the value.
//!   - `equals`: the resolution engine. Walks the probes in a fixed order
//!     allowed by the strategy and falls back to `deep`.
//!   - `matcher`: the seam between containers and equality. `Native` is
//!     `PartialEq`; `Resolved` is the engine.
//!   - `slice`: `Slice<E, M>`, an ordered sequence behind one
//!     `parking_lot::RwLock`. `AnySlice<E>` is the engine-backed form.
//!   - `value`, `map`: single-value and keyed siblings behind a mutex.
//!
//! Constraints
//! - Every container operation is atomic with respect to the others on the
//!   same instance. Nothing is lock-free.
//! - Returned collections are copies. Callers never alias internal storage
//!   except inside `exclusive` and `update_range`.
//! - The strategy is read once per comparison. A change racing with an
//!   in-flight search may or may not be seen by it.
//! - Structural comparison never loops: rendering stops at
//!   `deep::MAX_DEPTH` and the comparison answers "not equal".
//!
//! Reentrancy policy
//! - Locks are not reentrant. User code that runs while a container lock is
//!   held (`exclusive` and `update_range` callbacks, equality probes during
//!   `compare_and_swap`/`compare_and_delete`) must not call back into the
//!   same container. Doing so deadlocks the calling thread.
//! - Debug builds track the thread inside such a section and log an error
//!   from the reentrant entry point before it blocks. Release builds carry
//!   no tracking.
//! - `contains` and `range` work on snapshots, so their probes and visitors
//!   may use the container freely.
//! - Evicted elements are dropped after the lock is released.
//!
//! Notes and non-goals
//! - No fine-grained or lock-free concurrency, no persistence.
//! - Probe answers are trusted as given; an inconsistent type gets the
//!   answer of the first probe it supports.
//! - A probe receives `&Self`. Comparing across element types is not
//!   expressible.

mod equals;
mod map;
mod matcher;
mod reentrancy;
mod slice;
#[cfg(test)]
mod slice_proptest;
mod strategy;
mod value;

pub mod deep;
pub mod probes;

// Public surface
pub use deep::ShapeError;
pub use equals::{equals, equals_in, resolve};
pub use map::Map;
pub use matcher::{Matcher, Native, Resolved};
pub use probes::{MarshalError, Probes};
pub use slice::{AnySlice, Slice};
pub use strategy::{
    set_strategy, strategy, ParseStrategyError, Strategy, StrategyCell, GLOBAL_STRATEGY,
};
pub use value::{Numeric, Value};
