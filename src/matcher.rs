//! The comparison seam used by `Slice` for search-by-value operations.

use crate::equals;
use crate::probes::Probes;
use crate::strategy::{Strategy, StrategyCell, GLOBAL_STRATEGY};
use serde::Serialize;

/// Decides whether the probe receiver `a` matches `b`.
pub trait Matcher<E: ?Sized> {
    fn matches(&self, a: &E, b: &E) -> bool;
}

/// Native `PartialEq`. Never consults any strategy.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Native;

impl<E: PartialEq + ?Sized> Matcher<E> for Native {
    #[inline]
    fn matches(&self, a: &E, b: &E) -> bool {
        a == b
    }
}

/// Resolution engine driven by a strategy cell (the process-wide one
/// unless another is injected).
#[derive(Copy, Clone, Debug)]
pub struct Resolved {
    cell: &'static StrategyCell,
}

impl Resolved {
    pub fn with_cell(cell: &'static StrategyCell) -> Self {
        Self { cell }
    }

    /// Strategy the next comparison will use.
    pub fn strategy(&self) -> Strategy {
        self.cell.get()
    }
}

impl Default for Resolved {
    fn default() -> Self {
        Self::with_cell(&GLOBAL_STRATEGY)
    }
}

impl<E: Probes + Serialize + ?Sized> Matcher<E> for Resolved {
    #[inline]
    fn matches(&self, a: &E, b: &E) -> bool {
        equals::equals_in(self.cell, a, b)
    }
}
