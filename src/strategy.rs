//! Equality strategy selection and the cell that carries it.
//!
//! A `StrategyCell` is a relaxed atomic: a store becomes visible to later
//! loads on every thread, but a comparison already in flight keeps the
//! strategy it read when it started. Concurrent writers resolve as
//! last-write-wins. Nothing orders a strategy change against comparisons
//! running on other threads.

use core::fmt;
use core::str::FromStr;
use core::sync::atomic::{AtomicU8, Ordering};
use serde::{Deserialize, Serialize};

/// Which capability probes the resolution engine may try.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Identity-style probes, then structural comparison.
    #[default]
    Lax,
    /// Identity-style probes, then serialization-style probes, then
    /// structural comparison.
    LaxMarshal,
    /// Serialization-style probes, then structural comparison.
    Marshal,
    /// Structural comparison only.
    Reflect,
}

impl Strategy {
    const ALL: [Strategy; 4] = [
        Strategy::Lax,
        Strategy::LaxMarshal,
        Strategy::Marshal,
        Strategy::Reflect,
    ];

    /// True when the `Equal` .. `Hash` probe group is enabled.
    #[inline]
    pub fn tries_identity(self) -> bool {
        matches!(self, Strategy::Lax | Strategy::LaxMarshal)
    }

    /// True when the `String` .. `MarshalJSON` probe group is enabled.
    #[inline]
    pub fn tries_marshal(self) -> bool {
        matches!(self, Strategy::LaxMarshal | Strategy::Marshal)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::Lax => "lax",
            Strategy::LaxMarshal => "lax_marshal",
            Strategy::Marshal => "marshal",
            Strategy::Reflect => "reflect",
        }
    }

    #[inline]
    fn to_bits(self) -> u8 {
        self as u8
    }

    #[inline]
    fn from_bits(bits: u8) -> Self {
        // Only `to_bits` values are ever stored.
        Self::ALL.get(bits as usize).copied().unwrap_or_default()
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
#[error("unknown equality strategy `{0}` (expected lax, lax_marshal, marshal or reflect)")]
pub struct ParseStrategyError(String);

impl FromStr for Strategy {
    type Err = ParseStrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|st| st.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ParseStrategyError(s.to_string()))
    }
}

/// Shared, atomically updated strategy setting.
#[derive(Debug)]
pub struct StrategyCell {
    bits: AtomicU8,
}

impl StrategyCell {
    /// Const so it can back a `static`.
    pub const fn new(strategy: Strategy) -> Self {
        Self {
            bits: AtomicU8::new(strategy as u8),
        }
    }

    #[inline]
    pub fn get(&self) -> Strategy {
        Strategy::from_bits(self.bits.load(Ordering::Relaxed))
    }

    /// Store a new strategy and return the one it replaced.
    pub fn set(&self, strategy: Strategy) -> Strategy {
        let prev = Strategy::from_bits(self.bits.swap(strategy.to_bits(), Ordering::Relaxed));
        if prev != strategy {
            tracing::debug!(from = %prev, to = %strategy, "equality strategy changed");
        }
        prev
    }
}

impl Default for StrategyCell {
    fn default() -> Self {
        Self::new(Strategy::default())
    }
}

/// Process-wide strategy read by `equals` and by default-built `AnySlice`s.
pub static GLOBAL_STRATEGY: StrategyCell = StrategyCell::new(Strategy::Lax);

/// Set the process-wide strategy. Returns the previous one.
pub fn set_strategy(strategy: Strategy) -> Strategy {
    GLOBAL_STRATEGY.set(strategy)
}

/// Current process-wide strategy.
pub fn strategy() -> Strategy {
    GLOBAL_STRATEGY.get()
}
