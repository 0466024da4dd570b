//! Equality resolution: the ordered probe chain.
//!
//! Order is fixed and observable. For types that implement several probes
//! with inconsistent answers, the first supported one wins:
//!
//! 1. `Reflect` skips straight to 4.
//! 2. `Lax`/`LaxMarshal`: `Equal`, `Equals`, `Compare`, `Cmp`, `Is`,
//!    `IsSame`, then `Hash64` (only when both sides expose it). Each is
//!    called on `a` with `b` as the argument.
//! 3. `LaxMarshal`/`Marshal`: `Display`, `MarshalBinary`, `MarshalJson`,
//!    each only when both sides expose it. A marshal probe that fails on
//!    either side is skipped. `LaxMarshal` reaches this group only after
//!    the whole of group 2 came up empty.
//! 4. Structural comparison (`deep::deep_equal`).

use crate::deep;
use crate::probes::{MarshalError, Probes};
use crate::strategy::{Strategy, StrategyCell, GLOBAL_STRATEGY};
use core::cmp::Ordering;
use serde::Serialize;

/// Decide whether `a` and `b` are equal under `strategy`.
pub fn resolve<T>(a: &T, b: &T, strategy: Strategy) -> bool
where
    T: Probes + Serialize + ?Sized,
{
    if strategy.tries_identity() {
        if let Some(eq) = identity_probe(a, b) {
            return eq;
        }
    }
    if strategy.tries_marshal() {
        if let Some(eq) = marshal_probe(a, b) {
            return eq;
        }
    }
    tracing::trace!(%strategy, "no probe decided; comparing structurally");
    deep::deep_equal(a, b)
}

/// `resolve` under the process-wide strategy.
pub fn equals<T>(a: &T, b: &T) -> bool
where
    T: Probes + Serialize + ?Sized,
{
    resolve(a, b, GLOBAL_STRATEGY.get())
}

/// `resolve` under the strategy currently held by `cell`.
pub fn equals_in<T>(cell: &StrategyCell, a: &T, b: &T) -> bool
where
    T: Probes + Serialize + ?Sized,
{
    resolve(a, b, cell.get())
}

fn identity_probe<T: Probes + ?Sized>(a: &T, b: &T) -> Option<bool> {
    if let Some(p) = a.as_equal() {
        return Some(decided("equal", p.equal(b)));
    }
    if let Some(p) = a.as_equals() {
        return Some(decided("equals", p.equals(b)));
    }
    if let Some(p) = a.as_compare() {
        return Some(decided("compare", p.compare(b) == Ordering::Equal));
    }
    if let Some(p) = a.as_cmp() {
        return Some(decided("cmp", p.cmp_to(b) == 0));
    }
    if let Some(p) = a.as_is() {
        return Some(decided("is", p.is(b)));
    }
    if let Some(p) = a.as_is_same() {
        return Some(decided("is_same", p.is_same(b)));
    }
    if let (Some(ha), Some(hb)) = (a.as_hash64(), b.as_hash64()) {
        return Some(decided("hash64", ha.hash64() == hb.hash64()));
    }
    None
}

fn marshal_probe<T: Probes + ?Sized>(a: &T, b: &T) -> Option<bool> {
    if let (Some(sa), Some(sb)) = (a.as_string_probe(), b.as_string_probe()) {
        return Some(decided("display", sa.to_string() == sb.to_string()));
    }
    if let (Some(ma), Some(mb)) = (a.as_marshal_binary(), b.as_marshal_binary()) {
        if let Some(eq) = same_bytes("marshal_binary", ma.marshal_binary(), || mb.marshal_binary()) {
            return Some(eq);
        }
    }
    if let (Some(ma), Some(mb)) = (a.as_marshal_json(), b.as_marshal_json()) {
        if let Some(eq) = same_bytes("marshal_json", ma.marshal_json(), || mb.marshal_json()) {
            return Some(eq);
        }
    }
    None
}

/// Compare two encodings; `None` if either side failed. `b` is only
/// encoded once `a` succeeded.
fn same_bytes(
    probe: &'static str,
    a: Result<Vec<u8>, MarshalError>,
    b: impl FnOnce() -> Result<Vec<u8>, MarshalError>,
) -> Option<bool> {
    match a.and_then(|a| b().map(|b| a == b)) {
        Ok(eq) => Some(decided(probe, eq)),
        Err(error) => {
            tracing::trace!(probe, %error, "marshal probe failed; trying next");
            None
        }
    }
}

#[inline]
fn decided(probe: &'static str, eq: bool) -> bool {
    tracing::trace!(probe, eq, "probe decided comparison");
    eq
}
