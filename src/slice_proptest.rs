#![cfg(test)]

// Property tests for Slice kept inside the crate next to the matcher and
// strategy internals they lean on.

use crate::matcher::Resolved;
use crate::probes::Equal;
use crate::slice::{AnySlice, Slice};
use crate::strategy::{Strategy as EqStrategy, StrategyCell};
use proptest::prelude::*;

// Engine-backed element: `Equal` looks at `id` only, `stamp` differs per
// insertion, so a structural comparison would never match.
#[derive(Clone, Debug, serde::Serialize)]
struct Item {
    id: i8,
    stamp: u32,
}

impl Equal for Item {
    fn equal(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
crate::probes!(Item: Equal);

static CELL: StrategyCell = StrategyCell::new(EqStrategy::Lax);

#[derive(Clone, Debug)]
enum Op {
    Append(Vec<i8>),
    Prepend(Vec<i8>),
    Store(Vec<i8>),
    Pop,
    Shift,
    Remove(usize),
    CompareAndSwap(i8, i8),
    CompareAndDelete(i8),
    Contains(i8),
    UpdatePrefix(usize, i8),
    Clear,
    LoadAndDelete,
}

// Small value domain so searches hit often.
fn val() -> impl Strategy<Value = i8> {
    -4i8..4
}

fn arb_ops() -> impl Strategy<Value = Vec<Op>> {
    let vals = || proptest::collection::vec(val(), 0..5);
    let op = prop_oneof![
        vals().prop_map(Op::Append),
        vals().prop_map(Op::Prepend),
        vals().prop_map(Op::Store),
        Just(Op::Pop),
        Just(Op::Shift),
        (0usize..10).prop_map(Op::Remove),
        (val(), val()).prop_map(|(o, n)| Op::CompareAndSwap(o, n)),
        val().prop_map(Op::CompareAndDelete),
        val().prop_map(Op::Contains),
        (0usize..10, val()).prop_map(|(n, d)| Op::UpdatePrefix(n, d)),
        Just(Op::Clear),
        Just(Op::LoadAndDelete),
    ];
    proptest::collection::vec(op, 1..60)
}

struct Stamper(u32);

impl Stamper {
    fn item(&mut self, id: i8) -> Item {
        self.0 += 1;
        Item { id, stamp: self.0 }
    }

    fn items(&mut self, ids: &[i8]) -> Vec<Item> {
        ids.iter().map(|&id| self.item(id)).collect()
    }
}

fn ids(s: &AnySlice<Item>) -> Vec<i8> {
    s.load().iter().map(|it| it.id).collect()
}

// Property: State-machine equivalence against a plain Vec.
// Invariants exercised across random operation sequences:
// - Append/prepend/store keep order; pop/shift/remove report absence exactly
//   when the model does.
// - Compare-and-swap/delete touch only the first match, and the
//   engine-backed slice matches through the `Equal` probe, not structure.
// - `contains` yields the first matching index or `None`.
// - `update_range` applies a prefix of updates and stops at the first `None`.
// - `len`/`is_empty` parity with the model after each op.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine(ops in arb_ops()) {
        let native: Slice<i8> = Slice::new();
        let engine: AnySlice<Item> = Slice::with_matcher(Vec::new(), Resolved::with_cell(&CELL));
        let mut model: Vec<i8> = Vec::new();
        let mut stamper = Stamper(0);

        for op in ops {
            match op {
                Op::Append(vs) => {
                    native.append(vs.iter().copied());
                    engine.append(stamper.items(&vs));
                    model.extend(vs);
                }
                Op::Prepend(vs) => {
                    native.prepend(vs.iter().copied());
                    engine.prepend(stamper.items(&vs));
                    let mut front = vs;
                    front.append(&mut model);
                    model = front;
                }
                Op::Store(vs) => {
                    native.store(&vs);
                    engine.store(&stamper.items(&vs));
                    model = vs;
                }
                Op::Pop => {
                    let want = model.pop();
                    prop_assert_eq!(native.pop(), want);
                    prop_assert_eq!(engine.pop().map(|it| it.id), want);
                }
                Op::Shift => {
                    let want = if model.is_empty() { None } else { Some(model.remove(0)) };
                    prop_assert_eq!(native.shift(), want);
                    prop_assert_eq!(engine.shift().map(|it| it.id), want);
                }
                Op::Remove(pos) => {
                    let ok = pos < model.len();
                    if ok {
                        model.remove(pos);
                    }
                    prop_assert_eq!(native.remove(pos), ok);
                    prop_assert_eq!(engine.remove(pos), ok);
                }
                Op::CompareAndSwap(old, new) => {
                    let hit = model.iter().position(|&v| v == old);
                    if let Some(pos) = hit {
                        model[pos] = new;
                    }
                    prop_assert_eq!(native.compare_and_swap(&old, new), hit.is_some());
                    let probe = stamper.item(old);
                    let fresh = stamper.item(new);
                    prop_assert_eq!(engine.compare_and_swap(&probe, fresh), hit.is_some());
                }
                Op::CompareAndDelete(old) => {
                    let hit = model.iter().position(|&v| v == old);
                    if let Some(pos) = hit {
                        model.remove(pos);
                    }
                    prop_assert_eq!(native.compare_and_delete(&old), hit.is_some());
                    let probe = stamper.item(old);
                    prop_assert_eq!(engine.compare_and_delete(&probe), hit.is_some());
                }
                Op::Contains(v) => {
                    let want = model.iter().position(|&m| m == v);
                    prop_assert_eq!(native.contains(&v), want);
                    let probe = stamper.item(v);
                    prop_assert_eq!(engine.contains(&probe), want);
                }
                Op::UpdatePrefix(n, delta) => {
                    let step = |x: i8| x.wrapping_add(delta);
                    for v in model.iter_mut().take(n) {
                        *v = step(*v);
                    }
                    native.update_range(|pos, &old| if pos < n { Some(step(old)) } else { None });
                    engine.update_range(|pos, old| {
                        if pos < n { Some(stamper.item(step(old.id))) } else { None }
                    });
                }
                Op::Clear => {
                    native.clear();
                    engine.clear();
                    model.clear();
                }
                Op::LoadAndDelete => {
                    let want = core::mem::take(&mut model);
                    prop_assert_eq!(native.load_and_delete(), want.clone());
                    let got: Vec<i8> = engine.load_and_delete().iter().map(|it| it.id).collect();
                    prop_assert_eq!(got, want);
                }
            }
            prop_assert_eq!(native.load(), model.clone());
            prop_assert_eq!(ids(&engine), model.clone());
            prop_assert_eq!(native.len(), model.len());
            prop_assert_eq!(engine.is_empty(), model.is_empty());
        }
    }
}
