// Value, Numeric and Map integration suite.
//
// Mirrors the single-value and keyed wrappers' basic contracts: absence
// until stored, overwrite on store, compare-and-swap only on a present and
// equal value, and atomic read-modify-write under contention.
use mutex_kit::{Map, Numeric, Value};
use std::thread;

// Test: empty Value, then store/load.
#[test]
fn value_new_then_store() {
    let v: Value<String> = Value::new();
    assert_eq!(v.load(), None);
    v.store("42".to_string());
    assert_eq!(v.load().as_deref(), Some("42"));
}

// Test: Value built with contents, then compare-and-swap.
#[test]
fn value_with_value_cas() {
    let v = Value::with_value("42".to_string());
    assert!(!v.compare_and_swap(&"41".to_string(), "43".to_string()));
    assert!(v.compare_and_swap(&"42".to_string(), "43".to_string()));
    assert_eq!(v.into_inner().as_deref(), Some("43"));
}

// Test: Numeric add from absent and from an initial value.
#[test]
fn numeric_add() {
    let n: Numeric<i32> = Numeric::new();
    assert_eq!(n.load(), None);
    assert_eq!(n.add(42), 42);

    let n = Numeric::with_value(41i32);
    assert_eq!(n.add(1), 42);
    assert!(n.compare_and_swap(&42, 0));
    assert_eq!(n.load(), Some(0));
}

// Test: Map store/load, including borrowed lookups.
#[test]
fn map_store_load() {
    let m: Map<String, String> = Map::new();
    assert_eq!(m.load("key"), None);
    m.store("key".to_string(), "42".to_string());
    assert_eq!(m.load("key").as_deref(), Some("42"));
    m.delete("key");
    assert!(m.is_empty());
}

// Test: concurrent load_or_store agrees on one winner per key.
#[test]
fn map_load_or_store_single_winner() {
    const THREADS: u32 = 8;
    let m: Map<&str, u32> = Map::new();
    let winners: Vec<u32> = thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|t| {
                let m = &m;
                scope.spawn(move || m.load_or_store("k", t))
            })
            .collect();
        handles
            .into_iter()
            .filter_map(|h| match h.join() {
                Ok((v, false)) => Some(v),
                _ => None,
            })
            .collect()
    });
    assert_eq!(winners.len(), 1);
    assert_eq!(m.load("k"), Some(winners[0]));
}
