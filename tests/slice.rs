// Slice integration suite.
//
// Covers the public constructors, the queue-style front/back operations,
// copy isolation at the boundary, behavior under concurrent use and the
// documented self-deadlock when a locked callback re-enters the slice.
// Core invariants exercised:
// - Every operation is atomic with respect to every other one.
// - Returned and stored sequences never alias the internal storage.
// - Locks are not reentrant: a callback running under the lock that calls
//   into the same slice blocks forever.
use mutex_kit::{AnySlice, Matcher, Native, Resolved, Slice};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

// Test: empty construction, then append and drain from the front.
// Verifies: shift yields elements in append order.
#[test]
fn new_append_shift() {
    let s: Slice<String> = Slice::new();
    assert!(s.load().is_empty());
    s.append(["41".to_string(), "42".to_string()]);
    assert_eq!(s.shift().as_deref(), Some("41"));
    assert_eq!(s.shift().as_deref(), Some("42"));
    assert_eq!(s.shift(), None);
}

// Test: prepend keeps argument order, pop drains from the back.
#[test]
fn new_prepend_pop() {
    let s: Slice<&str> = Slice::new();
    s.prepend(["42", "41"]);
    assert_eq!(s.pop(), Some("41"));
    assert_eq!(s.pop(), Some("42"));
    assert_eq!(s.pop(), None);
}

// Test: construction with initial contents, native and engine-backed.
#[test]
fn with_value_constructors() {
    let s: Slice<&str> = Slice::from_vec(vec!["41", "42"]);
    assert_eq!(s.shift(), Some("41"));
    assert_eq!(s.pop(), Some("42"));

    let any: AnySlice<String> = Slice::new();
    any.store(&["41".to_string(), "42".to_string()]);
    assert_eq!(any.shift().as_deref(), Some("41"));
    assert_eq!(any.pop().as_deref(), Some("42"));

    let any: AnySlice<String> = Slice::from_slice(&["41".to_string(), "42".to_string()]);
    assert_eq!(any.shift().as_deref(), Some("41"));
    assert_eq!(any.pop().as_deref(), Some("42"));
    assert!(any.is_empty());
}

// Test: the engine-backed slice searches with the process-wide strategy.
// Assumes: nothing in this binary changes the global strategy (Lax).
#[test]
fn any_slice_search() {
    let s: AnySlice<String> = ["a", "b", "c"].iter().map(|x| x.to_string()).collect();
    assert_eq!(s.contains(&"b".to_string()), Some(1));
    assert_eq!(s.contains(&"z".to_string()), None);
    assert!(s.compare_and_swap(&"c".to_string(), "d".to_string()));
    assert!(s.compare_and_delete(&"a".to_string()));
    assert_eq!(s.load(), vec!["b".to_string(), "d".to_string()]);
}

// Test: loaded copies and stored inputs are isolated from the slice.
#[test]
fn boundary_copies_are_isolated() {
    let s: Slice<Vec<u8>> = Slice::new();
    let mut input = vec![vec![1], vec![2]];
    s.store(&input);
    input[0].push(9);
    let mut out = s.load();
    out[1].push(9);
    assert_eq!(s.load(), vec![vec![1], vec![2]]);
}

// Test: NaN never matches, even itself, on either matcher.
#[test]
fn nan_never_matches() {
    let s: Slice<f64> = Slice::from_vec(vec![1.0, f64::NAN]);
    assert_eq!(s.contains(&f64::NAN), None);
    assert!(!s.compare_and_delete(&f64::NAN));

    let any: AnySlice<f64> = Slice::from_vec(vec![f64::NAN]);
    assert_eq!(any.contains(&f64::NAN), None);
}

#[derive(Clone, Debug, serde::Serialize)]
struct Link {
    next: Option<Box<Link>>,
}
mutex_kit::probes!(Link);

fn links(len: usize) -> Link {
    (1..len).fold(Link { next: None }, |tail, _| Link {
        next: Some(Box::new(tail)),
    })
}

// Test: deeply nested elements with no probes of their own.
// Verifies: structural search still finds an identical element, so
// `contains` and `compare_and_delete` see what the slice holds.
#[test]
fn deep_elements_match_structurally() {
    let chain = links(200);
    let s: AnySlice<Link> = Slice::from_vec(vec![links(3), chain.clone()]);
    assert_eq!(s.contains(&chain), Some(1));
    assert_eq!(s.contains(&links(199)), None);
    assert!(s.compare_and_delete(&chain));
    assert_eq!(s.len(), 1);
}

// Test: concurrent writers and readers on one slice.
// Verifies: no appended element is lost; every removal takes exactly one
// element; readers never observe a torn state.
#[test]
fn concurrent_mixed_operations() {
    const THREADS: usize = 8;
    const PER_THREAD: usize = 500;
    let s: Slice<usize> = Slice::new();

    thread::scope(|scope| {
        for t in 0..THREADS {
            let s = &s;
            scope.spawn(move || {
                for i in 0..PER_THREAD {
                    s.append([t * PER_THREAD + i]);
                    let _ = s.len();
                    let _ = s.contains(&(t * PER_THREAD));
                    s.range(|_, _| true);
                }
            });
        }
    });

    let mut all = s.load();
    all.sort_unstable();
    assert_eq!(all, (0..THREADS * PER_THREAD).collect::<Vec<_>>());

    let popped = std::sync::atomic::AtomicUsize::new(0);
    thread::scope(|scope| {
        for _ in 0..THREADS {
            scope.spawn(|| {
                while s.pop().is_some() || s.shift().is_some() {
                    popped.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
                }
            });
        }
    });
    assert!(s.is_empty());
    assert_eq!(popped.into_inner(), THREADS * PER_THREAD);
}

// Every thread runs the full operation mix against one shared slice.
fn stress<M: Matcher<u32> + Sync>(s: &Slice<u32, M>) {
    const THREADS: u32 = 8;
    const ROUNDS: u32 = 200;
    thread::scope(|scope| {
        for t in 0..THREADS {
            scope.spawn(move || {
                for i in 0..ROUNDS {
                    let v = t * ROUNDS + i;
                    s.append([v, v + 1]);
                    s.prepend([v]);
                    let _ = s.remove((v % 7) as usize);
                    let _ = s.contains(&v);
                    let _ = s.compare_and_swap(&v, v + 2);
                    let _ = s.compare_and_delete(&(v + 1));
                    let snapshot = s.load();
                    if i % 50 == 0 {
                        s.store(&snapshot);
                    }
                    if i % 97 == 0 {
                        s.clear();
                    }
                    let _ = s.len();
                    let n = s.exclusive(|items| {
                        items.push(v);
                        items.len()
                    });
                    assert!(n >= 1);
                    s.range(|_, _| true);
                    s.update_range(|pos, old| (pos < 4).then(|| old.wrapping_add(1)));
                    let _ = s.pop();
                    let _ = s.shift();
                }
            });
        }
    });
    assert_eq!(s.len(), s.load().len());
    assert_eq!(s.is_empty(), s.load().is_empty());
}

// Test: full mixed workload from many threads, fast path and engine.
// Verifies: completes without panics; `len` agrees with the contents.
#[test]
fn concurrent_stress_all_operations() {
    let native: Slice<u32> = Slice::new();
    stress(&native);
    let engine: AnySlice<u32> = Slice::new();
    stress(&engine);
}

// Test: concurrent compare-and-swap races on a single slot.
// Verifies: exactly one thread wins each generation.
#[test]
fn concurrent_compare_and_swap_single_winner() {
    const THREADS: usize = 8;
    let s: Slice<u32, Native> = Slice::from_vec(vec![0]);
    let wins = std::sync::atomic::AtomicUsize::new(0);
    thread::scope(|scope| {
        for _ in 0..THREADS {
            scope.spawn(|| {
                if s.compare_and_swap(&0, 1) {
                    wins.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
                }
            });
        }
    });
    assert_eq!(wins.into_inner(), 1);
    assert_eq!(s.load(), vec![1]);
}

// Test: update_range holds the lock for the whole traversal.
// Verifies: a concurrent snapshot never sees a half-applied traversal.
#[test]
fn update_range_is_atomic() {
    let s: Slice<u32> = Slice::from_vec(vec![0; 64]);
    thread::scope(|scope| {
        scope.spawn(|| {
            for _ in 0..50 {
                s.update_range(|_, v| Some(v + 1));
            }
        });
        scope.spawn(|| {
            for _ in 0..50 {
                let snap = s.load();
                let first = snap[0];
                assert!(snap[..64].iter().all(|&v| v == first), "torn update");
                s.append([first]);
                s.pop();
            }
        });
    });
    assert!(s.load().iter().all(|&v| v == 50));
}

fn assert_blocks<F>(what: &str, work: F)
where
    F: FnOnce() + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        work();
        let _ = tx.send(());
    });
    // The worker is left blocked; the test process exits regardless.
    assert!(
        rx.recv_timeout(Duration::from_millis(300)).is_err(),
        "{what} returned; expected the calling thread to deadlock"
    );
}

// Test: calling back into the slice from `exclusive` deadlocks.
#[test]
fn exclusive_reentry_deadlocks() {
    let s: Arc<Slice<i32>> = Arc::new(Slice::from_vec(vec![1]));
    let inner = Arc::clone(&s);
    assert_blocks("exclusive + len", move || {
        inner.exclusive(|_| inner.len());
    });
}

// Test: calling back into the slice from `update_range` deadlocks.
#[test]
fn update_range_reentry_deadlocks() {
    let s: Arc<Slice<i32>> = Arc::new(Slice::from_vec(vec![1, 2]));
    let inner = Arc::clone(&s);
    assert_blocks("update_range + append", move || {
        inner.update_range(|_, v| {
            inner.append([*v]);
            Some(*v)
        });
    });
}

// Test: other threads are unaffected by a different slice's deadlock.
#[test]
fn unrelated_slice_still_usable() {
    let stuck: Arc<Slice<i32>> = Arc::new(Slice::new());
    let inner = Arc::clone(&stuck);
    assert_blocks("exclusive + pop", move || {
        inner.exclusive(|_| inner.pop());
    });
    let other: Slice<i32, Resolved> = Slice::from_vec(vec![3]);
    assert_eq!(other.contains(&3), Some(0));
}
