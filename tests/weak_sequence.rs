// WeakSequence integration suite.
//
// Core behaviors exercised:
// - Liveness: only referents with an outstanding strong reference count.
// - Identity: add deduplicates by allocation, not by value.
// - Order: survivors keep insertion order across purges.
// - Iteration: a pass neither skips nor repeats a survivor when elements
//   die or are removed mid-pass, and passes do not disturb each other.
// - Visiting: for_each stops at the first error and returns it.
// - Concurrency: many threads may add, remove and iterate at once.
use std::rc::{Rc, Weak};
use std::sync::Arc;
use weak_collections::WeakSequence;

fn objects(n: usize) -> Vec<Rc<usize>> {
    (0..n).map(Rc::new).collect()
}

fn values(seq: &WeakSequence<Weak<usize>>) -> Vec<usize> {
    seq.to_vec().iter().map(|o| **o).collect()
}

// Test: the ten-object observer scenario.
// Assumes: the caller holds the only strong references.
// Verifies: re-adding is a no-op; dropping two objects leaves the other
// eight in their original order.
#[test]
fn ten_objects_drop_two() {
    let mut objs: Vec<Option<Rc<usize>>> = objects(10).into_iter().map(Some).collect();
    let seq: WeakSequence<Weak<usize>> = WeakSequence::new();
    for o in objs.iter().flatten() {
        assert!(seq.add(o));
    }
    assert_eq!(seq.len(), 10);

    let first = objs[0].clone().expect("object 0 alive");
    assert!(!seq.add(&first));
    assert_eq!(seq.len(), 10);
    drop(first);

    objs[3] = None;
    objs[7] = None;
    assert_eq!(seq.len(), 8);
    assert_eq!(values(&seq), vec![0, 1, 2, 4, 5, 6, 8, 9]);
}

// Test: identity, not value equality, decides membership.
// Assumes: two separate allocations with the same content.
// Verifies: both are stored; contains/remove only match the exact one.
#[test]
fn dedup_is_by_identity() {
    let a = Rc::new(5usize);
    let twin = Rc::new(5usize);
    let seq: WeakSequence<Weak<usize>> = WeakSequence::with(&a);
    assert!(seq.add(&twin));
    assert_eq!(seq.len(), 2);
    assert!(seq.contains(&a));

    let removed = seq.remove(&twin).expect("twin present");
    assert!(Rc::ptr_eq(&removed, &twin));
    assert!(!seq.contains(&twin));
    assert!(seq.contains(&a));
    assert_eq!(seq.remove(&twin), None);
}

// Test: explicit purge and clear.
// Assumes: purge reports what this acquisition removed.
// Verifies: counts dead slots once; clear empties without touching referents.
#[test]
fn purge_and_clear() {
    let objs = objects(4);
    let seq: WeakSequence<Weak<usize>> = objs.iter().collect();
    let mut objs: Vec<Option<Rc<usize>>> = objs.into_iter().map(Some).collect();
    objs[1] = None;
    objs[2] = None;
    assert_eq!(seq.purge(), 2);
    assert_eq!(seq.purge(), 0);

    seq.clear();
    assert!(seq.is_empty());
    assert_eq!(objs[0].as_deref(), Some(&0));
}

// Test: for_each short-circuits.
// Assumes: visitor errors carry a caller-defined type.
// Verifies: traversal stops at the first error; earlier items were seen.
#[test]
fn for_each_stops_on_first_error() {
    let objs = objects(5);
    let seq: WeakSequence<Weak<usize>> = objs.iter().collect();
    let mut seen = Vec::new();
    let res = seq.for_each(|o| {
        if *o == 2 {
            return Err(format!("stopped at {}", o));
        }
        seen.push(*o);
        Ok(())
    });
    assert_eq!(res, Err("stopped at 2".to_string()));
    assert_eq!(seen, vec![0, 1]);

    let mut total = 0;
    seq.for_each::<(), _>(|o| {
        total += *o;
        Ok(())
    })
    .expect("no error");
    assert_eq!(total, 10);
}

// Test: referents dying during a pass.
// Assumes: the iterator purges on every step.
// Verifies: dead elements behind or ahead of the iterator are handled
// without skipping or repeating a survivor.
#[test]
fn iteration_survives_deallocation() {
    let mut objs: Vec<Option<Rc<usize>>> = objects(6).into_iter().map(Some).collect();
    let seq: WeakSequence<Weak<usize>> = objs.iter().flatten().collect();

    let mut it = seq.iter();
    let mut seen = Vec::new();
    seen.push(*it.next().expect("0"));
    seen.push(*it.next().expect("1"));
    // One already yielded, one still ahead.
    objs[0] = None;
    objs[4] = None;
    for o in it {
        seen.push(*o);
    }
    assert_eq!(seen, vec![0, 1, 2, 3, 5]);
}

// Test: the iterator drops the referent it is about to visit.
// Assumes: a survivor is yielded as a strong reference.
// Verifies: killing the current element keeps the pass aligned.
#[test]
fn iteration_survives_dropping_current() {
    let mut objs: Vec<Option<Rc<usize>>> = objects(4).into_iter().map(Some).collect();
    let seq: WeakSequence<Weak<usize>> = objs.iter().flatten().collect();

    let mut seen = Vec::new();
    for o in seq.iter() {
        let v = *o;
        drop(o);
        objs[v] = None;
        seen.push(v);
    }
    assert_eq!(seen, vec![0, 1, 2, 3]);
    assert!(seq.is_empty());
}

// Test: `for x in &seq` sugar.
// Assumes: IntoIterator for &WeakSequence starts a fresh pass.
// Verifies: a second loop sees every survivor again.
#[test]
fn borrowed_into_iter_restarts() {
    let objs = objects(3);
    let seq: WeakSequence<Weak<usize>> = objs.iter().collect();
    let first: Vec<usize> = (&seq).into_iter().map(|o| *o).collect();
    let mut second = Vec::new();
    for o in &seq {
        second.push(*o);
    }
    assert_eq!(first, vec![0, 1, 2]);
    assert_eq!(first, second);
}

// Test: overlapping passes over one sequence.
// Assumes: each iterator keeps its own position.
// Verifies: nested loops and zipped passes each see every survivor.
#[test]
fn overlapping_passes_are_independent() {
    let objs = objects(3);
    let seq: WeakSequence<Weak<usize>> = objs.iter().collect();

    let mut outer = Vec::new();
    let mut inner_counts = Vec::new();
    for a in &seq {
        outer.push(*a);
        inner_counts.push((&seq).into_iter().count());
    }
    assert_eq!(outer, vec![0, 1, 2]);
    assert_eq!(inner_counts, vec![3, 3, 3]);

    let pairs: Vec<(usize, usize)> = seq.iter().zip(seq.iter()).map(|(a, b)| (*a, *b)).collect();
    assert_eq!(pairs, vec![(0, 0), (1, 1), (2, 2)]);
}

// Test: shared sequence across threads.
// Assumes: Arc referents; the retained objects are added before the
// threads start and are never removed.
// Verifies: every pass on every thread sees each retained object exactly
// once while other threads add, remove and iterate concurrently.
#[test]
fn concurrent_add_remove_iterate() {
    let keep: Vec<Arc<u64>> = (0..64).map(Arc::new).collect();
    let seq: WeakSequence<std::sync::Weak<u64>> = keep.iter().collect();

    std::thread::scope(|s| {
        for t in 0..4u64 {
            let seq = &seq;
            s.spawn(move || {
                for round in 0..200u64 {
                    let temp = Arc::new(1_000 + t * 1_000 + round);
                    seq.add(&temp);
                    if round % 3 == 0 {
                        assert!(seq.remove(&temp).is_some());
                    }
                    let retained: Vec<u64> = seq.iter().map(|o| *o).filter(|v| *v < 64).collect();
                    assert_eq!(retained, (0..64).collect::<Vec<u64>>());
                }
            });
        }
    });

    assert_eq!(seq.len(), keep.len());
    for k in &keep {
        assert!(seq.contains(k));
    }
}
