#![cfg(test)]

use std::rc::{Rc, Weak};
use weak_collections::{WeakKeyMap, WeakSequence};

#[test]
fn visitor_may_use_other_containers() {
    let a = Rc::new(1);
    let seq: WeakSequence<Weak<i32>> = WeakSequence::with(&a);
    let other: WeakSequence<Weak<i32>> = WeakSequence::new();
    seq.for_each::<(), _>(|o| {
        other.add(&o);
        Ok(())
    })
    .expect("visitor ok");
    assert_eq!(other.len(), 1);
}

#[test]
fn sequential_calls_are_ok() {
    let a = Rc::new(1);
    let seq: WeakSequence<Weak<i32>> = WeakSequence::with(&a);
    for o in seq.iter() {
        // The lock is released between steps of an iterator.
        assert!(seq.contains(&o));
    }
}

#[cfg(debug_assertions)]
#[test]
fn reentrancy_panics_in_debug() {
    let a = Rc::new(1);
    let seq: WeakSequence<Weak<i32>> = WeakSequence::with(&a);
    let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        // Calling back into the same sequence from its visitor should panic
        let _ = seq.for_each::<(), _>(|_| {
            let _ = seq.len();
            Ok(())
        });
    }));
    assert!(res.is_err(), "expected reentrancy to panic in debug builds");
    // The lock was released by unwinding.
    assert_eq!(seq.len(), 1);
}

#[cfg(debug_assertions)]
#[test]
fn map_reentrancy_panics_in_debug() {
    let k = Rc::new(1u8);
    let map: WeakKeyMap<Weak<u8>, u8> = WeakKeyMap::new();
    map.insert(&k, 0);
    let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        map.update(&k, |v| {
            *v = map.len() as u8;
        })
    }));
    assert!(res.is_err(), "expected reentrancy to panic in debug builds");
    assert_eq!(map.get(&k), Some(0));
}
