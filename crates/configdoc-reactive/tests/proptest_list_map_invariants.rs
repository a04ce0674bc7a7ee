#![forbid(unsafe_code)]

//! Property-based invariant tests for the observable collections.
//!
//! 1. Replaying every published `ListChange` onto a plain `Vec` reproduces
//!    the list contents.
//! 2. An `ObservableMap` matches a naive ordered model after any sequence of
//!    inserts and removals, and publishes only effective changes.
//! 3. `Observable` versions count effective changes only.

use std::sync::{Arc, Mutex};

use configdoc_reactive::{ListChange, MapChange, Observable, ObservableList, ObservableMap};
use proptest::prelude::*;

// ── Strategies ──────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum ListOp {
    Push(u8),
    Extend(Vec<u8>),
    Insert(usize, u8),
    Remove(usize),
    RemoveItem(u8),
    RetainEven,
}

fn list_op() -> impl Strategy<Value = ListOp> {
    prop_oneof![
        any::<u8>().prop_map(ListOp::Push),
        proptest::collection::vec(any::<u8>(), 0..4).prop_map(ListOp::Extend),
        (0usize..16, any::<u8>()).prop_map(|(i, v)| ListOp::Insert(i, v)),
        (0usize..16).prop_map(ListOp::Remove),
        (0u8..8).prop_map(ListOp::RemoveItem),
        Just(ListOp::RetainEven),
    ]
}

#[derive(Debug, Clone)]
enum MapOp {
    Insert(u8, u8),
    Remove(u8),
}

fn map_op() -> impl Strategy<Value = MapOp> {
    prop_oneof![
        (0u8..6, 0u8..4).prop_map(|(k, v)| MapOp::Insert(k, v)),
        (0u8..6).prop_map(MapOp::Remove),
    ]
}

// ── Helpers ─────────────────────────────────────────────────────────────

fn replay(mirror: &mut Vec<u8>, change: &ListChange<u8>) {
    for removed in &change.removed {
        let index = mirror
            .iter()
            .skip(change.from)
            .position(|v| v == removed)
            .map(|offset| offset + change.from)
            .expect("removed element present in mirror");
        mirror.remove(index);
    }
    for (offset, added) in change.added.iter().enumerate() {
        mirror.insert(change.from + offset, *added);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 1. List changes replay to the same contents
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn list_changes_replay_to_contents(ops in proptest::collection::vec(list_op(), 0..40)) {
        let list = ObservableList::<u8>::new();
        let mirror = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&mirror);
        let _sub = list.subscribe(move |change| replay(&mut sink.lock().unwrap(), change));

        for op in ops {
            match op {
                ListOp::Push(v) => list.push(v),
                ListOp::Extend(vs) => list.extend(vs),
                ListOp::Insert(i, v) => {
                    if i <= list.len() {
                        list.insert(i, v);
                    }
                }
                ListOp::Remove(i) => {
                    list.remove(i);
                }
                ListOp::RemoveItem(v) => {
                    list.remove_item(&v);
                }
                ListOp::RetainEven => list.retain(|v| v % 2 == 0),
            }
            prop_assert_eq!(&*mirror.lock().unwrap(), &list.to_vec());
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. Map matches an ordered model
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn map_matches_ordered_model(ops in proptest::collection::vec(map_op(), 0..40)) {
        let map = ObservableMap::<u8, u8>::new();
        let published = Arc::new(Mutex::new(0usize));
        let sink = Arc::clone(&published);
        let _sub = map.subscribe(move |_: &MapChange<u8, u8>| *sink.lock().unwrap() += 1);

        let mut model: Vec<(u8, u8)> = Vec::new();
        let mut effective = 0usize;

        for op in ops {
            match op {
                MapOp::Insert(k, v) => {
                    match model.iter_mut().find(|(mk, _)| *mk == k) {
                        Some((_, mv)) if *mv == v => {}
                        Some((_, mv)) => {
                            *mv = v;
                            effective += 1;
                        }
                        None => {
                            model.push((k, v));
                            effective += 1;
                        }
                    }
                    map.insert(k, v);
                }
                MapOp::Remove(k) => {
                    if let Some(pos) = model.iter().position(|(mk, _)| *mk == k) {
                        model.remove(pos);
                        effective += 1;
                    }
                    map.remove(&k);
                }
            }
            prop_assert_eq!(map.entries(), model.clone());
        }
        prop_assert_eq!(*published.lock().unwrap(), effective);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Observable versions count effective changes
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn observable_version_counts_changes(values in proptest::collection::vec(0u8..4, 0..50)) {
        let obs = Observable::new(0u8);
        let mut last = 0u8;
        let mut changes = 0u64;
        for v in values {
            if v != last {
                changes += 1;
                last = v;
            }
            obs.set(v);
        }
        prop_assert_eq!(obs.version(), changes);
        prop_assert_eq!(obs.get(), last);
    }
}
