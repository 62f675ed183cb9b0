//! Handle ownership through the public surface
//!
//! Tests here compare process-wide live-object and call counts, so they run
//! one at a time.

use parking_lot::{const_mutex, Mutex};
use pyobj::{dict, list, set, Dict, Handle, Kind, List, View};
use pyobj_runtime::api;

static LIVE_LOCK: Mutex<()> = const_mutex(());

fn live_objects() -> usize {
    api::stats().unwrap().live_objects
}

fn runtime_calls() -> u64 {
    api::stats().unwrap().calls
}

fn setup() {
    assert!(pyobj::init());
}

#[test]
fn test_temporaries_are_released() {
    let _guard = LIVE_LOCK.lock();
    setup();
    let before = live_objects();
    {
        let xs = list![1, "two", 3.0];
        let d = dict! { "xs" => &xs, "n" => 4 };
        let s = set![1, 2];
        xs.append(&d);
        assert_eq!(d.len(), 2);
        assert_eq!(s.len(), 2);
        for item in &xs {
            let _ = item.to_text();
        }
    }
    api::collect().unwrap();
    assert_eq!(live_objects(), before);
}

#[test]
fn test_element_handles_outlive_their_container() {
    let _guard = LIVE_LOCK.lock();
    setup();
    let item = {
        let xs = list![list![9]];
        xs.get(0)
    };
    assert_eq!(item.kind(), Kind::List);
    assert_eq!(item.refcount(), 1);
    assert_eq!(item.to_string(), "[9]");
}

#[test]
fn test_pop_transfers_the_reference() {
    let _guard = LIVE_LOCK.lock();
    setup();
    let value = Handle::from(31337i64);
    let d = Dict::new();
    d.add("k", &value);
    assert_eq!(value.refcount(), 2);
    let popped = d.pop("k");
    assert!(popped.is_same(&value));
    assert_eq!(value.refcount(), 2);
    drop(popped);
    assert_eq!(value.refcount(), 1);
}

#[test]
fn test_view_round_trip_keeps_identity() {
    let _guard = LIVE_LOCK.lock();
    setup();
    let xs = list![1];
    let handle: Handle = xs.clone().into_handle();
    assert!(handle.is_same(&xs));
    let again = List::from_handle(handle);
    again.append(2);
    assert_eq!(xs.len(), 2);
}

#[test]
fn test_failed_operations_leave_no_garbage() {
    let _guard = LIVE_LOCK.lock();
    setup();
    let before = live_objects();
    {
        let xs = list![1];
        assert!(xs.get(10).is_null());
        assert!(!Dict::new().add(List::new(), 1));
        assert!(pyobj::call(&Handle::from(1i64), &pyobj::args![1, 2], None).is_null());
    }
    api::collect().unwrap();
    assert_eq!(live_objects(), before);
}

#[test]
fn test_uncallable_handle_makes_no_runtime_call() {
    let _guard = LIVE_LOCK.lock();
    setup();
    let len = pyobj::builtin("len");
    let not_callable = Handle::from(3i64);

    let before = runtime_calls();
    assert!(pyobj::call(&not_callable, &pyobj::args![1], None).is_null());
    assert!(not_callable.call_method("bit_length_missing", &[], None).is_null());
    assert!(pyobj::call(&Handle::empty(), &[], None).is_null());
    assert_eq!(runtime_calls(), before);

    assert_eq!(pyobj::call(&len, &pyobj::args!["abc"], None).as_i64(), Some(3));
    assert!(runtime_calls() > before);
}
