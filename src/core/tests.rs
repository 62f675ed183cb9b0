use super::*;
use crate::infrastructure::diagnostics;

fn setup() {
    assert!(crate::init());
}

#[test]
fn test_clone_and_drop_track_refcount() {
    setup();
    let a = Handle::from(1234i64);
    assert_eq!(a.refcount(), 1);
    let b = a.clone();
    assert_eq!(a.refcount(), 2);
    assert!(a.is_same(&b));
    drop(b);
    assert_eq!(a.refcount(), 1);
}

#[test]
fn test_take_moves_without_counting() {
    setup();
    let mut a = Handle::from("moved");
    let b = a.take();
    assert!(a.is_null());
    assert_eq!(b.refcount(), 1);
    let c = b;
    assert_eq!(c.refcount(), 1);
}

#[test]
fn test_clone_from_self_share_keeps_object() {
    setup();
    let mut a = Handle::from(5i64);
    let b = a.clone();
    a.clone_from(&b);
    assert_eq!(a.refcount(), 2);
    assert_eq!(a.as_i64(), Some(5));
}

#[test]
fn test_acquire_borrows() {
    setup();
    let owner = Handle::from(9i64);
    let shared = Handle::acquire(owner.raw());
    assert_eq!(owner.refcount(), 2);
    drop(shared);
    assert_eq!(owner.refcount(), 1);
    assert!(Handle::acquire(None).is_null());
}

#[test]
fn test_empty_handle_is_inert() {
    setup();
    let empty = Handle::empty();
    assert!(empty.is_null());
    assert!(empty.is_empty());
    assert_eq!(empty.kind(), Kind::Null);
    assert_eq!(empty.len(), 0);
    assert_eq!(empty.refcount(), 0);
    assert!(!empty.is_truthy());
    assert!(!empty.is_callable());
    assert_eq!(empty.as_i64(), None);
    assert_eq!(empty.to_text(), "None");
    assert!(empty.getattr("upper").is_null());
    assert!(!empty.is_same(&Handle::empty()));
}

#[test]
fn test_kinds_of_host_conversions() {
    setup();
    assert_eq!(Handle::from(true).kind(), Kind::Bool);
    assert_eq!(Handle::from(3i32).kind(), Kind::Int);
    assert_eq!(Handle::from(2.5f64).kind(), Kind::Float);
    assert_eq!(Handle::from("s").kind(), Kind::Text);
    assert_eq!(Handle::none().kind(), Kind::None);
    assert_eq!(Handle::from(None::<i64>).kind(), Kind::None);
    assert_eq!(Handle::from(Some(4i64)).as_i64(), Some(4));
}

#[test]
fn test_conversions_are_kind_gated() {
    setup();
    let text = Handle::from("12");
    assert_eq!(text.as_i64(), None);
    assert_eq!(text.as_string().as_deref(), Some("12"));

    let int = Handle::from(12i64);
    assert_eq!(int.as_string(), None);
    assert_eq!(int.as_f64(), Some(12.0));
    assert_eq!(int.as_bool(), None);

    assert_eq!(Handle::from(true).as_i64(), Some(1));
    assert_eq!(Handle::from(false).as_bool(), Some(false));
}

#[test]
fn test_emptiness_by_length() {
    setup();
    assert!(Handle::from("").is_empty());
    assert!(!Handle::from("x").is_empty());
    // Zero is falsy but not empty
    assert!(!Handle::from(0i64).is_empty());
    assert_eq!(Handle::from(0i64).len(), 0);
}

#[test]
fn test_oversized_usize_reports() {
    setup();
    let before = diagnostics::count();
    let handle = Handle::from(usize::MAX);
    assert!(handle.is_null());
    assert!(diagnostics::count() > before);
}

#[test]
fn test_comparisons() {
    setup();
    let one = Handle::from(1i64);
    let two = Handle::from(2i64);
    assert!(one < two);
    assert!(two >= one);
    assert_eq!(one, Handle::from(1.0f64));
    assert_ne!(one, two);
    assert_eq!(one.partial_cmp(&two), Some(std::cmp::Ordering::Less));
}

#[test]
fn test_comparisons_with_null() {
    setup();
    let empty = Handle::empty();
    assert!(empty == Handle::empty());
    assert!(Handle::from(1i64) != empty);
    assert!(!(Handle::from(1i64) < empty));
}

#[test]
fn test_incomparable_soft_fails() {
    setup();
    let before = diagnostics::count();
    let text = Handle::from("a");
    let int = Handle::from(1i64);
    assert!(!(text < int));
    assert!(diagnostics::count() > before);
    assert_eq!(text.partial_cmp(&int), None);
}

#[test]
fn test_text_and_repr() {
    setup();
    let text = Handle::from("hi");
    assert_eq!(text.to_text(), "hi");
    assert_eq!(text.repr(), "'hi'");
    assert_eq!(format!("{:?}", text), "Handle('hi')");
    assert_eq!(format!("{:?}", Handle::empty()), "Handle(null)");
}

#[test]
fn test_kind_display() {
    setup();
    assert_eq!(Handle::from("x").kind().to_string(), "text");
    assert_eq!(Kind::of(&Handle::none()).to_string(), "none");
}
