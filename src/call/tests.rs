use super::*;

fn setup() {
    assert!(crate::init());
}

fn ints(list: &List) -> Vec<i64> {
    list.iter().filter_map(|item| item.as_i64()).collect()
}

#[test]
fn test_call_builtin_with_positional_args() {
    setup();
    let len = builtin("len");
    assert!(len.is_callable());
    let result = call(&len, &crate::args!["four"], None);
    assert_eq!(result.as_i64(), Some(4));

    let max = builtin("max");
    assert_eq!(max.call(&crate::args![3, 9, 2], None).as_i64(), Some(9));
}

#[test]
fn test_call_with_keywords() {
    setup();
    let sorted = builtin("sorted");
    let items = crate::list![2, 3, 1];
    let kwargs = Kwargs::new().arg("reverse", true);
    let result = List::from_handle(sorted.call(&crate::args![&items], Some(&kwargs)));
    assert_eq!(ints(&result), [3, 2, 1]);
    // The argument itself is unchanged
    assert_eq!(ints(&items), [2, 3, 1]);
}

#[test]
fn test_unknown_keyword_fails_softly() {
    setup();
    let before = crate::infrastructure::diagnostics::count();
    let kwargs = Kwargs::new().arg("bogus", 1);
    let result = builtin("sorted").call(&crate::args![crate::list![1]], Some(&kwargs));
    assert!(result.is_null());
    assert!(crate::infrastructure::diagnostics::count() > before);
}

#[test]
fn test_call_empty_or_uncallable_reports() {
    setup();
    let before = crate::infrastructure::diagnostics::count();
    assert!(call(&Handle::empty(), &[], None).is_null());
    assert!(call(&Handle::from(3i64), &[], None).is_null());
    let recent = crate::infrastructure::diagnostics::recent();
    assert!(recent
        .iter()
        .any(|d| d.operation == "call" && d.message.contains("'int' object is not callable")));
    assert!(crate::infrastructure::diagnostics::count() >= before + 2);
}

#[test]
fn test_empty_handle_argument_is_none() {
    setup();
    let repr = builtin("repr");
    let result = repr.call(&crate::args![Handle::empty()], None);
    assert_eq!(result.as_string().as_deref(), Some("None"));
}

#[test]
fn test_call_method() {
    setup();
    let text = Handle::from("a,b");
    let parts = List::from_handle(text.call_method("split", &crate::args![","], None));
    assert_eq!(parts.len(), 2);
    assert!(text.call_method("no_such_method", &[], None).is_null());
    assert!(Handle::empty().call_method("split", &[], None).is_null());
}

#[test]
fn test_all_and_any() {
    setup();
    assert!(all(&List::new()));
    assert!(!any(&List::new()));
    assert!(all(&crate::list![1, "x", true]));
    assert!(!all(&crate::list![1, 0]));
    assert!(any(&crate::list![0, "", 2]));
    assert!(!any(&crate::list![0, false, ""]));
}

#[test]
fn test_map_skips_failed_calls() {
    setup();
    let int = builtin("int");
    let mapped = map(&int, &crate::list!["1", "x", "3"]);
    assert_eq!(ints(&mapped), [1, 3]);

    let abs = builtin("abs");
    assert_eq!(ints(&map(&abs, &crate::list![-1, 2, -3])), [1, 2, 3]);
}

#[test]
fn test_unknown_builtin() {
    setup();
    assert!(builtin("no_such_builtin").is_null());
}

#[test]
fn test_call_releases_argument_packing() {
    setup();
    let item = Handle::from(4242i64);
    let len = builtin("len");
    let items = crate::list![&item];
    assert_eq!(item.refcount(), 2);
    for _ in 0..3 {
        len.call(&crate::args![&items], None);
    }
    assert_eq!(item.refcount(), 2);
    drop(items);
    assert_eq!(item.refcount(), 1);
}
