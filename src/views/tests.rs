use super::*;
use crate::core::Handle;

fn setup() {
    assert!(crate::init());
}

fn ints(list: &List) -> Vec<i64> {
    list.iter().filter_map(|item| item.as_i64()).collect()
}

#[test]
fn test_normalize_index() {
    assert_eq!(normalize_index(0, 3), Some(0));
    assert_eq!(normalize_index(-1, 3), Some(2));
    assert_eq!(normalize_index(-3, 3), Some(0));
    assert_eq!(normalize_index(3, 3), None);
    assert_eq!(normalize_index(-4, 3), None);
    assert_eq!(normalize_index(0, 0), None);
}

#[test]
fn test_from_handle_checks_kind() {
    setup();
    let list = List::from_handle(Handle::from("not a list"));
    assert_eq!(list.kind(), Kind::List);
    assert_eq!(list.len(), 0);

    let text = Text::from_handle(Handle::from("kept"));
    assert_eq!(text.as_str_lossy(), "kept");

    let dict = Dict::from_handle(Handle::empty());
    assert_eq!(dict.kind(), Kind::Dict);
}

#[test]
fn test_list_indexing() {
    setup();
    let xs = crate::list![10, 20, 30];
    assert_eq!(xs.get(0).as_i64(), Some(10));
    assert_eq!(xs.get(-1).as_i64(), Some(30));
    assert!(xs.get(3).is_null());
    assert!(xs.set(-2, 21));
    assert!(!xs.set(5, 0));
    assert_eq!(ints(&xs), [10, 21, 30]);
}

#[test]
fn test_list_mutation() {
    setup();
    let xs = List::new();
    xs.append(3);
    xs.append(1);
    xs.insert(0, 2);
    xs.insert(100, 4);
    assert_eq!(ints(&xs), [2, 3, 1, 4]);

    assert!(xs.remove(3));
    assert!(!xs.remove(99));
    assert_eq!(xs.pop_last().as_i64(), Some(4));
    assert!(xs.pop(7).is_null());
    assert_eq!(xs.len(), 2);

    xs.extend(&crate::list![5, 5]);
    assert_eq!(xs.count(5), 2);
    assert_eq!(xs.index_of(5), Some(2));
    assert_eq!(xs.index_of(42), None);

    xs.sort();
    assert_eq!(ints(&xs), [1, 2, 5, 5]);
    xs.reverse();
    assert_eq!(ints(&xs), [5, 5, 2, 1]);
    xs.clear();
    assert!(xs.is_empty());
}

#[test]
fn test_list_holds_shares() {
    setup();
    let item = Handle::from(777i64);
    let xs = List::from_handles(vec![item.clone(), item.clone()]);
    assert_eq!(item.refcount(), 3);
    drop(xs);
    assert_eq!(item.refcount(), 1);
}

#[test]
fn test_list_with_empty_element_stores_none() {
    setup();
    let xs = crate::list![1, Handle::empty()];
    assert_eq!(xs.len(), 2);
    assert_eq!(xs.get(1).kind(), Kind::None);
}

#[test]
fn test_list_iteration_is_a_snapshot() {
    setup();
    let xs = crate::list![1, 2];
    for item in &xs {
        xs.append(item);
    }
    assert_eq!(ints(&xs), [1, 2, 1, 2]);
    let collected: List = xs.iter().take(1).collect();
    assert_eq!(ints(&collected), [1]);
}

#[test]
fn test_tuple() {
    setup();
    let t = crate::tuple![1, "two", 3.0];
    assert_eq!(t.len(), 3);
    assert_eq!(t.get(1).as_string().as_deref(), Some("two"));
    assert_eq!(t.get(-1).as_f64(), Some(3.0));
    assert!(t.get(3).is_null());
    assert!(t.contains("two"));
    assert!(!t.contains("three"));
    // Only text, list, dict and set count as empty by length
    assert!(!Tuple::new().is_empty());
    assert_eq!(Tuple::new().len(), 0);
}

#[test]
fn test_dict_basics() {
    setup();
    let d = crate::dict! { "x" => 10, "y" => "s" };
    assert_eq!(d.len(), 2);
    assert_eq!(d.get("x").as_i64(), Some(10));
    assert!(d.get("z").is_null());
    assert_eq!(d.get_or("z", 0).as_i64(), Some(0));
    assert!(d.contains("y"));

    assert!(d.add("x", 11));
    assert_eq!(d.get("x").as_i64(), Some(11));
    assert_eq!(d.len(), 2);
}

#[test]
fn test_dict_absent_pop_leaves_dict_untouched() {
    setup();
    let d = crate::dict! { "a" => 1 };
    assert!(d.pop("missing").is_null());
    assert_eq!(d.len(), 1);
    assert_eq!(d.pop("a").as_i64(), Some(1));
    assert!(d.is_empty());
    assert!(!d.remove("a"));
}

#[test]
fn test_dict_order_and_views() {
    setup();
    let d = Dict::new();
    d.add("b", 2);
    d.add("a", 1);
    d.add("c", 3);
    let keys: Vec<String> = d.keys().iter().filter_map(|k| k.as_string()).collect();
    assert_eq!(keys, ["b", "a", "c"]);
    assert_eq!(ints(&d.values()), [2, 1, 3]);
    assert_eq!(d.items().len(), 3);

    let other = crate::dict! { "a" => 100, "d" => 4 };
    d.update(&other);
    assert_eq!(d.get("a").as_i64(), Some(100));
    assert_eq!(d.len(), 4);
    d.clear();
    assert_eq!(d.len(), 0);
}

#[test]
fn test_dict_rejects_unhashable_key() {
    setup();
    let d = Dict::new();
    assert!(!d.add(List::new(), 1));
    assert!(d.is_empty());
}

#[test]
fn test_dict_from_iterator() {
    setup();
    let d: Dict = vec![("one", 1), ("two", 2)].into_iter().collect();
    assert_eq!(d.get("two").as_i64(), Some(2));
}

#[test]
fn test_set_membership() {
    setup();
    let s = crate::set![1, 2, 2, 3];
    assert_eq!(s.len(), 3);
    assert!(s.add(4));
    assert!(!s.add(4));
    assert!(s.contains(4));
    assert!(s.remove(4));
    assert!(!s.remove(4));
    s.discard(99);
    assert_eq!(s.len(), 3);

    let popped = s.pop();
    assert!(!popped.is_null());
    assert!(!s.contains(&popped));
    s.clear();
    assert!(s.pop().is_null());
}

#[test]
fn test_set_algebra() {
    setup();
    let a = crate::set![1, 2, 3];
    let b = crate::set![3, 4];
    assert_eq!(a.union(&b).len(), 4);
    assert_eq!(a.intersection(&b).len(), 1);
    assert_eq!(a.difference(&b).len(), 2);
    assert_eq!(a.symmetric_difference(&b).len(), 3);
    assert!(crate::set![1].is_subset(&a));
    assert!(a.is_superset(&crate::set![2, 3]));
    assert!(!a.is_disjoint(&b));
    assert!(a.is_disjoint(&crate::set![9]));
}

#[test]
fn test_text_methods() {
    setup();
    let t = Text::from("  Hello World  ");
    assert_eq!(t.strip().as_str_lossy(), "Hello World");
    assert_eq!(t.lstrip().as_str_lossy(), "Hello World  ");
    assert_eq!(t.rstrip().as_str_lossy(), "  Hello World");
    assert_eq!(t.strip().upper().as_str_lossy(), "HELLO WORLD");
    assert_eq!(t.strip().lower().as_str_lossy(), "hello world");
    assert_eq!(Text::from("hello world").title().as_str_lossy(), "Hello World");
    assert_eq!(Text::from("hELLO").capitalize().as_str_lossy(), "Hello");
    assert_eq!(Text::from("a-b").replace("-", "+").as_str_lossy(), "a+b");
}

#[test]
fn test_text_search() {
    setup();
    let t = Text::from("banana");
    assert_eq!(t.find("nan"), 2);
    assert_eq!(t.find("x"), -1);
    assert_eq!(t.count("a"), 3);
    assert!(t.startswith("ban"));
    assert!(t.endswith("na"));
    assert!(!t.startswith("na"));
}

#[test]
fn test_text_split_and_join() {
    setup();
    let parts = Text::from("a,b,,c").split(Some(","));
    let parts_text: Vec<String> = parts.iter().map(Text::as_str_lossy).collect();
    assert_eq!(parts_text, ["a", "b", "", "c"]);

    let words = Text::from("  one  two ").split(None);
    assert_eq!(words.len(), 2);

    let joined = Text::from("-").join(&words);
    assert_eq!(joined.as_str_lossy(), "one-two");
}

#[test]
fn test_text_predicates_and_chars() {
    setup();
    assert!(Text::from("123").isdigit());
    assert!(!Text::from("12a").isdigit());
    assert!(Text::from("abc").isalpha());
    assert!(Text::from("a1").isalnum());
    assert!(Text::from(" \t").isspace());
    assert!(Text::from("ABC").isupper());
    assert!(Text::from("abc").islower());

    let t = Text::from("héllo");
    assert_eq!(t.char_at(1).as_str_lossy(), "é");
    assert_eq!(t.char_at(-1).as_str_lossy(), "o");
    assert!(t.char_at(5).is_empty());
}

#[test]
fn test_view_comparisons() {
    setup();
    assert_eq!(crate::list![1, 2], crate::list![1, 2]);
    assert!(crate::list![1, 2] < crate::list![1, 3]);
    assert_eq!(Text::from("a"), Text::from("a"));
}
