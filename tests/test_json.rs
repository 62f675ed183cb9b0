//! JSON bridge - text encode/decode and file round trips

use parking_lot::{const_mutex, Mutex};
use pyobj::{dict, json, list, Dict, Handle, Kind, List, View};
use pyobj_runtime::api;

/// File tests compare the process-wide open-file count
static FILE_LOCK: Mutex<()> = const_mutex(());

fn setup() {
    assert!(pyobj::init());
}

#[test]
fn test_encode_compact() {
    setup();
    let value = dict! { "a" => 1, "b" => list![true, Handle::none(), 2.5] };
    assert_eq!(
        json::encode(&value).as_str_lossy(),
        r#"{"a": 1, "b": [true, null, 2.5]}"#
    );
}

#[test]
fn test_encode_indented() {
    setup();
    let value = dict! { "k" => list![1] };
    let text = json::encode_indent(&value, Some(2)).as_str_lossy();
    assert_eq!(text, "{\n  \"k\": [\n    1\n  ]\n}");
}

#[test]
fn test_encode_failure_is_empty_text() {
    setup();
    let before = pyobj::infrastructure::diagnostics::count();
    let text = json::encode(&pyobj::builtin("len"));
    assert_eq!(text.kind(), Kind::Text);
    assert_eq!(text.len(), 0);
    assert!(pyobj::infrastructure::diagnostics::count() > before);

    let nan = Handle::from(f64::NAN);
    assert_eq!(json::encode(&nan).len(), 0);
}

#[test]
fn test_encode_cycle_fails() {
    setup();
    let xs = List::new();
    xs.append(&xs);
    assert_eq!(json::encode(&xs).len(), 0);
    xs.clear();
}

#[test]
fn test_decode() {
    setup();
    let value = Dict::from_handle(json::decode(r#"{"name": "x", "tags": [1, 2], "none": null}"#));
    assert_eq!(value.get("name").as_string().as_deref(), Some("x"));
    assert_eq!(List::from_handle(value.get("tags")).len(), 2);
    assert_eq!(value.get("none").kind(), Kind::None);
    let keys: Vec<String> = value.keys().iter().filter_map(|k| k.as_string()).collect();
    assert_eq!(keys, ["name", "tags", "none"]);
}

#[test]
fn test_decode_invalid() {
    setup();
    assert!(json::decode("{not json").is_null());
    assert!(json::decode("").is_null());
    assert!(json::decode("18446744073709551615").is_null());
}

#[test]
fn test_file_round_trip_closes_files() {
    let _guard = FILE_LOCK.lock();
    setup();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.json");
    let open_before = api::open_files();

    let value = dict! { "x" => 10, "y" => "s" };
    assert!(json::dump_file(&value, &path, None));
    assert_eq!(api::open_files(), open_before);
    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        r#"{"x": 10, "y": "s"}"#
    );

    let loaded = json::load_file(&path);
    assert_eq!(api::open_files(), open_before);
    assert_eq!(Dict::from_handle(loaded).get("x").as_i64(), Some(10));
}

#[test]
fn test_file_failures_close_files() {
    let _guard = FILE_LOCK.lock();
    setup();
    let dir = tempfile::tempdir().unwrap();
    let open_before = api::open_files();

    let path = dir.path().join("bad.json");
    std::fs::write(&path, "[1, 2").unwrap();
    assert!(json::load_file(&path).is_null());
    assert_eq!(api::open_files(), open_before);

    assert!(json::load_file(dir.path().join("missing.json")).is_null());
    assert!(!json::dump_file(&list![1], dir.path().join("no/such/dir.json"), None));
    assert!(!json::dump_file(&pyobj::builtin("len"), dir.path().join("f.json"), None));
    assert_eq!(api::open_files(), open_before);
}

#[test]
fn test_file_guard_closes_on_drop() {
    let _guard = FILE_LOCK.lock();
    setup();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("raw.txt");
    let open_before = api::open_files();
    {
        let file = json::FileGuard::open(&path, "w").unwrap();
        assert_eq!(api::open_files(), open_before + 1);
        assert_eq!(file.write("abc").unwrap(), 3);
    }
    assert_eq!(api::open_files(), open_before);
    let file = json::FileGuard::open(&path, "r").unwrap();
    assert_eq!(file.read().unwrap(), "abc");
}

#[test]
fn test_encode_default_uses_config_indent() {
    setup();
    // Default config is compact
    let value = list![1, 2];
    assert_eq!(json::encode_default(&value).as_str_lossy(), "[1, 2]");
}

#[test]
fn test_encode_deep_nesting_fails_softly() {
    setup();
    let mut deep = List::new();
    for _ in 0..20_000 {
        deep = list![&deep];
    }
    let before = pyobj::infrastructure::diagnostics::count();
    assert_eq!(json::encode(&deep).as_str_lossy(), "");
    assert!(pyobj::infrastructure::diagnostics::count() > before);
}
