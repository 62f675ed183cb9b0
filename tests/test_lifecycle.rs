//! Runtime lifecycle seen from the handle layer

use parking_lot::{const_mutex, Mutex};
use pyobj::infrastructure::diagnostics;
use pyobj::{exec, json, list, Config, Handle, Kind};

/// Tests in this file stop the runtime; only one may run at a time
static RUNTIME_LOCK: Mutex<()> = const_mutex(());

#[test]
fn test_init_and_shutdown_are_idempotent() {
    let _guard = RUNTIME_LOCK.lock();
    assert!(pyobj::init());
    assert!(pyobj::init());
    assert!(pyobj::is_initialized());
    pyobj::shutdown();
    pyobj::shutdown();
    assert!(!pyobj::is_initialized());
    assert!(pyobj::init());
}

#[test]
fn test_stale_handles_are_inert() {
    let _guard = RUNTIME_LOCK.lock();
    assert!(pyobj::init());
    let stale = list![1, 2, 3];
    let stale_copy = stale.clone();
    pyobj::shutdown();

    assert!(pyobj::init());
    let fresh = Handle::from(5i64);
    // Nothing from the old runtime reaches the new one
    assert_eq!(stale.len(), 0);
    assert_eq!(stale.kind(), Kind::Null);
    assert!(stale.get(0).is_null());
    drop(stale);
    drop(stale_copy);
    assert_eq!(fresh.refcount(), 1);
    assert_eq!(fresh.as_i64(), Some(5));
}

#[test]
fn test_drop_after_shutdown_is_quiet() {
    let _guard = RUNTIME_LOCK.lock();
    assert!(pyobj::init());
    let value = Handle::from("outlives the runtime");
    pyobj::shutdown();
    let before = diagnostics::count();
    drop(value);
    assert_eq!(diagnostics::count(), before);
    assert!(pyobj::init());
}

#[test]
fn test_operations_before_init_degrade() {
    let _guard = RUNTIME_LOCK.lock();
    pyobj::shutdown();
    let before = diagnostics::count();
    assert!(Handle::from(1i64).is_null());
    assert!(exec::eval("1").is_null());
    assert!(matches!(exec::try_eval("1"), Err(pyobj::ExecError::NotInitialized)));
    assert!(json::decode("[]").is_null());
    assert!(diagnostics::count() > before);
    assert!(pyobj::init());
}

#[test]
fn test_init_with_config_installs_config() {
    let _guard = RUNTIME_LOCK.lock();
    let config = Config::parse(
        r#"
[logging]
level = "error"

[exec]
extra_reserved_names = ["hidden"]

[pretty]
indent_width = 2
"#,
    )
    .unwrap();
    let _log_guard = pyobj::init_with_config(&config);
    assert!(pyobj::is_initialized());
    assert_eq!(*pyobj::config::current(), config);

    let bindings = exec::exec_result("hidden = 1\nshown = 2\n");
    assert!(!bindings.contains("hidden"));
    assert!(bindings.contains("shown"));
    assert_eq!(pyobj::pretty_print(&list![1]), "[\n  1\n]");

    pyobj::config::set(Config::default());
}
