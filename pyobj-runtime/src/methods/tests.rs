use super::list::merge_sort;
use super::*;

fn interp() -> Interpreter {
    Interpreter::new(1).unwrap()
}

fn eval(interp: &mut Interpreter, source: &str) -> String {
    let ns = interp.new_namespace(None).unwrap();
    let value = interp.eval_source(source, "<test>", ns).unwrap();
    let text = interp.repr(value).unwrap();
    interp.release(value);
    interp.release(ns);
    text
}

fn eval_err(interp: &mut Interpreter, source: &str) -> RuntimeError {
    let ns = interp.new_namespace(None).unwrap();
    let err = interp.eval_source(source, "<test>", ns).unwrap_err();
    interp.release(ns);
    err
}

#[test]
fn test_call_args_arity_messages() {
    let args = [];
    let call = CallArgs::new("f", &args, &[]);
    assert!(call.arity(0, 1).is_ok());
    let err = call.arity(1, 1).unwrap_err();
    assert_eq!(err.message(), "f() takes exactly 1 argument (0 given)");
}

#[test]
fn test_call_args_rejects_unknown_keyword() {
    let mut interp = interp();
    let value = interp.new_int(1);
    let kwargs = vec![("bogus".to_string(), value)];
    let call = CallArgs::new("f", &[], &kwargs);
    assert!(call.keywords_only(&["key"]).unwrap_err().message().contains("bogus"));
    assert!(call.simple(0, 0).unwrap_err().message().contains("no keyword"));
}

#[test]
fn test_string_methods() {
    let mut interp = interp();
    assert_eq!(eval(&mut interp, "'hello world'.title()"), "'Hello World'");
    assert_eq!(eval(&mut interp, "'  pad  '.strip()"), "'pad'");
    assert_eq!(eval(&mut interp, "'xxabcxx'.strip('x')"), "'abc'");
    assert_eq!(eval(&mut interp, "'a,b,,c'.split(',')"), "['a', 'b', '', 'c']");
    assert_eq!(eval(&mut interp, "' a  b '.split()"), "['a', 'b']");
    assert_eq!(eval(&mut interp, "'-'.join(['x', 'y', 'z'])"), "'x-y-z'");
    assert_eq!(eval(&mut interp, "'banana'.find('nan')"), "2");
    assert_eq!(eval(&mut interp, "'banana'.find('z')"), "-1");
    assert_eq!(eval(&mut interp, "'banana'.count('a')"), "3");
    assert_eq!(eval(&mut interp, "'aaa'.replace('a', 'b')"), "'bbb'");
    assert_eq!(eval(&mut interp, "'file.py'.endswith('.py')"), "True");
}

#[test]
fn test_join_requires_text() {
    let mut interp = interp();
    let err = eval_err(&mut interp, "','.join([1, 2])");
    assert_eq!(err.kind(), ExcKind::TypeError);
}

#[test]
fn test_list_mutation_methods() {
    let mut interp = interp();
    let one = interp.new_int(1);
    let two = interp.new_int(2);
    let list = interp.new_list(Vec::new());

    let none = interp.call_method(list, "append", &[one], &[]).unwrap();
    assert!(interp.is_none(none));
    interp.call_method(list, "insert", &[one, two], &[]).unwrap();
    assert_eq!(interp.repr(list).unwrap(), "[1, 2]");

    let popped = interp.call_method(list, "pop", &[], &[]).unwrap();
    assert_eq!(interp.repr(popped).unwrap(), "2");
    assert_eq!(interp.repr(list).unwrap(), "[1]");

    let err = interp.call_method(list, "remove", &[two], &[]).unwrap_err();
    assert_eq!(err.kind(), ExcKind::ValueError);
}

#[test]
fn test_list_pop_transfers_ownership() {
    let mut interp = interp();
    let item = interp.new_str("x");
    let list = interp.adopt(Object::List(vec![item])).unwrap();
    interp.release(item);

    let popped = interp.call_method(list, "pop", &[], &[]).unwrap();
    assert_eq!(popped, item);
    assert_eq!(interp.heap.refcount(popped), 1);
}

#[test]
fn test_sort_with_key_and_reverse() {
    let mut interp = interp();
    assert_eq!(
        eval(&mut interp, "sorted(['ccc', 'a', 'bb'], key=len, reverse=True)"),
        "['ccc', 'bb', 'a']"
    );
    let err = eval_err(&mut interp, "sorted([1, 'a'])");
    assert_eq!(err.kind(), ExcKind::TypeError);
}

#[test]
fn test_merge_sort_is_stable() {
    let mut pairs = vec![(1, 'a'), (0, 'b'), (1, 'c'), (0, 'd')];
    merge_sort(&mut pairs, &mut |x: (i32, char), y: (i32, char)| Ok(x.0 < y.0)).unwrap();
    assert_eq!(pairs, [(0, 'b'), (0, 'd'), (1, 'a'), (1, 'c')]);
}

#[test]
fn test_dict_methods() {
    let mut interp = interp();
    assert_eq!(eval(&mut interp, "{'a': 1}.get('b', 0)"), "0");
    assert_eq!(eval(&mut interp, "list({'a': 1, 'b': 2}.items())"), "[('a', 1), ('b', 2)]");
    assert_eq!(eval(&mut interp, "{'a': 1}.pop('a')"), "1");
    assert_eq!(eval(&mut interp, "{'a': 1}.pop('z', None)"), "None");
    assert_eq!(eval_err(&mut interp, "{}.pop('z')").kind(), ExcKind::KeyError);
}

#[test]
fn test_dict_update_and_setdefault() {
    let mut interp = interp();
    let dict = interp.new_dict();
    let key = interp.new_str("k");
    let value = interp.new_int(5);
    let first = interp.call_method(dict, "setdefault", &[key, value], &[]).unwrap();
    assert_eq!(first, value);
    let other = interp.new_int(9);
    let second = interp.call_method(dict, "setdefault", &[key, other], &[]).unwrap();
    assert_eq!(second, value);

    let extra = vec![("z".to_string(), other)];
    interp.call_method(dict, "update", &[], &extra).unwrap();
    assert_eq!(interp.repr(dict).unwrap(), "{'k': 5, 'z': 9}");
}

#[test]
fn test_set_methods() {
    let mut interp = interp();
    assert_eq!(eval(&mut interp, "sorted({1, 2, 3}.union({4}))"), "[1, 2, 3, 4]");
    assert_eq!(eval(&mut interp, "{1, 2}.intersection({2, 3})"), "{2}");
    assert_eq!(eval(&mut interp, "{1, 2}.issubset({1, 2, 3})"), "True");
    assert_eq!(eval(&mut interp, "{1}.isdisjoint({2})"), "True");
    assert_eq!(eval_err(&mut interp, "set().remove(1)").kind(), ExcKind::KeyError);
}

#[test]
fn test_tuple_methods() {
    let mut interp = interp();
    assert_eq!(eval(&mut interp, "(1, 2, 1).count(1)"), "2");
    assert_eq!(eval(&mut interp, "(1, 2, 1).index(2)"), "1");
}

#[test]
fn test_getattr_binds_method() {
    let mut interp = interp();
    let text = interp.new_str("abc");
    let method = interp.getattr(text, "upper").unwrap();
    assert_eq!(interp.heap.refcount(text), 2);
    let result = interp.call(method, &[], &[]).unwrap();
    assert_eq!(interp.to_str(result).unwrap(), "ABC");
    interp.release(method);
    assert_eq!(interp.heap.refcount(text), 1);
}

#[test]
fn test_missing_attribute() {
    let mut interp = interp();
    let value = interp.new_int(1);
    let err = interp.getattr(value, "nope").unwrap_err();
    assert_eq!(err.kind(), ExcKind::AttributeError);
    assert_eq!(err.message(), "'int' object has no attribute 'nope'");
}

#[test]
fn test_file_methods() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.txt");
    let path = path.to_string_lossy().to_string();

    let mut interp = interp();
    let file = interp.alloc(Object::File(
        crate::file::FileObject::open(&path, crate::file::FileMode::Write).unwrap(),
    ));
    let text = interp.new_str("héllo");
    let written = interp.call_method(file, "write", &[text], &[]).unwrap();
    assert_eq!(interp.to_int(written).unwrap(), 5);
    interp.call_method(file, "close", &[], &[]).unwrap();
    let closed = interp.getattr(file, "closed").unwrap();
    assert!(interp.truthy(closed).unwrap());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "héllo");
}
