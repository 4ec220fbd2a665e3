use super::*;
use std::collections::HashSet;

fn noop() -> ContinuationFn {
    Box::new(|| Ok(()))
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[test]
fn register_indexes_every_dependency() {
    let mut index = AfterIndex::new();
    index.register(names(&["a", "b"]), noop());

    assert!(index.watches("a"));
    assert!(index.watches("b"));
    assert!(!index.watches("c"));
    assert_eq!(index.len(), 1);
}

#[test]
fn take_ready_waits_for_full_dependency_set() {
    let mut index = AfterIndex::new();
    index.register(names(&["a", "b"]), noop());

    let pending: HashSet<&str> = ["b"].into_iter().collect();
    assert!(index.take_ready("a", |n| pending.contains(n)).is_none());
    assert_eq!(index.len(), 1);

    let ready = index.take_ready("b", |_| false);
    assert!(ready.is_some());
    assert_eq!(index.len(), 0);
    assert!(!index.watches("a"));
    assert!(!index.watches("b"));
}

#[test]
fn duplicate_dependencies_index_once() {
    let mut index = AfterIndex::new();
    index.register(names(&["a", "b", "b"]), noop());

    let ready = index.take_ready("b", |_| false);
    assert!(ready.is_some_and(|r| r.depends_on == names(&["a", "b", "b"])));
    assert!(index.take_ready("b", |_| false).is_none());
    assert!(index.take_ready("a", |_| false).is_none());
}

#[test]
fn ready_continuations_come_out_in_registration_order() {
    let mut index = AfterIndex::new();
    let first = index.register(names(&["c", "a"]), noop());
    let second = index.register(names(&["c"]), noop());

    let ids: Vec<u64> = std::iter::from_fn(|| index.take_ready("c", |_| false))
        .map(|r| r.id)
        .collect();
    assert_eq!(ids, vec![first, second]);
    assert!(!index.watches("a"));
}

#[test]
fn blocked_continuation_does_not_hide_later_ready_one() {
    let mut index = AfterIndex::new();
    index.register(names(&["c", "a"]), noop());
    let ready_id = index.register(names(&["c"]), noop());

    let ready = index.take_ready("c", |n| n == "a");
    assert_eq!(ready.map(|r| r.id), Some(ready_id));
    assert_eq!(index.len(), 1);
    assert!(index.watches("c"));
}

#[test]
fn taken_callback_is_runnable() {
    let mut index = AfterIndex::new();
    index.register(names(&["x"]), Box::new(|| Err("nope".into())));

    let ready = index.take_ready("x", |_| false);
    let result = ready.map(|r| (r.callback)());
    assert!(matches!(result, Some(Err(TaskError::Message(msg))) if msg == "nope"));
}
