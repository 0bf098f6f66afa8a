//! Integration tests for the path-addressed layer over a live in-memory
//! store: namespacing, caching, batched loads, reassignment, expiry.

use std::time::Duration;

use chrono::NaiveDate;
use dotkv::{InMemoryStore, LoadOutcome, Root, Settings, Storage, Value};

fn new_root() -> Root<InMemoryStore> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
    Root::new(InMemoryStore::new())
}

/// Scalars of every concrete type survive save → flush → load.
#[test]
fn test_numbers_roundtrip() {
    let root = new_root();
    let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
    let now = today.and_hms_micro_opt(9, 30, 0, 250_000).unwrap();
    let items: Vec<Value> = vec![
        Value::from(10),
        Value::from(10.1),
        Value::from(rust_decimal::Decimal::new(10, 0)),
        Value::complex(10.0, 1.0),
        Value::from(today),
        Value::from(now),
    ];

    for value in items {
        root.save("part", value.clone()).unwrap();
        root.flush().unwrap();
        assert_eq!(root.load("part").unwrap(), Some(value));
    }
}

/// Values written through a grandchild path land under the dotted key.
#[test]
fn test_grandchild_path() {
    let root = new_root();
    root.save("haha.wahaha", "for real?").unwrap();

    let stored = root.store().get("root.haha.wahaha").unwrap().unwrap();
    assert_eq!(stored.as_ref(), b"for real?");

    root.flush().unwrap();
    assert_eq!(
        root.load("haha.wahaha").unwrap(),
        Some(Value::from("for real?"))
    );
}

/// Bracketed navigation addresses the same key as its dotted form.
#[test]
fn test_bracket_path_aliases_dotted() {
    let root = new_root();
    root.save("items[3].name", "widget").unwrap();
    root.flush().unwrap();
    assert_eq!(
        root.load("items.3.name").unwrap(),
        Some(Value::from("widget"))
    );
}

/// Several children of different categories coexist.
#[test]
fn test_many_different_children_types() {
    let root = new_root();
    let set_value = Value::set([Value::from(1), Value::from(2), Value::from(4)]);
    let dict_value = Value::map([
        (Value::from(1), Value::from(1)),
        (
            Value::from(2),
            Value::map([(Value::from("a"), Value::from(1))]),
        ),
    ]);
    let list_value = Value::seq([
        Value::from(1),
        Value::seq([Value::from("b"), Value::from(3)]),
    ]);

    root.save("part_set", set_value.clone()).unwrap();
    root.save("part_dict", dict_value.clone()).unwrap();
    root.save("part_list", list_value.clone()).unwrap();
    root.flush().unwrap();

    assert_eq!(root.load("part_set").unwrap(), Some(set_value));
    assert_eq!(root.load("part_dict").unwrap(), Some(dict_value));
    assert_eq!(root.load("part_list").unwrap(), Some(list_value));
}

/// Reassigning a mapping replaces it wholesale.
#[test]
fn test_dict_reassignment() {
    let root = new_root();
    let value1 = Value::map([(Value::from("a"), Value::from("b"))]);
    let value2 = Value::map([(Value::from("c"), Value::from("d"))]);

    root.save("body", value1).unwrap();
    root.save("body", value2.clone()).unwrap();
    root.flush().unwrap();

    assert_eq!(root.load("body").unwrap(), Some(value2));
}

/// Changing a path from a list to a string leaves the string only.
#[test]
fn test_change_key_type() {
    let root = new_root();
    root.save(
        "something",
        Value::seq([Value::from(1), Value::from(3), Value::from(4)]),
    )
    .unwrap();
    root.save("something", "string").unwrap();
    root.flush().unwrap();

    assert_eq!(root.load("something").unwrap(), Some(Value::from("string")));
}

/// Changing a path from a string to a set triggers the conflict retry and
/// still replaces the value.
#[test]
fn test_change_string_to_set() {
    let root = new_root();
    root.save("something", "plain").unwrap();
    let set_value = Value::set([Value::from(4), Value::from(5)]);
    root.save("something", set_value.clone()).unwrap();
    root.flush().unwrap();

    assert_eq!(root.load("something").unwrap(), Some(set_value));
}

/// A batched load over a missing path marks only that slot.
#[test]
fn test_batch_partial_miss() {
    let root = new_root();
    root.save("a", 1).unwrap();
    root.save("b", Value::seq([Value::from(2)])).unwrap();
    root.flush().unwrap();

    let outcomes = root.load_many(&["a", "ghost", "b"]).unwrap();
    assert_eq!(outcomes.len(), 3);
    assert_eq!(outcomes[0].value(), Some(&Value::from(1)));
    assert!(outcomes[1].is_missing());
    assert_eq!(outcomes[2].value(), Some(&Value::seq([Value::from(2)])));
}

/// A batch mixing every structural shape decodes each through its own
/// accessor.
#[test]
fn test_batch_mixed_shapes() {
    let root = new_root();
    root.save("s", "text").unwrap();
    root.save("set", Value::set([Value::from(1)])).unwrap();
    root.save("list", Value::seq([Value::from(1)])).unwrap();
    root.save("map", Value::map([(Value::from("k"), Value::from("v"))]))
        .unwrap();
    root.flush().unwrap();

    let outcomes = root.load_many(&["s", "set", "list", "map"]).unwrap();
    let values: Vec<_> = outcomes.iter().map(|o| o.value().cloned()).collect();
    assert_eq!(
        values,
        vec![
            Some(Value::from("text")),
            Some(Value::set([Value::from(1)])),
            Some(Value::seq([Value::from(1)])),
            Some(Value::map([(Value::from("k"), Value::from("v"))])),
        ]
    );
}

/// A corrupt stored payload surfaces as a failed slot, not a batch abort.
#[test]
fn test_batch_decode_failure_is_isolated() {
    let root = new_root();
    root.save("good", 1).unwrap();
    root.store()
        .set(
            "root.bad",
            bytes::Bytes::from_static(b"!__num__int__not-a-number"),
        )
        .unwrap();
    root.flush().unwrap();

    let outcomes = root.load_many(&["good", "bad"]).unwrap();
    assert_eq!(outcomes[0].value(), Some(&Value::from(1)));
    assert!(matches!(outcomes[1], LoadOutcome::Failed(_)));
}

/// A value saved with a TTL reads as missing after the deadline.
#[test]
fn test_ttl_expiry() {
    let root = new_root();
    root.save_with_ttl("fleeting", 7, Duration::from_millis(40))
        .unwrap();
    root.flush().unwrap();

    assert_eq!(root.load("fleeting").unwrap(), Some(Value::from(7)));
    std::thread::sleep(Duration::from_millis(80));
    root.flush().unwrap();
    assert_eq!(root.load("fleeting").unwrap(), None);
}

/// A default TTL from settings applies to every save.
#[test]
fn test_default_ttl_from_settings() {
    let settings = Settings {
        default_ttl_secs: Some(1),
        ..Settings::default()
    };
    let root = Root::with_settings(InMemoryStore::new(), &settings);
    root.save("k", 1).unwrap();

    // Armed, not yet due.
    assert_eq!(root.load("k").unwrap(), Some(Value::from(1)));
}

/// Loads are served from the cache until flush drops it.
#[test]
fn test_flush_drops_read_cache() {
    let root = new_root();
    root.save("cached", 1).unwrap();

    // Mutate behind the cache's back.
    root.store()
        .set("root.cached", bytes::Bytes::from_static(b"!__num__int__2"))
        .unwrap();
    assert_eq!(root.load("cached").unwrap(), Some(Value::from(1)));

    root.flush().unwrap();
    assert_eq!(root.load("cached").unwrap(), Some(Value::from(2)));
}

/// Staged writes reach the store in insertion order on flush.
#[test]
fn test_staged_writes_flush_in_order() {
    let root = new_root();
    root.stage("k", 1).unwrap();
    root.stage("k", 2).unwrap();
    root.flush().unwrap();

    assert_eq!(root.load("k").unwrap(), Some(Value::from(2)));
}
