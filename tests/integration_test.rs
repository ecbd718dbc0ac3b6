//! End-to-end tests over the public maskdb API:
//! - open / reopen lifecycle against a file-backed store
//! - strict-create vs adopt-existing behavior
//! - feature columns declared after data already exists
//! - first-writer-wins seeding across reopen
//! - the range-scan ordering scenarios over namespaces

use maskdb::{Error, Feature, FeatureValue, Op, Store, StoreOptions, Value};
use serde_json::json;
use tempfile::TempDir;

#[test]
fn test_write_reopen_read() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("app.db");

    // Phase 1: write
    {
        let store = Store::open(&path, StoreOptions::new()).unwrap();
        store.put("greeting", "hello").unwrap();
        store.put("count", 42i64).unwrap();
        store.put("profile", json!({"name": "alice", "tags": ["a", "b"]})).unwrap();
        store.close().unwrap();
    }

    // Phase 2: reopen and verify
    {
        let store = Store::open(&path, StoreOptions::new().ignore_existing(true)).unwrap();
        assert_eq!(store.get("greeting").unwrap(), Some(Value::Str("hello".into())));
        assert_eq!(store.get("count").unwrap(), Some(Value::Int(42)));
        assert_eq!(
            store.get("profile").unwrap(),
            Some(Value::Doc(json!({"name": "alice", "tags": ["a", "b"]})))
        );
        store.close().unwrap();
    }
}

#[test]
fn test_strict_create_fails_on_existing_schema() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("app.db");

    Store::open(&path, StoreOptions::new()).unwrap().close().unwrap();

    assert!(matches!(
        Store::open(&path, StoreOptions::new()),
        Err(Error::CantCreateDatabase { .. })
    ));
}

#[test]
fn test_feature_declared_after_data_reads_as_default() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("app.db");

    {
        let store = Store::open(&path, StoreOptions::new()).unwrap();
        store.put("u:1", "alice").unwrap();
        store.close().unwrap();
    }

    // Reopen with a feature the first generation never declared.
    {
        let store = Store::open(
            &path,
            StoreOptions::new()
                .ignore_existing(true)
                .feature(Feature::int("rank", 5).unwrap()),
        )
        .unwrap();

        // Pre-existing row reads the declared default.
        assert_eq!(store.features("u:1").unwrap()["rank"], FeatureValue::Int(5));

        store
            .put_with_features("u:1", None, &[("rank", FeatureValue::Int(9))])
            .unwrap();
        assert_eq!(store.features("u:1").unwrap()["rank"], FeatureValue::Int(9));
        store.close().unwrap();
    }
}

#[test]
fn test_seeding_is_first_writer_wins_across_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("app.db");

    {
        let store = Store::open(&path, StoreOptions::new().seed("tuser", "pass")).unwrap();
        assert_eq!(store.get("tuser").unwrap(), Some(Value::Str("pass".into())));
        store.put("tuser", "changed").unwrap();
        store.close().unwrap();
    }

    // The seed must not overwrite the caller's later value.
    {
        let store = Store::open(
            &path,
            StoreOptions::new().ignore_existing(true).seed("tuser", "pass"),
        )
        .unwrap();
        assert_eq!(store.get("tuser").unwrap(), Some(Value::Str("changed".into())));
        store.close().unwrap();
    }
}

#[test]
fn test_creation_order_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("app.db");

    {
        let store = Store::open(&path, StoreOptions::new()).unwrap();
        store.put("a:z", 1i64).unwrap();
        store.put("a:a", 2i64).unwrap();
        store.close().unwrap();
    }

    {
        let store = Store::open(&path, StoreOptions::new().ignore_existing(true)).unwrap();
        // New inserts keep extending the sequence after the stored maximum.
        store.put("a:m", 3i64).unwrap();

        let order: Vec<_> = store
            .keys(Op::Gte, "a:z", "a:", true, -1)
            .unwrap()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(order, ["a:z", "a:a", "a:m"]);
        store.close().unwrap();
    }
}

#[test]
fn test_range_scan_over_namespace() {
    let store = Store::open_in_memory(StoreOptions::new()).unwrap();
    for i in 0..10 {
        store.put(&format!("base:{i}"), i as i64).unwrap();
    }

    // Above the anchor, ascending by key, anchor excluded.
    let up: Vec<_> = store
        .keys(Op::Gt, "base:5", "base:", false, -1)
        .unwrap()
        .map(|(_, v)| v.unwrap().as_int().unwrap())
        .collect();
    assert_eq!(up, [6, 7, 8, 9]);

    // Below the anchor, descending, anchor included, bounded.
    let down: Vec<_> = store
        .keys(Op::Lte, "base:5", "base:", false, 4)
        .unwrap()
        .map(|(_, v)| v.unwrap().as_int().unwrap())
        .collect();
    assert_eq!(down, [5, 4, 3, 2]);
}

#[test]
fn test_insertion_order_scan_ignores_key_order() {
    let store = Store::open_in_memory(StoreOptions::new()).unwrap();
    let area = store.namespace("area");

    for i in 0..5 {
        area.put(&i.to_string(), i as i64).unwrap();
    }
    for i in (5..10).rev() {
        area.put(&i.to_string(), i as i64).unwrap();
    }

    let values: Vec<_> = area
        .keys(Op::Gte, "0", true, -1)
        .unwrap()
        .map(|(_, v)| v.unwrap().as_int().unwrap())
        .collect();
    assert_eq!(values, [0, 1, 2, 3, 4, 9, 8, 7, 6, 5]);
}

#[test]
fn test_operator_symbols_parse() {
    let store = Store::open_in_memory(StoreOptions::new()).unwrap();
    let area = store.namespace("area");
    for i in 0..10 {
        area.put(&i.to_string(), i as i64).unwrap();
    }

    let op: Op = "<".parse().unwrap();
    let values: Vec<_> = area
        .keys(op, "3", false, 1)
        .unwrap()
        .map(|(_, v)| v.unwrap().as_int().unwrap())
        .collect();
    assert_eq!(values, [2]);

    assert!(matches!(
        "=!".parse::<Op>(),
        Err(Error::NoOperations(s)) if s == "=!"
    ));
}

#[test]
fn test_select_across_and_within_namespaces() {
    let store = Store::open_in_memory(
        StoreOptions::new().feature(Feature::bool("active", false).unwrap()),
    )
    .unwrap();

    let users = store.namespace("user");
    let bots = store.namespace("bot");
    users
        .put_with_features("alice", Some(Value::Int(1)), &[("active", FeatureValue::Bool(true))])
        .unwrap();
    users.put("mallory", 2i64).unwrap();
    bots.put_with_features("crawler", Some(Value::Int(3)), &[("active", FeatureValue::Bool(true))])
        .unwrap();

    let scoped: Vec<_> = users
        .select("active", FeatureValue::Bool(true), -1)
        .unwrap()
        .map(|(k, _)| k)
        .collect();
    assert_eq!(scoped, ["user:alice"]);

    let global: Vec<_> = store
        .select("active", FeatureValue::Bool(true), "", -1)
        .unwrap()
        .map(|(k, _)| k)
        .collect();
    assert_eq!(global, ["bot:crawler", "user:alice"]);
}
