use std::collections::HashMap;

use ortak::{ContainerKind, OrtakError, TransferableState, Value};
use ortak_map::{MapKey, MapOptions, ShareableMap};
use rand::distributions::Alphanumeric;
use rand::Rng;

fn new_map() -> ShareableMap {
    ShareableMap::new(MapOptions::default()).unwrap()
}

#[test]
fn test_set_and_get() {
    let map = new_map();
    map.set("a", 1).unwrap();
    map.set("b", 2).unwrap();
    assert_eq!(map.get("a").unwrap(), Some(Value::Int(1)));
    assert_eq!(map.get("b").unwrap(), Some(Value::Int(2)));
    assert_eq!(map.get("c").unwrap(), None);
}

#[test]
fn test_set_chains() {
    let map = new_map();
    map.set("a", 1).unwrap().set("b", 2).unwrap().set("c", 3).unwrap();
    assert_eq!(map.len().unwrap(), 3);
}

#[test]
fn test_duplicate_keys_keep_last_value() {
    // Six inserts over four distinct keys.
    let map = new_map();
    for (key, value) in [("a", 1), ("b", 2), ("c", 3), ("a", 4), ("d", 5), ("a", 6)] {
        map.set(key, value).unwrap();
    }
    assert_eq!(map.len().unwrap(), 4);
    assert_eq!(map.get("a").unwrap(), Some(Value::Int(6)));

    let mut keys: Vec<String> = map
        .keys()
        .unwrap()
        .map(|k| match k.unwrap() {
            MapKey::Str(s) => s,
            other => panic!("unexpected key {:?}", other),
        })
        .collect();
    keys.sort();
    assert_eq!(keys, ["a", "b", "c", "d"]);
}

#[test]
fn test_has_skips_decode() {
    let map = new_map();
    map.set("present", "x").unwrap();
    assert!(map.has("present").unwrap());
    assert!(!map.has("missing").unwrap());
}

#[test]
fn test_delete() {
    let map = new_map();
    map.set("a", 1).unwrap();
    map.set("b", 2).unwrap();
    assert!(map.delete("a").unwrap());
    assert!(!map.delete("a").unwrap());
    assert_eq!(map.get("a").unwrap(), None);
    assert_eq!(map.get("b").unwrap(), Some(Value::Int(2)));
    assert_eq!(map.len().unwrap(), 1);
}

#[test]
fn test_clear() {
    let map = new_map();
    for i in 0..100 {
        map.set(format!("k{}", i), i).unwrap();
    }
    map.clear().unwrap();
    assert!(map.is_empty().unwrap());
    for i in 0..100 {
        assert_eq!(map.get(format!("k{}", i)).unwrap(), None);
    }

    // The map stays usable after a clear.
    map.set("again", 1).unwrap();
    assert_eq!(map.len().unwrap(), 1);
}

#[test]
fn test_heterogeneous_values() {
    let map = new_map();
    map.set("int", -5).unwrap();
    map.set("float", 2.5).unwrap();
    map.set("string", "text").unwrap();
    map.set("json", serde_json::json!({"nested": [1, 2, 3]}))
        .unwrap();

    assert_eq!(map.get("int").unwrap(), Some(Value::Int(-5)));
    assert_eq!(map.get("float").unwrap(), Some(Value::Float(2.5)));
    assert_eq!(map.get("string").unwrap(), Some(Value::Str("text".into())));
    assert_eq!(
        map.get("json").unwrap(),
        Some(Value::Json(serde_json::json!({"nested": [1, 2, 3]})))
    );
}

#[test]
fn test_composite_keys_roundtrip_through_iteration() {
    let map = new_map();
    map.set(42i64, "numeric").unwrap();
    map.set(serde_json::json!(["a", 1]), "structural").unwrap();
    map.set("plain", "string").unwrap();

    assert_eq!(map.get(42i64).unwrap(), Some(Value::Str("numeric".into())));
    assert_eq!(
        map.get(serde_json::json!(["a", 1])).unwrap(),
        Some(Value::Str("structural".into()))
    );

    let mut composites = 0;
    let mut strings = 0;
    map.for_each(|key, _| match key {
        MapKey::Composite(_) => composites += 1,
        MapKey::Str(_) => strings += 1,
    })
    .unwrap();
    assert_eq!(composites, 2);
    assert_eq!(strings, 1);
}

#[test]
fn test_shrinking_update_stays_in_place() {
    let map = new_map();
    map.set("k", "abcdef").unwrap();
    let before = map.stats().unwrap();

    map.set("k", "abc").unwrap();
    let after = map.stats().unwrap();

    // No new entry was appended.
    assert_eq!(after.free_start, before.free_start);
    assert_eq!(after.used_space, before.used_space - 3);
    assert_eq!(map.get("k").unwrap(), Some(Value::Str("abc".into())));
}

#[test]
fn test_growing_update_replaces_entry() {
    let map = new_map();
    map.set("k", "ab").unwrap();
    let before = map.stats().unwrap();

    map.set("k", "a much longer value than before").unwrap();
    let after = map.stats().unwrap();

    assert!(after.free_start > before.free_start);
    assert_eq!(after.len, 1);
    assert_eq!(
        map.get("k").unwrap(),
        Some(Value::Str("a much longer value than before".into()))
    );
}

#[test]
fn test_set_if_absent() {
    let map = new_map();
    assert_eq!(map.set_if_absent("k", 1).unwrap(), None);
    assert_eq!(map.set_if_absent("k", 2).unwrap(), Some(Value::Int(1)));
    assert_eq!(map.get("k").unwrap(), Some(Value::Int(1)));
}

#[test]
fn test_values_and_iter() {
    let map = new_map();
    map.set("a", 1).unwrap();
    map.set("b", 2).unwrap();
    map.set("c", 3).unwrap();

    let mut values: Vec<i32> = map
        .values()
        .unwrap()
        .map(|v| v.unwrap().as_int().unwrap())
        .collect();
    values.sort();
    assert_eq!(values, [1, 2, 3]);

    let mut pairs: Vec<(String, i32)> = map
        .iter()
        .unwrap()
        .map(|pair| {
            let (k, v) = pair.unwrap();
            (k.as_str().unwrap().to_owned(), v.as_int().unwrap())
        })
        .collect();
    pairs.sort();
    assert_eq!(pairs, [("a".into(), 1), ("b".into(), 2), ("c".into(), 3)]);
}

#[test]
fn test_invalid_average_value_len() {
    let options = MapOptions {
        average_value_len: Some(10),
        ..MapOptions::default()
    };
    let err = ShareableMap::new(options).unwrap_err();
    assert!(matches!(err, OrtakError::InvalidConfig(_)));
}

#[test]
fn test_transferable_state_roundtrip() {
    let map = new_map();
    map.set("shared", "payload").unwrap();
    map.set("n", 7).unwrap();

    let view = ShareableMap::from_transferable_state(
        map.to_transferable_state(),
        MapOptions::default(),
    )
    .unwrap();

    assert_eq!(view.len().unwrap(), 2);
    assert_eq!(view.get("shared").unwrap(), Some(Value::Str("payload".into())));

    // Writes through one view are visible through the other.
    view.set("from-view", 1).unwrap();
    assert_eq!(map.get("from-view").unwrap(), Some(Value::Int(1)));

    let ours = map.stats().unwrap();
    let theirs = view.stats().unwrap();
    assert_eq!(ours, theirs);
}

#[test]
fn test_transferable_state_kind_mismatch() {
    let map = new_map();
    let state = map.to_transferable_state();
    let wrong = TransferableState {
        kind: ContainerKind::Array,
        ..state
    };
    let err = ShareableMap::from_transferable_state(wrong, MapOptions::default()).unwrap_err();
    assert!(matches!(
        err,
        OrtakError::KindMismatch {
            expected: ContainerKind::Map,
            found: ContainerKind::Array,
        }
    ));
}

#[test]
fn test_many_random_entries_match_model() {
    let map = new_map();
    let mut model: HashMap<String, String> = HashMap::new();
    let mut rng = rand::thread_rng();

    for _ in 0..100_000 {
        let key: String = (&mut rng)
            .sample_iter(Alphanumeric)
            .take(8)
            .map(char::from)
            .collect();
        let value: String = (&mut rng)
            .sample_iter(Alphanumeric)
            .take(12)
            .map(char::from)
            .collect();
        map.set(key.as_str(), value.as_str()).unwrap();
        model.insert(key, value);
    }

    // Overwrite a sample of existing keys with fresh values.
    let sample: Vec<String> = model.keys().take(500).cloned().collect();
    for key in &sample {
        let value = format!("rewritten-{}", key);
        map.set(key.as_str(), value.as_str()).unwrap();
        model.insert(key.clone(), value);
    }

    assert_eq!(map.len().unwrap(), model.len());
    for (key, value) in model.iter().take(2_000) {
        assert_eq!(
            map.get(key.as_str()).unwrap(),
            Some(Value::Str(value.clone())),
            "mismatch for key {}",
            key
        );
    }
    for key in &sample {
        assert!(map.has(key.as_str()).unwrap());
    }
}

#[test]
fn test_empty_string_key_and_value() {
    let map = new_map();
    map.set("", "").unwrap();
    assert_eq!(map.get("").unwrap(), Some(Value::Str(String::new())));
    assert!(map.delete("").unwrap());
}
