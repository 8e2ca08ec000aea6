//! Property-Based Tests for Cache Module
//!
//! Uses proptest to verify cache correctness properties over arbitrary
//! operation sequences and key/value shapes.

use std::collections::HashMap;
use std::sync::Arc;

use proptest::prelude::*;
use serde_json::json;

use crate::cache::TieredCache;
use crate::config::Config;
use crate::policy::PrivacyLevel;

// == Strategies ==
/// Generates valid cache keys (non-empty, within length limit)
fn valid_key_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_]{1,64}".prop_map(|s| s)
}

/// Generates valid payload strings
fn valid_value_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{1,256}".prop_map(|s| s)
}

fn privacy_level_strategy() -> impl Strategy<Value = PrivacyLevel> {
    (0u8..=6).prop_map(PrivacyLevel::from_raw)
}

/// A sequence of cache operations for model-based testing
#[derive(Debug, Clone)]
enum CacheOp {
    Put { key: String, value: String },
    Get { key: String },
    Invalidate { key: String },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        (valid_key_strategy(), valid_value_strategy())
            .prop_map(|(key, value)| CacheOp::Put { key, value }),
        valid_key_strategy().prop_map(|key| CacheOp::Get { key }),
        valid_key_strategy().prop_map(|key| CacheOp::Invalidate { key }),
    ]
}

fn test_cache() -> TieredCache {
    TieredCache::from_config(&Config::default())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // For any key-value pair, a put followed by a get (before expiry)
    // returns exactly the stored value, at any privacy level.
    #[test]
    fn prop_roundtrip_storage(
        key in valid_key_strategy(),
        value in valid_value_strategy(),
        level in privacy_level_strategy()
    ) {
        let cache = test_cache();

        cache.put("progress", &key, json!(value.clone()), level).unwrap();

        let entry = cache.get("progress", &key).unwrap();
        prop_assert_eq!(entry.value, json!(value));
    }

    // For any key, storing V1 then V2 makes V1 unobservable.
    #[test]
    fn prop_overwrite_semantics(
        key in valid_key_strategy(),
        value1 in valid_value_strategy(),
        value2 in valid_value_strategy()
    ) {
        let cache = test_cache();

        cache.put("progress", &key, json!(value1), PrivacyLevel::Private).unwrap();
        cache.put("progress", &key, json!(value2.clone()), PrivacyLevel::Private).unwrap();

        let entry = cache.get("progress", &key).unwrap();
        prop_assert_eq!(entry.value, json!(value2));
        prop_assert_eq!(cache.len(), 1);
    }

    // For any stored key, invalidation makes a subsequent get a miss.
    #[test]
    fn prop_invalidate_removes_entry(
        key in valid_key_strategy(),
        value in valid_value_strategy()
    ) {
        let cache = test_cache();

        cache.put("progress", &key, json!(value), PrivacyLevel::Private).unwrap();
        prop_assert!(cache.get("progress", &key).is_some());

        prop_assert!(cache.invalidate("progress", &key));
        prop_assert!(cache.get("progress", &key).is_none());
    }

    // Resolved lifetimes never increase as the privacy level rises.
    #[test]
    fn prop_lifetime_non_increasing(key in valid_key_strategy()) {
        let cache = test_cache();

        let mut previous = u64::MAX;
        for raw in 1u8..=4 {
            let entry = cache
                .put("content", &key, json!(raw), PrivacyLevel::from_raw(raw))
                .unwrap();
            let lifetime = entry.expires_at - entry.created_at;
            prop_assert!(lifetime <= previous, "lifetime grew at level {}", raw);
            previous = lifetime;
        }
    }

    // For any op sequence, the hit/miss counters match a model replay.
    #[test]
    fn prop_statistics_accuracy(ops in prop::collection::vec(cache_op_strategy(), 1..50)) {
        let cache = test_cache();
        let mut model: HashMap<String, String> = HashMap::new();
        let mut expected_hits: u64 = 0;
        let mut expected_misses: u64 = 0;

        for op in ops {
            match op {
                CacheOp::Put { key, value } => {
                    cache.put("progress", &key, json!(value.clone()), PrivacyLevel::Private).unwrap();
                    model.insert(key, value);
                }
                CacheOp::Get { key } => {
                    let entry = cache.get("progress", &key);
                    match (&entry, model.get(&key)) {
                        (Some(e), Some(expected)) => {
                            expected_hits += 1;
                            prop_assert_eq!(&e.value, &json!(expected));
                        }
                        (None, None) => expected_misses += 1,
                        _ => prop_assert!(false, "cache and model disagree on '{}'", key),
                    }
                }
                CacheOp::Invalidate { key } => {
                    cache.invalidate("progress", &key);
                    model.remove(&key);
                }
            }
        }

        let stats = cache.stats();
        prop_assert_eq!(stats.hits, expected_hits, "Hits mismatch");
        prop_assert_eq!(stats.misses, expected_misses, "Misses mismatch");
        prop_assert_eq!(stats.total_entries, model.len(), "Total entries mismatch");
    }
}

// Concurrency properties run fewer cases; each spawns real threads.
proptest! {
    #![proptest_config(ProptestConfig::with_cases(10))]

    // Two writers racing on one key never produce a torn read: every
    // reader observes one of the two complete values, nothing else.
    #[test]
    fn prop_concurrent_same_key_writes_never_tear(
        key in valid_key_strategy(),
        value_a in valid_value_strategy(),
        value_b in valid_value_strategy()
    ) {
        prop_assume!(value_a != value_b);

        let cache = Arc::new(test_cache());
        let expected_a = json!({"payload": value_a.clone(), "tag": "a"});
        let expected_b = json!({"payload": value_b.clone(), "tag": "b"});

        cache.put("progress", &key, expected_a.clone(), PrivacyLevel::Private).unwrap();

        let mut handles = Vec::new();
        for writer_value in [expected_a.clone(), expected_b.clone()] {
            let cache = Arc::clone(&cache);
            let key = key.clone();
            handles.push(std::thread::spawn(move || {
                for _ in 0..50 {
                    cache
                        .put("progress", &key, writer_value.clone(), PrivacyLevel::Private)
                        .unwrap();
                }
            }));
        }

        let reader = {
            let cache = Arc::clone(&cache);
            let key = key.clone();
            let expected_a = expected_a.clone();
            let expected_b = expected_b.clone();
            std::thread::spawn(move || {
                for _ in 0..200 {
                    if let Some(entry) = cache.get("progress", &key) {
                        if entry.value != expected_a && entry.value != expected_b {
                            return Err(entry.value);
                        }
                    }
                }
                Ok(())
            })
        };

        for handle in handles {
            handle.join().expect("writer panicked");
        }
        let observed = reader.join().expect("reader panicked");
        prop_assert!(observed.is_ok(), "torn read observed: {:?}", observed);

        // After the dust settles, the surviving value is one of the two.
        let survivor = cache.get("progress", &key).unwrap();
        prop_assert!(survivor.value == expected_a || survivor.value == expected_b);
    }
}
