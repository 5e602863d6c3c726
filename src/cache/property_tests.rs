//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the table invariants against a simple model.

use proptest::prelude::*;
use std::time::Duration;
use tokio::runtime::{Builder, Runtime};

use crate::cache::Cache;
use crate::config::{CacheConfig, ConfigPatch};
use crate::error::CacheError;

// == Test Configuration ==
const LONG_TTL: Duration = Duration::from_secs(3600);

fn test_runtime() -> Runtime {
    Builder::new_current_thread()
        .enable_time()
        .build()
        .expect("failed to build test runtime")
}

fn test_cache(runtime: &Runtime) -> Cache<String> {
    Cache::with_runtime(CacheConfig::default(), runtime.handle().clone())
}

// == Strategies ==
/// Generates valid cache keys from a small alphabet so operations collide
fn valid_key_strategy() -> impl Strategy<Value = String> {
    "[a-e]{1,2}".prop_map(|s| s)
}

fn valid_value_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{0,32}".prop_map(|s| s)
}

#[derive(Debug, Clone)]
enum CacheOp {
    Set { key: String, value: String, ttl: bool },
    Get { key: String },
    Delete { key: String },
    FlushAll,
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        4 => (valid_key_strategy(), valid_value_strategy(), any::<bool>())
            .prop_map(|(key, value, ttl)| CacheOp::Set { key, value, ttl }),
        2 => valid_key_strategy().prop_map(|key| CacheOp::Get { key }),
        2 => valid_key_strategy().prop_map(|key| CacheOp::Delete { key }),
        1 => Just(CacheOp::FlushAll),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // For any sequence of operations, the live counter, the stats, and the key
    // enumeration all agree with an insertion-ordered model of the table.
    #[test]
    fn prop_table_matches_model(ops in prop::collection::vec(cache_op_strategy(), 1..60)) {
        let runtime = test_runtime();
        let cache = test_cache(&runtime);
        let mut model: Vec<(String, String)> = Vec::new();

        for op in ops {
            match op {
                CacheOp::Set { key, value, ttl } => {
                    let ttl = if ttl { Some(LONG_TTL) } else { None };
                    cache.set(key.clone(), value.clone(), ttl).unwrap();
                    model.retain(|(k, _)| k != &key);
                    model.push((key, value));
                }
                CacheOp::Get { key } => {
                    let expected = model.iter().find(|(k, _)| k == &key).map(|(_, v)| v.clone());
                    prop_assert_eq!(cache.get(&key).unwrap(), expected);
                }
                CacheOp::Delete { key } => {
                    let before = cache.key_count();
                    let present = model.iter().any(|(k, _)| k == &key);
                    prop_assert_eq!(cache.delete(&key).unwrap(), present);
                    model.retain(|(k, _)| k != &key);
                    let expected = if present { before - 1 } else { before };
                    prop_assert_eq!(cache.key_count(), expected);
                }
                CacheOp::FlushAll => {
                    cache.flush_all().unwrap();
                    model.clear();
                }
            }

            let keys: Vec<String> = model.iter().map(|(k, _)| k.clone()).collect();
            prop_assert_eq!(cache.key_count(), model.len(), "Live counter mismatch");
            prop_assert_eq!(cache.stats().keys, model.len(), "Stats mismatch");
            prop_assert_eq!(cache.all_keys(), keys, "Key order mismatch");
        }
    }

    // For any key and two values, re-setting the key replaces the entry
    // wholesale: the latest value wins and no expiration is left behind.
    #[test]
    fn prop_overwrite_semantics(
        key in valid_key_strategy(),
        value1 in valid_value_strategy(),
        value2 in valid_value_strategy()
    ) {
        let runtime = test_runtime();
        let cache = test_cache(&runtime);

        cache.set(key.clone(), value1, Some(LONG_TTL)).unwrap();
        cache.set(key.clone(), value2.clone(), None).unwrap();

        prop_assert_eq!(cache.get(&key).unwrap(), Some(value2));
        prop_assert_eq!(cache.key_count(), 1);
        let has_expiry = cache.shared.table().get(&key).is_some_and(|e| e.has_expiry());
        prop_assert!(!has_expiry, "Replaced entry kept its old expiration");
    }

    // For any absent key, error_or_null decides between a null result and
    // NotExistKey, for both reads and deletes.
    #[test]
    fn prop_error_or_null_governs_missing_keys(key in valid_key_strategy(), error_or_null in any::<bool>()) {
        let runtime = test_runtime();
        let cache = test_cache(&runtime);
        cache.configure(ConfigPatch::new().with_error_or_null(error_or_null));

        let get = cache.get(&key);
        let delete = cache.delete(&key);
        if error_or_null {
            prop_assert!(matches!(get, Err(CacheError::NotExistKey(_))));
            prop_assert!(matches!(delete, Err(CacheError::NotExistKey(_))));
        } else {
            prop_assert_eq!(get, Ok(None));
            prop_assert_eq!(delete, Ok(false));
        }
        prop_assert!(!cache.exists_key(&key));
    }
}
