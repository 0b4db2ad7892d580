//! Integration tests for the cache engine, run against the in-memory store.

use redis_cache_engine::{
    CacheEngine, EngineError, EngineSettings, KeyValueStore, MemoryStore, Operation, RedisEngine,
};
use serde_json::json;
use std::io;
use std::sync::{Arc, Mutex};
use std::thread;

fn engine_with(settings: EngineSettings) -> (RedisEngine<MemoryStore>, MemoryStore) {
    let store = MemoryStore::new();
    let engine = RedisEngine::init(store.clone(), settings).unwrap();
    (engine, store)
}

fn engine() -> (RedisEngine<MemoryStore>, MemoryStore) {
    engine_with(EngineSettings::new().prefix("app_"))
}

/// Log sink shared with a fmt subscriber.
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn count(&self, needle: &str) -> usize {
        let buf = self.0.lock().unwrap();
        String::from_utf8_lossy(&buf).matches(needle).count()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Run `f` with every tracing event written to the returned sink.
fn with_captured_logs(f: impl FnOnce()) -> CapturedLogs {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .with_writer(move || writer.clone())
        .finish();
    tracing::subscriber::with_default(subscriber, f);
    logs
}

#[test]
fn test_basic_workflow() {
    let (mut engine, _) = engine();

    assert!(engine.write("user", &json!({"name": "Alice"}), 60).unwrap());
    assert_eq!(engine.read("user").unwrap(), Some(json!({"name": "Alice"})));

    assert!(engine.delete("user").unwrap());
    assert_eq!(engine.read("user").unwrap(), None);
}

#[test]
fn test_counter_written_raw_then_incremented() {
    let (mut engine, store) = engine();

    assert!(engine.write("k", &json!(7), 0).unwrap());
    assert_eq!(store.peek("app_k"), Some("7".to_string()));

    assert_eq!(engine.increment("k", 3).unwrap(), Some(10));
    assert_eq!(engine.read("k").unwrap(), Some(json!(10)));
    assert_eq!(engine.decrement("k", 1).unwrap(), Some(9));
}

#[test]
fn test_multi_digit_value_is_not_raw() {
    let (mut engine, store) = engine();

    engine.write("k", &json!(42), 0).unwrap();
    assert_ne!(store.peek("app_k"), Some("42".to_string()));
    assert_eq!(engine.read("k").unwrap(), Some(json!(42)));
}

#[test]
fn test_increment_missing_key_starts_at_zero() {
    let (mut engine, _) = engine();
    assert_eq!(engine.increment("hits", 1).unwrap(), Some(1));
}

#[test]
fn test_write_with_duration_expires() {
    let (mut engine, _) = engine();

    engine.write("short", &json!("v"), 1).unwrap();
    assert!(engine.read("short").unwrap().is_some());

    thread::sleep(std::time::Duration::from_millis(1100));
    assert_eq!(engine.read("short").unwrap(), None);
}

#[test]
fn test_unrepresentable_duration_is_a_store_error() {
    let (mut engine, store) = engine();
    assert!(engine.write("k", &json!("v"), u64::MAX).unwrap());
    assert_eq!(store.peek("app_k"), None);
    assert_eq!(engine.stats().transport_failures, 1);

    let (mut strict, _) = engine_with(EngineSettings::new().throw_exceptions(true));
    let err = strict.write("k", &json!("v"), u64::MAX).unwrap_err();
    assert!(matches!(
        err,
        EngineError::Transport {
            operation: Operation::Write,
            ..
        }
    ));
}

#[test]
fn test_delete_reports_removal() {
    let (mut engine, _) = engine();

    assert!(!engine.delete("missing-key").unwrap());

    engine.write("existing-key", &json!("v"), 0).unwrap();
    assert!(engine.delete("existing-key").unwrap());
    assert_eq!(engine.read("existing-key").unwrap(), None);
}

#[test]
fn test_clear_check_is_a_pure_probe() {
    let (mut engine, store) = engine();
    engine.write("a", &json!(1), 0).unwrap();

    let calls = store.call_count();
    assert!(engine.clear(true).unwrap());
    assert_eq!(store.call_count(), calls);
    assert_eq!(store.peek("app_a"), Some("1".to_string()));
}

#[test]
fn test_clear_only_touches_prefix() {
    let (mut engine, store) = engine();

    let mut other = store.clone();
    other.connect().unwrap();
    other.set("app_a", "1").unwrap();
    other.set("app_b", "2").unwrap();
    other.set("other", "3").unwrap();

    assert!(engine.clear(false).unwrap());
    assert_eq!(store.peek("app_a"), None);
    assert_eq!(store.peek("app_b"), None);
    assert_eq!(store.peek("other"), Some("3".to_string()));

    // Nothing left to match is still a success.
    assert!(engine.clear(false).unwrap());
}

#[test]
fn test_clear_spares_look_alike_prefixes() {
    let store = MemoryStore::new();
    let mut mine = RedisEngine::init(store.clone(), EngineSettings::new().prefix("ab_")).unwrap();
    let mut other = RedisEngine::init(store.clone(), EngineSettings::new().prefix("ac_")).unwrap();
    mine.write("k", &json!("mine"), 0).unwrap();
    other.write("k", &json!("other"), 0).unwrap();

    // A backslash or braces would make `prefix*` match other engines' keys.
    for prefix in ["a\\b_", "a{b,c}_", "a[bc]_"] {
        let err = RedisEngine::init(store.clone(), EngineSettings::new().prefix(prefix));
        assert!(matches!(err, Err(EngineError::InvalidSettings(_))));
    }

    assert!(mine.clear(false).unwrap());
    assert_eq!(mine.read("k").unwrap(), None);
    assert_eq!(other.read("k").unwrap(), Some(json!("other")));
}

#[test]
fn test_group_tokens() {
    let settings = EngineSettings::new().prefix("app_").groups(["posts", "users"]);
    let (mut engine, _) = engine_with(settings);

    assert_eq!(engine.groups().unwrap(), ["posts1", "users1"]);

    assert!(engine.clear_group("users").unwrap());
    assert_eq!(engine.groups().unwrap(), ["posts1", "users2"]);
    assert_eq!(engine.stats().group_invalidations, 1);
}

#[test]
fn test_group_invalidation_orphans_keys() {
    let (mut engine, _) = engine_with(EngineSettings::new().prefix("app_").group("users"));

    let key = format!("{}_profile_1", engine.groups().unwrap()[0]);
    engine.write(&key, &json!({"id": 1}), 300).unwrap();
    assert!(engine.read(&key).unwrap().is_some());

    engine.clear_group("users").unwrap();
    let fresh = format!("{}_profile_1", engine.groups().unwrap()[0]);
    assert_ne!(fresh, key);
    assert_eq!(engine.read(&fresh).unwrap(), None);
}

#[test]
fn test_groups_shared_between_engines() {
    let store = MemoryStore::new();
    let settings = EngineSettings::new().prefix("app_").group("users");
    let mut a = RedisEngine::init(store.clone(), settings.clone()).unwrap();
    let mut b = RedisEngine::init(store, settings).unwrap();

    assert_eq!(a.groups().unwrap(), ["users1"]);
    a.clear_group("users").unwrap();
    b.clear_group("users").unwrap();

    assert_eq!(a.groups().unwrap(), ["users3"]);
    assert_eq!(b.groups().unwrap(), ["users3"]);
}

#[test]
fn test_concurrent_group_invalidation() {
    let store = MemoryStore::new();
    let settings = EngineSettings::new().prefix("app_").group("users");

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let store = store.clone();
            let settings = settings.clone();
            thread::spawn(move || {
                let mut engine = RedisEngine::init(store, settings).unwrap();
                for _ in 0..10 {
                    assert!(engine.clear_group("users").unwrap());
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    let mut engine = RedisEngine::init(store, settings).unwrap();
    assert_eq!(engine.groups().unwrap(), ["users80"]);
}

#[test]
fn test_add_only_creates() {
    let (mut engine, store) = engine();

    assert!(engine.add("k", &json!("first"), 60).unwrap());
    assert!(!engine.add("k", &json!("second"), 60).unwrap());
    assert_eq!(engine.read("k").unwrap(), Some(json!("first")));

    engine.write("counter", &json!(3), 0).unwrap();
    assert!(!engine.add("counter", &json!(9), 0).unwrap());
    assert_eq!(store.peek("app_counter"), Some("3".to_string()));
}

#[test]
fn test_add_sets_expiry() {
    let (mut engine, _) = engine();

    assert!(engine.add("k", &json!("v"), 1).unwrap());
    thread::sleep(std::time::Duration::from_millis(1100));
    assert_eq!(engine.read("k").unwrap(), None);
    assert!(engine.add("k", &json!("again"), 0).unwrap());
}

#[test]
fn test_outage_is_silent_by_default() {
    let (mut engine, store) = engine_with(EngineSettings::new().prefix("app_").group("users"));
    store.set_online(false);

    assert!(engine.write("k", &json!("v"), 60).unwrap());
    assert_eq!(engine.read("k").unwrap(), None);
    assert_eq!(engine.increment("k", 1).unwrap(), None);
    assert_eq!(engine.decrement("k", 1).unwrap(), None);
    assert!(!engine.delete("k").unwrap());
    assert!(engine.clear(false).unwrap());
    assert!(engine.groups().unwrap().is_empty());
    assert!(!engine.clear_group("users").unwrap());
    assert!(!engine.add("k", &json!("v"), 60).unwrap());

    let stats = engine.stats();
    assert_eq!(stats.transport_failures, 9);
    assert_eq!(stats.suppressed_failures, 9);
    assert_eq!(stats.writes, 0);
}

#[test]
fn test_outage_propagates_when_strict() {
    let settings = EngineSettings::new().prefix("app_").throw_exceptions(true);
    let (mut engine, store) = engine_with(settings);
    store.set_online(false);

    let err = engine.write("k", &json!("v"), 60).unwrap_err();
    assert!(matches!(
        err,
        EngineError::Transport {
            operation: Operation::Write,
            ..
        }
    ));
    assert_eq!(engine.stats().transport_failures, 1);

    assert!(engine.read("k").is_err());
    assert!(engine.clear(false).is_err());
    // The probe never reaches the store.
    assert!(engine.clear(true).unwrap());
}

#[test]
fn test_failure_is_logged_once() {
    let logs = with_captured_logs(|| {
        let settings = EngineSettings::new().prefix("app_").throw_exceptions(true);
        let (mut engine, store) = engine_with(settings);
        store.set_online(false);
        assert!(engine.write("k", &json!("v"), 60).is_err());
    });
    assert_eq!(logs.count("cache store call failed"), 1);
    assert_eq!(logs.count("operation=write"), 1);

    let logs = with_captured_logs(|| {
        let (mut engine, store) = engine();
        store.set_online(false);
        assert_eq!(engine.read("k").unwrap(), None);
    });
    assert_eq!(logs.count("cache store call failed"), 1);
}

#[test]
fn test_recovers_after_outage() {
    let (mut engine, store) = engine();

    store.set_online(false);
    store.drop_connections();
    assert_eq!(engine.read("k").unwrap(), None);

    store.set_online(true);
    assert!(engine.write("k", &json!([1, 2]), 60).unwrap());
    assert_eq!(engine.read("k").unwrap(), Some(json!([1, 2])));
    assert!(engine.is_connected());
}

#[test]
fn test_increment_of_structured_value_fails_through_policy() {
    let (mut engine, _) = engine();
    engine.write("k", &json!({"a": 1}), 0).unwrap();
    assert_eq!(engine.increment("k", 1).unwrap(), None);

    let (mut strict, _) = engine_with(EngineSettings::new().throw_exceptions(true));
    strict.write("k", &json!("text"), 0).unwrap();
    assert!(strict.increment("k", 1).is_err());
}
