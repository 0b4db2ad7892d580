//! Group versioning.
//!
//! Redis cannot atomically delete "every key in group X". Instead each group
//! has a version counter stored at `prefix ++ group`. Callers fold the group
//! token (`group ++ version`) into the keys they write for that group.
//! Invalidating the group bumps the counter, so every key built from the old
//! token becomes unreachable at once; the orphaned entries stay in the store
//! until their own TTL runs out.
//!
//! Versions start at 1 and only ever go up. Creation uses SETNX and
//! invalidation uses INCR, so concurrent engines sharing a store never hand
//! out a token older than one another engine has already seen.

use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::store::KeyValueStore;

/// Version a group starts at.
const INITIAL_VERSION: u64 = 1;

/// The store key holding a group's version.
pub fn version_key(prefix: &str, group: &str) -> String {
    format!("{}{}", prefix, group)
}

/// Current token for `group`, creating the version at 1 if it is absent.
pub fn token<S>(store: &mut S, prefix: &str, group: &str) -> StoreResult<String>
where
    S: KeyValueStore + ?Sized,
{
    let key = version_key(prefix, group);

    let version = match read_version(store, &key)? {
        Some(version) => version,
        None => initialize(store, &key)?,
    };

    Ok(format!("{}{}", group, version))
}

fn initialize<S>(store: &mut S, key: &str) -> StoreResult<u64>
where
    S: KeyValueStore + ?Sized,
{
    if store.set_if_absent(key, &INITIAL_VERSION.to_string())? {
        return Ok(INITIAL_VERSION);
    }
    // Lost the race to another writer; use whatever it stored.
    Ok(read_version(store, key)?.unwrap_or(INITIAL_VERSION))
}

/// Tokens for every group, in the order given.
pub fn tokens<S>(store: &mut S, prefix: &str, groups: &[String]) -> StoreResult<Vec<String>>
where
    S: KeyValueStore + ?Sized,
{
    groups
        .iter()
        .map(|group| token(store, prefix, group))
        .collect()
}

/// Bump the version of `group`. An absent version is created at 1 by the
/// store's INCR semantics.
pub fn invalidate<S>(store: &mut S, prefix: &str, group: &str) -> StoreResult<bool>
where
    S: KeyValueStore + ?Sized,
{
    let version = store.incr(&version_key(prefix, group))?;
    debug!(group, version, "group invalidated");
    Ok(version > 0)
}

fn read_version<S>(store: &mut S, key: &str) -> StoreResult<Option<u64>>
where
    S: KeyValueStore + ?Sized,
{
    match store.get(key)? {
        None => Ok(None),
        Some(raw) => match raw.parse::<u64>() {
            Ok(version) if version >= INITIAL_VERSION => Ok(Some(version)),
            _ => Err(StoreError::Response(format!(
                "group version at '{}' is not a positive integer: '{}'",
                key, raw
            ))),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;

    fn connected() -> MemoryStore {
        let mut store = MemoryStore::new();
        store.connect().unwrap();
        store
    }

    #[test]
    fn test_token_initializes_version() {
        let mut store = connected();

        assert_eq!(token(&mut store, "app_", "users").unwrap(), "users1");
        assert_eq!(store.peek("app_users"), Some("1".to_string()));
        assert_eq!(token(&mut store, "app_", "users").unwrap(), "users1");
    }

    #[test]
    fn test_invalidate_bumps_token() {
        let mut store = connected();

        assert_eq!(token(&mut store, "app_", "users").unwrap(), "users1");
        assert!(invalidate(&mut store, "app_", "users").unwrap());
        assert_eq!(token(&mut store, "app_", "users").unwrap(), "users2");
    }

    #[test]
    fn test_invalidate_absent_group() {
        let mut store = connected();

        assert!(invalidate(&mut store, "app_", "fresh").unwrap());
        assert_eq!(token(&mut store, "app_", "fresh").unwrap(), "fresh1");
    }

    #[test]
    fn test_tokens_keep_order() {
        let mut store = connected();
        let groups = vec!["posts".to_string(), "users".to_string()];
        invalidate(&mut store, "app_", "users").unwrap();
        invalidate(&mut store, "app_", "users").unwrap();

        assert_eq!(
            tokens(&mut store, "app_", &groups).unwrap(),
            vec!["posts1".to_string(), "users2".to_string()]
        );
    }

    #[test]
    fn test_corrupt_version_is_an_error() {
        let mut store = connected();
        store.set("app_users", "abc").unwrap();
        assert!(token(&mut store, "app_", "users").is_err());
    }

    #[test]
    fn test_concurrent_invalidation_is_observed() {
        let mut a = connected();
        let mut b = a.clone();
        b.connect().unwrap();

        assert_eq!(token(&mut a, "app_", "users").unwrap(), "users1");
        invalidate(&mut a, "app_", "users").unwrap();
        invalidate(&mut b, "app_", "users").unwrap();

        assert_eq!(token(&mut a, "app_", "users").unwrap(), "users3");
        assert_eq!(token(&mut b, "app_", "users").unwrap(), "users3");
    }
}
