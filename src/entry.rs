//! A stored value with an optional expiry, used by the in-memory store.

use bytes::Bytes;
use std::time::{Duration, Instant};

/// A single entry in the in-memory store.
#[derive(Debug, Clone)]
pub struct Entry {
    /// The stored value.
    pub(crate) value: Bytes,

    /// When this entry expires. `None` means no expiration.
    pub(crate) expires_at: Option<Instant>,
}

impl Entry {
    /// Create a new entry with no expiration.
    pub fn new(value: impl Into<Bytes>) -> Self {
        Self {
            value: value.into(),
            expires_at: None,
        }
    }

    /// Create a new entry that expires `ttl` from now.
    ///
    /// Returns `None` if the deadline cannot be represented.
    pub fn with_ttl(value: impl Into<Bytes>, ttl: Duration) -> Option<Self> {
        let expires_at = Instant::now().checked_add(ttl)?;
        Some(Self {
            value: value.into(),
            expires_at: Some(expires_at),
        })
    }

    /// Check if this entry has expired.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    /// Check if this entry has expired at a given time.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        match self.expires_at {
            Some(expires) => now >= expires,
            None => false,
        }
    }

    /// Replace the value, keeping the current expiry.
    pub fn replace_value(&mut self, value: impl Into<Bytes>) {
        self.value = value.into();
    }

    /// Expire the entry `ttl` from now. Returns `false`, leaving the entry
    /// untouched, if the deadline cannot be represented.
    pub fn expire_in(&mut self, ttl: Duration) -> bool {
        match Instant::now().checked_add(ttl) {
            Some(expires_at) => {
                self.expires_at = Some(expires_at);
                true
            }
            None => false,
        }
    }

    /// The value as a string, the way the remote store would return it.
    pub fn as_string(&self) -> String {
        String::from_utf8_lossy(&self.value).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_entry_not_expired() {
        let entry = Entry::new("test");
        assert!(!entry.is_expired());
        assert!(entry.expires_at.is_none());
    }

    #[test]
    fn test_entry_with_future_expiration() {
        let entry = Entry::with_ttl("test", Duration::from_secs(60)).unwrap();
        assert!(!entry.is_expired());
    }

    #[test]
    fn test_entry_expired_at_later_instant() {
        let entry = Entry::with_ttl("test", Duration::from_secs(1)).unwrap();
        let later = Instant::now() + Duration::from_secs(2);
        assert!(entry.is_expired_at(later));
    }

    #[test]
    fn test_replace_value_keeps_expiry() {
        let mut entry = Entry::with_ttl("1", Duration::from_secs(60)).unwrap();
        let expires = entry.expires_at;
        entry.replace_value("2");
        assert_eq!(entry.as_string(), "2");
        assert_eq!(entry.expires_at, expires);
    }

    #[test]
    fn test_unrepresentable_ttl() {
        assert!(Entry::with_ttl("test", Duration::MAX).is_none());

        let mut entry = Entry::with_ttl("test", Duration::from_secs(60)).unwrap();
        let expires = entry.expires_at;
        assert!(!entry.expire_in(Duration::MAX));
        assert_eq!(entry.expires_at, expires);
    }
}
