//! Host State Store
//!
//! A small key-value store standing in for the host platform's entity
//! states. The backend (or an operator) publishes its current address under
//! [`BACKEND_HOST_KEY`], and the conversation agent reads it on every turn.

use anyhow::anyhow;
use std::{collections::HashMap, sync::RwLock};
use turn_relay_core::DynamicEndpointSource;

/// Well-known key under which the backend host is published.
pub const BACKEND_HOST_KEY: &str = "input_text.backend_host";

#[derive(Default)]
pub struct HostStateStore {
    states: RwLock<HashMap<String, String>>,
}

impl HostStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        let states = self
            .states
            .read()
            .map_err(|_| anyhow!("host state store is poisoned"))?;
        Ok(states.get(key).cloned())
    }

    pub fn set(&self, key: &str, value: impl Into<String>) -> anyhow::Result<Option<String>> {
        let mut states = self
            .states
            .write()
            .map_err(|_| anyhow!("host state store is poisoned"))?;
        Ok(states.insert(key.to_string(), value.into()))
    }

    pub fn remove(&self, key: &str) -> anyhow::Result<Option<String>> {
        let mut states = self
            .states
            .write()
            .map_err(|_| anyhow!("host state store is poisoned"))?;
        Ok(states.remove(key))
    }
}

impl DynamicEndpointSource for HostStateStore {
    fn read_host(&self) -> anyhow::Result<Option<String>> {
        let states = self
            .states
            .read()
            .map_err(|_| anyhow!("host state store is poisoned"))?;
        Ok(states.get(BACKEND_HOST_KEY).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use turn_relay_core::{EndpointResolver, endpoint::FALLBACK_HOST};

    #[test]
    fn test_set_get_remove() {
        let store = HostStateStore::new();
        assert_eq!(store.get("a").unwrap(), None);
        assert_eq!(store.set("a", "1").unwrap(), None);
        assert_eq!(store.set("a", "2").unwrap(), Some("1".to_string()));
        assert_eq!(store.get("a").unwrap(), Some("2".to_string()));
        assert_eq!(store.remove("a").unwrap(), Some("2".to_string()));
        assert_eq!(store.get("a").unwrap(), None);
    }

    #[test]
    fn test_poisoned_store_surfaces_errors() {
        let store = Arc::new(HostStateStore::new());
        store.set("a", "1").unwrap();

        let writer = store.clone();
        let joined = std::thread::spawn(move || {
            let _guard = writer.states.write().unwrap();
            panic!("writer died holding the lock");
        })
        .join();
        assert!(joined.is_err());

        assert!(store.get("a").is_err());
        assert!(store.set("a", "2").is_err());
        assert!(store.remove("a").is_err());
        assert!(store.read_host().is_err());
    }

    #[test]
    fn test_published_host_drives_resolution() {
        let store = Arc::new(HostStateStore::new());
        let resolver = EndpointResolver::new(store.clone());

        assert_eq!(resolver.resolve("", None).host, FALLBACK_HOST);

        store.set(BACKEND_HOST_KEY, "10.0.0.9").unwrap();
        assert_eq!(resolver.resolve("cube.local", None).host, "10.0.0.9");

        store.set(BACKEND_HOST_KEY, "unavailable").unwrap();
        assert_eq!(resolver.resolve("cube.local", None).host, "cube.local");
    }
}
