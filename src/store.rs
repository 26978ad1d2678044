use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::frame::DataType;
use crate::Result;

/// The stored unit of value. Reads hand out clones, so callers can never
/// mutate stored state through a read handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheItem {
    pub key: String,
    pub value: String,
    pub data_type: DataType,
}

impl CacheItem {
    pub fn bulk(key: impl Into<String>, value: impl Into<String>) -> CacheItem {
        CacheItem {
            key: key.into(),
            value: value.into(),
            data_type: DataType::BulkString,
        }
    }
}

/// Minimal capability surface over the shared mapping. `contains` and
/// `remove` are not wired to any command yet.
pub trait Cache {
    fn get(&self, key: &str) -> Option<CacheItem>;
    fn set(&self, key: String, item: CacheItem) -> Result<()>;
    fn contains(&self, key: &str) -> bool;
    fn remove(&self, key: &str) -> Result<()>;
}

/// The process-wide key-value state. Cloning is cheap and every clone
/// observes the same backing map; the server creates one instance and hands a
/// clone to each connection task. Individual operations are linearizable
/// through the internal mutex.
#[derive(Clone, Default)]
pub struct Store {
    inner: Arc<Mutex<HashMap<String, CacheItem>>>,
}

impl Store {
    pub fn new() -> Store {
        Store::default()
    }
}

impl Cache for Store {
    fn get(&self, key: &str) -> Option<CacheItem> {
        self.inner.lock().unwrap().get(key).cloned()
    }

    fn set(&self, key: String, item: CacheItem) -> Result<()> {
        self.inner.lock().unwrap().insert(key, item);
        Ok(())
    }

    fn contains(&self, key: &str) -> bool {
        self.inner.lock().unwrap().contains_key(key)
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.inner.lock().unwrap().remove(key);
        Ok(())
    }
}
