use super::{AccessTokenStore, AccountStore, ResourceServerStore, SimpleStore};
use crate::resource_server::ResourceServer;
use crate::types::{AccessToken, AccountId};
use std::collections::HashMap;
use std::convert::Infallible;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::{Arc, Mutex};

pub struct MemorySimpleStore<K, V> {
    store: Arc<Mutex<HashMap<K, V>>>,
}

impl<K, V> Default for MemorySimpleStore<K, V> {
    fn default() -> Self {
        Self { store: Arc::new(Mutex::new(HashMap::new())) }
    }
}

impl<K, V> SimpleStore<K, V> for MemorySimpleStore<K, V>
where
    K: Debug + Eq + Hash + Send + Sync + 'static,
    V: Debug + Clone + Send + Sync + 'static,
{
    type Error = Infallible;

    async fn get(&self, key: &K) -> Result<Option<V>, Self::Error> {
        Ok(self.store.lock().expect("lock should never be poisoned").get(key).cloned())
    }
    async fn set(&self, key: K, value: V) -> Result<(), Self::Error> {
        self.store.lock().expect("lock should never be poisoned").insert(key, value);
        Ok(())
    }
    async fn del(&self, key: &K) -> Result<(), Self::Error> {
        self.store.lock().expect("lock should never be poisoned").remove(key);
        Ok(())
    }
    async fn clear(&self) -> Result<(), Self::Error> {
        self.store.lock().expect("lock should never be poisoned").clear();
        Ok(())
    }
}

pub type MemoryResourceServerStore = MemorySimpleStore<String, ResourceServer>;

impl ResourceServerStore for MemoryResourceServerStore {}

pub type MemoryAccessTokenStore = MemorySimpleStore<AccountId, AccessToken>;

impl AccessTokenStore for MemoryAccessTokenStore {}

/// Accounts identified directly by their handle.
#[derive(Default)]
pub struct MemoryAccountStore {
    handles: Arc<Mutex<HashMap<String, AccountId>>>,
}

impl AccountStore for MemoryAccountStore {
    type Error = Infallible;

    async fn find_or_create_by_handle(&self, handle: &str) -> Result<AccountId, Self::Error> {
        let mut handles = self.handles.lock().expect("lock should never be poisoned");
        Ok(handles.entry(handle.to_string()).or_insert_with(|| AccountId::new(handle)).clone())
    }
}
