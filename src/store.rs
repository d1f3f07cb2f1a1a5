pub mod memory;

use crate::resource_server::ResourceServer;
use crate::types::{AccessToken, AccountId};
use std::error::Error;
use std::future::Future;
use std::hash::Hash;

#[trait_variant::make(Send)]
pub trait SimpleStore<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    type Error: Error + Send + Sync + 'static;

    fn get(&self, key: &K) -> impl Future<Output = Result<Option<V>, Self::Error>>;
    fn set(&self, key: K, value: V) -> impl Future<Output = Result<(), Self::Error>>;
    fn del(&self, key: &K) -> impl Future<Output = Result<(), Self::Error>>;
    fn clear(&self) -> impl Future<Output = Result<(), Self::Error>>;
}

/// Registered pods, keyed by host. At most one record per host.
pub trait ResourceServerStore: SimpleStore<String, ResourceServer> {}

/// Access tokens, keyed by the owning local account. The key choice enforces
/// the one-token-per-account invariant structurally.
pub trait AccessTokenStore: SimpleStore<AccountId, AccessToken> {}

/// Lookup-or-creation of local accounts from a composed `uid@host` handle.
///
/// This is the seam for the host application's account model; the provided
/// [`memory::MemoryAccountStore`](crate::store::memory::MemoryAccountStore)
/// implements the default find-or-create-by-handle behavior.
#[trait_variant::make(Send)]
pub trait AccountStore {
    type Error: Error + Send + Sync + 'static;

    fn find_or_create_by_handle(
        &self,
        handle: &str,
    ) -> impl Future<Output = Result<AccountId, Self::Error>>;
}
