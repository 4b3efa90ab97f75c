pub mod chatdb;
pub mod db;
pub mod jobdb;
#[cfg(test)]
pub mod memory;

use chatdb::ChatStoreExt;
use jobdb::JobStoreExt;

/// The full storage surface the services are written against. Implemented by
/// the Postgres-backed `DBClient` and, for tests, by the in-memory store.
pub trait Store: JobStoreExt + ChatStoreExt + Send + Sync {}

impl<T: JobStoreExt + ChatStoreExt + Send + Sync> Store for T {}
