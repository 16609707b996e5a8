pub mod cql_adapter;
pub mod memory_adapter;
pub mod schema;
pub mod session;

pub use cql_adapter::CqlStorageAdapter;
pub use memory_adapter::MemoryStorageAdapter;
pub use session::ClusterSession;

use crate::config::CassandraConfig;
use crate::context::RequestContext;
use crate::error::Result;
use crate::model::{User, WriteOutcome};
use tracing::info;

/// Unified record store over the Cassandra and in-memory adapters.
/// Both variants are cheap to clone and share their underlying state.
#[derive(Clone)]
pub enum StorageEngine {
    /// In-memory storage, no persistence
    Memory(MemoryStorageAdapter),
    /// Cassandra / ScyllaDB cluster
    Cassandra(CqlStorageAdapter),
}

impl StorageEngine {
    /// Create an in-memory engine with its schema already provisioned.
    pub fn open_memory(keyspace: &str, replication_factor: u32) -> Result<Self> {
        let adapter = MemoryStorageAdapter::new(keyspace);
        adapter.ensure_schema(replication_factor)?;
        Ok(StorageEngine::Memory(adapter))
    }

    /// Connect, provision the schema and prepare statements, in that order.
    ///
    /// This is the startup barrier: nothing is returned until the keyspace
    /// and table exist, so no caller can reach the store early.
    pub async fn open_cassandra(config: &CassandraConfig) -> Result<Self> {
        let session = ClusterSession::connect(config).await?;
        schema::ensure_schema(&session, &config.keyspace, config.replication_factor).await?;
        let adapter =
            CqlStorageAdapter::new(session, &config.keyspace, config.replication_factor).await?;
        info!(keyspace = %config.keyspace, "Cassandra storage ready");
        Ok(StorageEngine::Cassandra(adapter))
    }

    /// Re-apply the schema bootstrap. A no-op when everything exists.
    pub async fn ensure_schema(&self, replication_factor: u32) -> Result<()> {
        match self {
            StorageEngine::Memory(adapter) => adapter.ensure_schema(replication_factor),
            StorageEngine::Cassandra(adapter) => adapter.ensure_schema().await,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            StorageEngine::Memory(_) => "memory",
            StorageEngine::Cassandra(_) => "cassandra",
        }
    }

    /// Full-table scan in no particular order.
    pub async fn all(&self, ctx: &RequestContext) -> Result<Vec<User>> {
        match self {
            StorageEngine::Memory(adapter) => adapter.all(ctx).await,
            StorageEngine::Cassandra(adapter) => adapter.all(ctx).await,
        }
    }

    /// Get a user by id; `None` when no row exists.
    pub async fn load(&self, ctx: &RequestContext, id: &str) -> Result<Option<User>> {
        match self {
            StorageEngine::Memory(adapter) => adapter.load(ctx, id).await,
            StorageEngine::Cassandra(adapter) => adapter.load(ctx, id).await,
        }
    }

    /// Insert a new row; an existing id is reported, not overwritten.
    pub async fn create(&self, ctx: &RequestContext, user: &User) -> Result<WriteOutcome> {
        match self {
            StorageEngine::Memory(adapter) => adapter.create(ctx, user).await,
            StorageEngine::Cassandra(adapter) => adapter.create(ctx, user).await,
        }
    }

    /// Replace every column of an existing row.
    pub async fn update(&self, ctx: &RequestContext, user: &User) -> Result<WriteOutcome> {
        match self {
            StorageEngine::Memory(adapter) => adapter.update(ctx, user).await,
            StorageEngine::Cassandra(adapter) => adapter.update(ctx, user).await,
        }
    }

    /// Remove a row by id.
    pub async fn delete(&self, ctx: &RequestContext, id: &str) -> Result<WriteOutcome> {
        match self {
            StorageEngine::Memory(adapter) => adapter.delete(ctx, id).await,
            StorageEngine::Cassandra(adapter) => adapter.delete(ctx, id).await,
        }
    }

    /// Liveness probe: a read-only round trip to the store.
    pub async fn ping(&self, ctx: &RequestContext) -> Result<()> {
        match self {
            StorageEngine::Memory(adapter) => adapter.ping(ctx).await,
            StorageEngine::Cassandra(adapter) => adapter.ping(ctx).await,
        }
    }
}
