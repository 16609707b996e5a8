use crate::config::CassandraConfig;
use crate::error::{Result, UserStoreError};
use scylla::client::execution_profile::ExecutionProfile;
use scylla::client::session::Session;
use scylla::client::session_builder::SessionBuilder;
use scylla::statement::Consistency;
use std::sync::Arc;
use tracing::info;

/// Every statement is acknowledged by a majority of replicas.
pub const CONSISTENCY: Consistency = Consistency::Quorum;

/// Process-wide handle to the cluster connection.
///
/// Created once at startup and cloned into every component that talks to
/// the cluster. Clones share the same driver session, which is internally
/// synchronized and pools its own connections.
#[derive(Clone)]
pub struct ClusterSession {
    inner: Arc<Session>,
}

impl ClusterSession {
    /// Open a session against the configured contact points.
    ///
    /// One attempt only; a failure is returned to the caller and startup aborts.
    pub async fn connect(config: &CassandraConfig) -> Result<Self> {
        config.validate()?;

        info!(
            hosts = ?config.hosts,
            protocol_version = config.protocol_version,
            "Connecting to Cassandra cluster"
        );

        let profile = ExecutionProfile::builder()
            .consistency(CONSISTENCY)
            .request_timeout(Some(config.request_timeout()))
            .build();

        let mut builder = SessionBuilder::new()
            .known_nodes(&config.hosts)
            .connection_timeout(config.connect_timeout())
            .default_execution_profile_handle(profile.into_handle());

        if !config.username.is_empty() {
            builder = builder.user(config.username.clone(), config.password.clone());
        }

        let session = builder
            .build()
            .await
            .map_err(|e| UserStoreError::Connection(e.to_string()))?;

        info!("Connected to Cassandra cluster");
        Ok(Self {
            inner: Arc::new(session),
        })
    }

    pub fn session(&self) -> &Session {
        &self.inner
    }

    /// Point every connection of the shared session at `keyspace`.
    pub async fn use_keyspace(&self, keyspace: &str) -> Result<()> {
        self.inner
            .use_keyspace(keyspace, false)
            .await
            .map_err(|e| UserStoreError::Schema(format!("use keyspace {}: {}", keyspace, e)))
    }
}
