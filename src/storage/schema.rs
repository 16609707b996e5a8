//! Keyspace and table provisioning.
//!
//! Both statements are `if not exists`, so running the bootstrap against an
//! already provisioned cluster changes nothing. There are no migrations: the
//! table layout is fixed for a given release.

use super::session::ClusterSession;
use crate::config::is_valid_identifier;
use crate::error::{Result, UserStoreError};
use tracing::info;

pub const USERS_TABLE: &str = "users";

pub const CREATE_TABLE: &str = "
    create table if not exists users (
        id varchar,
        username varchar,
        email varchar,
        phone varchar,
        date_of_birth date,
        primary key (id)
    )";

/// Keyspace statement with a single-datacenter replication strategy.
pub fn create_keyspace_statement(keyspace: &str, replication_factor: u32) -> String {
    format!(
        "create keyspace if not exists {} with replication = \
         {{'class':'SimpleStrategy', 'replication_factor':{}}}",
        keyspace, replication_factor
    )
}

/// Create the keyspace, switch the session to it, then create the table.
///
/// Must finish before any record operation runs. Errors are fatal to startup.
pub async fn ensure_schema(
    session: &ClusterSession,
    keyspace: &str,
    replication_factor: u32,
) -> Result<()> {
    if !is_valid_identifier(keyspace) {
        return Err(UserStoreError::Schema(format!(
            "invalid keyspace name '{}'",
            keyspace
        )));
    }

    session
        .session()
        .query_unpaged(create_keyspace_statement(keyspace, replication_factor), ())
        .await
        .map_err(|e| UserStoreError::Schema(format!("create keyspace {}: {}", keyspace, e)))?;
    info!(keyspace, replication_factor, "Keyspace ready");

    session.use_keyspace(keyspace).await?;

    session
        .session()
        .query_unpaged(CREATE_TABLE, ())
        .await
        .map_err(|e| UserStoreError::Schema(format!("create table {}: {}", USERS_TABLE, e)))?;
    info!(keyspace, table = USERS_TABLE, "Table ready");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyspace_statement() {
        let stmt = create_keyspace_statement("masterdata", 3);
        assert!(stmt.starts_with("create keyspace if not exists masterdata"));
        assert!(stmt.contains("'class':'SimpleStrategy'"));
        assert!(stmt.contains("'replication_factor':3}"));
    }

    #[test]
    fn test_table_statement_is_idempotent() {
        assert!(CREATE_TABLE.contains("create table if not exists users"));
        assert!(CREATE_TABLE.contains("primary key (id)"));
        assert!(CREATE_TABLE.contains("date_of_birth date"));
    }
}
