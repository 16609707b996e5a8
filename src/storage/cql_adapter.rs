use super::schema;
use super::session::ClusterSession;
use crate::context::RequestContext;
use crate::error::{Result, UserStoreError};
use crate::model::{User, WriteOutcome};
use chrono::NaiveDate;
use futures::TryStreamExt;
use scylla::client::session::Session;
use scylla::response::query_result::QueryResult;
use scylla::statement::prepared::PreparedStatement;
use scylla::value::{CqlValue, Row};
use scylla::DeserializeRow;
use std::fmt::Display;
use std::sync::Arc;

const SELECT_ALL: &str = "select id, username, email, phone, date_of_birth from users";
const SELECT_ONE: &str =
    "select id, username, email, phone, date_of_birth from users where id = ?";
const INSERT: &str = "insert into users (id, username, email, phone, date_of_birth) \
                      values (?, ?, ?, ?, ?) if not exists";
const UPDATE: &str = "update users set username = ?, email = ?, phone = ?, date_of_birth = ? \
                      where id = ? if exists";
const DELETE: &str = "delete from users where id = ? if exists";
const PING: &str = "select release_version from system.local";

/// Row shape of the users table. Nullable columns decode to `None`.
#[derive(DeserializeRow)]
struct UserRow {
    id: String,
    username: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    date_of_birth: Option<NaiveDate>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            username: row.username.unwrap_or_default(),
            email: row.email.unwrap_or_default(),
            phone: row.phone.unwrap_or_default(),
            date_of_birth: row.date_of_birth,
        }
    }
}

struct Statements {
    select_all: PreparedStatement,
    select_one: PreparedStatement,
    insert: PreparedStatement,
    update: PreparedStatement,
    delete: PreparedStatement,
}

/// Record store over a Cassandra/ScyllaDB session.
///
/// Update and delete are conditional writes (`if exists`), so the cluster
/// itself reports whether the row was there; create is `if not exists`.
#[derive(Clone)]
pub struct CqlStorageAdapter {
    session: ClusterSession,
    keyspace: String,
    replication_factor: u32,
    statements: Arc<Statements>,
}

impl CqlStorageAdapter {
    /// Prepare the statements. The schema must already exist.
    pub async fn new(
        session: ClusterSession,
        keyspace: &str,
        replication_factor: u32,
    ) -> Result<Self> {
        let s = session.session();
        let statements = Statements {
            select_all: prepare(s, SELECT_ALL).await?,
            select_one: prepare(s, SELECT_ONE).await?,
            insert: prepare(s, INSERT).await?,
            update: prepare(s, UPDATE).await?,
            delete: prepare(s, DELETE).await?,
        };
        Ok(Self {
            session,
            keyspace: keyspace.to_string(),
            replication_factor,
            statements: Arc::new(statements),
        })
    }

    pub fn cluster_session(&self) -> &ClusterSession {
        &self.session
    }

    /// Re-run the schema bootstrap on the shared session.
    pub async fn ensure_schema(&self) -> Result<()> {
        schema::ensure_schema(&self.session, &self.keyspace, self.replication_factor).await
    }

    pub async fn all(&self, ctx: &RequestContext) -> Result<Vec<User>> {
        ctx.run(async {
            let pager = self
                .session
                .session()
                .execute_iter(self.statements.select_all.clone(), ())
                .await
                .map_err(storage_err("select all users"))?;
            let mut rows = pager
                .rows_stream::<UserRow>()
                .map_err(mapping_err("users row"))?;

            let mut users = Vec::new();
            while let Some(row) = rows.try_next().await.map_err(storage_err("read users page"))? {
                users.push(User::from(row));
            }
            Ok(users)
        })
        .await
    }

    pub async fn load(&self, ctx: &RequestContext, id: &str) -> Result<Option<User>> {
        ctx.run(async {
            let result = self
                .session
                .session()
                .execute_unpaged(&self.statements.select_one, (id,))
                .await
                .map_err(storage_err("select user"))?;
            let rows = result
                .into_rows_result()
                .map_err(mapping_err("select user result"))?;
            let row = rows
                .maybe_first_row::<UserRow>()
                .map_err(mapping_err("users row"))?;
            Ok(row.map(User::from))
        })
        .await
    }

    pub async fn create(&self, ctx: &RequestContext, user: &User) -> Result<WriteOutcome> {
        ctx.run(async {
            let result = self
                .session
                .session()
                .execute_unpaged(
                    &self.statements.insert,
                    (
                        user.id.as_str(),
                        user.username.as_str(),
                        user.email.as_str(),
                        user.phone.as_str(),
                        user.date_of_birth,
                    ),
                )
                .await
                .map_err(storage_err("insert user"))?;
            Ok(if was_applied(result)? {
                WriteOutcome::Applied
            } else {
                WriteOutcome::AlreadyExists
            })
        })
        .await
    }

    pub async fn update(&self, ctx: &RequestContext, user: &User) -> Result<WriteOutcome> {
        ctx.run(async {
            let result = self
                .session
                .session()
                .execute_unpaged(
                    &self.statements.update,
                    (
                        user.username.as_str(),
                        user.email.as_str(),
                        user.phone.as_str(),
                        user.date_of_birth,
                        user.id.as_str(),
                    ),
                )
                .await
                .map_err(storage_err("update user"))?;
            Ok(if was_applied(result)? {
                WriteOutcome::Applied
            } else {
                WriteOutcome::NotFound
            })
        })
        .await
    }

    pub async fn delete(&self, ctx: &RequestContext, id: &str) -> Result<WriteOutcome> {
        ctx.run(async {
            let result = self
                .session
                .session()
                .execute_unpaged(&self.statements.delete, (id,))
                .await
                .map_err(storage_err("delete user"))?;
            Ok(if was_applied(result)? {
                WriteOutcome::Applied
            } else {
                WriteOutcome::NotFound
            })
        })
        .await
    }

    /// Cheap read against the system keyspace; never touches user data.
    pub async fn ping(&self, ctx: &RequestContext) -> Result<()> {
        ctx.run(async {
            self.session
                .session()
                .query_unpaged(PING, ())
                .await
                .map_err(storage_err("ping"))?;
            Ok(())
        })
        .await
    }
}

async fn prepare(session: &Session, statement: &str) -> Result<PreparedStatement> {
    session
        .prepare(statement)
        .await
        .map_err(|e| UserStoreError::Schema(format!("prepare '{}': {}", statement, e)))
}

/// Read the `[applied]` column every conditional write returns first.
fn was_applied(result: QueryResult) -> Result<bool> {
    let rows = result
        .into_rows_result()
        .map_err(mapping_err("conditional write result"))?;
    let row = rows
        .maybe_first_row::<Row>()
        .map_err(mapping_err("conditional write row"))?;
    match row.and_then(|r| r.columns.into_iter().next().flatten()) {
        Some(CqlValue::Boolean(applied)) => Ok(applied),
        other => Err(UserStoreError::Mapping(format!(
            "missing [applied] column in conditional write result: {:?}",
            other
        ))),
    }
}

fn storage_err<E: Display>(op: &'static str) -> impl FnOnce(E) -> UserStoreError {
    move |e| UserStoreError::Storage(format!("{}: {}", op, e))
}

fn mapping_err<E: Display>(what: &'static str) -> impl FnOnce(E) -> UserStoreError {
    move |e| UserStoreError::Mapping(format!("{}: {}", what, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_nulls_map_to_zero_values() {
        let row = UserRow {
            id: "u1".to_string(),
            username: Some("alice".to_string()),
            email: None,
            phone: None,
            date_of_birth: None,
        };
        let user = User::from(row);
        assert_eq!(user, User::new("u1").with_username("alice"));
    }

    #[test]
    fn test_writes_are_conditional() {
        assert!(INSERT.ends_with("if not exists"));
        assert!(UPDATE.ends_with("if exists"));
        assert!(DELETE.ends_with("if exists"));
    }
}
