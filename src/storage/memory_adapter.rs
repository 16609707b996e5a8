use super::schema::USERS_TABLE;
use crate::context::RequestContext;
use crate::error::{Result, UserStoreError};
use crate::model::{User, WriteOutcome};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

/// Rows of one table keyed by primary key
type Table = HashMap<String, User>;

#[derive(Debug, Default)]
struct Keyspace {
    replication_factor: u32,
    tables: HashMap<String, Table>,
}

/// Keyspaces by name
type Catalog = HashMap<String, Keyspace>;

/// In-process record store with the same contract as the Cassandra adapter.
///
/// Schema is tracked too: record operations fail until `ensure_schema` has
/// created the keyspace and table. `set_offline` makes every call fail as if
/// the cluster were unreachable.
#[derive(Clone)]
pub struct MemoryStorageAdapter {
    catalog: Arc<RwLock<Catalog>>,
    keyspace: String,
    offline: Arc<AtomicBool>,
}

impl MemoryStorageAdapter {
    pub fn new(keyspace: &str) -> Self {
        Self {
            catalog: Arc::new(RwLock::new(HashMap::new())),
            keyspace: keyspace.to_string(),
            offline: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(UserStoreError::Storage(
                "no hosts available in the pool".to_string(),
            ));
        }
        Ok(())
    }

    /// Create keyspace and table if missing. Existing rows are untouched.
    pub fn ensure_schema(&self, replication_factor: u32) -> Result<()> {
        self.check_online()?;
        let mut catalog = self
            .catalog
            .write()
            .map_err(|e| UserStoreError::Schema(format!("Lock error: {}", e)))?;

        let keyspace = catalog
            .entry(self.keyspace.clone())
            .or_insert_with(|| Keyspace {
                replication_factor,
                tables: HashMap::new(),
            });
        keyspace.tables.entry(USERS_TABLE.to_string()).or_default();
        Ok(())
    }

    pub fn has_table(&self, table: &str) -> bool {
        self.catalog
            .read()
            .map(|c| {
                c.get(&self.keyspace)
                    .is_some_and(|ks| ks.tables.contains_key(table))
            })
            .unwrap_or(false)
    }

    pub fn replication_factor(&self) -> Option<u32> {
        self.catalog
            .read()
            .ok()
            .and_then(|c| c.get(&self.keyspace).map(|ks| ks.replication_factor))
    }

    fn with_table<T>(&self, f: impl FnOnce(&Table) -> T) -> Result<T> {
        self.check_online()?;
        let catalog = self
            .catalog
            .read()
            .map_err(|e| UserStoreError::Storage(format!("Lock error: {}", e)))?;
        let table = catalog
            .get(&self.keyspace)
            .and_then(|ks| ks.tables.get(USERS_TABLE))
            .ok_or_else(|| self.unconfigured())?;
        Ok(f(table))
    }

    fn with_table_mut<T>(&self, f: impl FnOnce(&mut Table) -> T) -> Result<T> {
        self.check_online()?;
        let mut catalog = self
            .catalog
            .write()
            .map_err(|e| UserStoreError::Storage(format!("Lock error: {}", e)))?;
        let table = catalog
            .get_mut(&self.keyspace)
            .and_then(|ks| ks.tables.get_mut(USERS_TABLE))
            .ok_or_else(|| self.unconfigured())?;
        Ok(f(table))
    }

    fn unconfigured(&self) -> UserStoreError {
        UserStoreError::Storage(format!(
            "unconfigured table {}.{}",
            self.keyspace, USERS_TABLE
        ))
    }

    pub async fn all(&self, ctx: &RequestContext) -> Result<Vec<User>> {
        ctx.run(async { self.with_table(|t| t.values().cloned().collect()) })
            .await
    }

    pub async fn load(&self, ctx: &RequestContext, id: &str) -> Result<Option<User>> {
        ctx.run(async { self.with_table(|t| t.get(id).cloned()) })
            .await
    }

    pub async fn create(&self, ctx: &RequestContext, user: &User) -> Result<WriteOutcome> {
        ctx.run(async {
            self.with_table_mut(|t| {
                if t.contains_key(&user.id) {
                    WriteOutcome::AlreadyExists
                } else {
                    t.insert(user.id.clone(), user.clone());
                    WriteOutcome::Applied
                }
            })
        })
        .await
    }

    pub async fn update(&self, ctx: &RequestContext, user: &User) -> Result<WriteOutcome> {
        ctx.run(async {
            self.with_table_mut(|t| match t.get_mut(&user.id) {
                Some(existing) => {
                    *existing = user.clone();
                    WriteOutcome::Applied
                }
                None => WriteOutcome::NotFound,
            })
        })
        .await
    }

    pub async fn delete(&self, ctx: &RequestContext, id: &str) -> Result<WriteOutcome> {
        ctx.run(async {
            self.with_table_mut(|t| match t.remove(id) {
                Some(_) => WriteOutcome::Applied,
                None => WriteOutcome::NotFound,
            })
        })
        .await
    }

    pub async fn ping(&self, ctx: &RequestContext) -> Result<()> {
        ctx.run(async { self.check_online() }).await
    }
}
