//! Entry point the HTTP layer calls for every user operation.
//!
//! Store and validator errors are logged here and collapsed into
//! [`Outcome::Internal`]; their text never reaches the caller.

use crate::context::RequestContext;
use crate::error::UserStoreError;
use crate::model::{User, WriteOutcome};
use crate::storage::StorageEngine;
use crate::validation::{FieldError, Validator};
use std::sync::Arc;
use tracing::{debug, error};

pub const ID_EMPTY: &str = "Id cannot be empty";
pub const ID_MISMATCH: &str = "Id not match";

/// Result of a service call, one variant per response class.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Ok(T),
    Created(T),
    NotFound,
    /// Create hit an id that already exists.
    Conflict,
    Invalid(Vec<FieldError>),
    /// Malformed request rejected before validation.
    BadRequest(String),
    /// The caller cancelled or ran out of time.
    Cancelled,
    Internal,
}

impl<T> Outcome<T> {
    pub fn is_ok(&self) -> bool {
        matches!(self, Outcome::Ok(_) | Outcome::Created(_))
    }
}

#[derive(Clone)]
pub struct UserService {
    storage: StorageEngine,
    validator: Arc<dyn Validator>,
}

impl UserService {
    pub fn new(storage: StorageEngine, validator: Arc<dyn Validator>) -> Self {
        Self { storage, validator }
    }

    pub fn storage(&self) -> &StorageEngine {
        &self.storage
    }

    pub async fn all(&self, ctx: &RequestContext) -> Outcome<Vec<User>> {
        match self.storage.all(ctx).await {
            Ok(users) => Outcome::Ok(users),
            Err(e) => failure("all", e, None),
        }
    }

    pub async fn load(&self, ctx: &RequestContext, id: &str) -> Outcome<User> {
        if id.is_empty() {
            return Outcome::BadRequest(ID_EMPTY.to_string());
        }
        match self.storage.load(ctx, id).await {
            Ok(Some(user)) => Outcome::Ok(user),
            Ok(None) => Outcome::NotFound,
            Err(e) => failure("load", e, None),
        }
    }

    /// Validate then insert. The payload is the affected-row count.
    pub async fn create(&self, ctx: &RequestContext, user: User) -> Outcome<i64> {
        if let Some(rejected) = self.validate(ctx, &user).await {
            return rejected;
        }
        match self.storage.create(ctx, &user).await {
            Ok(WriteOutcome::Applied) => Outcome::Created(WriteOutcome::Applied.affected()),
            Ok(WriteOutcome::AlreadyExists) => Outcome::Conflict,
            Ok(WriteOutcome::NotFound) => Outcome::NotFound,
            Err(e) => failure("create", e, Some(&user)),
        }
    }

    /// Full replace of the row at `path_id`.
    ///
    /// An empty body id adopts `path_id`; a different body id is rejected.
    pub async fn update(&self, ctx: &RequestContext, path_id: &str, mut user: User) -> Outcome<i64> {
        if path_id.is_empty() {
            return Outcome::BadRequest(ID_EMPTY.to_string());
        }
        if user.id.is_empty() {
            user.id = path_id.to_string();
        } else if user.id != path_id {
            return Outcome::BadRequest(ID_MISMATCH.to_string());
        }

        if let Some(rejected) = self.validate(ctx, &user).await {
            return rejected;
        }
        match self.storage.update(ctx, &user).await {
            Ok(WriteOutcome::Applied) => Outcome::Ok(WriteOutcome::Applied.affected()),
            Ok(other) => {
                debug!(id = %user.id, outcome = ?other, "update matched no row");
                Outcome::NotFound
            }
            Err(e) => failure("update", e, Some(&user)),
        }
    }

    pub async fn delete(&self, ctx: &RequestContext, id: &str) -> Outcome<i64> {
        if id.is_empty() {
            return Outcome::BadRequest(ID_EMPTY.to_string());
        }
        match self.storage.delete(ctx, id).await {
            Ok(WriteOutcome::Applied) => Outcome::Ok(WriteOutcome::Applied.affected()),
            Ok(_) => Outcome::NotFound,
            Err(e) => failure("delete", e, None),
        }
    }

    /// `Some` when the request must stop here.
    async fn validate<T>(&self, ctx: &RequestContext, user: &User) -> Option<Outcome<T>> {
        let mut errors = match self.validator.validate(ctx, user).await {
            Ok(errors) => errors,
            Err(e) if e.is_cancellation() => {
                debug!(op = "validate", "request cancelled: {}", e);
                return Some(Outcome::Cancelled);
            }
            Err(e) => {
                error!(op = "validate", error = %e, "validator failed");
                return Some(Outcome::Internal);
            }
        };

        // The store needs a key whatever the injected rules say.
        if user.id.is_empty() && !errors.iter().any(|e| e.field == "id") {
            errors.insert(0, FieldError::required("id"));
        }

        if errors.is_empty() {
            None
        } else {
            Some(Outcome::Invalid(errors))
        }
    }
}

fn failure<T>(op: &'static str, err: UserStoreError, input: Option<&User>) -> Outcome<T> {
    if err.is_cancellation() {
        debug!(op, "request cancelled: {}", err);
        return Outcome::Cancelled;
    }
    match input {
        Some(user) => error!(op, request = %user.redacted(), error = %err, "store operation failed"),
        None => error!(op, error = %err, "store operation failed"),
    }
    Outcome::Internal
}
