pub mod config;
pub mod context;
pub mod error;
pub mod health;
pub mod model;
pub mod observability;
pub mod server;
pub mod service;
pub mod storage;
pub mod validation;

pub use context::RequestContext;
pub use error::{Result, UserStoreError};
pub use model::{User, WriteOutcome};
pub use server::Server;
pub use service::{Outcome, UserService};
pub use storage::StorageEngine;
