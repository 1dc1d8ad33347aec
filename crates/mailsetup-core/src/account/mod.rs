//! Account management module.
//!
//! Provides the account record model, connection descriptor assembly and
//! account storage.

mod host_auth;
mod model;
mod persister;
mod repository;

pub use host_auth::{Direction, HostAuthBuilder};
pub use model::{
    AccountFlags, AccountId, AccountRecord, ConnectionDescriptor, HostAuthFlags, Protocol,
    Security,
};
pub use persister::persist;
pub use repository::{AccountStore, SqliteAccountStore};
