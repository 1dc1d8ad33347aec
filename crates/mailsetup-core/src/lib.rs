//! # mailsetup-core
//!
//! Mail account provisioning for `mailsetup`.
//!
//! This crate provides:
//! - Request parsing and validation
//! - Provider auto-discovery from a domain directory
//! - Inbound and outbound connection descriptor assembly
//! - Account storage (`SQLite`)
//! - Identity registration with the system keyring
//! - Result reporting over broadcast or caller-targeted channels

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod account;
pub mod config;
mod error;
pub mod identity;
pub mod provider;
pub mod provision;
pub mod report;

pub use account::{
    AccountFlags, AccountId, AccountRecord, AccountStore, ConnectionDescriptor, HostAuthFlags,
    Protocol, Security, SqliteAccountStore,
};
pub use config::ProvisioningConfig;
pub use error::{Error, Result};
pub use identity::{IdentityRegistrar, KeyringRegistrar, RegistrarAdapter};
pub use provider::{ProviderDirectory, ProviderResolver, ProviderTemplate, StaticProviderDirectory};
pub use provision::{
    FailureReason, Pipeline, ProvisioningRequest, ProvisioningResult, ProvisioningWorker, Stage,
};
pub use report::{ChannelSink, ReplyMode, ResultReporter, ResultSink};
