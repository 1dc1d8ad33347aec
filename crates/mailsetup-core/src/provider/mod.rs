//! Known-provider auto-discovery.
//!
//! Maps the domain of an email address to server templates and expands
//! them for that address.

mod directory;
mod model;
mod resolver;

pub use directory::{ProviderDirectory, StaticProviderDirectory};
pub use model::{ProviderTemplate, ResolvedProvider};
pub use resolver::ProviderResolver;
