//! The provisioning pipeline.
//!
//! A request flows through validation, provider resolution, connection
//! descriptor assembly, persistence and identity registration, then its
//! result is reported exactly once.

mod outcome;
mod pipeline;
mod request;
mod validation;
mod worker;

pub use outcome::{FailureReason, ProvisioningResult, Stage};
pub use pipeline::Pipeline;
pub use request::{MISSING_VERSION, ProvisioningRequest, ServerSettings, SyncFlags, keys};
pub use validation::{AddressValidator, BasicAddressValidator, Credentials, validate};
pub use worker::ProvisioningWorker;
