//! Registration of provisioned accounts with the host identity manager.

mod secret_store;

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::provision::SyncFlags;

pub use secret_store::{ACCOUNT_TYPE, CredentialError, CredentialResult, KeyringRegistrar};

/// Default bound on a registrar call.
pub const DEFAULT_REGISTRAR_TIMEOUT: Duration = Duration::from_secs(5);

/// Identity handed to the host system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityRegistration {
    /// Account name (the email address).
    pub email: String,
    /// Credential.
    pub password: String,
    /// Data the host should sync.
    pub sync: SyncFlags,
}

/// What the registrar reports back.
///
/// Registration only counts as successful when both markers are present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationReceipt {
    /// Name the host registered the account under.
    pub account_name: Option<String>,
    /// Account type the host registered.
    pub account_type: Option<String>,
}

impl RegistrationReceipt {
    /// Whether both the name and type markers are present.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.account_name.is_some() && self.account_type.is_some()
    }
}

/// Errors that can occur while registering an identity.
#[derive(Debug, thiserror::Error)]
pub enum RegistrarError {
    /// The host canceled the operation.
    #[error("Registration canceled")]
    Canceled,

    /// No authenticator is available for the account type.
    #[error("Authenticator unavailable: {0}")]
    AuthenticatorUnavailable(String),

    /// I/O error talking to the host.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Credential storage error.
    #[error("Credential error: {0}")]
    Credential(#[from] CredentialError),
}

/// The host system's account identity store.
///
/// Calls are blocking and may take arbitrarily long.
pub trait IdentityRegistrar: Send + Sync {
    /// Registers `registration` with the host.
    ///
    /// # Errors
    ///
    /// Returns an error if the host rejects or cannot complete the call.
    fn register(
        &self,
        registration: &IdentityRegistration,
    ) -> Result<RegistrationReceipt, RegistrarError>;
}

/// Bounded, failure-collapsing wrapper around an [`IdentityRegistrar`].
#[derive(Clone)]
pub struct RegistrarAdapter {
    registrar: Arc<dyn IdentityRegistrar>,
    timeout: Duration,
}

impl RegistrarAdapter {
    /// Wraps `registrar`, giving each call at most `timeout`.
    #[must_use]
    pub fn new(registrar: Arc<dyn IdentityRegistrar>, timeout: Duration) -> Self {
        Self { registrar, timeout }
    }

    /// Registers the account and reports whether it worked.
    ///
    /// The blocking call runs on the blocking pool. Cancellation, missing
    /// authenticator, I/O failure, panics and timeout all yield `false`.
    /// A call that outlives the timeout keeps running in the background;
    /// its outcome is ignored.
    pub async fn register(&self, email: &str, password: &str, sync: SyncFlags) -> bool {
        let registration = IdentityRegistration {
            email: email.to_string(),
            password: password.to_string(),
            sync,
        };
        let registrar = Arc::clone(&self.registrar);
        let call = tokio::task::spawn_blocking(move || registrar.register(&registration));

        match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(Ok(receipt))) if receipt.is_complete() => {
                debug!("Registered identity {email}");
                true
            }
            Ok(Ok(Ok(receipt))) => {
                warn!("Registrar returned incomplete receipt for {email}: {receipt:?}");
                false
            }
            Ok(Ok(Err(e))) => {
                warn!("Identity registration failed for {email}: {e}");
                false
            }
            Ok(Err(e)) => {
                warn!("Identity registration task failed for {email}: {e}");
                false
            }
            Err(_) => {
                warn!(
                    "Identity registration for {email} timed out after {:?}",
                    self.timeout
                );
                false
            }
        }
    }
}

impl std::fmt::Debug for RegistrarAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistrarAdapter")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
