//! Identity registration backed by the system keyring.
//!
//! Uses the platform's native credential storage:
//! - Linux: Secret Service (GNOME Keyring, `KWallet`)
//! - macOS: Keychain
//! - Windows: Credential Manager

use keyring::Entry;
use tracing::debug;

use super::{IdentityRegistrar, IdentityRegistration, RegistrarError, RegistrationReceipt};
use crate::provision::SyncFlags;

/// Service name used for keyring entries.
const SERVICE_NAME: &str = "mailsetup";

/// Credential type identifier for account passwords.
const PASSWORD_CREDENTIAL: &str = "password";

/// Credential type identifier for sync settings.
const SYNC_CREDENTIAL: &str = "sync";

/// Account type reported for every registered identity.
pub const ACCOUNT_TYPE: &str = "com.mailsetup.account";

/// Error type for credential operations.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    /// Failed to access keyring.
    #[error("Keyring error: {0}")]
    Keyring(#[from] keyring::Error),
}

/// Result type for credential operations.
pub type CredentialResult<T> = std::result::Result<T, CredentialError>;

/// Generates the keyring entry key for a credential.
fn credential_key(email: &str, credential_type: &str) -> String {
    format!("{SERVICE_NAME}_{credential_type}_{email}")
}

/// Registers identities in the system keyring.
///
/// The password and the sync flags (as JSON) are stored as two entries
/// keyed by the email address.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyringRegistrar;

impl KeyringRegistrar {
    /// Stores the account password.
    ///
    /// # Errors
    ///
    /// Returns an error if the keyring operation fails.
    pub fn store_password(email: &str, password: &str) -> CredentialResult<()> {
        let key = credential_key(email, PASSWORD_CREDENTIAL);
        let entry = Entry::new(SERVICE_NAME, &key)?;
        entry.set_password(password)?;
        debug!("Stored password for {email}");
        Ok(())
    }

    /// Retrieves the account password.
    ///
    /// # Errors
    ///
    /// Returns an error if the keyring operation fails.
    pub fn get_password(email: &str) -> CredentialResult<Option<String>> {
        let key = credential_key(email, PASSWORD_CREDENTIAL);
        let entry = Entry::new(SERVICE_NAME, &key)?;
        match entry.get_password() {
            Ok(password) => Ok(Some(password)),
            Err(keyring::Error::NoEntry) => {
                debug!("No password found for {email}");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Stores the sync flags as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the keyring operation or serialization fails.
    pub fn store_sync_flags(email: &str, sync: SyncFlags) -> CredentialResult<()> {
        let json = serde_json::to_string(&sync)
            .map_err(|e| CredentialError::Keyring(keyring::Error::PlatformFailure(Box::new(e))))?;

        let key = credential_key(email, SYNC_CREDENTIAL);
        let entry = Entry::new(SERVICE_NAME, &key)?;
        entry.set_password(&json)?;
        debug!("Stored sync flags for {email}");
        Ok(())
    }

    /// Retrieves the sync flags.
    ///
    /// # Errors
    ///
    /// Returns an error if the keyring operation or deserialization fails.
    pub fn get_sync_flags(email: &str) -> CredentialResult<Option<SyncFlags>> {
        let key = credential_key(email, SYNC_CREDENTIAL);
        let entry = Entry::new(SERVICE_NAME, &key)?;
        match entry.get_password() {
            Ok(json) => {
                let sync = serde_json::from_str(&json).map_err(|e| {
                    CredentialError::Keyring(keyring::Error::PlatformFailure(Box::new(e)))
                })?;
                Ok(Some(sync))
            }
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Deletes every entry for `email`. Missing entries are not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the keyring operation fails.
    pub fn delete(email: &str) -> CredentialResult<()> {
        for credential_type in [PASSWORD_CREDENTIAL, SYNC_CREDENTIAL] {
            let key = credential_key(email, credential_type);
            let entry = Entry::new(SERVICE_NAME, &key)?;
            match entry.delete_credential() {
                Ok(()) | Err(keyring::Error::NoEntry) => {}
                Err(e) => return Err(e.into()),
            }
        }
        debug!("Deleted keyring entries for {email}");
        Ok(())
    }
}

impl IdentityRegistrar for KeyringRegistrar {
    fn register(
        &self,
        registration: &IdentityRegistration,
    ) -> Result<RegistrationReceipt, RegistrarError> {
        let email = &registration.email;
        Self::store_password(email, &registration.password).map_err(unavailable)?;
        Self::store_sync_flags(email, registration.sync).map_err(unavailable)?;

        Ok(RegistrationReceipt {
            account_name: Some(email.clone()),
            account_type: Some(ACCOUNT_TYPE.to_string()),
        })
    }
}

/// Maps a missing keyring backend to an unavailable authenticator.
fn unavailable(e: CredentialError) -> RegistrarError {
    match e {
        CredentialError::Keyring(keyring::Error::NoStorageAccess(inner)) => {
            RegistrarError::AuthenticatorUnavailable(inner.to_string())
        }
        other => RegistrarError::Credential(other),
    }
}
