//! Account persistence step.

use tracing::{debug, warn};

use super::model::{AccountFlags, AccountId, AccountRecord, ConnectionDescriptor};
use super::repository::AccountStore;
use crate::provision::FailureReason;

/// Builds the account record and commits it to `store`.
///
/// The record always starts with [`AccountFlags::PROVISIONED`], marking it
/// incomplete until its first sync.
///
/// # Errors
///
/// Returns [`FailureReason::PersistenceFailed`] if the store produced no
/// identifier and [`FailureReason::Unknown`] if the store failed.
pub async fn persist<S: AccountStore>(
    store: &S,
    display_name: &str,
    email: &str,
    incoming: ConnectionDescriptor,
    outgoing: ConnectionDescriptor,
) -> Result<AccountId, FailureReason> {
    let record = AccountRecord {
        display_name: display_name.to_string(),
        email: email.to_string(),
        flags: AccountFlags::PROVISIONED,
        incoming,
        outgoing,
    };

    match store.insert(&record).await {
        Ok(Some(id)) => {
            debug!("Persisted account {email} as {id}");
            Ok(id)
        }
        Ok(None) => {
            warn!("Account store returned no identifier for {email}");
            Err(FailureReason::PersistenceFailed)
        }
        Err(e) => {
            warn!("Account store failed for {email}: {e}");
            Err(FailureReason::Unknown)
        }
    }
}
