//! Provider resolution for an email address.

use std::sync::Arc;

use tracing::debug;

use super::directory::ProviderDirectory;
use super::model::ResolvedProvider;
use crate::provision::FailureReason;

/// Resolves the provider template for an email address.
#[derive(Clone)]
pub struct ProviderResolver {
    directory: Arc<dyn ProviderDirectory>,
}

impl ProviderResolver {
    /// Creates a resolver backed by `directory`.
    #[must_use]
    pub fn new(directory: Arc<dyn ProviderDirectory>) -> Self {
        Self { directory }
    }

    /// Looks up and expands the template for `email`.
    ///
    /// `Ok(None)` means no auto-discovery is available for the domain.
    ///
    /// # Errors
    ///
    /// Returns [`FailureReason::InvalidHost`] if the address has no domain.
    pub fn resolve(&self, email: &str) -> Result<Option<ResolvedProvider>, FailureReason> {
        let domain = domain_of(email).ok_or(FailureReason::InvalidHost)?;

        let Some(template) = self.directory.lookup(domain) else {
            debug!("No provider template for {domain}");
            return Ok(None);
        };

        debug!("Resolved {domain} to provider {}", template.id);
        Ok(Some(template.expand(email.trim())))
    }
}

impl std::fmt::Debug for ProviderResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderResolver").finish_non_exhaustive()
    }
}

/// Trimmed domain segment of an address.
fn domain_of(email: &str) -> Option<&str> {
    let (_, domain) = email.rsplit_once('@')?;
    let domain = domain.trim();
    (!domain.is_empty()).then_some(domain)
}
