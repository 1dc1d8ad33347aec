//! Connection descriptor assembly.

use tracing::{debug, warn};
use url::Url;

use super::model::{ConnectionDescriptor, HostAuthFlags, Protocol};
use crate::provider::ResolvedProvider;
use crate::provision::{Credentials, FailureReason, ProvisioningRequest, ServerSettings};

/// Which side of the account a descriptor is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Receiving mail.
    Incoming,
    /// Sending mail.
    Outgoing,
}

impl Direction {
    /// Protocol used when the caller supplies explicit settings.
    #[must_use]
    pub const fn explicit_protocol(self) -> Protocol {
        match self {
            Self::Incoming => Protocol::Imap,
            Self::Outgoing => Protocol::Smtp,
        }
    }

    const fn settings(self, request: &ProvisioningRequest) -> &ServerSettings {
        match self {
            Self::Incoming => &request.incoming,
            Self::Outgoing => &request.outgoing,
        }
    }

    fn provider_uri(self, provider: &ResolvedProvider) -> (&str, Option<&str>) {
        match self {
            Self::Incoming => (
                provider.incoming_uri.as_str(),
                provider.incoming_username.as_deref(),
            ),
            Self::Outgoing => (
                provider.outgoing_uri.as_str(),
                provider.outgoing_username.as_deref(),
            ),
        }
    }
}

/// Builds inbound and outbound connection descriptors.
///
/// Every descriptor gets the same security flags, whatever its source.
#[derive(Debug, Clone, Copy)]
pub struct HostAuthBuilder {
    flags: HostAuthFlags,
}

impl Default for HostAuthBuilder {
    fn default() -> Self {
        Self::new(HostAuthFlags::PROVISIONING_DEFAULT)
    }
}

impl HostAuthBuilder {
    /// Creates a builder applying `flags` to every descriptor.
    #[must_use]
    pub const fn new(flags: HostAuthFlags) -> Self {
        Self { flags }
    }

    /// Builds the descriptor for `direction`.
    ///
    /// Complete explicit settings take precedence over the provider
    /// template.
    ///
    /// # Errors
    ///
    /// Returns [`FailureReason::InvalidHost`] if neither source yields a
    /// usable server.
    pub fn build(
        &self,
        direction: Direction,
        request: &ProvisioningRequest,
        credentials: &Credentials<'_>,
        provider: Option<&ResolvedProvider>,
    ) -> Result<ConnectionDescriptor, FailureReason> {
        let settings = direction.settings(request);

        if settings.is_complete()
            && let (Some(server), Some(port)) = (&settings.server, settings.port)
        {
            debug!("Using explicit {direction:?} server {server}:{port}");
            return Ok(ConnectionDescriptor {
                protocol: direction.explicit_protocol(),
                host: server.trim().to_string(),
                port,
                flags: self.flags,
                login: settings
                    .login
                    .clone()
                    .unwrap_or_else(|| credentials.email.to_string()),
                password: credentials.password.to_string(),
            });
        }

        let Some(provider) = provider else {
            debug!("No {direction:?} server: settings incomplete and no provider");
            return Err(FailureReason::InvalidHost);
        };

        let (uri, username) = direction.provider_uri(provider);
        let (protocol, host, port) = parse_server_uri(uri).ok_or_else(|| {
            warn!("Provider {} has an unusable {direction:?} URI", provider.id);
            FailureReason::InvalidHost
        })?;

        debug!("Using provider {} {direction:?} server {host}:{port}", provider.id);
        Ok(ConnectionDescriptor {
            protocol,
            host,
            port,
            flags: self.flags,
            login: username.unwrap_or(credentials.email).to_string(),
            password: credentials.password.to_string(),
        })
    }
}

/// Splits a provider URI into protocol, host and port.
///
/// Missing ports fall back to the protocol's default.
fn parse_server_uri(uri: &str) -> Option<(Protocol, String, u16)> {
    let url = Url::parse(uri.trim()).ok()?;
    let protocol = Protocol::from_scheme(url.scheme())?;
    let host = url.host_str().filter(|h| !h.is_empty())?.to_string();
    let port = url.port().unwrap_or_else(|| protocol.default_port());
    Some((protocol, host, port))
}
