//! Provisioning configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::Result;
use crate::account::HostAuthFlags;
use crate::identity::DEFAULT_REGISTRAR_TIMEOUT;

/// The only protocol version requests may carry.
pub const SUPPORTED_VERSION: &str = "1.0";

/// Default broadcast buffer size.
pub const DEFAULT_BROADCAST_CAPACITY: usize = 16;

/// Fixed policy values the pipeline applies to every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProvisioningConfig {
    /// Version a request must carry.
    pub supported_version: String,
    /// Bound on a single identity registrar call.
    #[serde(rename = "registrarTimeoutMs", with = "duration_millis")]
    pub registrar_timeout: Duration,
    /// Security flags applied to every connection descriptor.
    pub host_auth_flags: HostAuthFlags,
    /// Buffered results per broadcast listener.
    pub broadcast_capacity: usize,
}

impl Default for ProvisioningConfig {
    fn default() -> Self {
        Self {
            supported_version: SUPPORTED_VERSION.to_string(),
            registrar_timeout: DEFAULT_REGISTRAR_TIMEOUT,
            host_auth_flags: HostAuthFlags::PROVISIONING_DEFAULT,
            broadcast_capacity: DEFAULT_BROADCAST_CAPACITY,
        }
    }
}

impl ProvisioningConfig {
    /// Parses a JSON settings document. Missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Loads settings from `path`, falling back to defaults if the file
    /// does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !tokio::fs::try_exists(path).await? {
            debug!("No settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = tokio::fs::read_to_string(path).await?;
        let config = Self::from_json(&contents)?;
        debug!("Loaded settings from {}", path.display());
        Ok(config)
    }

    /// Overrides the registrar timeout.
    #[must_use]
    pub const fn with_registrar_timeout(mut self, timeout: Duration) -> Self {
        self.registrar_timeout = timeout;
        self
    }
}

/// Serde helpers storing a `Duration` as whole milliseconds.
mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(clippy::trivially_copy_pass_by_ref)] // Required by serde with= signature
    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
