//! Provisioning request parsed from a flat option map.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::account::Security;
use crate::report::ReplyMode;

/// Option keys recognized in a request payload.
pub mod keys {
    /// Protocol version, must equal the supported version.
    pub const VERSION: &str = "version";
    /// Account display name.
    pub const DISPLAY_NAME: &str = "displayName";
    /// Legacy user name; accepted and ignored.
    pub const USERNAME: &str = "username";
    /// Email address.
    pub const EMAIL: &str = "email";
    /// Password.
    pub const PASSWORD: &str = "password";
    /// Inbound login override.
    pub const IN_LOGIN: &str = "inLogin";
    /// Inbound server.
    pub const IN_SERVER: &str = "inServer";
    /// Inbound port.
    pub const IN_PORT: &str = "inPort";
    /// Inbound security mode.
    pub const IN_SECURITY: &str = "inSecurity";
    /// Outbound login override.
    pub const OUT_LOGIN: &str = "outLogin";
    /// Outbound server.
    pub const OUT_SERVER: &str = "outServer";
    /// Outbound port.
    pub const OUT_PORT: &str = "outPort";
    /// Outbound security mode.
    pub const OUT_SECURITY: &str = "outSecurity";
    /// Enable mail sync.
    pub const SYNC_EMAIL: &str = "syncEmail";
    /// Enable contacts sync.
    pub const SYNC_CONTACTS: &str = "syncContacts";
    /// Enable calendar sync.
    pub const SYNC_CALENDAR: &str = "syncCalendar";
    /// Opaque caller identity.
    pub const CALLER: &str = "caller";
}

/// Version assumed when a request carries none.
pub const MISSING_VERSION: &str = "0";

/// Explicit settings for one server, as supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerSettings {
    /// Server hostname.
    pub server: Option<String>,
    /// Server port.
    pub port: Option<u16>,
    /// Requested security mode.
    pub security: Option<Security>,
    /// Login override.
    pub login: Option<String>,
}

impl ServerSettings {
    /// Whether server, port and security are all present.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.server.is_some() && self.port.is_some() && self.security.is_some()
    }
}

/// Which data the host should sync for the account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncFlags {
    /// Sync mail.
    pub mail: bool,
    /// Sync contacts.
    pub contacts: bool,
    /// Sync calendar.
    pub calendar: bool,
}

impl Default for SyncFlags {
    fn default() -> Self {
        Self {
            mail: true,
            contacts: false,
            calendar: false,
        }
    }
}

/// One provisioning attempt.
#[derive(Debug, Clone)]
pub struct ProvisioningRequest {
    /// Protocol version.
    pub version: String,
    /// Display name; defaults to the email address.
    pub display_name: Option<String>,
    /// Email address.
    pub email: Option<String>,
    /// Password.
    pub password: Option<String>,
    /// Explicit inbound server.
    pub incoming: ServerSettings,
    /// Explicit outbound server.
    pub outgoing: ServerSettings,
    /// Sync flags forwarded to identity registration.
    pub sync: SyncFlags,
    /// Opaque identity of the caller.
    pub caller: Option<String>,
    /// Result delivery.
    pub reply: ReplyMode,
}

impl Default for ProvisioningRequest {
    fn default() -> Self {
        Self {
            version: MISSING_VERSION.to_string(),
            display_name: None,
            email: None,
            password: None,
            incoming: ServerSettings::default(),
            outgoing: ServerSettings::default(),
            sync: SyncFlags::default(),
            caller: None,
            reply: ReplyMode::default(),
        }
    }
}

impl ProvisioningRequest {
    /// Creates a request with the given version, address and password.
    #[must_use]
    pub fn new(
        version: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            version: version.into(),
            email: Some(email.into()),
            password: Some(password.into()),
            ..Self::default()
        }
    }

    /// Parses a flat option map.
    ///
    /// Values of the wrong type are treated as absent. Ports may be JSON
    /// numbers or numeric strings, flags JSON booleans or `"true"`/`"false"`.
    #[must_use]
    pub fn from_options(options: &Map<String, Value>) -> Self {
        let sync_default = SyncFlags::default();
        Self {
            version: string(options, keys::VERSION).unwrap_or_else(|| MISSING_VERSION.to_string()),
            display_name: string(options, keys::DISPLAY_NAME),
            email: string(options, keys::EMAIL),
            password: string(options, keys::PASSWORD),
            incoming: ServerSettings {
                server: string(options, keys::IN_SERVER),
                port: port(options, keys::IN_PORT),
                security: security(options, keys::IN_SECURITY),
                login: string(options, keys::IN_LOGIN),
            },
            outgoing: ServerSettings {
                server: string(options, keys::OUT_SERVER),
                port: port(options, keys::OUT_PORT),
                security: security(options, keys::OUT_SECURITY),
                login: string(options, keys::OUT_LOGIN),
            },
            sync: SyncFlags {
                mail: flag(options, keys::SYNC_EMAIL).unwrap_or(sync_default.mail),
                contacts: flag(options, keys::SYNC_CONTACTS).unwrap_or(sync_default.contacts),
                calendar: flag(options, keys::SYNC_CALENDAR).unwrap_or(sync_default.calendar),
            },
            caller: string(options, keys::CALLER),
            reply: ReplyMode::Broadcast,
        }
    }

    /// Sets the result delivery mode.
    #[must_use]
    pub fn with_reply(mut self, reply: ReplyMode) -> Self {
        self.reply = reply;
        self
    }

    /// Display name, falling back to the email address.
    #[must_use]
    pub fn display_name_or_email(&self) -> &str {
        self.display_name
            .as_deref()
            .or_else(|| self.email.as_deref().map(str::trim))
            .unwrap_or_default()
    }
}

/// Non-blank string value.
fn string(options: &Map<String, Value>, key: &str) -> Option<String> {
    match options.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::String(_) | Value::Null => None,
        other => {
            warn!("Ignoring option {key}: expected string, got {other}");
            None
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn port(options: &Map<String, Value>, key: &str) -> Option<u16> {
    let parsed = match options.get(key)? {
        Value::Number(n) => n
            .as_u64()
            .filter(|p| (1..=u64::from(u16::MAX)).contains(p))
            .map(|p| p as u16),
        Value::String(s) => s.trim().parse::<u16>().ok().filter(|p| *p != 0),
        _ => None,
    };
    if parsed.is_none() {
        warn!("Ignoring option {key}: not a valid port");
    }
    parsed
}

fn security(options: &Map<String, Value>, key: &str) -> Option<Security> {
    let raw = string(options, key)?;
    let parsed = Security::parse(&raw);
    if parsed.is_none() {
        warn!("Ignoring option {key}: unknown security mode {raw:?}");
    }
    parsed
}

fn flag(options: &Map<String, Value>, key: &str) -> Option<bool> {
    match options.get(key)? {
        Value::Bool(b) => Some(*b),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
