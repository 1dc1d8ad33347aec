//! Account model types.

use std::ops::BitOr;

use serde::{Deserialize, Serialize};

/// Unique identifier for a persisted account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountId(pub i64);

impl AccountId {
    /// Create a new account ID.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Security mode requested for an explicit server setting.
///
/// The requested mode only decides whether an explicit setting is complete.
/// Connection descriptors always carry the fixed [`HostAuthFlags`] policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Security {
    /// No encryption (not recommended).
    None,
    /// Implicit TLS (connect directly with TLS).
    Tls,
    /// STARTTLS upgrade after plaintext connect.
    StartTls,
}

impl Security {
    /// Parses a security mode, case-insensitively.
    ///
    /// Accepts `ssl`/`tls`, `starttls` and `none`.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ssl" | "tls" => Some(Self::Tls),
            "starttls" => Some(Self::StartTls),
            "none" => Some(Self::None),
            _ => None,
        }
    }
}

/// Mail protocol spoken by a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// IMAP (inbound).
    Imap,
    /// POP3 (inbound).
    Pop3,
    /// SMTP (outbound).
    Smtp,
}

impl Protocol {
    /// Parses the protocol part of a provider URI scheme.
    ///
    /// Schemes look like `imap`, `imap+ssl+` or `smtp+tls+`; only the part
    /// before the first `+` names the protocol.
    #[must_use]
    pub fn from_scheme(scheme: &str) -> Option<Self> {
        let protocol = scheme.split('+').next().unwrap_or_default();
        match protocol.to_ascii_lowercase().as_str() {
            "imap" => Some(Self::Imap),
            "pop3" => Some(Self::Pop3),
            "smtp" => Some(Self::Smtp),
            _ => None,
        }
    }

    /// Returns the scheme name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Imap => "imap",
            Self::Pop3 => "pop3",
            Self::Smtp => "smtp",
        }
    }

    /// Default implicit-TLS port for the protocol.
    #[must_use]
    pub const fn default_port(&self) -> u16 {
        match self {
            Self::Imap => 993,
            Self::Pop3 => 995,
            Self::Smtp => 465,
        }
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Security flags attached to a connection descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HostAuthFlags(u32);

impl HostAuthFlags {
    /// Use implicit SSL/TLS.
    pub const SSL: Self = Self(1);
    /// Use STARTTLS.
    pub const TLS: Self = Self(1 << 1);
    /// Authenticate with login and password.
    pub const AUTHENTICATE: Self = Self(1 << 2);
    /// Accept any server certificate.
    pub const TRUST_ALL: Self = Self(1 << 3);

    /// The fixed policy applied to every provisioned connection.
    pub const PROVISIONING_DEFAULT: Self =
        Self(Self::SSL.0 | Self::AUTHENTICATE.0 | Self::TRUST_ALL.0);

    /// Creates flags from raw bits.
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Raw bit representation.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Whether every bit of `other` is set.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for HostAuthFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Account state flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountFlags(u32);

impl AccountFlags {
    /// Notify the user when new mail arrives.
    pub const NOTIFY_NEW_MAIL: Self = Self(1);
    /// Mask of the two delete-policy bits.
    pub const DELETE_POLICY_MASK: Self = Self(0b11 << Self::DELETE_POLICY_SHIFT);
    /// Shift of the delete-policy bits.
    pub const DELETE_POLICY_SHIFT: u32 = 2;
    /// Account still needs its first sync before it is fully configured.
    pub const INCOMPLETE: Self = Self(1 << 4);

    /// Delete-policy value: delete on the server when deleted locally.
    pub const DELETE_POLICY_ON_DELETE: u32 = 2;

    /// Flags every freshly provisioned account starts with.
    pub const PROVISIONED: Self = Self(
        Self::INCOMPLETE.0
            | (Self::DELETE_POLICY_ON_DELETE << Self::DELETE_POLICY_SHIFT)
            | Self::NOTIFY_NEW_MAIL.0,
    );

    /// Creates flags from raw bits.
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Raw bit representation.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Whether every bit of `other` is set.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// The delete-policy value stored in the flags.
    #[must_use]
    pub const fn delete_policy(self) -> u32 {
        (self.0 & Self::DELETE_POLICY_MASK.0) >> Self::DELETE_POLICY_SHIFT
    }
}

impl BitOr for AccountFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Resolved settings for connecting to one mail server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionDescriptor {
    /// Protocol spoken by the server.
    pub protocol: Protocol,
    /// Server hostname.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Security flags.
    pub flags: HostAuthFlags,
    /// Login name.
    pub login: String,
    /// Password for authentication.
    #[serde(skip_serializing, default)]
    pub password: String,
}

/// Email account as handed to the account store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRecord {
    /// Display name for the account.
    pub display_name: String,
    /// Email address.
    pub email: String,
    /// Account state flags.
    pub flags: AccountFlags,
    /// Inbound server.
    pub incoming: ConnectionDescriptor,
    /// Outbound server.
    pub outgoing: ConnectionDescriptor,
}

#[cfg(test)]
mod tests {
    use super::*;

    mod account_id_tests {
        use super::*;

        #[test]
        fn display() {
            let id = AccountId::new(123);
            assert_eq!(format!("{id}"), "123");
        }

        #[test]
        fn equality() {
            assert_eq!(AccountId::new(1), AccountId::new(1));
            assert_ne!(AccountId::new(1), AccountId::new(2));
        }
    }

    mod security_tests {
        use super::*;

        #[test]
        fn parse_accepts_known_modes() {
            assert_eq!(Security::parse("SSL"), Some(Security::Tls));
            assert_eq!(Security::parse("tls"), Some(Security::Tls));
            assert_eq!(Security::parse(" StartTLS "), Some(Security::StartTls));
            assert_eq!(Security::parse("none"), Some(Security::None));
        }

        #[test]
        fn parse_rejects_unknown() {
            assert_eq!(Security::parse(""), None);
            assert_eq!(Security::parse("ssl/tls"), None);
        }
    }

    mod protocol_tests {
        use super::*;

        #[test]
        fn from_scheme_strips_modifiers() {
            assert_eq!(Protocol::from_scheme("imap+ssl+"), Some(Protocol::Imap));
            assert_eq!(Protocol::from_scheme("pop3+tls+"), Some(Protocol::Pop3));
            assert_eq!(Protocol::from_scheme("SMTP"), Some(Protocol::Smtp));
        }

        #[test]
        fn from_scheme_rejects_unknown() {
            assert_eq!(Protocol::from_scheme("eas+ssl+"), None);
            assert_eq!(Protocol::from_scheme("http"), None);
        }

        #[test]
        fn default_ports() {
            assert_eq!(Protocol::Imap.default_port(), 993);
            assert_eq!(Protocol::Pop3.default_port(), 995);
            assert_eq!(Protocol::Smtp.default_port(), 465);
        }
    }

    mod flag_tests {
        use super::*;

        #[test]
        fn host_auth_default_policy() {
            let flags = HostAuthFlags::PROVISIONING_DEFAULT;
            assert!(flags.contains(HostAuthFlags::SSL));
            assert!(flags.contains(HostAuthFlags::AUTHENTICATE));
            assert!(flags.contains(HostAuthFlags::TRUST_ALL));
            assert!(!flags.contains(HostAuthFlags::TLS));
            assert_eq!(flags.bits(), 0b1101);
        }

        #[test]
        fn account_provisioned_flags() {
            let flags = AccountFlags::PROVISIONED;
            assert!(flags.contains(AccountFlags::INCOMPLETE));
            assert!(flags.contains(AccountFlags::NOTIFY_NEW_MAIL));
            assert_eq!(flags.delete_policy(), AccountFlags::DELETE_POLICY_ON_DELETE);
            assert_eq!(flags.bits(), 0b11001);
        }

        #[test]
        fn bitor_combines() {
            let flags = AccountFlags::INCOMPLETE | AccountFlags::NOTIFY_NEW_MAIL;
            assert_eq!(flags.bits(), 0b10001);
            assert_eq!(flags.delete_policy(), 0);
        }
    }
}
