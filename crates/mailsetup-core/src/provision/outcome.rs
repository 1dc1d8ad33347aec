//! Provisioning outcomes.

use serde::{Deserialize, Serialize};

use crate::account::AccountId;

/// Why a provisioning request failed.
///
/// This is a closed set: every failure a caller can observe maps onto one
/// of these codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureReason {
    /// The request's protocol version is not supported.
    UnsupportedProtocolVersion,
    /// Email address or password is missing.
    MissingRequiredField,
    /// Email address is not syntactically valid.
    MalformedAddress,
    /// No usable server could be determined.
    InvalidHost,
    /// The account store did not return an identifier.
    PersistenceFailed,
    /// Anything else, including identity registration failures.
    Unknown,
}

impl FailureReason {
    /// Stable reason code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::UnsupportedProtocolVersion => "UnsupportedProtocolVersion",
            Self::MissingRequiredField => "MissingRequiredField",
            Self::MalformedAddress => "MalformedAddress",
            Self::InvalidHost => "InvalidHost",
            Self::PersistenceFailed => "PersistenceFailed",
            Self::Unknown => "Unknown",
        }
    }

    /// Get human-readable error message.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::UnsupportedProtocolVersion => "Unsupported protocol version",
            Self::MissingRequiredField => "Email address and password are required",
            Self::MalformedAddress => "Invalid email address format",
            Self::InvalidHost => "No usable mail server for this account",
            Self::PersistenceFailed => "Account could not be saved",
            Self::Unknown => "Account setup failed",
        }
    }
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for FailureReason {}

/// Pipeline stage, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    /// Checking version, required fields and address syntax.
    Validating,
    /// Looking up the provider directory.
    ResolvingProvider,
    /// Building the inbound connection descriptor.
    BuildingInboundAuth,
    /// Building the outbound connection descriptor.
    BuildingOutboundAuth,
    /// Writing the account record.
    Persisting,
    /// Registering the identity with the host system.
    RegisteringIdentity,
}

impl Stage {
    /// Short name used in logs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Validating => "validating",
            Self::ResolvingProvider => "resolving_provider",
            Self::BuildingInboundAuth => "building_inbound_auth",
            Self::BuildingOutboundAuth => "building_outbound_auth",
            Self::Persisting => "persisting",
            Self::RegisteringIdentity => "registering_identity",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal result of one provisioning request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisioningResult {
    /// Email address echoed from the request (empty if absent).
    pub email: String,
    /// Protocol version echoed from the request.
    pub version: String,
    /// Whether the account was provisioned.
    pub success: bool,
    /// Failure reason, absent on success.
    #[serde(rename = "reasonCode")]
    pub reason: Option<FailureReason>,
    /// Human-readable outcome.
    #[serde(rename = "reasonMessage")]
    pub message: String,
    /// Identifier of the stored account, when one was written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<AccountId>,
    /// Stage that failed.
    #[serde(skip)]
    pub failed_stage: Option<Stage>,
}

impl ProvisioningResult {
    /// Successful outcome.
    #[must_use]
    pub fn success(email: impl Into<String>, version: impl Into<String>, id: AccountId) -> Self {
        Self {
            email: email.into(),
            version: version.into(),
            success: true,
            reason: None,
            message: "Account created".to_string(),
            account_id: Some(id),
            failed_stage: None,
        }
    }

    /// Failed outcome.
    #[must_use]
    pub fn failure(
        email: impl Into<String>,
        version: impl Into<String>,
        stage: Stage,
        reason: FailureReason,
    ) -> Self {
        Self {
            email: email.into(),
            version: version.into(),
            success: false,
            reason: Some(reason),
            message: reason.message().to_string(),
            account_id: None,
            failed_stage: Some(stage),
        }
    }

    /// Records the identifier of an account written before the failure.
    #[must_use]
    pub fn with_account_id(mut self, id: Option<AccountId>) -> Self {
        self.account_id = id;
        self
    }
}
