//! Request validation.

use super::outcome::FailureReason;
use super::request::ProvisioningRequest;

/// Classifies strings as syntactically valid email addresses.
pub trait AddressValidator: Send + Sync {
    /// Whether `address` is a valid email address.
    fn is_valid(&self, address: &str) -> bool;
}

/// Basic structural address check: one `@`, non-empty local part, dotted
/// domain without empty labels.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicAddressValidator;

impl AddressValidator for BasicAddressValidator {
    fn is_valid(&self, address: &str) -> bool {
        is_valid_email(address)
    }
}

/// Email and password of a request that passed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Credentials<'a> {
    /// Email address.
    pub email: &'a str,
    /// Password.
    pub password: &'a str,
}

/// Validate a provisioning request.
///
/// Checks run in a fixed order and stop at the first failure: protocol
/// version, then required fields, then address syntax.
///
/// # Errors
///
/// Returns the [`FailureReason`] of the first failed check.
pub fn validate<'a>(
    request: &'a ProvisioningRequest,
    validator: &dyn AddressValidator,
    supported_version: &str,
) -> Result<Credentials<'a>, FailureReason> {
    if request.version != supported_version {
        return Err(FailureReason::UnsupportedProtocolVersion);
    }

    let email = request
        .email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty());
    let password = request.password.as_deref().filter(|p| !p.is_empty());
    let (Some(email), Some(password)) = (email, password) else {
        return Err(FailureReason::MissingRequiredField);
    };

    if !validator.is_valid(email) {
        return Err(FailureReason::MalformedAddress);
    }

    Ok(Credentials { email, password })
}

/// Basic email validation.
fn is_valid_email(email: &str) -> bool {
    let email = email.trim();

    // Must contain exactly one @
    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 {
        return false;
    }

    let local = parts[0];
    let domain = parts[1];

    if local.is_empty() || local.chars().any(char::is_whitespace) {
        return false;
    }

    // Domain must contain at least one dot and not be empty
    if domain.is_empty() || !domain.contains('.') {
        return false;
    }

    // Domain parts must not be empty
    !domain
        .split('.')
        .any(|p| p.is_empty() || p.chars().any(char::is_whitespace))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    /// Accepts everything, to observe ordering without syntax getting in the way.
    struct AcceptAll;

    impl AddressValidator for AcceptAll {
        fn is_valid(&self, _address: &str) -> bool {
            true
        }
    }

    #[test]
    fn test_valid_email() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("user.name@example.com"));
        assert!(is_valid_email("user@sub.example.com"));
    }

    #[test]
    fn test_invalid_email() {
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("user"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("user@"));
        assert!(!is_valid_email("user@example"));
        assert!(!is_valid_email("user@@example.com"));
        assert!(!is_valid_email("user@example..com"));
        assert!(!is_valid_email("us er@example.com"));
    }

    #[test]
    fn accepts_complete_request() {
        let request = ProvisioningRequest::new("1.0", "user@example.com", "pw");
        let credentials = validate(&request, &BasicAddressValidator, "1.0").unwrap();
        assert_eq!(credentials.email, "user@example.com");
        assert_eq!(credentials.password, "pw");
    }

    #[test]
    fn email_is_trimmed() {
        let request = ProvisioningRequest::new("1.0", "  user@example.com\t", "pw");
        let credentials = validate(&request, &BasicAddressValidator, "1.0").unwrap();
        assert_eq!(credentials.email, "user@example.com");
    }

    #[test]
    fn version_checked_first() {
        let request = ProvisioningRequest {
            version: "2.0".to_string(),
            ..ProvisioningRequest::default()
        };
        assert_eq!(
            validate(&request, &BasicAddressValidator, "1.0"),
            Err(FailureReason::UnsupportedProtocolVersion)
        );
    }

    #[test]
    fn missing_version_fails() {
        let request = ProvisioningRequest {
            email: Some("user@example.com".to_string()),
            password: Some("pw".to_string()),
            ..ProvisioningRequest::default()
        };
        assert_eq!(
            validate(&request, &BasicAddressValidator, "1.0"),
            Err(FailureReason::UnsupportedProtocolVersion)
        );
    }

    #[test]
    fn required_fields_before_syntax() {
        let mut request = ProvisioningRequest::new("1.0", "not an address", "pw");
        request.password = None;
        assert_eq!(
            validate(&request, &BasicAddressValidator, "1.0"),
            Err(FailureReason::MissingRequiredField)
        );

        let mut request = ProvisioningRequest::new("1.0", "user@example.com", "pw");
        request.email = Some("   ".to_string());
        assert_eq!(
            validate(&request, &BasicAddressValidator, "1.0"),
            Err(FailureReason::MissingRequiredField)
        );
    }

    #[test]
    fn malformed_address() {
        let request = ProvisioningRequest::new("1.0", "user.example.com", "pw");
        assert_eq!(
            validate(&request, &BasicAddressValidator, "1.0"),
            Err(FailureReason::MalformedAddress)
        );
    }

    #[test]
    fn custom_validator_is_consulted() {
        let request = ProvisioningRequest::new("1.0", "no-domain", "pw");
        assert!(validate(&request, &AcceptAll, "1.0").is_ok());
    }

    proptest! {
        #[test]
        fn unsupported_versions_always_rejected(version in "[0-9]\\.[0-9]") {
            prop_assume!(version != "1.0");
            let request = ProvisioningRequest::new(version, "user@example.com", "pw");
            prop_assert_eq!(
                validate(&request, &BasicAddressValidator, "1.0"),
                Err(FailureReason::UnsupportedProtocolVersion)
            );
        }

        #[test]
        fn missing_password_wins_over_syntax(email in "\\PC*") {
            let mut request = ProvisioningRequest::new("1.0", email, "pw");
            request.password = None;
            prop_assert_eq!(
                validate(&request, &AcceptAll, "1.0"),
                Err(FailureReason::MissingRequiredField)
            );
        }
    }
}
