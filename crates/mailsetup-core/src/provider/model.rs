//! Provider template types.

use serde::{Deserialize, Serialize};

/// Connection template for a known mail provider.
///
/// URIs and login names may contain the placeholders `$email`, `$user`
/// (local part) and `$domain`, substituted at resolution time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderTemplate {
    /// Provider identifier (e.g., "gmail").
    pub id: String,
    /// Human-readable provider name (e.g., "Gmail").
    pub label: String,
    /// Domain pattern; a trailing `*` matches any suffix.
    pub domain: String,
    /// Incoming server URI, e.g. `imap+ssl+://imap.gmail.com:993`.
    pub incoming_uri: String,
    /// Incoming login name pattern.
    #[serde(default)]
    pub incoming_username: Option<String>,
    /// Outgoing server URI, e.g. `smtp+ssl+://smtp.gmail.com:465`.
    pub outgoing_uri: String,
    /// Outgoing login name pattern.
    #[serde(default)]
    pub outgoing_username: Option<String>,
}

impl ProviderTemplate {
    /// Creates a template with the given URIs and no login patterns.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        domain: impl Into<String>,
        incoming_uri: impl Into<String>,
        outgoing_uri: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            domain: domain.into(),
            incoming_uri: incoming_uri.into(),
            incoming_username: None,
            outgoing_uri: outgoing_uri.into(),
            outgoing_username: None,
        }
    }

    /// Sets the login name patterns.
    #[must_use]
    pub fn with_usernames(mut self, incoming: &str, outgoing: &str) -> Self {
        self.incoming_username = Some(incoming.to_string());
        self.outgoing_username = Some(outgoing.to_string());
        self
    }

    /// Whether this template serves `domain` (case-insensitive).
    #[must_use]
    pub fn matches(&self, domain: &str) -> bool {
        let pattern = self.domain.to_ascii_lowercase();
        let domain = domain.to_ascii_lowercase();
        pattern
            .strip_suffix('*')
            .map_or(pattern == domain, |prefix| domain.starts_with(prefix))
    }

    /// Substitutes the placeholders for `email`.
    #[must_use]
    pub fn expand(&self, email: &str) -> ResolvedProvider {
        let (user, domain) = email.rsplit_once('@').unwrap_or((email, ""));
        let subst = |pattern: &str| {
            pattern
                .replace("$email", email)
                .replace("$user", user)
                .replace("$domain", domain)
        };
        ResolvedProvider {
            id: self.id.clone(),
            label: self.label.clone(),
            incoming_uri: subst(self.incoming_uri.as_str()),
            incoming_username: self.incoming_username.as_deref().map(subst),
            outgoing_uri: subst(self.outgoing_uri.as_str()),
            outgoing_username: self.outgoing_username.as_deref().map(subst),
        }
    }
}

/// A provider template expanded for one email address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedProvider {
    /// Provider identifier.
    pub id: String,
    /// Human-readable provider name.
    pub label: String,
    /// Concrete incoming server URI.
    pub incoming_uri: String,
    /// Concrete incoming login name.
    pub incoming_username: Option<String>,
    /// Concrete outgoing server URI.
    pub outgoing_uri: String,
    /// Concrete outgoing login name.
    pub outgoing_username: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template(domain: &str) -> ProviderTemplate {
        ProviderTemplate::new(
            "example",
            "Example",
            domain,
            "imap+ssl+://imap.$domain",
            "smtp+ssl+://smtp.$domain:465",
        )
    }

    #[test]
    fn exact_match_ignores_case() {
        let t = template("Example.com");
        assert!(t.matches("example.com"));
        assert!(t.matches("EXAMPLE.COM"));
        assert!(!t.matches("example.org"));
        assert!(!t.matches("mail.example.com"));
    }

    #[test]
    fn wildcard_matches_prefix() {
        let t = template("example.*");
        assert!(t.matches("example.com"));
        assert!(t.matches("example.co.uk"));
        assert!(!t.matches("sample.com"));
    }

    #[test]
    fn expand_substitutes_placeholders() {
        let resolved = template("example.com")
            .with_usernames("$email", "$user")
            .expand("jane@example.com");
        assert_eq!(resolved.incoming_uri, "imap+ssl+://imap.example.com");
        assert_eq!(resolved.outgoing_uri, "smtp+ssl+://smtp.example.com:465");
        assert_eq!(resolved.incoming_username.as_deref(), Some("jane@example.com"));
        assert_eq!(resolved.outgoing_username.as_deref(), Some("jane"));
    }

    #[test]
    fn expand_without_usernames() {
        let resolved = template("example.com").expand("jane@example.com");
        assert!(resolved.incoming_username.is_none());
        assert!(resolved.outgoing_username.is_none());
    }
}
