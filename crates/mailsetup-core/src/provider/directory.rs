//! Provider directory lookup.

use std::path::Path;

use tracing::debug;

use super::model::ProviderTemplate;
use crate::Result;

/// Maps an email domain to a provider template.
pub trait ProviderDirectory: Send + Sync {
    /// Looks up the template for `domain`.
    ///
    /// Matching is case-insensitive. `None` means the domain is not known.
    fn lookup(&self, domain: &str) -> Option<ProviderTemplate>;
}

/// In-memory provider directory.
///
/// Templates are checked in order; the first match wins.
#[derive(Debug, Clone, Default)]
pub struct StaticProviderDirectory {
    templates: Vec<ProviderTemplate>,
}

impl StaticProviderDirectory {
    /// Creates a directory from the given templates.
    #[must_use]
    pub const fn new(templates: Vec<ProviderTemplate>) -> Self {
        Self { templates }
    }

    /// Directory of well-known providers.
    #[must_use]
    pub fn builtin() -> Self {
        let mut templates = Vec::new();

        for domain in ["gmail.com", "googlemail.com"] {
            templates.push(
                ProviderTemplate::new(
                    "gmail",
                    "Gmail",
                    domain,
                    "imap+ssl+://imap.gmail.com:993",
                    "smtp+ssl+://smtp.gmail.com:465",
                )
                .with_usernames("$email", "$email"),
            );
        }

        for domain in ["outlook.com", "hotmail.com", "live.com"] {
            templates.push(
                ProviderTemplate::new(
                    "outlook",
                    "Outlook",
                    domain,
                    "imap+ssl+://outlook.office365.com:993",
                    "smtp+tls+://smtp.office365.com:587",
                )
                .with_usernames("$email", "$email"),
            );
        }

        for domain in ["yahoo.com", "ymail.com"] {
            templates.push(
                ProviderTemplate::new(
                    "yahoo",
                    "Yahoo",
                    domain,
                    "imap+ssl+://imap.mail.yahoo.com:993",
                    "smtp+ssl+://smtp.mail.yahoo.com:465",
                )
                .with_usernames("$email", "$email"),
            );
        }

        // iCloud logs in with the local part only
        for domain in ["icloud.com", "me.com", "mac.com"] {
            templates.push(
                ProviderTemplate::new(
                    "icloud",
                    "iCloud",
                    domain,
                    "imap+ssl+://imap.mail.me.com:993",
                    "smtp+tls+://smtp.mail.me.com:587",
                )
                .with_usernames("$user", "$email"),
            );
        }

        Self { templates }
    }

    /// Parses a JSON array of templates.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed.
    pub fn from_json(json: &str) -> Result<Self> {
        let templates: Vec<ProviderTemplate> = serde_json::from_str(json)?;
        Ok(Self { templates })
    }

    /// Loads a JSON array of templates from a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = tokio::fs::read_to_string(path.as_ref()).await?;
        let directory = Self::from_json(&contents)?;
        debug!(
            "Loaded {} provider templates from {}",
            directory.templates.len(),
            path.as_ref().display()
        );
        Ok(directory)
    }

    /// Appends templates, checked after the existing ones.
    pub fn extend(&mut self, templates: impl IntoIterator<Item = ProviderTemplate>) {
        self.templates.extend(templates);
    }

    /// Consumes the directory, returning its templates in lookup order.
    #[must_use]
    pub fn into_templates(self) -> Vec<ProviderTemplate> {
        self.templates
    }

    /// Number of templates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Whether the directory has no templates.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl ProviderDirectory for StaticProviderDirectory {
    fn lookup(&self, domain: &str) -> Option<ProviderTemplate> {
        self.templates.iter().find(|t| t.matches(domain)).cloned()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn builtin_knows_common_providers() {
        let directory = StaticProviderDirectory::builtin();
        for (domain, id) in [
            ("gmail.com", "gmail"),
            ("googlemail.com", "gmail"),
            ("outlook.com", "outlook"),
            ("hotmail.com", "outlook"),
            ("live.com", "outlook"),
            ("yahoo.com", "yahoo"),
            ("ymail.com", "yahoo"),
            ("icloud.com", "icloud"),
            ("me.com", "icloud"),
            ("mac.com", "icloud"),
        ] {
            assert_eq!(directory.lookup(domain).unwrap().id, id, "{domain}");
        }
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let directory = StaticProviderDirectory::builtin();
        assert_eq!(directory.lookup("GMail.COM").unwrap().id, "gmail");
    }

    #[test]
    fn unknown_domain() {
        let directory = StaticProviderDirectory::builtin();
        assert!(directory.lookup("example.org").is_none());
    }

    #[test]
    fn from_json() {
        let directory = StaticProviderDirectory::from_json(
            r#"[{
                "id": "corp",
                "label": "Corp Mail",
                "domain": "corp.example",
                "incomingUri": "imap+ssl+://mail.corp.example",
                "incomingUsername": "$user",
                "outgoingUri": "smtp+ssl+://mail.corp.example:465"
            }]"#,
        )
        .unwrap();
        assert_eq!(directory.len(), 1);
        let template = directory.lookup("corp.example").unwrap();
        assert_eq!(template.incoming_username.as_deref(), Some("$user"));
        assert!(template.outgoing_username.is_none());
    }

    #[test]
    fn from_json_rejects_garbage() {
        assert!(StaticProviderDirectory::from_json("{").is_err());
    }

    #[test]
    fn first_match_wins() {
        let mut directory = StaticProviderDirectory::new(vec![ProviderTemplate::new(
            "first",
            "First",
            "example.*",
            "imap://a",
            "smtp://a",
        )]);
        directory.extend([ProviderTemplate::new(
            "second",
            "Second",
            "example.com",
            "imap://b",
            "smtp://b",
        )]);
        assert_eq!(directory.lookup("example.com").unwrap().id, "first");
    }

    #[tokio::test]
    async fn load_missing_file_fails() {
        let result = StaticProviderDirectory::load("/nonexistent/providers.json").await;
        assert!(matches!(result, Err(crate::Error::Io(_))));
    }
}
