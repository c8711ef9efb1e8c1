//! Storefront identities and the admin access policy.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Signed-in user as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    /// Stable user id.
    pub uid: String,
    /// Verified email, if any.
    pub email: Option<String>,
    /// Name shown in the header.
    pub display_name: Option<String>,
}

#[allow(missing_docs)]
impl UserIdentity {
    #[must_use]
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            email: None,
            display_name: None,
        }
    }

    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    #[must_use]
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }
}

/// Set of identities allowed to use admin features.
///
/// Built from configuration at startup. Emails are compared trimmed and
/// case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessPolicy {
    admins: HashSet<String>,
}

impl AccessPolicy {
    #[must_use]
    /// Builds a policy from admin emails, compared case-insensitively.
    pub fn new<I, S>(admin_emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let admins = admin_emails
            .into_iter()
            .map(|e| normalize(e.as_ref()))
            .filter(|e| !e.is_empty())
            .collect();
        Self { admins }
    }

    /// A policy with no admins.
    #[must_use]
    pub fn deny_all() -> Self {
        Self::default()
    }

    #[must_use]
    /// Returns true when `email` belongs to an admin.
    pub fn is_admin_email(&self, email: &str) -> bool {
        let email = normalize(email);
        !email.is_empty() && self.admins.contains(&email)
    }

    /// An identity without an email is never an admin.
    #[must_use]
    pub fn is_admin(&self, user: &UserIdentity) -> bool {
        user.email
            .as_deref()
            .is_some_and(|email| self.is_admin_email(email))
    }

    #[must_use]
    /// Number of admin emails.
    pub fn len(&self) -> usize {
        self.admins.len()
    }

    #[must_use]
    /// Returns true when there are no admins.
    pub fn is_empty(&self) -> bool {
        self.admins.is_empty()
    }
}

fn normalize(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_match_is_case_insensitive() {
        let policy = AccessPolicy::new(["Owner@Verdant.shop ", "ops@verdant.shop"]);
        assert!(policy.is_admin_email("owner@verdant.shop"));
        assert!(policy.is_admin_email("  OPS@verdant.shop"));
        assert!(!policy.is_admin_email("guest@verdant.shop"));
        assert_eq!(policy.len(), 2);
    }

    #[test]
    fn test_identity_without_email_is_not_admin() {
        let policy = AccessPolicy::new(["owner@verdant.shop"]);
        assert!(!policy.is_admin(&UserIdentity::new("uid-1")));
        assert!(policy.is_admin(&UserIdentity::new("uid-2").with_email("owner@verdant.shop")));
    }

    #[test]
    fn test_blank_entries_are_ignored() {
        let policy = AccessPolicy::new(["", "   "]);
        assert!(policy.is_empty());
        assert!(!policy.is_admin_email(""));
        assert!(!AccessPolicy::deny_all().is_admin_email("owner@verdant.shop"));
    }
}
