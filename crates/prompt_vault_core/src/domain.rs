//! crates/prompt_vault_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any storage or serialization format.

use chrono::{DateTime, Duration, Utc};
use regex::Regex;
use std::sync::OnceLock;

use crate::ports::{PortError, PortResult};

/// Payment status the provider reports once a charge has settled.
pub const PAYMENT_COMPLETED: &str = "COMPLETED";

//=========================================================================================
// Prompts
//=========================================================================================

/// A text template record, grouped by category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub id: String,
    pub category: String,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub is_public: bool,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Prompt {
    /// Builds a freshly created prompt. Both timestamps share the same instant.
    pub fn from_new(id: String, new: NewPrompt, now: DateTime<Utc>) -> Self {
        Self {
            id,
            category: new.category,
            title: new.title,
            content: new.content,
            tags: new.tags,
            is_public: new.is_public,
            created_by: new.created_by,
            created_at: now,
            updated_at: now,
        }
    }

    /// Advances `updated_at`, strictly past its previous value even if the
    /// clock has not moved (or moved backwards).
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = if now > self.updated_at {
            now
        } else {
            self.updated_at + Duration::nanoseconds(1)
        };
    }
}

/// Caller-supplied fields for a new prompt. Ids and timestamps belong to the store.
#[derive(Debug, Clone, Default)]
pub struct NewPrompt {
    pub category: String,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub is_public: bool,
    pub created_by: String,
}

impl NewPrompt {
    pub fn validate(&self) -> PortResult<()> {
        require_text("category", &self.category)?;
        require_text("title", &self.title)?;
        require_text("content", &self.content)
    }
}

/// A partial update. `None` fields keep their stored value.
#[derive(Debug, Clone, Default)]
pub struct PromptPatch {
    pub category: Option<String>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
    pub is_public: Option<bool>,
}

impl PromptPatch {
    pub fn validate(&self) -> PortResult<()> {
        if let Some(category) = &self.category {
            require_text("category", category)?;
        }
        if let Some(title) = &self.title {
            require_text("title", title)?;
        }
        if let Some(content) = &self.content {
            require_text("content", content)?;
        }
        Ok(())
    }

    /// Merges the supplied fields onto `prompt`. Identity and timestamps are untouched.
    pub fn apply_to(self, prompt: &mut Prompt) {
        if let Some(category) = self.category {
            prompt.category = category;
        }
        if let Some(title) = self.title {
            prompt.title = title;
        }
        if let Some(content) = self.content {
            prompt.content = content;
        }
        if let Some(tags) = self.tags {
            prompt.tags = tags;
        }
        if let Some(is_public) = self.is_public {
            prompt.is_public = is_public;
        }
    }
}

/// Trims every tag and drops the empty ones.
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tags.into_iter()
        .map(|tag| tag.as_ref().trim().to_string())
        .filter(|tag| !tag.is_empty())
        .collect()
}

/// Splits a comma-separated tag list, as submitted by HTML forms.
pub fn split_tags(raw: &str) -> Vec<String> {
    normalize_tags(raw.split(','))
}

fn require_text(field: &str, value: &str) -> PortResult<()> {
    if value.trim().is_empty() {
        return Err(PortError::Validation(format!("{field} must not be empty")));
    }
    Ok(())
}

//=========================================================================================
// Subscriptions
//=========================================================================================

/// The subscription flag stored per identity-provider email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserStatus {
    pub email: String,
    pub is_pro: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionStatus {
    Free,
    Pro,
}

impl From<bool> for SubscriptionStatus {
    fn from(is_pro: bool) -> Self {
        if is_pro {
            Self::Pro
        } else {
            Self::Free
        }
    }
}

/// An inbound payment notification from the PIX provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentNotification {
    pub status: String,
    pub correlation_id: String,
}

impl PaymentNotification {
    pub fn is_completed(&self) -> bool {
        self.status == PAYMENT_COMPLETED
    }

    /// Extracts the payer's email from a `<prefix>-<email>` correlation id.
    ///
    /// Only the first `-` separates the prefix, so addresses containing
    /// hyphens are kept whole.
    pub fn payer_email(&self) -> PortResult<String> {
        let email = self
            .correlation_id
            .split_once('-')
            .map(|(_, rest)| rest.trim())
            .ok_or_else(|| {
                PortError::Validation(format!(
                    "correlation id '{}' has no email segment",
                    self.correlation_id
                ))
            })?;

        if !is_plausible_email(email) {
            return Err(PortError::Validation(format!(
                "correlation id '{}' does not carry a valid email",
                self.correlation_id
            )));
        }
        Ok(email.to_string())
    }
}

fn is_plausible_email(candidate: &str) -> bool {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL
        .get_or_init(|| {
            Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap_or_else(|e| panic!("email regex: {e}"))
        })
        .is_match(candidate)
}

//=========================================================================================
// Identity
//=========================================================================================

/// What the external identity provider tells us about the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthContext {
    pub authenticated: bool,
    pub email: Option<String>,
}

impl AuthContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn for_email(email: impl Into<String>) -> Self {
        Self {
            authenticated: true,
            email: Some(email.into()),
        }
    }

    /// The caller's email, only when the session is authenticated.
    pub fn user_email(&self) -> Option<&str> {
        if self.authenticated {
            self.email.as_deref()
        } else {
            None
        }
    }

    pub fn is_admin(&self, admin_email: &str) -> bool {
        self.user_email()
            .is_some_and(|email| email.eq_ignore_ascii_case(admin_email.trim()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_prompt() -> Prompt {
        let now = Utc::now();
        Prompt::from_new(
            "p-1".into(),
            NewPrompt {
                category: "writing".into(),
                title: "Outline".into(),
                content: "Write an outline".into(),
                tags: vec!["essay".into()],
                is_public: true,
                created_by: "admin@example.com".into(),
            },
            now,
        )
    }

    #[test]
    fn new_prompt_has_equal_timestamps() {
        let prompt = sample_prompt();
        assert_eq!(prompt.created_at, prompt.updated_at);
    }

    #[test]
    fn touch_is_strictly_monotonic_when_clock_stalls() {
        let mut prompt = sample_prompt();
        let stalled = prompt.updated_at;
        prompt.touch(stalled);
        assert!(prompt.updated_at > prompt.created_at);

        let earlier = prompt.created_at - Duration::seconds(10);
        let before = prompt.updated_at;
        prompt.touch(earlier);
        assert!(prompt.updated_at > before);
    }

    #[test]
    fn patch_only_touches_supplied_fields() {
        let mut prompt = sample_prompt();
        let original = prompt.clone();
        PromptPatch {
            content: Some("c2".into()),
            ..Default::default()
        }
        .apply_to(&mut prompt);

        assert_eq!(prompt.content, "c2");
        assert_eq!(prompt.title, original.title);
        assert_eq!(prompt.tags, original.tags);
        assert_eq!(prompt.is_public, original.is_public);
        assert_eq!(prompt.updated_at, original.updated_at);
    }

    #[test]
    fn blank_fields_fail_validation() {
        let new = NewPrompt {
            category: "x".into(),
            title: "  ".into(),
            content: "c".into(),
            ..Default::default()
        };
        assert!(matches!(new.validate(), Err(PortError::Validation(_))));

        let patch = PromptPatch {
            content: Some(String::new()),
            ..Default::default()
        };
        assert!(matches!(patch.validate(), Err(PortError::Validation(_))));
    }

    #[test]
    fn tags_are_trimmed_and_empty_ones_dropped() {
        assert_eq!(split_tags(" a, b ,,c , "), vec!["a", "b", "c"]);
        assert!(split_tags("").is_empty());
    }

    #[test]
    fn payer_email_keeps_hyphens_after_the_prefix() {
        let notification = PaymentNotification {
            status: PAYMENT_COMPLETED.into(),
            correlation_id: "sub-jane-doe@mail-host.com".into(),
        };
        assert!(notification.is_completed());
        assert_eq!(notification.payer_email().unwrap(), "jane-doe@mail-host.com");
    }

    #[test]
    fn payer_email_rejects_malformed_correlation_ids() {
        for correlation_id in ["no-separator-email", "nodash", "sub-", "sub-not an email"] {
            let notification = PaymentNotification {
                status: PAYMENT_COMPLETED.into(),
                correlation_id: correlation_id.into(),
            };
            assert!(
                matches!(notification.payer_email(), Err(PortError::Validation(_))),
                "{correlation_id} should be rejected"
            );
        }
    }

    #[test]
    fn admin_check_requires_an_authenticated_matching_email() {
        assert!(AuthContext::for_email("Admin@Example.com").is_admin("admin@example.com"));
        assert!(!AuthContext::for_email("user@example.com").is_admin("admin@example.com"));
        assert!(!AuthContext::anonymous().is_admin("admin@example.com"));

        let unauthenticated = AuthContext {
            authenticated: false,
            email: Some("admin@example.com".into()),
        };
        assert!(!unauthenticated.is_admin("admin@example.com"));
    }

    #[test]
    fn subscription_status_follows_the_flag() {
        assert_eq!(SubscriptionStatus::from(true), SubscriptionStatus::Pro);
        assert_eq!(SubscriptionStatus::from(false), SubscriptionStatus::Free);
    }
}
