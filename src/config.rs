//! Policy data for the snippet engine and the builder that produces it.

use crate::error::PolicyError;

/// Immutable allow-list policy consumed by
/// [`SnippetSanitizer`](crate::SnippetSanitizer).
///
/// Build one at startup with [`SnippetPolicy::builder`] (or take
/// [`SnippetPolicy::default`]) and hand it to the engine; nothing in the
/// engine mutates it afterwards.
///
/// # Example
///
/// ```
/// use ad_snippet_guard::{SnippetPolicy, SnippetSanitizer};
///
/// let policy = SnippetPolicy::builder()
///     .max_len(20_000)
///     .strict_account_match(true)
///     .build()
///     .unwrap();
/// let engine = SnippetSanitizer::new(policy).unwrap();
/// assert!(engine.policy().strict_account_match());
/// ```
#[derive(Debug, Clone)]
pub struct SnippetPolicy {
    pub(crate) ad_queue_token: String,
    pub(crate) syndication_domain: String,
    pub(crate) ins_class: String,
    pub(crate) account_prefix: String,
    pub(crate) account_attribute: String,
    pub(crate) slot_attribute: String,
    pub(crate) preserved_comment_keywords: Vec<String>,
    pub(crate) allowed_ins_attributes: Vec<String>,
    pub(crate) max_len: usize,
    pub(crate) min_len: usize,
    pub(crate) strict_account_match: bool,
    pub(crate) strict_ins_attributes: bool,
}

impl SnippetPolicy {
    /// Start a builder pre-filled with the defaults.
    pub fn builder() -> SnippetPolicyBuilder {
        SnippetPolicyBuilder::new()
    }

    /// Identifier of the ad network's client-side queue.
    pub fn ad_queue_token(&self) -> &str {
        &self.ad_queue_token
    }

    /// Trusted script and iframe domain.
    pub fn syndication_domain(&self) -> &str {
        &self.syndication_domain
    }

    /// Largest accepted sanitized output, in bytes.
    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Smallest accepted sanitized output, in bytes.
    pub fn min_len(&self) -> usize {
        self.min_len
    }

    /// Whether an account-identifier mismatch is a hard rejection.
    pub fn strict_account_match(&self) -> bool {
        self.strict_account_match
    }

    /// Whether `<ins>` attributes outside the allow-list are rejected.
    pub fn strict_ins_attributes(&self) -> bool {
        self.strict_ins_attributes
    }

    pub(crate) fn is_allowed_ins_attribute(&self, name: &str) -> bool {
        self.allowed_ins_attributes
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(name))
    }
}

impl Default for SnippetPolicy {
    fn default() -> Self {
        Self {
            ad_queue_token: "adsbygoogle".into(),
            syndication_domain: "googlesyndication.com".into(),
            ins_class: "adsbygoogle".into(),
            account_prefix: "ca-pub-".into(),
            account_attribute: "data-ad-client".into(),
            slot_attribute: "data-ad-slot".into(),
            preserved_comment_keywords: vec!["adsbygoogle".into(), "async".into()],
            allowed_ins_attributes: [
                "class",
                "style",
                "data-ad-client",
                "data-ad-slot",
                "data-ad-format",
                "data-full-width-responsive",
                "data-ad-layout",
                "data-ad-layout-key",
                "data-adtest",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            max_len: 50_000,
            min_len: 20,
            strict_account_match: false,
            strict_ins_attributes: false,
        }
    }
}

/// Fluent builder for [`SnippetPolicy`].
///
/// Defaults: ad queue token `adsbygoogle`, syndication domain
/// `googlesyndication.com`, ad-unit class `adsbygoogle`, account prefix
/// `ca-pub-`, output bounds 20..=50 000 bytes, both strict modes off.
#[derive(Debug, Clone, Default)]
pub struct SnippetPolicyBuilder {
    policy: SnippetPolicy,
}

impl SnippetPolicyBuilder {
    /// Same as [`SnippetPolicy::builder`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Identifier the ad network's script pushes display requests onto.
    pub fn ad_queue_token(mut self, token: impl Into<String>) -> Self {
        self.policy.ad_queue_token = token.into();
        self
    }

    /// Domain trusted for scripts and iframes (subdomains included).
    pub fn syndication_domain(mut self, domain: impl Into<String>) -> Self {
        self.policy.syndication_domain = domain.into().to_ascii_lowercase();
        self
    }

    /// CSS class every `<ins>` ad unit must carry.
    pub fn ins_class(mut self, class: impl Into<String>) -> Self {
        self.policy.ins_class = class.into();
        self
    }

    /// Literal prefix of account identifiers, followed by digits.
    pub fn account_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.policy.account_prefix = prefix.into();
        self
    }

    /// `<ins>` attribute holding the account identifier.
    pub fn account_attribute(mut self, name: impl Into<String>) -> Self {
        self.policy.account_attribute = name.into().to_ascii_lowercase();
        self
    }

    /// `<ins>` attribute holding the ad-slot identifier.
    pub fn slot_attribute(mut self, name: impl Into<String>) -> Self {
        self.policy.slot_attribute = name.into().to_ascii_lowercase();
        self
    }

    /// Add a keyword that keeps an HTML comment from being stripped.
    pub fn preserve_comments_containing(mut self, keyword: impl Into<String>) -> Self {
        self.policy.preserved_comment_keywords.push(keyword.into());
        self
    }

    /// Add an attribute name to the `<ins>` allow-list.
    pub fn allow_ins_attribute(mut self, name: impl Into<String>) -> Self {
        self.policy
            .allowed_ins_attributes
            .push(name.into().to_ascii_lowercase());
        self
    }

    /// Upper bound on the sanitized output, in bytes (inclusive).
    pub fn max_len(mut self, bytes: usize) -> Self {
        self.policy.max_len = bytes;
        self
    }

    /// Lower bound on the sanitized output, in bytes (inclusive).
    pub fn min_len(mut self, bytes: usize) -> Self {
        self.policy.min_len = bytes;
        self
    }

    /// Reject, instead of only logging, an account-identifier mismatch.
    pub fn strict_account_match(mut self, strict: bool) -> Self {
        self.policy.strict_account_match = strict;
        self
    }

    /// Reject `<ins>` attributes that are not on the allow-list.
    pub fn strict_ins_attributes(mut self, strict: bool) -> Self {
        self.policy.strict_ins_attributes = strict;
        self
    }

    /// Validate and return the finished policy.
    pub fn build(self) -> Result<SnippetPolicy, PolicyError> {
        let policy = self.policy;
        for (name, value) in [
            ("ad_queue_token", &policy.ad_queue_token),
            ("syndication_domain", &policy.syndication_domain),
            ("ins_class", &policy.ins_class),
            ("account_prefix", &policy.account_prefix),
            ("account_attribute", &policy.account_attribute),
            ("slot_attribute", &policy.slot_attribute),
        ] {
            if value.trim().is_empty() {
                return Err(PolicyError::EmptyToken(name));
            }
        }
        if policy.min_len > policy.max_len {
            return Err(PolicyError::InvalidBounds {
                min: policy.min_len,
                max: policy.max_len,
            });
        }
        Ok(policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_permissive() {
        let policy = SnippetPolicy::default();
        assert!(!policy.strict_account_match());
        assert!(!policy.strict_ins_attributes());
        assert_eq!(policy.max_len(), 50_000);
        assert_eq!(policy.min_len(), 20);
    }

    #[test]
    fn builder_overrides_defaults() {
        let policy = SnippetPolicy::builder()
            .syndication_domain("Ads.Example.NET")
            .max_len(1_000)
            .min_len(10)
            .strict_ins_attributes(true)
            .build()
            .unwrap();
        assert_eq!(policy.syndication_domain(), "ads.example.net");
        assert_eq!(policy.max_len(), 1_000);
        assert!(policy.strict_ins_attributes());
    }

    #[test]
    fn empty_token_is_rejected() {
        let err = SnippetPolicy::builder().ad_queue_token("  ").build().unwrap_err();
        assert!(matches!(err, PolicyError::EmptyToken("ad_queue_token")));
    }

    #[test]
    fn inverted_bounds_are_rejected() {
        let err = SnippetPolicy::builder()
            .min_len(100)
            .max_len(10)
            .build()
            .unwrap_err();
        assert!(matches!(err, PolicyError::InvalidBounds { min: 100, max: 10 }));
    }

    #[test]
    fn ins_allow_list_is_case_insensitive() {
        let policy = SnippetPolicy::builder()
            .allow_ins_attribute("data-custom")
            .build()
            .unwrap();
        assert!(policy.is_allowed_ins_attribute("DATA-AD-SLOT"));
        assert!(policy.is_allowed_ins_attribute("data-custom"));
        assert!(!policy.is_allowed_ins_attribute("onclick"));
    }
}
