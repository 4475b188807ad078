//! Ad-network format checks, including the `<ins>` ad-unit element.

use regex::Regex;
use scraper::{Html, Selector};

use super::security::is_event_handler_name;
use crate::config::SnippetPolicy;
use crate::error::{InsViolation, PolicyError, RejectionReason, Result};
use crate::extract::Extractor;

/// Confirms a snippet is recognizably ad-network markup.
///
/// The account-identifier cross-check is permissive by default: a mismatch is
/// logged and the snippet passes, because auto ads and specialized units may
/// legitimately vary the field. [`SnippetPolicy::strict_account_match`] turns
/// the mismatch into a rejection.
pub struct FormatValidator {
    ad_queue_token: String,
    syndication_domain: String,
    ins_open: Regex,
    ins_selector: Selector,
    account_format: Regex,
    policy: SnippetPolicy,
}

impl FormatValidator {
    pub fn new(policy: &SnippetPolicy) -> std::result::Result<Self, PolicyError> {
        let ins_selector =
            Selector::parse("ins").map_err(|e| PolicyError::InvalidSelector(format!("{e:?}")))?;
        Ok(Self {
            ad_queue_token: policy.ad_queue_token.to_ascii_lowercase(),
            syndication_domain: policy.syndication_domain.to_ascii_lowercase(),
            ins_open: Regex::new(r"(?i)<ins\b")?,
            ins_selector,
            account_format: Regex::new(&format!(
                r"^{}\d+$",
                regex::escape(&policy.account_prefix)
            ))?,
            policy: policy.clone(),
        })
    }

    /// Hard token requirement, account cross-check, then the ad-unit check
    /// when an `<ins>` element is present.
    pub fn check(
        &self,
        snippet: &str,
        expected_account: Option<&str>,
        extractor: &Extractor,
        label: &str,
    ) -> Result<()> {
        self.require_ad_markup(snippet)?;
        if let Some(expected) = expected_account {
            self.cross_check_account(snippet, expected, extractor, label)?;
        }
        if self.ins_open.is_match(snippet) {
            self.check_ins_element(snippet)?;
        }
        Ok(())
    }

    /// Token requirement and ad-unit check without the account cross-check,
    /// for re-verifying output the stripper has already rewritten.
    pub(crate) fn check_structure(&self, snippet: &str) -> Result<()> {
        self.require_ad_markup(snippet)?;
        if self.ins_open.is_match(snippet) {
            self.check_ins_element(snippet)?;
        }
        Ok(())
    }

    /// Both tokens present, for the cheap pre-check.
    pub(crate) fn has_both_tokens(&self, snippet: &str) -> bool {
        let lower = snippet.to_ascii_lowercase();
        lower.contains(&self.ad_queue_token) && lower.contains(&self.syndication_domain)
    }

    /// The snippet must mention the ad queue or the syndication domain.
    pub fn require_ad_markup(&self, snippet: &str) -> Result<()> {
        let lower = snippet.to_ascii_lowercase();
        if lower.contains(&self.ad_queue_token) || lower.contains(&self.syndication_domain) {
            Ok(())
        } else {
            Err(RejectionReason::NotAdMarkup)
        }
    }

    fn cross_check_account(
        &self,
        snippet: &str,
        expected: &str,
        extractor: &Extractor,
        label: &str,
    ) -> Result<()> {
        let expected = expected.trim();
        let prefix = self.policy.account_prefix.as_str();
        let expected_digits = expected.strip_prefix(prefix).unwrap_or(expected);
        for found in extractor.account_ids(snippet) {
            let found_digits = &found[prefix.len()..];
            if found_digits == expected_digits {
                continue;
            }
            if self.policy.strict_account_match {
                return Err(RejectionReason::AccountMismatch {
                    expected: expected.to_string(),
                    found: found.to_string(),
                });
            }
            tracing::warn!(
                context = label,
                expected,
                found,
                "Account identifier differs from the configured one, accepting"
            );
        }
        Ok(())
    }

    /// Validate every `<ins>` element in the snippet.
    ///
    /// Each element must carry the ad-unit class, a well-formed account
    /// identifier if it has one, and no inline event handler. In strict
    /// attribute mode, attributes outside the allow-list are refused too.
    pub fn check_ins_element(&self, snippet: &str) -> Result<()> {
        let fragment = Html::parse_fragment(snippet);
        for ins in fragment.select(&self.ins_selector) {
            let el = ins.value();

            if !el.classes().any(|c| c.eq_ignore_ascii_case(&self.policy.ins_class)) {
                return Err(RejectionReason::InvalidInsElement(InsViolation::MissingClass));
            }

            if let Some(account) = el.attr(&self.policy.account_attribute) {
                if !self.account_format.is_match(account.trim()) {
                    return Err(RejectionReason::InvalidInsElement(
                        InsViolation::MalformedAccountId,
                    ));
                }
            }

            if let Some((name, _)) = el.attrs().find(|(name, _)| is_event_handler_name(name)) {
                return Err(RejectionReason::InvalidInsElement(InsViolation::EventHandler(
                    name.to_string(),
                )));
            }

            let unknown = el
                .attrs()
                .map(|(name, _)| name)
                .filter(|name| !self.policy.is_allowed_ins_attribute(name));
            for name in unknown {
                if self.policy.strict_ins_attributes {
                    return Err(RejectionReason::InvalidInsElement(
                        InsViolation::UnknownAttribute(name.to_string()),
                    ));
                }
                tracing::debug!(attribute = name, "Ad unit carries an attribute outside the allow-list");
            }
        }
        Ok(())
    }
}
