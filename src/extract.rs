//! Pulls the account and slot identifiers out of a snippet for indexing.
//!
//! Extraction is plain pattern matching with no validation side effects. It
//! may run on raw or sanitized markup.

use regex::Regex;

use crate::config::SnippetPolicy;
use crate::error::PolicyError;

/// Identifiers found in a snippet. Either may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedIdentifiers {
    pub account_id: Option<String>,
    pub ad_slot: Option<String>,
}

/// Compiled identifier patterns for one policy.
pub struct Extractor {
    account_id: Regex,
    ad_slot: Regex,
}

impl Extractor {
    pub fn new(policy: &SnippetPolicy) -> Result<Self, PolicyError> {
        Ok(Self {
            account_id: Regex::new(&format!(r"{}\d+", regex::escape(&policy.account_prefix)))?,
            ad_slot: Regex::new(&format!(
                r#"(?i){}\s*=\s*["']?\s*(\d+)"#,
                regex::escape(&policy.slot_attribute)
            ))?,
        })
    }

    /// First `<prefix><digits>` account token, e.g. `ca-pub-1234567890123456`.
    pub fn account_id(&self, snippet: &str) -> Option<String> {
        self.account_id.find(snippet).map(|m| m.as_str().to_string())
    }

    /// Every account token in document order.
    pub(crate) fn account_ids<'h>(&self, snippet: &'h str) -> impl Iterator<Item = &'h str> {
        self.account_id.find_iter(snippet).map(|m| m.as_str())
    }

    /// Digits of the first slot-identifier attribute.
    pub fn ad_slot(&self, snippet: &str) -> Option<String> {
        self.ad_slot
            .captures(snippet)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }

    pub fn extract(&self, snippet: &str) -> ExtractedIdentifiers {
        ExtractedIdentifiers {
            account_id: self.account_id(snippet),
            ad_slot: self.ad_slot(snippet),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> Extractor {
        Extractor::new(&SnippetPolicy::default()).unwrap()
    }

    #[test]
    fn extracts_both_identifiers() {
        let html = r#"<ins class="adsbygoogle" data-ad-client="ca-pub-1234567890123456" data-ad-slot="9876543210"></ins>"#;
        assert_eq!(
            extractor().extract(html),
            ExtractedIdentifiers {
                account_id: Some("ca-pub-1234567890123456".into()),
                ad_slot: Some("9876543210".into()),
            }
        );
    }

    #[test]
    fn account_from_script_url() {
        let html = r#"<script async src="https://pagead2.googlesyndication.com/pagead/js/adsbygoogle.js?client=ca-pub-42"></script>"#;
        assert_eq!(extractor().account_id(html).as_deref(), Some("ca-pub-42"));
        assert_eq!(extractor().ad_slot(html), None);
    }

    #[test]
    fn slot_attribute_tolerates_quoting_styles() {
        assert_eq!(extractor().ad_slot("<ins data-ad-slot=123>").as_deref(), Some("123"));
        assert_eq!(extractor().ad_slot("<ins DATA-AD-SLOT = '77'>").as_deref(), Some("77"));
    }

    #[test]
    fn absence_is_not_an_error() {
        assert_eq!(extractor().extract("<div></div>"), ExtractedIdentifiers::default());
    }

    #[test]
    fn prefix_without_digits_is_not_an_account() {
        assert_eq!(extractor().account_id("ca-pub-xyz"), None);
    }
}
