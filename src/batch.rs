//! Validation of many named snippets at once.

use std::collections::BTreeMap;
use std::fmt;

use crate::context::{SanitizedSnippet, TrustContext};
use crate::error::RejectionReason;
use crate::sanitizer::SnippetSanitizer;

/// A snippet that failed validation, kept for operator review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedSnippet {
    /// The snippet exactly as supplied.
    pub original: String,
    pub reason: RejectionReason,
}

/// Partition of a batch. Every input key lands in exactly one of the two maps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchResult<K: Ord> {
    pub accepted: BTreeMap<K, SanitizedSnippet>,
    pub rejected: BTreeMap<K, RejectedSnippet>,
}

impl<K: Ord> BatchResult<K> {
    pub fn accepted_count(&self) -> usize {
        self.accepted.len()
    }

    pub fn rejected_count(&self) -> usize {
        self.rejected.len()
    }

    pub fn is_all_accepted(&self) -> bool {
        self.rejected.is_empty()
    }
}

impl<K: Ord> Default for BatchResult<K> {
    fn default() -> Self {
        Self {
            accepted: BTreeMap::new(),
            rejected: BTreeMap::new(),
        }
    }
}

impl SnippetSanitizer {
    /// Run the full pipeline on every `(name, snippet)` pair independently.
    ///
    /// Each name doubles as the context label for logging. Entries share no
    /// state, so iteration order has no effect on the outcome. If a name
    /// repeats, its last entry decides which map it lands in.
    ///
    /// ```
    /// use std::collections::HashMap;
    /// use ad_snippet_guard::SnippetSanitizer;
    ///
    /// let engine = SnippetSanitizer::new(Default::default()).unwrap();
    /// let snippets = HashMap::from([
    ///     ("desktop", "<script>(adsbygoogle = window.adsbygoogle || []).push({});</script>"),
    ///     ("mobile", ""),
    /// ]);
    /// let result = engine.validate_multiple(snippets, None);
    /// assert!(result.accepted.contains_key("desktop"));
    /// assert!(result.rejected.contains_key("mobile"));
    /// ```
    pub fn validate_multiple<K, S, I>(
        &self,
        snippets: I,
        expected_account: Option<&str>,
    ) -> BatchResult<K>
    where
        I: IntoIterator<Item = (K, S)>,
        K: Ord + fmt::Display,
        S: AsRef<str>,
    {
        let mut result = BatchResult::default();
        for (name, raw) in snippets {
            let mut ctx = TrustContext::new(name.to_string());
            if let Some(account) = expected_account {
                ctx = ctx.with_expected_account(account);
            }
            let raw = raw.as_ref();
            match self.sanitize(raw, &ctx) {
                Ok(out) => {
                    result.rejected.remove(&name);
                    result.accepted.insert(name, out);
                }
                Err(reason) => {
                    result.accepted.remove(&name);
                    result.rejected.insert(
                        name,
                        RejectedSnippet {
                            original: raw.to_string(),
                            reason,
                        },
                    );
                }
            }
        }
        tracing::debug!(
            accepted = result.accepted_count(),
            rejected = result.rejected_count(),
            "Batch validated"
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SnippetPolicy;

    const PUSH: &str = "<script>(adsbygoogle = window.adsbygoogle || []).push({});</script>";

    fn engine() -> SnippetSanitizer {
        SnippetSanitizer::new(SnippetPolicy::default()).unwrap()
    }

    #[test]
    fn partitions_by_outcome() {
        let snippets = vec![
            ("desktop".to_string(), PUSH.to_string()),
            ("mobile".to_string(), "<p>not an ad at all, really</p>".to_string()),
            ("sidebar".to_string(), "   ".to_string()),
        ];
        let result = engine().validate_multiple(snippets, None);

        assert_eq!(result.accepted_count(), 1);
        assert_eq!(result.rejected_count(), 2);
        assert!(!result.is_all_accepted());
        assert_eq!(result.accepted["desktop"].as_str(), PUSH);
        assert_eq!(result.rejected["mobile"].reason, RejectionReason::NotAdMarkup);
        assert_eq!(result.rejected["sidebar"].reason, RejectionReason::Empty);
    }

    #[test]
    fn rejected_entries_keep_the_original() {
        let raw = "\u{FEFF}  <iframe src=\"https://evil.example.com\"></iframe>";
        let result = engine().validate_multiple([("footer", raw)], None);
        assert_eq!(result.rejected["footer"].original, raw);
    }

    #[test]
    fn repeated_name_lands_in_one_map() {
        let result = engine().validate_multiple(vec![("a", PUSH), ("a", "")], None);
        assert!(!result.accepted.contains_key("a"));
        assert_eq!(result.rejected["a"].reason, RejectionReason::Empty);

        let result = engine().validate_multiple(vec![("a", ""), ("a", PUSH)], None);
        assert!(!result.rejected.contains_key("a"));
        assert_eq!(result.accepted["a"].as_str(), PUSH);
    }

    #[test]
    fn empty_batch_is_all_accepted() {
        let result = engine().validate_multiple(Vec::<(String, String)>::new(), None);
        assert!(result.is_all_accepted());
        assert_eq!(result.accepted_count(), 0);
    }
}
