//! Size bounds and the post-strip XSS sweep.

use regex::Regex;

use super::script::ScriptScanner;
use crate::config::SnippetPolicy;
use crate::error::{PolicyError, RejectionReason, Result, excerpt};

/// Last check on stripped output.
///
/// Stripping changes whitespace, so a pattern that did not match before
/// stripping may match after it. The sweep looks for `alert`, `prompt` and
/// `confirm` calls inside `<script>` bodies, scoped per element with the same
/// ad-queue exemption the security gate uses.
pub struct FinalGuard {
    scripts: ScriptScanner,
    dialog_call: Regex,
    max_len: usize,
    min_len: usize,
}

impl FinalGuard {
    pub fn new(policy: &SnippetPolicy) -> std::result::Result<Self, PolicyError> {
        Ok(Self {
            scripts: ScriptScanner::new(policy)?,
            dialog_call: Regex::new(r"(?i)\b(?:alert|prompt|confirm)\s*\(")?,
            max_len: policy.max_len,
            min_len: policy.min_len,
        })
    }

    pub fn check(&self, snippet: &str) -> Result<()> {
        let len = snippet.len();
        if len > self.max_len {
            return Err(RejectionReason::TooLong {
                len,
                max: self.max_len,
            });
        }
        if len < self.min_len {
            return Err(RejectionReason::TooShort {
                len,
                min: self.min_len,
            });
        }
        if let Some(hit) = self.scripts.find_unexempted(snippet, &self.dialog_call) {
            return Err(RejectionReason::SuspiciousOutput {
                excerpt: excerpt(hit),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guard() -> FinalGuard {
        FinalGuard::new(&SnippetPolicy::default()).unwrap()
    }

    #[test]
    fn accepts_bounded_clean_output() {
        let html = "<script>(adsbygoogle = window.adsbygoogle || []).push({});</script>";
        assert_eq!(guard().check(html), Ok(()));
    }

    #[test]
    fn rejects_too_long() {
        let html = format!("<!-- adsbygoogle -->{}", "x".repeat(50_000));
        assert!(matches!(
            guard().check(&html),
            Err(RejectionReason::TooLong { max: 50_000, .. })
        ));
    }

    #[test]
    fn rejects_too_short() {
        assert_eq!(
            guard().check("<ins></ins>"),
            Err(RejectionReason::TooShort { len: 11, min: 20 })
        );
    }

    #[test]
    fn boundaries_are_inclusive() {
        assert_eq!(guard().check(&"a".repeat(20)), Ok(()));
        assert_eq!(guard().check(&"a".repeat(50_000)), Ok(()));
    }

    #[test]
    fn rejects_dialog_calls_in_scripts() {
        let err = guard()
            .check("<script>window.confirm ('win a prize')</script>")
            .unwrap_err();
        assert!(matches!(err, RejectionReason::SuspiciousOutput { .. }));
    }

    #[test]
    fn dialog_words_outside_scripts_are_fine() {
        assert_eq!(guard().check("<p>set an alert(for deals) today</p>"), Ok(()));
    }

    #[test]
    fn exemption_does_not_cross_blocks() {
        let html = concat!(
            "<script>(adsbygoogle = window.adsbygoogle || []).push({});</script>",
            "<script>prompt('password')</script>",
        );
        assert!(matches!(
            guard().check(html),
            Err(RejectionReason::SuspiciousOutput { .. })
        ));
    }
}
