//! Per-element `<script>` scanning shared by the security gate and the
//! final guard.
//!
//! Every rule that looks inside scripts runs against one block at a time,
//! so the ad-queue exemption earned by one block never covers another.

use regex::Regex;

use crate::config::SnippetPolicy;
use crate::error::PolicyError;

pub(crate) struct ScriptScanner {
    block: Regex,
    safe_invocation: Regex,
}

impl ScriptScanner {
    pub(crate) fn new(policy: &SnippetPolicy) -> Result<Self, PolicyError> {
        Ok(Self {
            // An unterminated block runs to the end of the snippet.
            block: Regex::new(r"(?is)<script\b[^>]*>(.*?)(?:</script\s*>|\z)")?,
            safe_invocation: Regex::new(&format!(
                r"(?is)\b{}\b.*\.push\s*\(",
                regex::escape(&policy.ad_queue_token)
            ))?,
        })
    }

    /// Bodies of every `<script>` element, in document order.
    pub(crate) fn bodies<'h>(&self, html: &'h str) -> impl Iterator<Item = &'h str> {
        self.block
            .captures_iter(html)
            .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
    }

    /// Whether `body` makes the ad network's own queue push.
    pub(crate) fn is_exempt(&self, body: &str) -> bool {
        self.safe_invocation.is_match(body)
    }

    /// First match of `rule` inside a non-exempt script body.
    pub(crate) fn find_unexempted<'h>(&self, html: &'h str, rule: &Regex) -> Option<&'h str> {
        self.bodies(html).find_map(|body| {
            let hit = rule.find(body)?;
            if self.is_exempt(body) {
                tracing::debug!("Script rule matched inside ad-queue block, exempted");
                return None;
            }
            Some(hit.as_str())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scanner() -> ScriptScanner {
        ScriptScanner::new(&SnippetPolicy::default()).unwrap()
    }

    #[test]
    fn yields_each_body_separately() {
        let html = "<script>a()</script><p>x</p><SCRIPT type=\"text/javascript\">b()</SCRIPT >";
        let bodies: Vec<_> = scanner().bodies(html).collect();
        assert_eq!(bodies, vec!["a()", "b()"]);
    }

    #[test]
    fn unterminated_block_runs_to_end() {
        let bodies: Vec<_> = scanner().bodies("<script>eval(x)").collect();
        assert_eq!(bodies, vec!["eval(x)"]);
    }

    #[test]
    fn exemption_is_scoped_to_one_block() {
        let rule = Regex::new(r"(?i)\beval\b").unwrap();
        let html = concat!(
            "<script>(adsbygoogle = window.adsbygoogle || []).push({});</script>",
            "<script>eval(atob('x'))</script>",
        );
        assert_eq!(scanner().find_unexempted(html, &rule), Some("eval"));
    }

    #[test]
    fn exempt_block_is_skipped() {
        let rule = Regex::new(r"(?i)\beval\b").unwrap();
        let html = "<script>var e = 'eval'; (adsbygoogle = window.adsbygoogle || []).push({});</script>";
        assert_eq!(scanner().find_unexempted(html, &rule), None);
    }

    #[test]
    fn does_not_match_similar_tag_names() {
        assert_eq!(
            scanner()
                .bodies("<scripts>x</scripts><noscript>y</noscript>")
                .count(),
            0
        );
    }
}
