//! Comment removal and whitespace canonicalization.

use regex::Regex;

use super::Sanitizer;
use super::normalize::trim_snippet;
use crate::config::SnippetPolicy;
use crate::error::PolicyError;

/// Removes HTML comments and collapses whitespace.
///
/// Comments mentioning the ad queue or asynchronous loading are kept, since
/// some ad-network boilerplate carries directives in them. A removed comment
/// leaves a space behind so the text on either side cannot join into a new
/// tag or comment. Runs of whitespace become a single space and whitespace
/// between adjacent tags disappears. Never fails.
pub struct ContentStripper {
    comment: Regex,
    whitespace: Regex,
    between_tags: Regex,
    preserved_keywords: Vec<String>,
}

impl ContentStripper {
    pub fn new(policy: &SnippetPolicy) -> Result<Self, PolicyError> {
        Ok(Self {
            comment: Regex::new(r"(?s)<!--(.*?)-->")?,
            whitespace: Regex::new(r"\s+")?,
            between_tags: Regex::new(r">\s+<")?,
            preserved_keywords: policy
                .preserved_comment_keywords
                .iter()
                .map(|k| k.to_lowercase())
                .collect(),
        })
    }

    fn is_preserved(&self, comment_body: &str) -> bool {
        let lower = comment_body.to_lowercase();
        self.preserved_keywords.iter().any(|k| lower.contains(k))
    }

    fn remove_comments(&self, html: &str) -> String {
        self.comment
            .replace_all(html, |caps: &regex::Captures<'_>| {
                if self.is_preserved(&caps[1]) {
                    caps[0].to_string()
                } else {
                    " ".to_string()
                }
            })
            .into_owned()
    }
}

impl Sanitizer for ContentStripper {
    fn sanitize(&self, html: &str) -> String {
        let without_comments = self.remove_comments(html);
        let collapsed = self.whitespace.replace_all(&without_comments, " ");
        let tight = self.between_tags.replace_all(&collapsed, "><");
        trim_snippet(&tight).to_string()
    }
}
