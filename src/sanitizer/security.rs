//! Classification of known-dangerous constructs.
//!
//! The gate only classifies: it never rewrites the snippet. Rules run in a
//! fixed order (script injection, event handlers, `javascript:` URIs,
//! foreign iframes) and the first hit rejects.

use regex::Regex;
use url::Url;

use super::script::ScriptScanner;
use crate::config::SnippetPolicy;
use crate::error::{DangerKind, PolicyError, RejectionReason, Result};

/// Attribute text of a start tag. A quote opened right after `=` runs to its
/// closing quote, so a `>` inside a quoted value does not end the tag.
const TAG_ATTRS: &str = r#"(?:=\s*"[^"]*"|=\s*'[^']*'|[^>])*"#;

/// Rejects script injection, inline event handlers, `javascript:` URIs and
/// iframes from outside the syndication domain.
pub struct SecurityGate {
    scripts: ScriptScanner,
    script_injection: Regex,
    start_tag: Regex,
    handler_attr: Regex,
    js_uri: Regex,
    js_void: Regex,
    iframe: Regex,
    src_attr: Regex,
    syndication_domain: String,
}

impl SecurityGate {
    pub fn new(policy: &SnippetPolicy) -> std::result::Result<Self, PolicyError> {
        Ok(Self {
            scripts: ScriptScanner::new(policy)?,
            script_injection: Regex::new(r"(?i)\beval\b|\b(?:inner|outer)html\s*=(?:[^=]|\z)")?,
            start_tag: Regex::new(&format!(r"(?i)<([a-z][a-z0-9-]*)({TAG_ATTRS})>"))?,
            handler_attr: handler_attribute_regex()?,
            js_uri: Regex::new(r"(?i)javascript\s*:")?,
            // The no-op must be the whole URI: only a closing quote or the
            // end of input may follow.
            js_void: Regex::new(r#"(?i)^\s*void\s*\(\s*\d*\s*\)\s*;?\s*(?:["']|$)"#)?,
            iframe: Regex::new(&format!(r"(?i)<iframe\b({TAG_ATTRS})>"))?,
            src_attr: Regex::new(
                r#"(?i)(?:^|[\s/"'])(src|srcdoc)\s*=\s*(?:"([^"]*)"?|'([^']*)'?|([^\s>"']*))"#,
            )?,
            syndication_domain: policy.syndication_domain.to_ascii_lowercase(),
        })
    }

    /// Run every rule against an already-normalized snippet.
    pub fn check(&self, snippet: &str) -> Result<()> {
        if let Some(hit) = self
            .scripts
            .find_unexempted(snippet, &self.script_injection)
        {
            return Err(RejectionReason::dangerous(DangerKind::ScriptInjection, hit));
        }
        if let Some(hit) = self.find_event_handler(snippet, false) {
            return Err(RejectionReason::dangerous(DangerKind::EventHandler, hit));
        }
        if let Some(hit) = self.find_javascript_uri(snippet) {
            return Err(RejectionReason::dangerous(DangerKind::JavascriptUri, hit));
        }
        if let Some(hit) = self.find_foreign_iframe(snippet) {
            return Err(RejectionReason::dangerous(DangerKind::ForeignIframe, hit));
        }
        Ok(())
    }

    /// Whether any start tag carries an inline event handler, `<ins>` included.
    pub fn has_event_handler(&self, snippet: &str) -> bool {
        self.find_event_handler(snippet, true).is_some()
    }

    /// First `on*` attribute on a start tag.
    ///
    /// `<ins>` ad units are skipped unless `include_ins` is set: their
    /// attributes are owned by the ad-unit validator, which reports them
    /// with a more specific reason. An `<ins>` whose attribute text holds a
    /// `<` may be hiding another tag inside a quoted value, so it is scanned
    /// like any other tag.
    fn find_event_handler<'h>(&self, snippet: &'h str, include_ins: bool) -> Option<&'h str> {
        self.start_tag.captures_iter(snippet).find_map(|caps| {
            let tag = caps.get(1)?.as_str();
            let attrs = caps.get(2)?.as_str();
            if !include_ins && tag.eq_ignore_ascii_case("ins") && !attrs.contains('<') {
                return None;
            }
            self.handler_attr
                .captures(attrs)
                .and_then(|attr| attr.get(1))
                .map(|name| name.as_str())
        })
    }

    fn find_javascript_uri<'h>(&self, snippet: &'h str) -> Option<&'h str> {
        self.js_uri.find_iter(snippet).find_map(|m| {
            if self.js_void.is_match(&snippet[m.end()..]) {
                None
            } else {
                Some(&snippet[m.start()..])
            }
        })
    }

    fn find_foreign_iframe<'h>(&self, snippet: &'h str) -> Option<&'h str> {
        self.iframe.captures_iter(snippet).find_map(|caps| {
            let whole = caps.get(0)?.as_str();
            let attrs = caps.get(1).map_or("", |m| m.as_str());
            let mut trusted = false;
            for src in self.src_attr.captures_iter(attrs) {
                if src[1].eq_ignore_ascii_case("srcdoc") {
                    return Some(whole);
                }
                let value = src
                    .get(2)
                    .or_else(|| src.get(3))
                    .or_else(|| src.get(4))
                    .map_or("", |m| m.as_str());
                if !self.is_syndication_url(value) {
                    return Some(whole);
                }
                trusted = true;
            }
            (!trusted).then_some(whole)
        })
    }

    /// Whether `src` is an http(s) URL on the syndication domain or one of
    /// its subdomains. Protocol-relative URLs are resolved against `https:`.
    fn is_syndication_url(&self, src: &str) -> bool {
        let src = src.trim();
        let parsed = if src.starts_with("//") {
            Url::parse(&format!("https:{src}"))
        } else {
            Url::parse(src)
        };
        let Ok(url) = parsed else {
            return false;
        };
        if !matches!(url.scheme(), "http" | "https") {
            return false;
        }
        let Some(host) = url.host_str() else {
            return false;
        };
        let host = host.to_ascii_lowercase();
        host == self.syndication_domain
            || host
                .strip_suffix(&self.syndication_domain)
                .is_some_and(|rest| rest.ends_with('.'))
    }
}

/// Attribute-name match for `on*` handlers inside a tag's attribute string.
///
/// The name must start the attribute, so `data-onload` and `aria-*` do not
/// count.
pub(crate) fn handler_attribute_regex() -> std::result::Result<Regex, regex::Error> {
    Regex::new(r#"(?i)(?:^|[\s/"'])(on[a-z]{3,})\s*="#)
}

/// Same name set as [`handler_attribute_regex`], for a bare attribute name.
pub(crate) fn is_event_handler_name(name: &str) -> bool {
    let name = name.as_bytes();
    name.len() >= 5
        && name[..2].eq_ignore_ascii_case(b"on")
        && name[2..].iter().all(u8::is_ascii_alphabetic)
}
