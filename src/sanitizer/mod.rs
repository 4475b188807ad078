//! The snippet validation pipeline.
//!
//! Stages run strictly in order and the first failure aborts:
//!
//! 1. [`Normalizer`] -- BOM and invisible-whitespace removal, trimming.
//! 2. [`SecurityGate`] -- script injection, event handlers, `javascript:`
//!    URIs, foreign iframes.
//! 3. [`FormatValidator`] -- ad-network tokens, account cross-check, `<ins>`
//!    ad unit.
//! 4. [`ContentStripper`] -- comment removal, whitespace collapsing.
//! 5. [`FinalGuard`] -- size bounds and the post-strip XSS sweep.
//!
//! [`SnippetSanitizer`] owns one compiled instance of every stage.

mod format;
mod guard;
mod normalize;
mod script;
mod security;
mod strip;

pub use format::FormatValidator;
pub use guard::FinalGuard;
pub use normalize::Normalizer;
pub use security::SecurityGate;
pub use strip::ContentStripper;

use crate::config::SnippetPolicy;
use crate::context::{SanitizedSnippet, TrustContext};
use crate::error::{PolicyError, RejectionReason, Result};
use crate::extract::{ExtractedIdentifiers, Extractor};

/// Trait for the rewriting stages of the pipeline.
///
/// Implementations are total: they always return a string and never reject.
/// They must be `Send + Sync` so one engine can serve concurrent callers.
pub trait Sanitizer: Send + Sync {
    /// Transform the given markup, returning the rewritten result.
    fn sanitize(&self, html: &str) -> String;
}

/// Compiled, immutable validation engine for one [`SnippetPolicy`].
///
/// The engine holds no mutable state; share it by reference across threads.
///
/// # Example
///
/// ```
/// use ad_snippet_guard::{SnippetPolicy, SnippetSanitizer, TrustContext};
///
/// let engine = SnippetSanitizer::new(SnippetPolicy::default()).unwrap();
/// let ctx = TrustContext::new("desktop-banner");
///
/// let ok = engine.sanitize(
///     "<script>(adsbygoogle = window.adsbygoogle || []).push({});</script>",
///     &ctx,
/// );
/// assert!(ok.is_ok());
///
/// let err = engine.sanitize(r#"<a href="javascript:alert(1)">adsbygoogle</a>"#, &ctx);
/// assert_eq!(err.unwrap_err().kind(), "dangerous");
/// ```
pub struct SnippetSanitizer {
    policy: SnippetPolicy,
    normalizer: Normalizer,
    security: SecurityGate,
    format: FormatValidator,
    stripper: ContentStripper,
    guard: FinalGuard,
    extractor: Extractor,
}

impl SnippetSanitizer {
    /// Compile every stage for `policy`.
    pub fn new(policy: SnippetPolicy) -> std::result::Result<Self, PolicyError> {
        Ok(Self {
            normalizer: Normalizer,
            security: SecurityGate::new(&policy)?,
            format: FormatValidator::new(&policy)?,
            stripper: ContentStripper::new(&policy)?,
            guard: FinalGuard::new(&policy)?,
            extractor: Extractor::new(&policy)?,
            policy,
        })
    }

    pub fn policy(&self) -> &SnippetPolicy {
        &self.policy
    }

    /// Run the full pipeline on a raw snippet.
    ///
    /// Rejections are logged with the context label and the reason; the raw
    /// snippet itself is never logged.
    pub fn sanitize(&self, raw: &str, ctx: &TrustContext) -> Result<SanitizedSnippet> {
        let normalized = self.normalizer.sanitize(raw);
        self.finish(normalized, ctx)
    }

    /// Like [`sanitize`](Self::sanitize), for snippets still held as bytes.
    pub fn sanitize_bytes(&self, raw: &[u8], ctx: &TrustContext) -> Result<SanitizedSnippet> {
        let normalized = self.normalizer.normalize_bytes(raw);
        self.finish(normalized, ctx)
    }

    fn finish(&self, normalized: String, ctx: &TrustContext) -> Result<SanitizedSnippet> {
        let result = self.run(normalized, ctx);
        match &result {
            Ok(out) => tracing::debug!(context = ctx.label(), len = out.len(), "Snippet accepted"),
            Err(reason) => tracing::info!(
                context = ctx.label(),
                kind = reason.kind(),
                "Snippet rejected: {reason}"
            ),
        }
        result
    }

    fn run(&self, normalized: String, ctx: &TrustContext) -> Result<SanitizedSnippet> {
        if normalized.is_empty() {
            return Err(RejectionReason::Empty);
        }
        tracing::debug!(context = ctx.label(), len = normalized.len(), "Normalized snippet");

        self.security.check(&normalized)?;
        self.format.check(
            &normalized,
            ctx.expected_account(),
            &self.extractor,
            ctx.label(),
        )?;

        let stripped = self.stripper.sanitize(&normalized);
        tracing::debug!(context = ctx.label(), len = stripped.len(), "Stripped snippet");

        self.guard.check(&stripped)?;
        // Stripping drops comments and the tokens inside them, so the output
        // has to pass the earlier stages on its own.
        if stripped != normalized {
            self.security.check(&stripped)?;
            self.format.check_structure(&stripped)?;
        }

        Ok(SanitizedSnippet::new(stripped))
    }

    /// Cheap pre-filter that tolerates false negatives.
    ///
    /// Requires both the ad queue token and the syndication domain and no
    /// event handler anywhere. Never a substitute for [`sanitize`](Self::sanitize).
    pub fn is_likely_valid(&self, raw: &str) -> bool {
        let normalized = self.normalizer.sanitize(raw);
        !normalized.is_empty()
            && self.format.has_both_tokens(&normalized)
            && !self.security.has_event_handler(&normalized)
    }

    pub fn normalize(&self, raw: &str) -> String {
        self.normalizer.sanitize(raw)
    }

    pub fn normalize_bytes(&self, raw: &[u8]) -> String {
        self.normalizer.normalize_bytes(raw)
    }

    pub fn check_security(&self, snippet: &str) -> Result<()> {
        self.security.check(snippet)
    }

    /// Format stage on its own. Account discrepancies are logged without a
    /// context label.
    pub fn check_format(&self, snippet: &str, expected_account: Option<&str>) -> Result<()> {
        self.format.check(snippet, expected_account, &self.extractor, "")
    }

    pub fn check_ins_element(&self, snippet: &str) -> Result<()> {
        self.format.check_ins_element(snippet)
    }

    pub fn strip(&self, snippet: &str) -> String {
        self.stripper.sanitize(snippet)
    }

    pub fn check_final(&self, snippet: &str) -> Result<()> {
        self.guard.check(snippet)
    }

    pub fn extract_account_id(&self, snippet: &str) -> Option<String> {
        self.extractor.account_id(snippet)
    }

    pub fn extract_ad_slot(&self, snippet: &str) -> Option<String> {
        self.extractor.ad_slot(snippet)
    }

    pub fn extract(&self, snippet: &str) -> ExtractedIdentifiers {
        self.extractor.extract(snippet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DangerKind, InsViolation};

    const LOADER: &str = r#"<script async src="https://pagead2.googlesyndication.com/pagead/js/adsbygoogle.js?client=ca-pub-1234567890123456" crossorigin="anonymous"></script>"#;
    const UNIT: &str = r#"<ins class="adsbygoogle" style="display:block" data-ad-client="ca-pub-1234567890123456" data-ad-slot="9876543210" data-ad-format="auto"></ins>"#;
    const PUSH: &str = "<script>(adsbygoogle = window.adsbygoogle || []).push({});</script>";

    fn engine() -> SnippetSanitizer {
        SnippetSanitizer::new(SnippetPolicy::default()).unwrap()
    }

    fn ctx() -> TrustContext {
        TrustContext::new("test-slot")
    }

    #[test]
    fn full_unit_is_canonicalized() {
        let raw = format!("\u{FEFF}\n  <!-- AdSense -->\n{LOADER}\n<!-- display -->\n{UNIT}\n{PUSH}\n");
        let out = engine().sanitize(&raw, &ctx()).unwrap();
        assert_eq!(out.as_str(), format!("{LOADER}{UNIT}{PUSH}"));
    }

    #[test]
    fn empty_after_normalization() {
        assert_eq!(
            engine().sanitize(" \u{FEFF}\u{200B} ", &ctx()),
            Err(RejectionReason::Empty)
        );
    }

    #[test]
    fn security_runs_before_format() {
        let err = engine()
            .sanitize(r#"<iframe src="https://evil.example.com"></iframe>"#, &ctx())
            .unwrap_err();
        assert!(matches!(
            err,
            RejectionReason::Dangerous {
                kind: DangerKind::ForeignIframe,
                ..
            }
        ));
    }

    #[test]
    fn ad_unit_handler_reports_ins_violation() {
        let err = engine()
            .sanitize(r#"<ins class="adsbygoogle" onclick="alert(1)"></ins>"#, &ctx())
            .unwrap_err();
        assert_eq!(
            err,
            RejectionReason::InvalidInsElement(InsViolation::EventHandler("onclick".into()))
        );
    }

    #[test]
    fn comment_removal_cannot_assemble_a_script() {
        let raw = format!("{PUSH}<scr<!-- x -->ipt>eval(name)</script>");
        let out = engine().sanitize(&raw, &ctx()).unwrap();
        assert_eq!(out.as_str().matches("<script").count(), 1);
        assert!(out.as_str().contains("<scr ipt>"));
    }

    #[test]
    fn tokens_only_in_removed_comments_are_not_enough() {
        let raw = "<div class=\"promo\">Great offer inside</div><!-- googlesyndication.com -->";
        assert_eq!(
            engine().sanitize(raw, &ctx()),
            Err(RejectionReason::NotAdMarkup)
        );
    }

    #[test]
    fn bytes_entry_point_drops_bom() {
        let mut raw = vec![0xEF, 0xBB, 0xBF, b' '];
        raw.extend_from_slice(PUSH.as_bytes());
        let out = engine().sanitize_bytes(&raw, &ctx()).unwrap();
        assert_eq!(out.as_str(), PUSH);
    }

    #[test]
    fn likely_valid_requires_both_tokens() {
        let e = engine();
        assert!(e.is_likely_valid(&format!("{LOADER}{UNIT}{PUSH}")));
        assert!(!e.is_likely_valid(PUSH));
        assert!(!e.is_likely_valid(""));
    }

    #[test]
    fn likely_valid_rejects_any_handler() {
        let raw = format!(r#"{LOADER}<ins class="adsbygoogle" onload="x()"></ins>"#);
        assert!(!engine().is_likely_valid(&raw));
    }

    #[test]
    fn stricter_policy_is_honoured() {
        let policy = SnippetPolicy::builder()
            .strict_account_match(true)
            .build()
            .unwrap();
        let engine = SnippetSanitizer::new(policy).unwrap();
        let ctx = TrustContext::new("mobile").with_expected_account("ca-pub-999");
        let err = engine
            .sanitize(&format!("{UNIT}{PUSH}"), &ctx)
            .unwrap_err();
        assert_eq!(err.kind(), "account-mismatch");
    }

    #[test]
    fn engine_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SnippetSanitizer>();
    }
}
