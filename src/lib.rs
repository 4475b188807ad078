//! # ad_snippet_guard
//!
//! Validation and canonicalization of third-party ad markup before it is
//! rendered verbatim into a page.
//!
//! ## Overview
//!
//! Ad snippets are HTML/JS supplied by an ad network, stored in
//! configuration and pasted into ad slots. `ad_snippet_guard` checks one
//! against a narrow allow-list policy and either returns a
//! [`SanitizedSnippet`] that is safe to embed or a typed
//! [`RejectionReason`].
//!
//! The [`SnippetSanitizer`] pipeline runs five stages in a fixed order:
//! normalization, the security gate, the format check (including the `<ins>`
//! ad unit), content stripping and the final guard. It is pure and stateless:
//! no I/O, no shared mutable state, and every pattern is matched with the
//! linear-time `regex` engine, so adversarial input cannot trigger
//! catastrophic backtracking.
//!
//! ## Quick start
//!
//! ```rust
//! use ad_snippet_guard::{sanitize, extract_ad_slot};
//!
//! let raw = concat!(
//!     r#"<ins class="adsbygoogle" data-ad-client="ca-pub-1234567890123456" data-ad-slot="9876543210"></ins>"#,
//!     "\n<script>(adsbygoogle = window.adsbygoogle || []).push({});</script>",
//! );
//!
//! match sanitize(raw, Some("ca-pub-1234567890123456"), "desktop-banner") {
//!     Ok(snippet) => assert!(snippet.as_str().ends_with("</script>")),
//!     Err(reason) => panic!("rejected: {reason}"),
//! }
//! assert_eq!(extract_ad_slot(raw).as_deref(), Some("9876543210"));
//! ```
//!
//! The free functions use an engine built from [`SnippetPolicy::default`].
//! Build a [`SnippetSanitizer`] yourself for any other policy.

pub mod batch;
pub mod config;
pub mod context;
pub mod error;
pub mod extract;
pub mod sanitizer;

pub use batch::{BatchResult, RejectedSnippet};
pub use config::{SnippetPolicy, SnippetPolicyBuilder};
pub use context::{SanitizedSnippet, TrustContext};
pub use error::{DangerKind, InsViolation, PolicyError, RejectionReason, Result};
pub use extract::{ExtractedIdentifiers, Extractor};
pub use sanitizer::{
    ContentStripper, FinalGuard, FormatValidator, Normalizer, Sanitizer, SecurityGate,
    SnippetSanitizer,
};

use std::fmt;
use std::sync::OnceLock;

static DEFAULT_ENGINE: OnceLock<SnippetSanitizer> = OnceLock::new();

/// The shared engine for [`SnippetPolicy::default`], built on first use.
///
/// # Panics
///
/// Panics only if the built-in default policy fails to compile, which would
/// be a bug in this crate.
pub fn default_engine() -> &'static SnippetSanitizer {
    DEFAULT_ENGINE.get_or_init(|| {
        SnippetSanitizer::new(SnippetPolicy::default())
            .unwrap_or_else(|e| panic!("default snippet policy failed to compile: {e}"))
    })
}

/// Run the full pipeline with the default policy.
pub fn sanitize(
    raw: &str,
    expected_account: Option<&str>,
    context_label: &str,
) -> Result<SanitizedSnippet> {
    let mut ctx = TrustContext::new(context_label);
    if let Some(account) = expected_account {
        ctx = ctx.with_expected_account(account);
    }
    default_engine().sanitize(raw, &ctx)
}

/// Cheap, false-negative-tolerant pre-check with the default policy.
pub fn is_likely_valid(raw: &str) -> bool {
    default_engine().is_likely_valid(raw)
}

/// Trim and strip leading BOMs and zero-width characters.
pub fn normalize(raw: &str) -> String {
    Normalizer.sanitize(raw)
}

/// Decode raw bytes (lossily) and normalize them.
pub fn normalize_bytes(raw: &[u8]) -> String {
    Normalizer.normalize_bytes(raw)
}

/// Security-gate stage alone: script injection, event handlers, `javascript:`
/// URIs and foreign iframes.
pub fn check_security(snippet: &str) -> Result<()> {
    default_engine().check_security(snippet)
}

/// Format stage alone, including the `<ins>` ad-unit check.
pub fn check_format(snippet: &str, expected_account: Option<&str>) -> Result<()> {
    default_engine().check_format(snippet, expected_account)
}

/// Validate every `<ins>` ad unit in `snippet`.
pub fn check_ins_element(snippet: &str) -> Result<()> {
    default_engine().check_ins_element(snippet)
}

/// Drop non-directive comments and collapse whitespace. Never fails.
pub fn strip(snippet: &str) -> String {
    default_engine().strip(snippet)
}

/// Size bounds and the post-strip dialog-call sweep.
pub fn check_final(snippet: &str) -> Result<()> {
    default_engine().check_final(snippet)
}

/// First `ca-pub-<digits>` account identifier, if any.
pub fn extract_account_id(snippet: &str) -> Option<String> {
    default_engine().extract_account_id(snippet)
}

/// Digits of the `data-ad-slot` attribute, if any.
pub fn extract_ad_slot(snippet: &str) -> Option<String> {
    default_engine().extract_ad_slot(snippet)
}

/// Validate every named snippet with the default policy.
pub fn validate_multiple<K, S, I>(snippets: I, expected_account: Option<&str>) -> BatchResult<K>
where
    I: IntoIterator<Item = (K, S)>,
    K: Ord + fmt::Display,
    S: AsRef<str>,
{
    default_engine().validate_multiple(snippets, expected_account)
}
