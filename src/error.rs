//! Error types for the `ad_snippet_guard` crate.
//!
//! [`RejectionReason`] is the expected, recoverable outcome of validating a
//! snippet. [`PolicyError`] is only produced while building a
//! [`SnippetPolicy`](crate::SnippetPolicy) or compiling it into an engine.

use std::fmt;

/// Maximum size of a quoted excerpt carried by a rejection, in bytes.
const EXCERPT_MAX: usize = 40;

/// Which security-gate rule rejected a snippet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DangerKind {
    /// A `<script>` body calling `eval` or assigning `innerHTML`/`outerHTML`.
    ScriptInjection,
    /// An inline `on*` event-handler attribute.
    EventHandler,
    /// A `javascript:` URI other than the `javascript:void(0)` no-op.
    JavascriptUri,
    /// An `<iframe>` not served from the syndication domain.
    ForeignIframe,
}

impl DangerKind {
    /// Stable label used in audit logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            DangerKind::ScriptInjection => "script-injection",
            DangerKind::EventHandler => "event-handler",
            DangerKind::JavascriptUri => "javascript-uri",
            DangerKind::ForeignIframe => "foreign-iframe",
        }
    }
}

impl fmt::Display for DangerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What is wrong with an `<ins>` ad-unit element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsViolation {
    /// The element does not carry the ad-unit CSS class.
    MissingClass,
    /// The account-identifier attribute is not `<prefix><digits>`.
    MalformedAccountId,
    /// The element carries an inline event handler (attribute name attached).
    EventHandler(String),
    /// An attribute outside the allow-list (strict attribute mode only).
    UnknownAttribute(String),
}

impl fmt::Display for InsViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InsViolation::MissingClass => f.write_str("missing ad-unit class"),
            InsViolation::MalformedAccountId => f.write_str("malformed account identifier"),
            InsViolation::EventHandler(name) => write!(f, "event handler attribute {name:?}"),
            InsViolation::UnknownAttribute(name) => write!(f, "unknown attribute {name:?}"),
        }
    }
}

/// Why a raw snippet was refused.
///
/// The caller is expected to render nothing for any variant; the variants
/// only differ for logging and audit. Excerpts are short and have their angle
/// brackets escaped, so a logged reason cannot re-render markup.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RejectionReason {
    /// Nothing left after normalization.
    #[error("Snippet is empty")]
    Empty,

    /// A security-gate rule matched.
    #[error("Dangerous content ({kind}): {excerpt:?}")]
    Dangerous { kind: DangerKind, excerpt: String },

    /// Neither the ad queue token nor the syndication domain is present.
    #[error("Snippet is not ad-network markup")]
    NotAdMarkup,

    /// The `<ins>` ad-unit element failed validation.
    #[error("Invalid ad unit element: {0}")]
    InvalidInsElement(InsViolation),

    /// The account identifier differs from the expected one (strict mode only).
    #[error("Account identifier mismatch: expected {expected:?}, found {found:?}")]
    AccountMismatch { expected: String, found: String },

    /// Sanitized output exceeds the size bound.
    #[error("Sanitized snippet too long: {len} bytes (max {max})")]
    TooLong { len: usize, max: usize },

    /// Sanitized output is below the size bound.
    #[error("Sanitized snippet too short: {len} bytes (min {min})")]
    TooShort { len: usize, min: usize },

    /// The post-strip XSS sweep matched.
    #[error("Suspicious output: {excerpt:?}")]
    SuspiciousOutput { excerpt: String },
}

impl RejectionReason {
    /// Stable, machine-readable label for audit logs.
    pub fn kind(&self) -> &'static str {
        match self {
            RejectionReason::Empty => "empty",
            RejectionReason::Dangerous { .. } => "dangerous",
            RejectionReason::NotAdMarkup => "not-ad-markup",
            RejectionReason::InvalidInsElement(_) => "invalid-ins-element",
            RejectionReason::AccountMismatch { .. } => "account-mismatch",
            RejectionReason::TooLong { .. } => "too-long",
            RejectionReason::TooShort { .. } => "too-short",
            RejectionReason::SuspiciousOutput { .. } => "suspicious-output",
        }
    }

    pub(crate) fn dangerous(kind: DangerKind, matched: &str) -> Self {
        RejectionReason::Dangerous {
            kind,
            excerpt: excerpt(matched),
        }
    }
}

/// Errors raised while building a policy or compiling it into an engine.
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    /// A pattern derived from the policy failed to compile.
    #[error("Invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// The element selector failed to parse.
    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    /// A required token was configured as an empty string.
    #[error("Policy token `{0}` must not be empty")]
    EmptyToken(&'static str),

    /// The size bounds are inverted.
    #[error("Invalid size bounds: min {min} > max {max}")]
    InvalidBounds { min: usize, max: usize },
}

/// A type alias for `Result<T, RejectionReason>`.
pub type Result<T> = std::result::Result<T, RejectionReason>;

/// Cut `matched` down to a loggable excerpt that cannot be read back as markup.
pub(crate) fn excerpt(matched: &str) -> String {
    let mut cut = matched.len().min(EXCERPT_MAX);
    while !matched.is_char_boundary(cut) {
        cut -= 1;
    }
    matched[..cut].replace('<', "&lt;").replace('>', "&gt;")
}
