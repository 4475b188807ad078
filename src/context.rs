//! Per-call trust context and the sanitized output type.

use std::fmt;

/// Where a snippet is used and which account it is expected to belong to.
///
/// The label only feeds diagnostics; it never changes a validation outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrustContext {
    expected_account: Option<String>,
    label: String,
}

impl TrustContext {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            expected_account: None,
            label: label.into(),
        }
    }

    /// Cross-check the snippet's account identifier against `account`.
    pub fn with_expected_account(mut self, account: impl Into<String>) -> Self {
        self.expected_account = Some(account.into());
        self
    }

    pub fn expected_account(&self) -> Option<&str> {
        self.expected_account.as_deref()
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

/// Markup that passed every stage of the pipeline and may be embedded
/// verbatim into an ad slot.
///
/// Only the engine can construct one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SanitizedSnippet(String);

impl SanitizedSnippet {
    pub(crate) fn new(markup: String) -> Self {
        Self(markup)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<str> for SanitizedSnippet {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SanitizedSnippet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<SanitizedSnippet> for String {
    fn from(snippet: SanitizedSnippet) -> Self {
        snippet.0
    }
}
