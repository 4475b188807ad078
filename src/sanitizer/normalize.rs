//! Leading BOM and invisible-whitespace removal.

use super::Sanitizer;

/// Characters that render as nothing but can hide in front of markup.
const INVISIBLE_LEADERS: &[char] = &['\u{200B}', '\u{200C}', '\u{200D}', '\u{FEFF}'];

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Trims ASCII whitespace and strips byte-order marks and zero-width spaces
/// from the front of a snippet.
///
/// Leading whitespace and invisible characters are removed together until
/// neither remains, so a BOM hidden behind a space (or a space behind a BOM)
/// is caught. The result is idempotent.
///
/// ```
/// use ad_snippet_guard::{Normalizer, Sanitizer};
///
/// let out = Normalizer.sanitize("\u{FEFF}  \u{200B}<ins></ins>\n");
/// assert_eq!(out, "<ins></ins>");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Normalizer;

impl Normalizer {
    /// Decode raw configuration bytes and normalize them.
    ///
    /// A leading UTF-8 BOM is dropped before decoding; invalid sequences are
    /// replaced with U+FFFD rather than rejected.
    pub fn normalize_bytes(&self, raw: &[u8]) -> String {
        let raw = raw.strip_prefix(UTF8_BOM).unwrap_or(raw);
        trim_snippet(&String::from_utf8_lossy(raw)).to_string()
    }
}

impl Sanitizer for Normalizer {
    fn sanitize(&self, html: &str) -> String {
        trim_snippet(html).to_string()
    }
}

/// Borrowing form of the normalization, shared with the content stripper.
pub(crate) fn trim_snippet(s: &str) -> &str {
    s.trim_start_matches(|c: char| c.is_ascii_whitespace() || INVISIBLE_LEADERS.contains(&c))
        .trim_end_matches(|c: char| c.is_ascii_whitespace())
}
