//! Cached regex patterns for FB2 repair.

use regex_lite::Regex;
use std::sync::LazyLock;

/// Matches an XML declaration's ` encoding="windows-1251"` attribute
pub static WINDOWS_1251_DECL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#" encoding\s*=\s*"windows-1251""#).unwrap()
});
