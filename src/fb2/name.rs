//! File name derivation.

use super::{DOCUMENT_EXTENSION, SITE_MARKER, TITLE_SEPARATOR};

/// Literal substrings removed from a document name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameRules {
    /// Extension re-appended after cleaning, without the dot.
    pub extension: String,
    /// Removed first, everywhere it occurs.
    pub marker: String,
    /// Removed second, everywhere it occurs.
    pub separator: String,
}

impl Default for NameRules {
    fn default() -> Self {
        Self {
            extension: DOCUMENT_EXTENSION.to_string(),
            marker: SITE_MARKER.to_string(),
            separator: TITLE_SEPARATOR.to_string(),
        }
    }
}

impl NameRules {
    /// Derive the cleaned document name from an entry file name.
    ///
    /// Strips the extension, removes the marker and then the separator,
    /// trims whitespace and re-appends the extension. When nothing is left
    /// of the title, the trimmed original stem is used instead.
    pub fn derive(&self, name: &str) -> String {
        let stem = strip_extension(name);

        let mut cleaned = stem.to_string();
        if !self.marker.is_empty() {
            cleaned = cleaned.replace(&self.marker, "");
        }
        if !self.separator.is_empty() {
            cleaned = cleaned.replace(&self.separator, "");
        }

        let title = match cleaned.trim() {
            "" => stem.trim(),
            title => title,
        };
        format!("{title}.{}", self.extension)
    }
}

/// Derive a cleaned name with the royallib.com rules.
///
/// # Examples
///
/// ```
/// use fb2fix::fb2::derive_name;
///
/// assert_eq!(derive_name("Title - royallib.com.fb2"), "Title.fb2");
/// assert_eq!(derive_name("Title.fb2"), "Title.fb2");
/// ```
pub fn derive_name(name: &str) -> String {
    NameRules::default().derive(name)
}

/// Case-insensitive check of a file name's last extension.
pub fn has_extension(name: &str, extension: &str) -> bool {
    name.rsplit_once('.')
        .is_some_and(|(_, ext)| ext.eq_ignore_ascii_case(extension))
}

/// Everything before the last `.`, or the whole name when there is none.
fn strip_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(dot) => &name[..dot],
        None => name,
    }
}
