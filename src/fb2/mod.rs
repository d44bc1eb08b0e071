//! FictionBook document repair.
//!
//! Pure transformations applied to a royallib.com download: deriving a clean
//! file name from the archive entry, and repairing the document text itself.

mod fix;
mod name;
mod patterns;

pub use fix::{FixedDocument, declares_windows_1251, fix_document, strip_injected_blocks};
pub use name::{NameRules, derive_name, has_extension};

/// Extension of the document inside a download archive.
pub const DOCUMENT_EXTENSION: &str = "fb2";

/// Extension appended to the repacked archive.
pub const ARCHIVE_EXTENSION: &str = "zip";

/// Site marker royallib.com inserts into file names.
pub const SITE_MARKER: &str = "royallib.com";

/// Separator left around the title once the marker is gone.
pub const TITLE_SEPARATOR: &str = " - ";
