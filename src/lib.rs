//! # fb2fix
//!
//! Repairs FictionBook e-books downloaded from royallib.com.
//!
//! Each download is a ZIP holding one `.fb2` document whose entry name is
//! stored in the DOS Cyrillic code page, whose text is often windows-1251,
//! and which carries injected `<myheader>`/`<myfooter>` blocks. Repairing an
//! archive:
//!
//! - extracts the document into a scoped temporary [`Workspace`]
//! - renames it to a cleaned title (`Title - royallib.com.fb2` → `Title.fb2`)
//! - re-encodes windows-1251 text as UTF-8 and fixes the XML declaration
//! - strips the injected blocks
//! - repacks it as `Title.fb2.zip` next to the original, which is removed
//!
//! ## Quick Start
//!
//! ```no_run
//! use fb2fix::{Fixer, resolve_inputs};
//!
//! let fixer = Fixer::new();
//! let inputs = resolve_inputs("downloads/*.fb2.zip")?;
//! let summary = fixer.fix_all(inputs, |_, _| {});
//! println!("{} fixed, {} failed", summary.fixed.len(), summary.failures.len());
//! # Ok::<(), fb2fix::Error>(())
//! ```
//!
//! The document transformations are available on their own:
//!
//! ```
//! use fb2fix::fb2::{derive_name, fix_document};
//!
//! assert_eq!(derive_name("Title - royallib.com.fb2"), "Title.fb2");
//!
//! let fixed = fix_document(b"<p>text</p><myfooter>junk</myfooter>");
//! assert_eq!(fixed.bytes, b"<p>text</p>");
//! ```

pub mod archive;
pub mod error;
pub mod fb2;
pub mod pipeline;
pub(crate) mod util;
pub mod workspace;

pub use error::{Error, Result};
pub use pipeline::{BatchSummary, FixConfig, FixReport, Fixer, resolve_inputs};
pub use workspace::{Workspace, WorkspaceBuilder};
