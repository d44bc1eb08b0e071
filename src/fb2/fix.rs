//! Encoding declaration rewrite and removal of injected markup.

use std::borrow::Cow;

use memchr::memmem;

use super::patterns::WINDOWS_1251_DECL_RE;
use crate::util::{decode_utf8, decode_with};

const UTF8_DECLARATION: &str = r#" encoding="utf-8""#;

/// Injected blocks as (opening tag, closing tag), removed in this order.
const INJECTED_BLOCKS: [(&[u8], &[u8]); 2] = [
    (b"<myheader>", b"</myheader>"),
    (b"<myfooter>", b"</myfooter>"),
];

/// A repaired document, ready to be written out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedDocument {
    /// UTF-8 when `reencoded`, otherwise the source bytes minus the
    /// injected blocks.
    pub bytes: Vec<u8>,
    /// The source declared windows-1251 and was re-decoded from it.
    pub reencoded: bool,
}

/// Whether `text` carries an XML `encoding="windows-1251"` declaration.
pub fn declares_windows_1251(text: &str) -> bool {
    WINDOWS_1251_DECL_RE.is_match(text)
}

/// Remove every `<myheader>…</myheader>` and `<myfooter>…</myfooter>` span.
///
/// Matching is case-sensitive and runs from an opening tag to the first
/// closing tag after it, across line breaks. Works on raw bytes, so text in
/// any ASCII-compatible encoding passes through untouched.
pub fn strip_injected_blocks(bytes: &[u8]) -> Cow<'_, [u8]> {
    let mut out = Cow::Borrowed(bytes);
    for (open, close) in INJECTED_BLOCKS {
        let stripped = match strip_blocks(&out, open, close) {
            Cow::Owned(stripped) => Some(stripped),
            Cow::Borrowed(_) => None,
        };
        if let Some(stripped) = stripped {
            out = Cow::Owned(stripped);
        }
    }
    out
}

fn strip_blocks<'a>(bytes: &'a [u8], open: &[u8], close: &[u8]) -> Cow<'a, [u8]> {
    let open_finder = memmem::Finder::new(open);
    let close_finder = memmem::Finder::new(close);

    let mut out: Option<Vec<u8>> = None;
    let mut pos = 0;
    while let Some(start) = open_finder.find(&bytes[pos..]).map(|i| pos + i) {
        let body = start + open.len();
        // An unclosed tag here means no later opening tag is closed either
        let Some(end) = close_finder.find(&bytes[body..]).map(|i| body + i + close.len()) else {
            break;
        };
        out.get_or_insert_with(|| Vec::with_capacity(bytes.len()))
            .extend_from_slice(&bytes[pos..start]);
        pos = end;
    }

    match out {
        Some(mut stripped) => {
            stripped.extend_from_slice(&bytes[pos..]);
            Cow::Owned(stripped)
        }
        None => Cow::Borrowed(bytes),
    }
}

/// Repair raw document bytes.
///
/// The declaration is looked for in the bytes read as UTF-8. If the text
/// declares windows-1251, the bytes are decoded with that code page and the
/// declaration is rewritten to UTF-8. Otherwise the bytes are kept as they
/// are. Injected header and footer blocks are removed either way.
pub fn fix_document(bytes: &[u8]) -> FixedDocument {
    if declares_windows_1251(&decode_utf8(bytes)) {
        let legacy = decode_with(encoding_rs::WINDOWS_1251, bytes);
        let rewritten = WINDOWS_1251_DECL_RE.replace_all(&legacy, UTF8_DECLARATION);
        FixedDocument {
            bytes: strip_injected_blocks(rewritten.as_bytes()).into_owned(),
            reencoded: true,
        }
    } else {
        FixedDocument {
            bytes: strip_injected_blocks(bytes).into_owned(),
            reencoded: false,
        }
    }
}
