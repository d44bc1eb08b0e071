//! ZIP access for download archives.
//!
//! royallib.com archives store entry names in the DOS Cyrillic code page
//! (IBM866) without setting the ZIP UTF-8 flag. The `zip` crate decodes such
//! names as CP437, so names are re-decoded here from their raw bytes.

use std::fs::File;
use std::io::{self, Read, Seek, Write};
use std::path::Path;

use encoding_rs::Encoding;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::Result;
use crate::fb2::has_extension;

/// Code page used for entry names that lack the UTF-8 flag.
pub static ENTRY_NAME_ENCODING: &Encoding = &encoding_rs::IBM866_INIT;

/// An entry in an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryInfo {
    /// Position in the central directory.
    pub index: usize,
    /// Decoded entry name, as stored (may contain directories).
    pub name: String,
    /// The name was decoded from [`ENTRY_NAME_ENCODING`].
    pub legacy_name: bool,
}

impl EntryInfo {
    /// The last path component of the entry name.
    pub fn file_name(&self) -> &str {
        entry_file_name(&self.name)
    }
}

/// Decode an entry name from its raw bytes.
///
/// `decoded` is the name as reported by the `zip` crate, which is UTF-8 when
/// the entry carries the UTF-8 flag and CP437 otherwise. Returns the name
/// and whether the legacy code page was used.
pub fn decode_entry_name(raw: &[u8], decoded: &str) -> (String, bool) {
    if raw.is_ascii() {
        return (decoded.to_string(), false);
    }
    if std::str::from_utf8(raw).is_ok_and(|utf8| utf8 == decoded) {
        return (decoded.to_string(), false);
    }
    let (name, _) = ENTRY_NAME_ENCODING.decode_without_bom_handling(raw);
    (name.into_owned(), true)
}

/// The last `/` or `\` separated component of an entry name.
pub fn entry_file_name(name: &str) -> &str {
    name.rsplit(['/', '\\']).next().unwrap_or(name)
}

/// List the file entries of an archive, skipping directories.
pub fn list_entries<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Result<Vec<EntryInfo>> {
    let mut entries = Vec::with_capacity(archive.len());
    for index in 0..archive.len() {
        let file = archive.by_index(index)?;
        if file.is_dir() {
            continue;
        }
        let (name, legacy_name) = decode_entry_name(file.name_raw(), file.name());
        entries.push(EntryInfo {
            index,
            name,
            legacy_name,
        });
    }
    Ok(entries)
}

/// Pick the document entry with the given extension.
///
/// When several entries match, the last one in the archive wins.
pub fn find_document<'a>(entries: &'a [EntryInfo], extension: &str) -> Option<&'a EntryInfo> {
    let (count, last) = entries
        .iter()
        .filter(|e| has_extension(e.file_name(), extension))
        .fold((0usize, None), |(count, _), e| (count + 1, Some(e)));

    if let Some(chosen) = last.filter(|_| count > 1) {
        tracing::warn!(
            count,
            chosen = %chosen.name,
            "archive holds several .{extension} entries, using the last one"
        );
    }
    last
}

/// Extract one entry to `dest`, replacing any existing file.
pub fn extract_entry<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    index: usize,
    dest: &Path,
) -> Result<u64> {
    let mut file = archive.by_index(index)?;
    let mut out = File::create(dest)?;
    let written = io::copy(&mut file, &mut out)?;
    out.flush()?;
    Ok(written)
}

/// Create a ZIP at `path` whose only entry is the file at `source`,
/// stored under its file name.
///
/// Names are not written back in [`ENTRY_NAME_ENCODING`]: `ZipWriter` only
/// emits UTF-8, so a non-ASCII name is stored as UTF-8 with the ZIP UTF-8
/// flag set.
pub fn write_single_entry(path: &Path, source: &Path) -> Result<()> {
    let entry_name = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "source has no file name"))?;
    let data = std::fs::read(source)?;

    let mut zip = ZipWriter::new(File::create(path)?);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    zip.start_file(entry_name.as_str(), options)?;
    zip.write_all(&data)?;
    zip.finish()?;
    Ok(())
}
