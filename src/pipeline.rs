//! Archive conversion pipeline.
//!
//! [`Fixer::process_one`] turns one royallib.com download into a cleaned
//! archive next to it; [`Fixer::fix_all`] drives a batch of them, isolating
//! failures per archive.

use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use glob::MatchOptions;
use zip::ZipArchive;

use crate::archive::{extract_entry, find_document, list_entries, write_single_entry};
use crate::error::{Error, Result};
use crate::fb2::{ARCHIVE_EXTENSION, NameRules, fix_document};
use crate::workspace::WorkspaceBuilder;

/// Configuration for [`Fixer`].
#[derive(Debug, Clone)]
pub struct FixConfig {
    /// How document names are cleaned, including the document extension.
    pub names: NameRules,
    /// Extension appended to the cleaned document name for the output
    /// archive, without the dot.
    pub archive_extension: String,
    /// Leave each temporary workspace on disk after processing.
    pub keep_workspace: bool,
    /// Parent directory for workspaces. Defaults to the system temp dir.
    pub workspace_root: Option<PathBuf>,
}

impl Default for FixConfig {
    fn default() -> Self {
        Self {
            names: NameRules::default(),
            archive_extension: ARCHIVE_EXTENSION.to_string(),
            keep_workspace: false,
            workspace_root: None,
        }
    }
}

impl FixConfig {
    pub fn with_name_rules(mut self, names: NameRules) -> Self {
        self.names = names;
        self
    }

    pub fn with_archive_extension(mut self, extension: impl Into<String>) -> Self {
        self.archive_extension = extension.into();
        self
    }

    pub fn with_keep_workspace(mut self, keep: bool) -> Self {
        self.keep_workspace = keep;
        self
    }

    pub fn with_workspace_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.workspace_root = Some(root.into());
        self
    }
}

/// Outcome of repairing one archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixReport {
    /// The input archive.
    pub source: PathBuf,
    /// Name of the document entry that was processed.
    pub entry_name: String,
    /// Cleaned document name, also the sole entry of the output.
    pub document_name: String,
    /// The archive that was written.
    pub output: PathBuf,
    /// The document was converted from windows-1251.
    pub reencoded: bool,
    /// The input archive was deleted because the output path differs.
    pub source_removed: bool,
    /// Workspace left on disk when [`FixConfig::keep_workspace`] is set.
    pub kept_workspace: Option<PathBuf>,
}

/// Result of a batch run.
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub fixed: Vec<FixReport>,
    pub failures: Vec<(PathBuf, Error)>,
}

impl BatchSummary {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// 0 when every archive was fixed, otherwise the highest
    /// [`Error::exit_code`] among the failures.
    pub fn exit_code(&self) -> u8 {
        self.failures
            .iter()
            .map(|(_, e)| e.exit_code())
            .max()
            .unwrap_or(0)
    }
}

/// Repairs royallib.com archives.
///
/// # Example
///
/// ```no_run
/// use fb2fix::Fixer;
///
/// let report = Fixer::new().process_one("Title - royallib.com.fb2.zip".as_ref())?;
/// println!("Packed to {}", report.output.display());
/// # Ok::<(), fb2fix::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Fixer {
    config: FixConfig,
}

impl Fixer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: FixConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FixConfig {
        &self.config
    }

    /// Repair one archive.
    ///
    /// The document is staged in a fresh workspace which is released when
    /// this returns, whether it succeeded or not.
    pub fn process_one(&self, archive_path: &Path) -> Result<FixReport> {
        tracing::info!(archive = %archive_path.display(), "processing");
        let workspace = self.workspace_builder().acquire()?;

        let entry_name = {
            let mut archive = ZipArchive::new(BufReader::new(File::open(archive_path)?))?;
            let entries = list_entries(&mut archive)?;
            let entry = find_document(&entries, &self.config.names.extension)
                .ok_or_else(|| Error::DocumentNotFound(archive_path.to_path_buf()))?;

            let staged = workspace.full_path(entry.file_name());
            let size = extract_entry(&mut archive, entry.index, &staged)?;
            tracing::debug!(entry = %entry.name, legacy_name = entry.legacy_name, size, "extracted");
            entry.file_name().to_string()
        };

        let document_name = self.config.names.derive(&entry_name);
        workspace.rename(&entry_name, &document_name)?;

        let staged = workspace.full_path(&document_name);
        let fixed = fix_document(&fs::read(&staged)?);
        fs::write(&staged, &fixed.bytes)?;
        tracing::debug!(reencoded = fixed.reencoded, "rewrote document");

        let output = output_path(archive_path, &document_name, &self.config.archive_extension);
        // Decided before anything is removed: once the output is gone the
        // two paths can no longer be compared on disk.
        let in_place = is_same_file(&output, archive_path);
        if output.exists() {
            fs::remove_file(&output)?;
        }
        write_single_entry(&output, &staged)?;

        let source_removed = !in_place;
        if source_removed {
            fs::remove_file(archive_path)?;
        }

        tracing::info!(output = %output.display(), "packed");
        Ok(FixReport {
            source: archive_path.to_path_buf(),
            entry_name,
            document_name,
            output,
            reencoded: fixed.reencoded,
            source_removed,
            kept_workspace: workspace.is_kept().then(|| workspace.path().to_path_buf()),
        })
    }

    /// Repair every archive in `inputs`, in order.
    ///
    /// A failing archive does not stop the batch. `observe` is called after
    /// each archive with its outcome.
    pub fn fix_all<I, F>(&self, inputs: I, mut observe: F) -> BatchSummary
    where
        I: IntoIterator<Item = PathBuf>,
        F: FnMut(&Path, &Result<FixReport>),
    {
        let mut summary = BatchSummary::default();
        for path in inputs {
            let result = self.process_one(&path);
            observe(&path, &result);
            match result {
                Ok(report) => summary.fixed.push(report),
                Err(e) => {
                    tracing::warn!(archive = %path.display(), error = %e, "failed");
                    summary.failures.push((path, e));
                }
            }
        }
        summary
    }

    fn workspace_builder(&self) -> WorkspaceBuilder {
        let mut builder = WorkspaceBuilder::new().keep(self.config.keep_workspace);
        if let Some(root) = &self.config.workspace_root {
            builder = builder.root(root);
        }
        builder
    }
}

/// Where the repacked archive for `document_name` goes: next to the input.
pub fn output_path(archive_path: &Path, document_name: &str, archive_extension: &str) -> PathBuf {
    let dir = archive_path.parent().unwrap_or(Path::new(""));
    dir.join(format!("{document_name}.{archive_extension}"))
}

/// Whether both paths name the same existing file.
///
/// Path spelling is not enough: on a case-insensitive filesystem
/// `Book.FB2.zip` and `Book.fb2.zip` are one file.
fn is_same_file(a: &Path, b: &Path) -> bool {
    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;
        match (fs::metadata(a), fs::metadata(b)) {
            (Ok(m1), Ok(m2)) => m1.dev() == m2.dev() && m1.ino() == m2.ino(),
            _ => false,
        }
    }
    #[cfg(not(unix))]
    {
        match (fs::canonicalize(a), fs::canonicalize(b)) {
            (Ok(p1), Ok(p2)) => p1 == p2,
            _ => false,
        }
    }
}

/// Expand the command-line argument into the archives to process.
///
/// A path naming an existing file is taken literally. Anything else is a
/// glob pattern whose wildcards never cross a directory separator; only
/// regular files are returned.
pub fn resolve_inputs(pattern: &str) -> Result<Vec<PathBuf>> {
    let literal = Path::new(pattern);
    if literal.is_file() {
        return Ok(vec![literal.to_path_buf()]);
    }

    let options = MatchOptions {
        case_sensitive: !cfg!(windows),
        require_literal_separator: true,
        require_literal_leading_dot: false,
    };

    let mut files = Vec::new();
    for entry in glob::glob_with(pattern, options)? {
        let path = entry?;
        if path.is_file() {
            files.push(path);
        }
    }
    Ok(files)
}
