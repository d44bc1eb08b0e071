//! Scoped temporary workspace.
//!
//! A [`Workspace`] owns a freshly created directory named
//! `<prefix>.<8 hex digits>.<extension>` under the system temp directory.
//! Files staged in it live exactly as long as the handle: dropping the
//! workspace (or calling [`Workspace::release`]) removes the directory and
//! everything below it, unless the workspace was acquired with
//! [`WorkspaceBuilder::keep`].
//!
//! # Example
//!
//! ```no_run
//! use fb2fix::workspace::WorkspaceBuilder;
//!
//! let staged = WorkspaceBuilder::new().scoped(|ws| {
//!     std::fs::write(ws.full_path("a.txt"), b"hello")?;
//!     ws.rename("a.txt", "b.txt")?;
//!     Ok::<_, fb2fix::Error>(ws.full_path("b.txt"))
//! })?;
//! assert!(!staged.exists());
//! # Ok::<(), fb2fix::Error>(())
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::util::Lcg;

const DEFAULT_EXTENSION: &str = "tmp";

/// Random directory suffixes are drawn from this range so they always
/// format as exactly 8 hex digits.
const SUFFIX_RANGE: (u32, u32) = (0x1000_0000, 0x7FFF_FFFF);

/// Options for acquiring a [`Workspace`].
#[derive(Debug, Clone, Default)]
pub struct WorkspaceBuilder {
    prefix: Option<String>,
    extension: Option<String>,
    root: Option<PathBuf>,
    keep: bool,
}

impl WorkspaceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory name prefix. Defaults to the package name.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Directory name extension. Defaults to `tmp`.
    pub fn extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = Some(extension.into());
        self
    }

    /// Parent directory. Defaults to [`std::env::temp_dir`].
    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    /// Leave the directory on disk when the workspace is released.
    pub fn keep(mut self, keep: bool) -> Self {
        self.keep = keep;
        self
    }

    /// Create the workspace directory.
    pub fn acquire(&self) -> Result<Workspace> {
        let mut rng = Lcg::from_clock();
        self.acquire_with(|| rng.next_in(SUFFIX_RANGE.0, SUFFIX_RANGE.1))
    }

    /// Create the workspace, run `f` with it, then release it.
    ///
    /// The workspace is released before the result of `f` is returned,
    /// whether `f` succeeded or not.
    pub fn scoped<T, E, F>(&self, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&Workspace) -> std::result::Result<T, E>,
        E: From<Error>,
    {
        let workspace = self.acquire()?;
        let result = f(&workspace);
        workspace.release();
        result
    }

    /// Create the workspace drawing directory suffixes from `next_suffix`
    /// until an unused name is found.
    pub(crate) fn acquire_with(&self, mut next_suffix: impl FnMut() -> u32) -> Result<Workspace> {
        let root = self.root.clone().unwrap_or_else(std::env::temp_dir);
        let prefix = self
            .prefix
            .as_deref()
            .filter(|p| !p.is_empty())
            .unwrap_or(env!("CARGO_PKG_NAME"));
        let extension = self
            .extension
            .as_deref()
            .filter(|e| !e.is_empty())
            .unwrap_or(DEFAULT_EXTENSION);

        loop {
            let path = root.join(format!("{prefix}.{:08X}.{extension}", next_suffix()));
            match fs::create_dir(&path) {
                Ok(()) => {
                    tracing::debug!(path = %path.display(), "created workspace");
                    return Ok(Workspace {
                        root: path,
                        keep: self.keep,
                        released: false,
                    });
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    tracing::trace!(path = %path.display(), "workspace name taken, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

/// An exclusively owned temporary directory.
#[derive(Debug)]
pub struct Workspace {
    root: PathBuf,
    keep: bool,
    released: bool,
}

impl Workspace {
    /// Acquire a workspace with the default prefix and extension.
    pub fn acquire() -> Result<Self> {
        WorkspaceBuilder::new().acquire()
    }

    /// The workspace directory.
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Whether the directory survives release.
    pub fn is_kept(&self) -> bool {
        self.keep
    }

    /// Join `name` onto the workspace directory. Does no I/O.
    pub fn full_path(&self, name: impl AsRef<Path>) -> PathBuf {
        self.root.join(name)
    }

    /// Move a file or directory inside the workspace.
    ///
    /// Fails with [`Error::NotFound`] when nothing exists at `from`.
    pub fn rename(&self, from: impl AsRef<Path>, to: impl AsRef<Path>) -> Result<()> {
        let from = self.full_path(from);
        let to = self.full_path(to);

        if from.is_file() || from.is_dir() {
            fs::rename(&from, &to)?;
            tracing::debug!(from = %from.display(), to = %to.display(), "renamed");
            Ok(())
        } else {
            Err(Error::NotFound(from))
        }
    }

    /// Delete a file, or a directory with its contents, inside the workspace.
    ///
    /// Fails with [`Error::NotFound`] when nothing exists at `name`.
    pub fn delete(&self, name: impl AsRef<Path>) -> Result<()> {
        let path = self.full_path(name);

        if path.is_file() {
            fs::remove_file(&path)?;
        } else if path.is_dir() {
            fs::remove_dir_all(&path)?;
        } else {
            return Err(Error::NotFound(path));
        }
        Ok(())
    }

    /// Release the workspace now instead of at the end of its scope.
    pub fn release(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        if self.keep {
            tracing::debug!(path = %self.root.display(), "keeping workspace");
            return;
        }
        if let Err(e) = fs::remove_dir_all(&self.root) {
            tracing::warn!(path = %self.root.display(), error = %e, "failed to remove workspace");
        }
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        self.teardown();
    }
}
