use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::domain::LibraryEntry;

/// The local storage directory. The directory itself is the source of
/// truth: nothing is cached, every call re-reads it.
#[derive(Debug, Clone)]
pub struct Library {
    dir: PathBuf,
    extension: String,
}

impl Library {
    pub fn new(dir: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            extension: extension.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn ensure_dir(&self) -> io::Result<()> {
        std::fs::create_dir_all(&self.dir)
    }

    /// Lists playable files in byte-wise lexicographic order.
    pub fn refresh(&self) -> io::Result<Vec<LibraryEntry>> {
        self.ensure_dir()?;

        let suffix = format!(".{}", self.extension);
        let mut entries = Vec::new();

        for dir_entry in std::fs::read_dir(&self.dir)? {
            let dir_entry = dir_entry?;
            let path = dir_entry.path();

            let Some(name) = dir_entry.file_name().to_str().map(str::to_string) else {
                warn!(path = %path.display(), "skipping non UTF-8 file name");
                continue;
            };

            if name.ends_with(&suffix) && path.is_file() {
                entries.push(LibraryEntry { name, path });
            }
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        debug!(dir = %self.dir.display(), count = entries.len(), "library refreshed");

        Ok(entries)
    }

    /// Where a downloaded file has to be renamed to, or `None` when it
    /// already carries the target extension.
    pub fn normalized_path(&self, path: &Path) -> Option<PathBuf> {
        if path.extension().and_then(OsStr::to_str) == Some(self.extension.as_str()) {
            None
        } else {
            Some(path.with_extension(&self.extension))
        }
    }

    /// `path` itself when nothing is stored there, otherwise the first free
    /// `<stem> (n).<ext>` next to it.
    pub fn unique_path(&self, path: &Path) -> PathBuf {
        if !path.exists() {
            return path.to_path_buf();
        }

        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extension = path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();

        let mut n = 1;
        loop {
            let candidate = path.with_file_name(format!("{} ({}){}", stem, n, extension));
            if !candidate.exists() {
                debug!(taken = %path.display(), chosen = %candidate.display(), "name already in library");
                return candidate;
            }
            n += 1;
        }
    }
}
