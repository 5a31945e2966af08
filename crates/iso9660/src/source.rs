//! The capability the image driver reads its input tree from, and its host
//! filesystem implementation.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::error::{Error, Result};

/// One entry of a source directory listing.
#[derive(Debug, Clone)]
pub struct SourceEntry {
  /// Base name, joinable with the parent path.
  pub name: String,
  pub is_directory: bool,
  /// Byte size; zero for directories.
  pub size: u64,
  pub modified_at: DateTime<Utc>,
}

/// Read access to the tree an image is built from.
///
/// `open` is called lazily, once per file, at the moment that file's bytes
/// are emitted; each returned stream is fully consumed and dropped before
/// the next is opened, so a source never has more than one stream live.
pub trait DirectorySource {
  /// Lists the entries of the directory at `path` (relative to the source
  /// root; `.` is the root itself).
  fn read_dir(&self, path: &Path) -> Result<Vec<SourceEntry>>;

  /// Opens a fresh byte stream over the file at `path`.
  fn open(&self, path: &Path) -> Result<Box<dyn Read>>;
}

/// A [DirectorySource] over a directory of the host filesystem.
#[derive(Debug, Clone)]
pub struct HostDirectory {
  root: PathBuf,
}

impl HostDirectory {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  fn resolve(&self, path: &Path) -> PathBuf {
    self.root.join(path)
  }
}

impl DirectorySource for HostDirectory {
  fn read_dir(&self, path: &Path) -> Result<Vec<SourceEntry>> {
    let resolved = self.resolve(path);
    let read_dir_error = |source| Error::ReadDir {
      path: resolved.clone(),
      source,
    };

    let mut entries = Vec::new();

    for entry in fs::read_dir(&resolved).map_err(read_dir_error)? {
      let entry = entry.map_err(read_dir_error)?;
      let metadata = entry.metadata().map_err(read_dir_error)?;
      let modified = metadata.modified().map_err(read_dir_error)?;

      entries.push(SourceEntry {
        name: entry.file_name().to_string_lossy().into_owned(),
        is_directory: metadata.is_dir(),
        size: if metadata.is_dir() { 0 } else { metadata.len() },
        modified_at: DateTime::<Utc>::from(modified),
      });
    }

    Ok(entries)
  }

  fn open(&self, path: &Path) -> Result<Box<dyn Read>> {
    let resolved = self.resolve(path);
    let file = fs::File::open(&resolved).map_err(|source| Error::OpenFile {
      path: resolved.clone(),
      source,
    })?;

    Ok(Box::new(file))
  }
}
