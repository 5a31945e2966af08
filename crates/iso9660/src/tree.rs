//! In-memory model of the volume's directory hierarchy.
//!
//! Directories and files are cheap handles over shared state: a directory
//! holds its entries by reference, and a child derives its `..` record from
//! its parent's live pointer record, so relocating a directory during
//! layout is automatically reflected everywhere that directory is referred
//! to.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::VecDeque;
use std::io::Write;
use std::rc::{Rc, Weak};

use crate::datetime::RecordDateTime;
use crate::error::Result;
use crate::layout::LOGICAL_BLOCK_SIZE;
use crate::record::{
  directory_record_length, DirectoryRecord, FileFlags, FileIdentifier,
};
use crate::encode::{U16BothEndian, U32BothEndian};

/// A node of the directory tree: either a directory or a single-section
/// file. Cloning an `Entry` clones the handle, not the node.
#[derive(Clone)]
pub enum Entry {
  Directory(Directory),
  File(File),
}

impl Entry {
  /// The record describing this node, as it appears in the parent
  /// directory's data.
  pub fn pointer_record(&self) -> DirectoryRecord {
    match self {
      Entry::Directory(dir) => dir.pointer_record(),
      Entry::File(file) => file.pointer_record(),
    }
  }

  /// Length of this node's pointer record in octets.
  pub fn record_length(&self) -> u8 {
    match self {
      Entry::Directory(dir) => directory_record_length(dir.inner.borrow().record.identifier.len()),
      Entry::File(file) => directory_record_length(file.inner.borrow().identifier.len()),
    }
  }

  /// Size of this node's extent data: the block-rounded body size for a
  /// directory, the raw byte size for a file.
  pub fn data_length(&self) -> u32 {
    match self {
      Entry::Directory(dir) => dir.inner.borrow().record.data_length.get(),
      Entry::File(file) => file.inner.borrow().data_length,
    }
  }

  pub fn location(&self) -> u32 {
    match self {
      Entry::Directory(dir) => dir.location(),
      Entry::File(file) => file.location(),
    }
  }

  pub fn relocate(&self, block: u32) {
    match self {
      Entry::Directory(dir) => dir.relocate(block),
      Entry::File(file) => file.relocate(block),
    }
  }

  pub fn is_directory(&self) -> bool {
    matches!(self, Entry::Directory(_))
  }

  /// Writes this node's extent data: the serialized directory body, or the
  /// file's bytes copied from a freshly opened stream.
  pub fn write_to<W: Write>(&self, w: &mut W) -> Result<u64> {
    match self {
      Entry::Directory(dir) => dir.write_to(w),
      Entry::File(file) => file.write_to(w),
    }
  }

  fn children(&self) -> Vec<Entry> {
    match self {
      Entry::Directory(dir) => dir.entries(),
      Entry::File(_) => Vec::new(),
    }
  }
}

impl From<Directory> for Entry {
  fn from(dir: Directory) -> Self {
    Entry::Directory(dir)
  }
}

impl From<File> for Entry {
  fn from(file: File) -> Self {
    Entry::File(file)
  }
}

struct DirectoryInner {
  /// The directory's own record; self and parent records are derived from
  /// it (and from the parent's copy) on demand so that relocations and
  /// child additions never leave stale copies behind.
  record: DirectoryRecord,
  parent: Option<Weak<RefCell<DirectoryInner>>>,
  entries: Vec<Entry>,
  /// Body size before rounding: the lengths of the self and parent records
  /// plus every entry's pointer record.
  real_data_length: u32,
}

/// A directory node. The directory's reported data length is its body size
/// rounded up to a whole number of logical blocks, which is what ISO 9660
/// readers expect to find in its records.
#[derive(Clone)]
pub struct Directory {
  inner: Rc<RefCell<DirectoryInner>>,
}

impl Directory {
  /// Creates a directory with no entries. The body of an empty directory
  /// consists of the `.` and `..` records alone (34 octets each).
  ///
  /// The root directory is created with `parent` absent; it derives its
  /// `..` record from its own pointer record.
  pub fn new_empty(
    identifier: FileIdentifier,
    recorded_at: impl Into<RecordDateTime>,
    parent: Option<&Directory>,
  ) -> Self {
    let record = DirectoryRecord {
      length: directory_record_length(identifier.len()),
      extended_attribute_length: 0,
      extent_location: U32BothEndian::new(0),
      // Initial body size, rounded up to one block.
      data_length: U32BothEndian::new(LOGICAL_BLOCK_SIZE),
      recorded_at: recorded_at.into(),
      file_flags: FileFlags::DIRECTORY,
      // Interleaving is not recorded.
      file_unit_size: 0,
      interleave_gap_size: 0,
      volume_sequence_number: U16BothEndian::new(1),
      identifier,
    };

    let self_length = directory_record_length(1) as u32;
    let parent_length = directory_record_length(1) as u32;

    Self {
      inner: Rc::new(RefCell::new(DirectoryInner {
        record,
        parent: parent.map(|p| Rc::downgrade(&p.inner)),
        entries: Vec::new(),
        real_data_length: self_length + parent_length,
      })),
    }
  }

  /// The record describing this directory in its parent's data.
  pub fn pointer_record(&self) -> DirectoryRecord {
    self.inner.borrow().record.clone()
  }

  /// The `.` record: the pointer record with the reserved current-directory
  /// identifier.
  pub fn self_record(&self) -> DirectoryRecord {
    let mut record = self.inner.borrow().record.clone();
    record.identifier = FileIdentifier::current_directory();
    record.length = directory_record_length(record.identifier.len());
    record
  }

  /// The `..` record: the parent's pointer record with the reserved parent
  /// identifier. For the root directory this is derived from the root's own
  /// pointer record.
  pub fn parent_record(&self) -> DirectoryRecord {
    let inner = self.inner.borrow();

    let mut record = match &inner.parent {
      Some(parent) => {
        let parent = parent
          .upgrade()
          .expect("parent directory must outlive its children");
        let record = parent.borrow().record.clone();
        record
      }
      None => inner.record.clone(),
    };

    record.identifier = FileIdentifier::parent_directory();
    record.length = directory_record_length(record.identifier.len());
    record
  }

  pub fn parent(&self) -> Option<Directory> {
    self.inner.borrow().parent.as_ref().map(|parent| Directory {
      inner: parent
        .upgrade()
        .expect("parent directory must outlive its children"),
    })
  }

  /// Appends an entry to this directory's body and grows the reported data
  /// length to the next block boundary.
  ///
  /// Entries must be inserted in the order mandated for directory records;
  /// use [EntryKey] ordering before adding.
  pub fn add(&self, entry: impl Into<Entry>) {
    let entry = entry.into();
    let mut inner = self.inner.borrow_mut();

    inner.real_data_length += entry.record_length() as u32;
    let rounded =
      (inner.real_data_length + LOGICAL_BLOCK_SIZE - 1) / LOGICAL_BLOCK_SIZE * LOGICAL_BLOCK_SIZE;
    inner.record.data_length = U32BothEndian::new(rounded);
    inner.entries.push(entry);
  }

  /// Snapshot of the direct entries, as handles.
  pub fn entries(&self) -> Vec<Entry> {
    self.inner.borrow().entries.clone()
  }

  pub fn location(&self) -> u32 {
    self.inner.borrow().record.extent_location.get()
  }

  /// Assigns the directory's starting block. Self records and children's
  /// parent records reflect the new location immediately, as they are
  /// derived from this directory's pointer record.
  pub fn relocate(&self, block: u32) {
    self.inner.borrow_mut().record.extent_location = U32BothEndian::new(block);
  }

  /// Yields this directory and all of its descendants; breadth-first when
  /// `depth_first` is false, pre-order depth-first otherwise. Breadth-first
  /// order within a single directory equals insertion order.
  pub fn walk(&self, depth_first: bool) -> Walk {
    let mut queue = VecDeque::new();
    queue.push_back(Entry::Directory(self.clone()));
    Walk { queue, depth_first }
  }

  /// Serializes the directory body: the `.` record, the `..` record, each
  /// entry's pointer record, then zero fill up to the reported data length.
  pub fn write_to<W: Write>(&self, w: &mut W) -> Result<u64> {
    let mut written = self.self_record().write_to(w)?;
    written += self.parent_record().write_to(w)?;

    for entry in self.entries() {
      written += entry.pointer_record().write_to(w)?;
    }

    let data_length = self.inner.borrow().record.data_length.get() as u64;
    if written < data_length {
      let padding = vec![0u8; (data_length - written) as usize];
      w.write_all(&padding)?;
      written += padding.len() as u64;
    }

    Ok(written)
  }

  /// Stable identity of the underlying node, for keying lookup tables.
  pub(crate) fn key(&self) -> usize {
    Rc::as_ptr(&self.inner) as usize
  }
}

struct FileInner {
  identifier: FileIdentifier,
  location: u32,
  recorded_at: RecordDateTime,
  flags: FileFlags,
  data_length: u32,
  /// Opens a fresh byte stream over the file contents. Invoked only when
  /// the file's extent is emitted, so building a tree never holds host file
  /// descriptors open.
  open: Box<dyn Fn() -> Result<Box<dyn std::io::Read>>>,
}

/// A file node carrying a deferred byte source.
#[derive(Clone)]
pub struct File {
  inner: Rc<RefCell<FileInner>>,
}

impl File {
  pub fn new(
    identifier: FileIdentifier,
    recorded_at: impl Into<RecordDateTime>,
    data_length: u32,
    open: impl Fn() -> Result<Box<dyn std::io::Read>> + 'static,
  ) -> Self {
    Self {
      inner: Rc::new(RefCell::new(FileInner {
        identifier,
        location: 0,
        recorded_at: recorded_at.into(),
        flags: FileFlags::empty(),
        data_length,
        open: Box::new(open),
      })),
    }
  }

  pub fn pointer_record(&self) -> DirectoryRecord {
    let inner = self.inner.borrow();

    DirectoryRecord {
      length: directory_record_length(inner.identifier.len()),
      extended_attribute_length: 0,
      extent_location: U32BothEndian::new(inner.location),
      data_length: U32BothEndian::new(inner.data_length),
      recorded_at: inner.recorded_at,
      file_flags: inner.flags,
      file_unit_size: 0,
      interleave_gap_size: 0,
      volume_sequence_number: U16BothEndian::new(1),
      identifier: inner.identifier.clone(),
    }
  }

  pub fn location(&self) -> u32 {
    self.inner.borrow().location
  }

  pub fn relocate(&self, block: u32) {
    self.inner.borrow_mut().location = block;
  }

  /// Copies the full byte stream to `w`. The stream is opened here and
  /// dropped before returning.
  pub fn write_to<W: Write>(&self, w: &mut W) -> Result<u64> {
    let mut reader = (self.inner.borrow().open)()?;
    let written = std::io::copy(&mut reader, w)?;
    Ok(written)
  }
}

/// Iterator over a directory and its descendants, produced by
/// [Directory::walk].
pub struct Walk {
  queue: VecDeque<Entry>,
  depth_first: bool,
}

impl Iterator for Walk {
  type Item = Entry;

  fn next(&mut self) -> Option<Entry> {
    let node = self.queue.pop_front()?;
    let children = node.children();

    if self.depth_first {
      for child in children.into_iter().rev() {
        self.queue.push_front(child);
      }
    } else {
      self.queue.extend(children);
    }

    Some(node)
  }
}

/// Sort key implementing the mandated order of directory records within a
/// directory (ECMA-119 §10.3): ascending file name, then ascending
/// extension, then descending version, then directories before files, then
/// ascending file section index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryKey<'a> {
  pub name: &'a str,
  pub extension: &'a str,
  pub version: u16,
  pub is_directory: bool,
  pub section_index: u32,
}

impl Ord for EntryKey<'_> {
  fn cmp(&self, other: &Self) -> Ordering {
    self
      .name
      .cmp(other.name)
      .then_with(|| self.extension.cmp(other.extension))
      .then_with(|| other.version.cmp(&self.version))
      .then_with(|| other.is_directory.cmp(&self.is_directory))
      .then_with(|| self.section_index.cmp(&other.section_index))
  }
}

impl PartialOrd for EntryKey<'_> {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}
