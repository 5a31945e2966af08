//! The end-to-end image driver: builds a tree from a [DirectorySource],
//! lays it out, and streams the finished volume to a sink.

use std::io::Write;
use std::path::Path;
use std::rc::Rc;

use chrono::Utc;

use crate::block::BlockWriter;
use crate::datetime::RecordDateTime;
use crate::encode::{directory_identifier, file_identifier, FileIdentifierEncoding};
use crate::error::{Error, Result};
use crate::layout::{relocate_tree, BlockAllocator};
use crate::path_table::PathTable;
use crate::record::FileIdentifier;
use crate::source::{DirectorySource, SourceEntry};
use crate::tree::{Directory, EntryKey, File};
use crate::volume::{PrimaryVolumeDescriptor, VolumeDescriptorSetTerminator, VolumeIdentifiers};

/// Blocks 0..=15 are the system area; the volume descriptor set starts at
/// block 16 and is terminated at block 17, so content begins at 18.
const PRIMARY_VOLUME_DESCRIPTOR_BLOCK: u32 = 16;
const TERMINATOR_BLOCK: u32 = 17;
const FIRST_CONTENT_BLOCK: u32 = 18;

/// An ISO 9660 image over a source tree. Nothing is read from the source
/// until [Image::write_to] runs.
pub struct Image<S> {
  source: Rc<S>,
  identifiers: VolumeIdentifiers,
}

impl<S: DirectorySource + 'static> Image<S> {
  pub fn new(source: S) -> Self {
    Self::with_identifiers(source, VolumeIdentifiers::default())
  }

  pub fn with_identifiers(source: S, identifiers: VolumeIdentifiers) -> Self {
    Self {
      source: Rc::new(source),
      identifiers,
    }
  }

  /// Builds the volume and writes it to `sink`, returning the total number
  /// of bytes written.
  ///
  /// On error, whatever was already written stays on the sink; cleaning up
  /// a truncated file is the caller's concern.
  pub fn write_to<W: Write>(&self, sink: W) -> Result<u64> {
    let root = build_directory(
      &self.source,
      Path::new("."),
      None,
      RecordDateTime::from(Utc::now()),
    )?;

    let path_table = PathTable::new(&root);
    let path_table_size = path_table.size();

    // The path table sits in front of the tree's extents, so a reader can
    // seek to any directory without touching the hierarchy.
    let mut allocator = BlockAllocator::new(FIRST_CONTENT_BLOCK);
    let l_table_block = allocator.allocate(path_table_size);
    let m_table_block = allocator.allocate(path_table_size);

    relocate_tree(&root, &mut allocator);
    let volume_space_size = allocator.next_block();

    let descriptor = PrimaryVolumeDescriptor::new(
      &self.identifiers,
      volume_space_size,
      path_table_size,
      l_table_block,
      0,
      m_table_block,
      0,
      &root,
    )?;

    let mut writer = BlockWriter::new(sink);

    log::debug!("writing primary volume descriptor at block {PRIMARY_VOLUME_DESCRIPTOR_BLOCK}");
    writer.write_block_with(PRIMARY_VOLUME_DESCRIPTOR_BLOCK, |mut w| {
      Ok(descriptor.write_to(&mut w)?)
    })?;

    log::debug!("writing volume descriptor set terminator at block {TERMINATOR_BLOCK}");
    writer.write_block_with(TERMINATOR_BLOCK, |mut w| {
      Ok(VolumeDescriptorSetTerminator.write_to(&mut w)?)
    })?;

    log::debug!("writing type L path table at block {l_table_block} ({path_table_size} bytes)");
    writer.write_block_with(l_table_block, |mut w| Ok(path_table.write_l_table(&mut w)?))?;

    log::debug!("writing type M path table at block {m_table_block} ({path_table_size} bytes)");
    writer.write_block_with(m_table_block, |mut w| Ok(path_table.write_m_table(&mut w)?))?;

    for entry in root.walk(false) {
      log::debug!(
        "writing {} '{}' at block {}",
        if entry.is_directory() { "directory" } else { "file" },
        String::from_utf8_lossy(entry.pointer_record().identifier.as_bytes()),
        entry.location(),
      );

      writer.write_block_with(entry.location(), |mut w| entry.write_to(&mut w))?;
    }

    log::info!(
      "image complete: {} bytes in {} blocks",
      writer.bytes_written(),
      volume_space_size,
    );

    Ok(writer.bytes_written())
  }
}

/// Recursively builds a directory node from the source listing at `path`,
/// inserting entries in the mandated record order.
fn build_directory<S: DirectorySource + 'static>(
  source: &Rc<S>,
  path: &Path,
  parent: Option<&Directory>,
  recorded_at: RecordDateTime,
) -> Result<Directory> {
  let identifier = match parent {
    // The root directory's identifier is the reserved 0x00 octet.
    None => FileIdentifier::current_directory(),
    Some(_) => {
      let name = path
        .file_name()
        .map(|name| name.to_string_lossy())
        .unwrap_or_default();
      FileIdentifier::from(directory_identifier(&name)?)
    }
  };

  let dir = Directory::new_empty(identifier, recorded_at, parent);

  let mut entries = source.read_dir(path)?;
  entries.sort_by(|a, b| source_entry_key(a).cmp(&source_entry_key(b)));

  for entry in entries {
    let entry_path = path.join(&entry.name);

    if entry.is_directory {
      let subdir = build_directory(
        source,
        &entry_path,
        Some(&dir),
        RecordDateTime::from(entry.modified_at),
      )?;
      dir.add(subdir);
    } else {
      let size = u32::try_from(entry.size).map_err(|_| Error::FileTooLarge {
        path: entry_path.clone(),
      })?;

      let (name, extension) = split_name(&entry.name);
      let identifier = FileIdentifier::from(file_identifier(
        name,
        extension,
        1,
        FileIdentifierEncoding::DCharacters,
      )?);

      let open_source = Rc::clone(source);
      let open_path = entry_path.clone();
      let file = File::new(identifier, entry.modified_at, size, move || {
        open_source.open(&open_path)
      });

      dir.add(file);
    }
  }

  Ok(dir)
}

/// Splits a base name on its last `.` into (file name, extension).
fn split_name(name: &str) -> (&str, &str) {
  match name.rfind('.') {
    Some(index) => (&name[..index], &name[index + 1..]),
    None => (name, ""),
  }
}

fn source_entry_key(entry: &SourceEntry) -> EntryKey<'_> {
  let (name, extension) = split_name(&entry.name);

  EntryKey {
    name,
    extension,
    version: 1,
    is_directory: entry.is_directory,
    section_index: 0,
  }
}
