//! Path table derivation: a flat, breadth-first list of every directory in
//! the volume, serializable in both byte orders.

use std::collections::HashMap;
use std::io::Write;

use crate::record::{Endianness, PathTableRecord};
use crate::tree::{Directory, Entry};

/// Derives path table records from a directory tree on demand, so tables
/// written after layout carry the final extent locations.
pub struct PathTable {
  root: Directory,
}

impl PathTable {
  pub fn new(root: &Directory) -> Self {
    Self { root: root.clone() }
  }

  /// The table's records in breadth-first order.
  ///
  /// Records must be ordered by hierarchy level first, then by parent
  /// directory number, then by directory identifier; a breadth-first walk
  /// of a tree whose siblings were inserted in record order produces
  /// exactly that. Directory numbers are 1-based ordinals in visitation
  /// order, and the root is recorded as its own parent.
  pub fn records(&self) -> Vec<PathTableRecord> {
    let mut directory_numbers: HashMap<usize, u16> = HashMap::new();
    let mut records = Vec::new();

    for entry in self.root.walk(false) {
      let Entry::Directory(dir) = entry else {
        continue;
      };

      let parent_number = match dir.parent() {
        // A breadth-first walk numbers every parent before its children;
        // a missing entry here is a traversal bug, not an input error.
        Some(parent) => *directory_numbers
          .get(&parent.key())
          .expect("parent directory must be numbered before its children"),
        None => 1,
      };

      let record = dir.pointer_record();
      records.push(PathTableRecord {
        extended_attribute_length: 0,
        extent_location: record.extent_location.get(),
        parent_directory_number: parent_number,
        identifier: record.identifier,
      });

      directory_numbers.insert(dir.key(), records.len() as u16);
    }

    records
  }

  /// Total serialized size of the table in bytes, identical for the L and M
  /// variants.
  pub fn size(&self) -> u32 {
    self.records().iter().map(PathTableRecord::encoded_length).sum()
  }

  /// Serializes the type L (little-endian) path table.
  pub fn write_l_table<W: Write>(&self, w: &mut W) -> std::io::Result<u64> {
    self.write_table(w, Endianness::Little)
  }

  /// Serializes the type M (big-endian) path table.
  pub fn write_m_table<W: Write>(&self, w: &mut W) -> std::io::Result<u64> {
    self.write_table(w, Endianness::Big)
  }

  fn write_table<W: Write>(&self, w: &mut W, endianness: Endianness) -> std::io::Result<u64> {
    let mut written = 0;

    for record in self.records() {
      written += record.write_to(w, endianness)?;
    }

    Ok(written)
  }
}
