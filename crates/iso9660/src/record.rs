//! Directory and path table record value types and their serialization.

use std::io::Write;

use crate::datetime::RecordDateTime;
use crate::encode::{U16BothEndian, U32BothEndian};

/// A directory record without its file identifier is 33 octets
/// (ECMA-119 §10.1).
const BASE_DIRECTORY_RECORD_LENGTH: usize = 33;

bitflags::bitflags! {
  /// File flags octet of a directory record (ECMA-119 §10.1.12).
  #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
  pub struct FileFlags: u8 {
    const HIDDEN = 0x01;
    const DIRECTORY = 0x02;
    const ASSOCIATED_FILE = 0x04;
    const RECORD = 0x08;
    const PROTECTION = 0x10;
    const MULTI_EXTENT = 0x80;
  }
}

/// A file or directory identifier: the combination of file name, extension,
/// and version for files, or the bare directory name for directories
/// (ECMA-119 §8.5, §8.6).
///
/// The single octets `0x00` and `0x01` are reserved for the current (`.`)
/// and parent (`..`) directory entries; the root directory's own identifier
/// is `0x00` as well.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileIdentifier(Vec<u8>);

impl FileIdentifier {
  /// The `.` entry, also used as the root directory's identifier.
  pub fn current_directory() -> Self {
    Self(vec![0x00])
  }

  /// The `..` entry.
  pub fn parent_directory() -> Self {
    Self(vec![0x01])
  }

  pub fn as_bytes(&self) -> &[u8] {
    &self.0
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }
}

impl From<Vec<u8>> for FileIdentifier {
  fn from(bytes: Vec<u8>) -> Self {
    Self(bytes)
  }
}

/// Total length of a directory record carrying an identifier of
/// `identifier_length` octets: the 33-octet fixed part, the identifier, and
/// a single pad octet whenever the identifier has even length, so the
/// record's total is always even (ECMA-119 §10.1).
pub fn directory_record_length(identifier_length: usize) -> u8 {
  let padding = if identifier_length % 2 == 0 { 1 } else { 0 };
  (BASE_DIRECTORY_RECORD_LENGTH + identifier_length + padding) as u8
}

/// Describes the identifier, extent location, and size of one file section
/// or directory, as recorded inside a directory's data (ECMA-119 §10.1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryRecord {
  pub length: u8,
  pub extended_attribute_length: u8,
  pub extent_location: U32BothEndian,
  pub data_length: U32BothEndian,
  pub recorded_at: RecordDateTime,
  pub file_flags: FileFlags,
  pub file_unit_size: u8,
  pub interleave_gap_size: u8,
  pub volume_sequence_number: U16BothEndian,
  pub identifier: FileIdentifier,
}

impl DirectoryRecord {
  /// Serializes the record: the fixed prefix, the identifier octets, then
  /// zero fill up to the record's declared `length`.
  pub fn write_to<W: Write>(&self, w: &mut W) -> std::io::Result<u64> {
    let mut bytes = Vec::with_capacity(self.length as usize);
    bytes.push(self.length);
    bytes.push(self.extended_attribute_length);
    bytes.extend_from_slice(&self.extent_location.to_bytes());
    bytes.extend_from_slice(&self.data_length.to_bytes());
    bytes.extend_from_slice(&self.recorded_at.to_bytes());
    bytes.push(self.file_flags.bits());
    bytes.push(self.file_unit_size);
    bytes.push(self.interleave_gap_size);
    bytes.extend_from_slice(&self.volume_sequence_number.to_bytes());
    bytes.push(self.identifier.len() as u8);
    bytes.extend_from_slice(self.identifier.as_bytes());
    bytes.resize(bytes.len().max(self.length as usize), 0);

    w.write_all(&bytes)?;
    Ok(bytes.len() as u64)
  }
}

/// Byte order selected for a path table serialization: type L tables use
/// little-endian numbers, type M tables big-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
  Little,
  Big,
}

/// Locates one directory by extent number without traversing the directory
/// tree (ECMA-119 §9.4).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTableRecord {
  pub extended_attribute_length: u8,
  pub extent_location: u32,
  pub parent_directory_number: u16,
  pub identifier: FileIdentifier,
}

impl PathTableRecord {
  /// Serialized length: the 8-octet fixed part, the identifier, and a pad
  /// octet whenever the identifier has odd length.
  pub fn encoded_length(&self) -> u32 {
    8 + self.identifier.len() as u32 + (self.identifier.len() % 2) as u32
  }

  pub fn write_to<W: Write>(&self, w: &mut W, endianness: Endianness) -> std::io::Result<u64> {
    let mut bytes = Vec::with_capacity(self.encoded_length() as usize);
    bytes.push(self.identifier.len() as u8);
    bytes.push(self.extended_attribute_length);

    match endianness {
      Endianness::Little => {
        bytes.extend_from_slice(&self.extent_location.to_le_bytes());
        bytes.extend_from_slice(&self.parent_directory_number.to_le_bytes());
      }
      Endianness::Big => {
        bytes.extend_from_slice(&self.extent_location.to_be_bytes());
        bytes.extend_from_slice(&self.parent_directory_number.to_be_bytes());
      }
    }

    bytes.extend_from_slice(self.identifier.as_bytes());

    if self.identifier.len() % 2 == 1 {
      bytes.push(0);
    }

    w.write_all(&bytes)?;
    Ok(bytes.len() as u64)
  }
}
