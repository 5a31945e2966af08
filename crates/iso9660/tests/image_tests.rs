//! End-to-end tests: build images from an in-memory source and read the
//! produced bytes back with an independent, minimal parser.

use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone, Utc};
use iso9660::{DirectorySource, Error, Image, Result, SourceEntry, VolumeIdentifiers};

const BLOCK: usize = 2048;

/// A source tree held entirely in memory, keyed by paths relative to the
/// root (the root itself is the empty path).
#[derive(Default)]
struct MemorySource {
  listings: HashMap<PathBuf, Vec<SourceEntry>>,
  files: HashMap<PathBuf, Vec<u8>>,
}

impl MemorySource {
  fn new() -> Self {
    let mut source = Self::default();
    source.listings.insert(PathBuf::new(), Vec::new());
    source
  }

  fn add_dir(&mut self, path: &str, modified_at: DateTime<Utc>) {
    let path = PathBuf::from(path);
    let name = path.file_name().unwrap().to_string_lossy().into_owned();
    let parent = path.parent().unwrap().to_path_buf();

    self.listings.entry(path).or_default();
    self
      .listings
      .entry(parent)
      .or_default()
      .push(SourceEntry {
        name,
        is_directory: true,
        size: 0,
        modified_at,
      });
  }

  fn add_file(&mut self, path: &str, contents: &[u8], modified_at: DateTime<Utc>) {
    let path = PathBuf::from(path);
    let name = path.file_name().unwrap().to_string_lossy().into_owned();
    let parent = path.parent().unwrap().to_path_buf();

    self
      .listings
      .entry(parent)
      .or_default()
      .push(SourceEntry {
        name,
        is_directory: false,
        size: contents.len() as u64,
        modified_at,
      });
    self.files.insert(path, contents.to_vec());
  }

  fn normalize(path: &Path) -> &Path {
    path.strip_prefix(".").unwrap_or(path)
  }
}

impl DirectorySource for MemorySource {
  fn read_dir(&self, path: &Path) -> Result<Vec<SourceEntry>> {
    self
      .listings
      .get(Self::normalize(path))
      .cloned()
      .ok_or_else(|| Error::ReadDir {
        path: path.to_path_buf(),
        source: std::io::Error::from(std::io::ErrorKind::NotFound),
      })
  }

  fn open(&self, path: &Path) -> Result<Box<dyn Read>> {
    let contents = self
      .files
      .get(Self::normalize(path))
      .cloned()
      .ok_or_else(|| Error::OpenFile {
        path: path.to_path_buf(),
        source: std::io::Error::from(std::io::ErrorKind::NotFound),
      })?;

    Ok(Box::new(Cursor::new(contents)))
  }
}

/// A directory record as decoded from image bytes.
#[derive(Debug)]
struct ParsedRecord {
  extent: u32,
  data_length: u32,
  recorded: [u8; 7],
  flags: u8,
  identifier: Vec<u8>,
}

fn read_both_u32(bytes: &[u8]) -> u32 {
  let little = u32::from_le_bytes(bytes[0..4].try_into().unwrap());
  let big = u32::from_be_bytes(bytes[4..8].try_into().unwrap());
  assert_eq!(little, big, "both-endian halves must agree");
  little
}

fn read_both_u16(bytes: &[u8]) -> u16 {
  let little = u16::from_le_bytes(bytes[0..2].try_into().unwrap());
  let big = u16::from_be_bytes(bytes[2..4].try_into().unwrap());
  assert_eq!(little, big, "both-endian halves must agree");
  little
}

/// Decodes the directory records of one directory body; stops at the first
/// zero length octet.
fn parse_directory(block: &[u8]) -> Vec<ParsedRecord> {
  let mut records = Vec::new();
  let mut offset = 0;

  while offset < block.len() && block[offset] != 0 {
    let length = block[offset] as usize;
    let record = &block[offset..offset + length];

    assert_eq!(length % 2, 0, "directory record length must be even");

    let identifier_length = record[32] as usize;
    records.push(ParsedRecord {
      extent: read_both_u32(&record[2..10]),
      data_length: read_both_u32(&record[10..18]),
      recorded: record[18..25].try_into().unwrap(),
      flags: record[25],
      identifier: record[33..33 + identifier_length].to_vec(),
    });

    offset += length;
  }

  records
}

fn block_of(image: &[u8], number: u32) -> &[u8] {
  &image[number as usize * BLOCK..(number as usize + 1) * BLOCK]
}

#[test]
fn empty_source_produces_a_minimal_mountable_volume() {
  let image = Image::new(MemorySource::new());

  let mut bytes = Vec::new();
  let written = image.write_to(&mut bytes).unwrap();

  // 16 system blocks, two descriptors, two one-block path tables, and the
  // root directory body.
  assert_eq!(written, 21 * BLOCK as u64);
  assert_eq!(bytes.len() as u64, written);

  assert!(bytes[..16 * BLOCK].iter().all(|&b| b == 0), "system area must be zero");

  let pvd = block_of(&bytes, 16);
  assert_eq!(pvd[0], 1);
  assert_eq!(&pvd[1..6], b"CD001");
  assert_eq!(pvd[6], 1);
  assert_eq!(read_both_u32(&pvd[80..88]), 21, "volume space size");
  assert_eq!(read_both_u16(&pvd[120..124]), 1, "volume set size");
  assert_eq!(read_both_u16(&pvd[124..128]), 1, "volume sequence number");
  assert_eq!(read_both_u16(&pvd[128..132]), 2048, "logical block size");
  assert_eq!(read_both_u32(&pvd[132..140]), 10, "path table size");
  assert_eq!(u32::from_le_bytes(pvd[140..144].try_into().unwrap()), 18);
  assert_eq!(u32::from_be_bytes(pvd[148..152].try_into().unwrap()), 19);

  // Embedded root record: one block of directory data at block 20.
  assert_eq!(pvd[156], 34);
  assert_eq!(read_both_u32(&pvd[158..166]), 20);
  assert_eq!(read_both_u32(&pvd[166..174]), 2048);

  let terminator = block_of(&bytes, 17);
  assert_eq!(&terminator[..7], &[255, b'C', b'D', b'0', b'0', b'1', 1]);
  assert!(terminator[7..].iter().all(|&b| b == 0));

  // The root body holds only its own `.` and `..` records.
  let records = parse_directory(block_of(&bytes, 20));
  assert_eq!(records.len(), 2);
  assert_eq!(records[0].identifier, [0x00]);
  assert_eq!(records[1].identifier, [0x01]);
  assert_eq!(records[0].extent, 20);
  assert_eq!(records[1].extent, 20);
}

#[test]
fn image_round_trips_names_sizes_times_and_contents() {
  let foo_modified = Utc.with_ymd_and_hms(2015, 7, 31, 19, 0, 15).unwrap();
  let bar_modified = Utc.with_ymd_and_hms(2020, 2, 2, 2, 2, 2).unwrap();
  let baz_modified = Utc.with_ymd_and_hms(2021, 3, 3, 3, 3, 3).unwrap();

  let mut source = MemorySource::new();
  source.add_file("FOO.TXT", b"foo", foo_modified);
  source.add_dir("BAR", bar_modified);
  source.add_file("BAR/BAZ.DAT", b"quux", baz_modified);

  let image = Image::with_identifiers(
    source,
    VolumeIdentifiers {
      volume: "ROUNDTRIP".to_string(),
      ..Default::default()
    },
  );

  let mut bytes = Vec::new();
  let written = image.write_to(&mut bytes).unwrap();

  // Blocks: 18 L table, 19 M table, 20 root, 21 BAR, 22 FOO.TXT,
  // 23 BAZ.DAT.
  assert_eq!(written, 24 * BLOCK as u64);

  let pvd = block_of(&bytes, 16);
  assert_eq!(&pvd[40..49], b"ROUNDTRIP");
  assert_eq!(read_both_u32(&pvd[80..88]), 24);
  // Root (8 + 1 + 1) plus BAR (8 + 3 + 1).
  assert_eq!(read_both_u32(&pvd[132..140]), 22);

  // Root body: `.`, `..`, then BAR before FOO.TXT (directories first is
  // irrelevant here; BAR sorts before FOO by name).
  let root_records = parse_directory(block_of(&bytes, 20));
  assert_eq!(root_records.len(), 4);

  let bar = &root_records[2];
  assert_eq!(bar.identifier, b"BAR");
  assert_eq!(bar.flags, 0x02);
  assert_eq!(bar.extent, 21);
  assert_eq!(bar.data_length, 2048);
  assert_eq!(bar.recorded, [120, 2, 2, 2, 2, 2, 0]);

  let foo = &root_records[3];
  assert_eq!(foo.identifier, b"FOO.TXT;1");
  assert_eq!(foo.flags, 0);
  assert_eq!(foo.extent, 22);
  assert_eq!(foo.data_length, 3);
  assert_eq!(foo.recorded, [0x73, 0x07, 0x1F, 0x13, 0x00, 0x0F, 0x00]);

  // BAR body: its `..` record points back at the root.
  let bar_records = parse_directory(block_of(&bytes, 21));
  assert_eq!(bar_records.len(), 3);
  assert_eq!(bar_records[0].identifier, [0x00]);
  assert_eq!(bar_records[0].extent, 21);
  assert_eq!(bar_records[1].identifier, [0x01]);
  assert_eq!(bar_records[1].extent, 20);

  let baz = &bar_records[2];
  assert_eq!(baz.identifier, b"BAZ.DAT;1");
  assert_eq!(baz.extent, 23);
  assert_eq!(baz.data_length, 4);
  assert_eq!(baz.recorded, [121, 3, 3, 3, 3, 3, 0]);

  // File extents hold the contents, zero-padded to the block.
  let foo_block = block_of(&bytes, 22);
  assert_eq!(&foo_block[..3], b"foo");
  assert!(foo_block[3..].iter().all(|&b| b == 0));

  let baz_block = block_of(&bytes, 23);
  assert_eq!(&baz_block[..4], b"quux");
  assert!(baz_block[4..].iter().all(|&b| b == 0));

  // Path tables: root then BAR, little-endian and big-endian.
  let l_table = block_of(&bytes, 18);
  assert_eq!(
    &l_table[..22],
    &[
      1, 0, 20, 0, 0, 0, 1, 0, 0x00, 0x00, // root
      3, 0, 21, 0, 0, 0, 1, 0, b'B', b'A', b'R', 0x00, // BAR
    ]
  );
  assert!(l_table[22..].iter().all(|&b| b == 0));

  let m_table = block_of(&bytes, 19);
  assert_eq!(
    &m_table[..22],
    &[
      1, 0, 0, 0, 0, 20, 0, 1, 0x00, 0x00, // root
      3, 0, 0, 0, 0, 21, 0, 1, b'B', b'A', b'R', 0x00, // BAR
    ]
  );
}

#[test]
fn lowercase_source_names_are_uppercased_in_records() {
  let mut source = MemorySource::new();
  source.add_file("readme.txt", b"hi", Utc::now());

  let mut bytes = Vec::new();
  Image::new(source).write_to(&mut bytes).unwrap();

  let root_records = parse_directory(block_of(&bytes, 20));
  assert_eq!(root_records[2].identifier, b"README.TXT;1");
}

#[test]
fn invalid_source_names_fail_the_build() {
  let mut source = MemorySource::new();
  source.add_file("bad name.txt", b"x", Utc::now());

  let err = Image::new(source).write_to(&mut Vec::new()).unwrap_err();
  assert!(matches!(err, Error::InvalidCharacters));
}

#[test]
fn unreadable_directories_fail_the_build() {
  let mut source = MemorySource::new();
  // Listed but without a listing of its own.
  source
    .listings
    .get_mut(&PathBuf::new())
    .unwrap()
    .push(SourceEntry {
      name: "GHOST".to_string(),
      is_directory: true,
      size: 0,
      modified_at: Utc::now(),
    });

  let err = Image::new(source).write_to(&mut Vec::new()).unwrap_err();
  assert!(matches!(err, Error::ReadDir { .. }));
}

#[test]
fn unopenable_files_fail_during_emission() {
  let mut source = MemorySource::new();
  // Listed with a size but no contents registered: the tree builds, then
  // emission fails when the extent is written.
  source
    .listings
    .get_mut(&PathBuf::new())
    .unwrap()
    .push(SourceEntry {
      name: "MISSING.DAT".to_string(),
      is_directory: false,
      size: 3,
      modified_at: Utc::now(),
    });

  let err = Image::new(source).write_to(&mut Vec::new()).unwrap_err();
  assert!(matches!(err, Error::OpenFile { .. }));
}

#[test]
fn oversized_files_are_rejected() {
  let mut source = MemorySource::new();
  source
    .listings
    .get_mut(&PathBuf::new())
    .unwrap()
    .push(SourceEntry {
      name: "HUGE.BIN".to_string(),
      is_directory: false,
      size: u64::from(u32::MAX) + 1,
      modified_at: Utc::now(),
    });

  let err = Image::new(source).write_to(&mut Vec::new()).unwrap_err();
  assert!(matches!(err, Error::FileTooLarge { .. }));
}
