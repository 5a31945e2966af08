//! Volume descriptors: the Primary Volume Descriptor and the set
//! terminator, each exactly one 2048-octet block.

use std::io::Write;

use crate::datetime::LongDateTime;
use crate::encode::{
  encode_a_characters, encode_d_characters, U16BothEndian, U32BothEndian, FILLER,
};
use crate::error::Result;
use crate::layout::LOGICAL_BLOCK_SIZE;
use crate::tree::Directory;

/// Standard identifier carried by every volume descriptor: always `CD001`
/// (ECMA-119 §9.1.3).
pub const STANDARD_IDENTIFIER: [u8; 5] = *b"CD001";

const VOLUME_DESCRIPTOR_TYPE_PRIMARY: u8 = 1;
const VOLUME_DESCRIPTOR_TYPE_TERMINATOR: u8 = 255;
const VOLUME_DESCRIPTOR_VERSION: u8 = 1;
const FILE_STRUCTURE_VERSION: u8 = 1;

/// The textual identifiers recorded in a primary volume descriptor. All are
/// encoded strictly with uppercasing; a character outside the field's
/// alphabet fails descriptor assembly.
#[derive(Debug, Clone)]
pub struct VolumeIdentifiers {
  /// Up to 32 a-characters.
  pub system: String,
  /// Up to 32 d-characters.
  pub volume: String,
  /// Up to 128 d-characters.
  pub volume_set: String,
  /// Up to 128 a-characters.
  pub publisher: String,
  /// Up to 128 d-characters.
  pub data_preparer: String,
  /// Up to 128 a-characters.
  pub application: String,
}

impl Default for VolumeIdentifiers {
  fn default() -> Self {
    Self {
      system: String::new(),
      volume: "ISO9660".to_string(),
      volume_set: String::new(),
      publisher: String::new(),
      data_preparer: String::new(),
      application: String::new(),
    }
  }
}

/// The primary volume descriptor (ECMA-119 §9.4): volume metadata plus the
/// root directory record and path table locations, either of which lets a
/// reader traverse the volume.
#[derive(Debug)]
pub struct PrimaryVolumeDescriptor {
  system_identifier: [u8; 32],
  volume_identifier: [u8; 32],
  volume_space_size: U32BothEndian,
  volume_set_size: U16BothEndian,
  volume_sequence_number: U16BothEndian,
  logical_block_size: U16BothEndian,
  path_table_size: U32BothEndian,
  l_path_table_location: u32,
  optional_l_path_table_location: u32,
  m_path_table_location: u32,
  optional_m_path_table_location: u32,
  root_directory_record: [u8; 34],
  volume_set_identifier: [u8; 128],
  publisher_identifier: [u8; 128],
  data_preparer_identifier: [u8; 128],
  application_identifier: [u8; 128],
  creation_date: LongDateTime,
  modification_date: LongDateTime,
  expiration_date: LongDateTime,
  effective_date: LongDateTime,
}

impl PrimaryVolumeDescriptor {
  /// Assembles the descriptor once layout has resolved every size and
  /// location. `root` supplies the embedded 34-octet root directory record
  /// (its self record).
  #[allow(clippy::too_many_arguments)]
  pub fn new(
    identifiers: &VolumeIdentifiers,
    volume_space_size: u32,
    path_table_size: u32,
    l_path_table_location: u32,
    optional_l_path_table_location: u32,
    m_path_table_location: u32,
    optional_m_path_table_location: u32,
    root: &Directory,
  ) -> Result<Self> {
    let mut descriptor = Self {
      // Character fields start out filler-filled so that identifiers left
      // empty still satisfy the unused-position requirement.
      system_identifier: [FILLER; 32],
      volume_identifier: [FILLER; 32],
      volume_space_size: U32BothEndian::new(volume_space_size),
      volume_set_size: U16BothEndian::new(1),
      volume_sequence_number: U16BothEndian::new(1),
      logical_block_size: U16BothEndian::new(LOGICAL_BLOCK_SIZE as u16),
      path_table_size: U32BothEndian::new(path_table_size),
      l_path_table_location,
      optional_l_path_table_location,
      m_path_table_location,
      optional_m_path_table_location,
      root_directory_record: [0; 34],
      volume_set_identifier: [FILLER; 128],
      publisher_identifier: [FILLER; 128],
      data_preparer_identifier: [FILLER; 128],
      application_identifier: [FILLER; 128],
      creation_date: LongDateTime::zero(),
      modification_date: LongDateTime::zero(),
      expiration_date: LongDateTime::zero(),
      effective_date: LongDateTime::zero(),
    };

    let mut root_record = Vec::with_capacity(34);
    root.self_record().write_to(&mut root_record)?;
    descriptor.root_directory_record.copy_from_slice(&root_record);

    encode_a_characters(&identifiers.system, &mut descriptor.system_identifier, true, true)?;
    encode_d_characters(&identifiers.volume, &mut descriptor.volume_identifier, true, true)?;
    encode_d_characters(
      &identifiers.volume_set,
      &mut descriptor.volume_set_identifier,
      true,
      true,
    )?;
    encode_a_characters(
      &identifiers.publisher,
      &mut descriptor.publisher_identifier,
      true,
      true,
    )?;
    encode_d_characters(
      &identifiers.data_preparer,
      &mut descriptor.data_preparer_identifier,
      true,
      true,
    )?;
    encode_a_characters(
      &identifiers.application,
      &mut descriptor.application_identifier,
      true,
      true,
    )?;

    Ok(descriptor)
  }

  /// Serializes the descriptor as exactly one logical block.
  pub fn write_to<W: Write>(&self, w: &mut W) -> std::io::Result<u64> {
    let mut block = [0u8; LOGICAL_BLOCK_SIZE as usize];

    block[0] = VOLUME_DESCRIPTOR_TYPE_PRIMARY;
    block[1..6].copy_from_slice(&STANDARD_IDENTIFIER);
    block[6] = VOLUME_DESCRIPTOR_VERSION;
    // block[7] unused.
    block[8..40].copy_from_slice(&self.system_identifier);
    block[40..72].copy_from_slice(&self.volume_identifier);
    // block[72..80] unused.
    block[80..88].copy_from_slice(&self.volume_space_size.to_bytes());
    // block[88..120] unused.
    block[120..124].copy_from_slice(&self.volume_set_size.to_bytes());
    block[124..128].copy_from_slice(&self.volume_sequence_number.to_bytes());
    block[128..132].copy_from_slice(&self.logical_block_size.to_bytes());
    block[132..140].copy_from_slice(&self.path_table_size.to_bytes());
    block[140..144].copy_from_slice(&self.l_path_table_location.to_le_bytes());
    block[144..148].copy_from_slice(&self.optional_l_path_table_location.to_le_bytes());
    block[148..152].copy_from_slice(&self.m_path_table_location.to_be_bytes());
    block[152..156].copy_from_slice(&self.optional_m_path_table_location.to_be_bytes());
    block[156..190].copy_from_slice(&self.root_directory_record);
    block[190..318].copy_from_slice(&self.volume_set_identifier);
    block[318..446].copy_from_slice(&self.publisher_identifier);
    block[446..574].copy_from_slice(&self.data_preparer_identifier);
    block[574..702].copy_from_slice(&self.application_identifier);
    // The three file identifier fields are unset, which is recorded as all
    // filler, never as zeros.
    block[702..739].fill(FILLER);
    block[739..776].fill(FILLER);
    block[776..813].fill(FILLER);
    block[813..830].copy_from_slice(&self.creation_date.to_bytes());
    block[830..847].copy_from_slice(&self.modification_date.to_bytes());
    block[847..864].copy_from_slice(&self.expiration_date.to_bytes());
    block[864..881].copy_from_slice(&self.effective_date.to_bytes());
    block[881] = FILE_STRUCTURE_VERSION;
    // block[882] reserved.
    block[883..1395].fill(FILLER);
    // block[1395..2048] reserved.

    w.write_all(&block)?;
    Ok(block.len() as u64)
  }
}

/// Terminates the volume descriptor set (ECMA-119 §9.3): a descriptor with
/// no payload.
#[derive(Debug)]
pub struct VolumeDescriptorSetTerminator;

impl VolumeDescriptorSetTerminator {
  pub fn write_to<W: Write>(&self, w: &mut W) -> std::io::Result<u64> {
    let mut block = [0u8; LOGICAL_BLOCK_SIZE as usize];
    block[0] = VOLUME_DESCRIPTOR_TYPE_TERMINATOR;
    block[1..6].copy_from_slice(&STANDARD_IDENTIFIER);
    block[6] = VOLUME_DESCRIPTOR_VERSION;

    w.write_all(&block)?;
    Ok(block.len() as u64)
  }
}
