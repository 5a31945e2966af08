//! The two on-disk date/time representations: the 7-octet numerical form
//! used by directory records and the 17-octet digit form used by volume
//! descriptors.

use chrono::{Datelike, TimeZone, Timelike, Utc};

/// Numerical date and time as recorded in a directory record
/// (ECMA-119 §10.1.6).
///
/// Instants are normalised to UTC on conversion, so the GMT offset octet is
/// always zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordDateTime {
  pub years_since_1900: u8,
  pub month: u8,
  pub day: u8,
  pub hour: u8,
  pub minute: u8,
  pub second: u8,
  /// GMT offset in 15-minute intervals.
  pub gmt_offset: i8,
}

impl RecordDateTime {
  pub fn to_bytes(self) -> [u8; 7] {
    [
      self.years_since_1900,
      self.month,
      self.day,
      self.hour,
      self.minute,
      self.second,
      self.gmt_offset as u8,
    ]
  }
}

impl<Tz: TimeZone> From<chrono::DateTime<Tz>> for RecordDateTime {
  fn from(instant: chrono::DateTime<Tz>) -> Self {
    let utc = instant.with_timezone(&Utc);

    Self {
      years_since_1900: (utc.year().max(1900) - 1900) as u8,
      month: utc.month() as u8,
      day: utc.day() as u8,
      hour: utc.hour() as u8,
      minute: utc.minute() as u8,
      second: utc.second() as u8,
      gmt_offset: 0,
    }
  }
}

/// Digit-based date and time as recorded in volume descriptors
/// (ECMA-119 §9.4.27.2): four ASCII digits of year, two each of month, day,
/// hour, minute, second, and centiseconds, then the GMT offset octet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LongDateTime {
  pub year: [u8; 4],
  pub month: [u8; 2],
  pub day: [u8; 2],
  pub hour: [u8; 2],
  pub minute: [u8; 2],
  pub second: [u8; 2],
  pub centiseconds: [u8; 2],
  /// GMT offset in 15-minute intervals.
  pub gmt_offset: i8,
}

impl LongDateTime {
  /// The unset value: ASCII `'0'` in every digit position and offset zero.
  pub fn zero() -> Self {
    Self {
      year: [b'0'; 4],
      month: [b'0'; 2],
      day: [b'0'; 2],
      hour: [b'0'; 2],
      minute: [b'0'; 2],
      second: [b'0'; 2],
      centiseconds: [b'0'; 2],
      gmt_offset: 0,
    }
  }

  pub fn to_bytes(self) -> [u8; 17] {
    let mut bytes = [0u8; 17];
    bytes[0..4].copy_from_slice(&self.year);
    bytes[4..6].copy_from_slice(&self.month);
    bytes[6..8].copy_from_slice(&self.day);
    bytes[8..10].copy_from_slice(&self.hour);
    bytes[10..12].copy_from_slice(&self.minute);
    bytes[12..14].copy_from_slice(&self.second);
    bytes[14..16].copy_from_slice(&self.centiseconds);
    bytes[16] = self.gmt_offset as u8;
    bytes
  }
}

impl Default for LongDateTime {
  fn default() -> Self {
    Self::zero()
  }
}
