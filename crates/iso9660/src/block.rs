//! Sequential, block-addressed writing over an arbitrary byte sink.
//!
//! The writer is the only place block-level padding happens: payloads above
//! it emit variable-length streams, and the writer zero-fills skipped
//! blocks and rounds every payload up to a whole number of blocks.

use std::io::Write;

use crate::error::{Error, Result};
use crate::layout::LOGICAL_BLOCK_SIZE;

/// Counts bytes as they pass through to the wrapped writer.
struct CountingWriter<W> {
  inner: W,
  count: u64,
}

impl<W: Write> CountingWriter<W> {
  fn new(inner: W) -> Self {
    Self { inner, count: 0 }
  }
}

impl<W: Write> Write for CountingWriter<W> {
  fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
    let written = self.inner.write(buf)?;
    self.count += written as u64;
    Ok(written)
  }

  fn flush(&mut self) -> std::io::Result<()> {
    self.inner.flush()
  }
}

/// Writes logical blocks to a sink in strictly ascending order.
pub struct BlockWriter<W> {
  sink: CountingWriter<W>,
  current_block: u32,
}

impl<W: Write> BlockWriter<W> {
  pub fn new(sink: W) -> Self {
    Self {
      sink: CountingWriter::new(sink),
      current_block: 0,
    }
  }

  /// Writes a payload starting at block `number`.
  ///
  /// Blocks between the current position and `number` are zero-filled, and
  /// the payload is zero-padded up to the next block boundary. Writing at a
  /// block lower than the current position fails with
  /// [Error::NonSequentialBlockWrite] before anything reaches the sink.
  pub fn write_block_with<F>(&mut self, number: u32, payload: F) -> Result<()>
  where
    F: FnOnce(&mut dyn Write) -> Result<u64>,
  {
    if number < self.current_block {
      return Err(Error::NonSequentialBlockWrite);
    }

    let zero_block = [0u8; LOGICAL_BLOCK_SIZE as usize];
    while number > self.current_block {
      self.sink.write_all(&zero_block)?;
      self.current_block += 1;
    }

    let count_before = self.sink.count;
    payload(&mut self.sink)?;
    let content_size = self.sink.count - count_before;

    let content_blocks = content_size.div_ceil(LOGICAL_BLOCK_SIZE as u64);
    let padding = content_blocks * LOGICAL_BLOCK_SIZE as u64 - content_size;
    if padding > 0 {
      // Never more than one block's worth.
      self.sink.write_all(&zero_block[..padding as usize])?;
    }

    self.current_block += content_blocks as u32;

    Ok(())
  }

  /// Total bytes pushed to the sink, including zero fill and padding.
  pub fn bytes_written(&self) -> u64 {
    self.sink.count
  }
}
