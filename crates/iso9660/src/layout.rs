//! Extent allocation: assigns every path table, directory, and file its
//! starting block.
//!
//! Layout runs in two passes. Sizing happens implicitly while the tree is
//! built (directories maintain their block-rounded data lengths as entries
//! are added, which also fixes the path table size), and only then are
//! locations handed out from a single advancing cursor. Neither pass could
//! run alone: the path table's size depends on every directory, and no
//! record can be emitted until every structure before it has a size.

use crate::tree::Directory;

/// Logical block size, fixed at the near-universal value. The logical
/// sector size is the same, which keeps block arithmetic trivial.
pub const LOGICAL_BLOCK_SIZE: u32 = 2048;

/// Hands out ascending block numbers, advancing by whole blocks.
#[derive(Debug)]
pub struct BlockAllocator {
  next_block: u32,
}

impl BlockAllocator {
  pub fn new(first_block: u32) -> Self {
    Self {
      next_block: first_block,
    }
  }

  /// Reserves enough whole blocks for `size` bytes and returns the first of
  /// them. A zero-sized allocation reserves nothing and returns the current
  /// cursor.
  pub fn allocate(&mut self, size: u32) -> u32 {
    let block = self.next_block;
    self.next_block += (size + LOGICAL_BLOCK_SIZE - 1) / LOGICAL_BLOCK_SIZE;
    block
  }

  /// The first block not yet allocated. After layout this is the total
  /// number of blocks in the volume.
  pub fn next_block(&self) -> u32 {
    self.next_block
  }
}

/// Assigns every directory and file under `root` (inclusive) its starting
/// block, in breadth-first order.
pub fn relocate_tree(root: &Directory, allocator: &mut BlockAllocator) {
  for entry in root.walk(false) {
    entry.relocate(allocator.allocate(entry.data_length()));
  }
}
