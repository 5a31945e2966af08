//! Authoring of ECMA-119 (ISO 9660) volume images.
//!
//! An [Image] consumes a [DirectorySource] and emits a byte stream that a
//! conforming ISO 9660 reader can mount: volume descriptors at blocks 16
//! and 17, both path tables, then every directory body and file extent in
//! breadth-first order, all aligned to 2048-octet logical blocks.
//!
//! ```no_run
//! use iso9660::{HostDirectory, Image};
//!
//! # fn main() -> iso9660::Result<()> {
//! let image = Image::new(HostDirectory::new("./sysroot"));
//! let out = std::fs::File::create("out.iso")?;
//! let bytes = image.write_to(std::io::BufWriter::new(out))?;
//! # Ok(())
//! # }
//! ```
//!
//! The lower layers are exposed for callers that assemble trees by hand:
//! the tree model ([Directory], [File]), the layout engine, path tables,
//! volume descriptors, and the block writer.

pub mod block;
pub mod datetime;
pub mod encode;
pub mod error;
pub mod image;
pub mod layout;
pub mod path_table;
pub mod record;
pub mod source;
pub mod tree;
pub mod volume;

pub use error::{Error, Result};
pub use image::Image;
pub use layout::LOGICAL_BLOCK_SIZE;
pub use record::{DirectoryRecord, FileFlags, FileIdentifier, PathTableRecord};
pub use source::{DirectorySource, HostDirectory, SourceEntry};
pub use tree::{Directory, Entry, File};
pub use volume::VolumeIdentifiers;
