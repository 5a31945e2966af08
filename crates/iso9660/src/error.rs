use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
  /// Strict encoding saw a character outside the target alphabet, even
  /// after uppercasing.
  #[error("input string contains characters that violate encoding")]
  InvalidCharacters,
  /// The encode target is shorter than the input. Should never occur under
  /// correct field sizing.
  #[error("provided buffer is not big enough to hold encoded result")]
  BufferTooSmall,
  #[error("invalid file version number; must be in the range 1-32767 (inclusive)")]
  InvalidVersion,
  #[error("unsupported file identifier encoding")]
  UnsupportedEncoding,
  #[error("cannot write blocks in non-sequential order or rewrite existing blocks")]
  NonSequentialBlockWrite,
  #[error("file too large for a single extent: {path}")]
  FileTooLarge { path: PathBuf },
  #[error("failed to read source directory '{path}': {source}")]
  ReadDir {
    path: PathBuf,
    source: std::io::Error,
  },
  #[error("failed to open source file '{path}': {source}")]
  OpenFile {
    path: PathBuf,
    source: std::io::Error,
  },
  /// I/O failure on the output sink, surfaced verbatim.
  #[error("I/O error: {0}")]
  Io(#[from] std::io::Error),
}
