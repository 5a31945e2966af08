use clap::Parser;
use std::path::PathBuf;

/// Create an ISO 9660 image from a directory.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Cli {
  /// Source directory whose contents become the volume.
  #[arg(long)]
  pub dir: PathBuf,

  /// Path of the image file to write.
  #[arg(long)]
  pub output: PathBuf,

  /// Volume identifier recorded in the primary volume descriptor.
  #[arg(long, default_value = "ISO9660")]
  pub volume_id: String,

  /// Publisher identifier recorded in the primary volume descriptor.
  #[arg(long, default_value = "")]
  pub publisher: String,

  /// Application identifier recorded in the primary volume descriptor.
  #[arg(long, default_value = "")]
  pub application: String,
}

pub fn parse() -> Cli {
  Cli::parse()
}
