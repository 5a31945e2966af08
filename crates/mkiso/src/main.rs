use std::fs;
use std::io::{BufWriter, Write};

use iso9660::{HostDirectory, Image, VolumeIdentifiers};

mod cli;

fn main() {
  pretty_env_logger::init();

  let cli = cli::parse();

  if let Err(err) = run(&cli) {
    log::error!("{err}");
    std::process::exit(1);
  }
}

fn run(cli: &cli::Cli) -> Result<(), Box<dyn std::error::Error>> {
  let identifiers = VolumeIdentifiers {
    volume: cli.volume_id.clone(),
    publisher: cli.publisher.clone(),
    application: cli.application.clone(),
    ..Default::default()
  };

  let image = Image::with_identifiers(HostDirectory::new(&cli.dir), identifiers);

  let output = fs::File::create(&cli.output)?;
  let mut writer = BufWriter::new(output);
  let written = image.write_to(&mut writer)?;
  writer.flush()?;

  log::info!("wrote {written} bytes to {}", cli.output.display());

  Ok(())
}
