use clap::Parser;
use lexelt::{pipeline::merge_folders, Error};
use std::path::PathBuf;

/// Merges item folders of several corpus shards.
#[derive(Parser)]
#[clap(version)]
struct Opts {
    /// Folders with `<key>.bin` items.
    #[clap(required = true)]
    inputs: Vec<PathBuf>,
    /// Output folder, must not exist.
    #[clap(long, short)]
    output: PathBuf,
}

fn main() -> Result<(), Error> {
    env_logger::init();
    let opts = Opts::parse();

    let n = merge_folders(&opts.inputs[..], &opts.output)?;
    println!("Merged {} items into {}.", n, opts.output.display());
    Ok(())
}
