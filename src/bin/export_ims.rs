use clap::Parser;
use lexelt::{export::export_items, Error};
use std::path::PathBuf;

/// Converts item artifacts to the IMS lexical sample format (XML and key files).
#[derive(Parser)]
#[clap(version)]
struct Opts {
    /// Folder with `<key>.bin` items.
    #[clap(long, short)]
    input: PathBuf,
    /// Output folder, must not exist.
    #[clap(long, short)]
    output: PathBuf,
}

fn main() -> Result<(), Error> {
    env_logger::init();
    let opts = Opts::parse();

    let summary = export_items(&opts.input, &opts.output)?;
    println!("List of words in {}", summary.word_list.display());
    println!("Total number of items: {}", summary.items);
    println!("Total number of instances: {}", summary.instances);
    Ok(())
}
