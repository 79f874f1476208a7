use clap::Parser;
use lexelt::{
    corpus::{create_output_dir, save_items, semeval2013, ContextBuilder},
    resource::WordNet,
    Error,
};
use std::path::PathBuf;

/// Converts the SemEval-2013 all-words data into one lexical item artifact per lemma and
/// part-of-speech.
#[derive(Parser)]
#[clap(version)]
struct Opts {
    /// The corpus XML file.
    #[clap(long)]
    xml: PathBuf,
    /// The gold key file. Only instances listed here are converted.
    #[clap(long)]
    key: PathBuf,
    /// The WordNet directory (or its `dict` subdirectory).
    #[clap(long)]
    wordnet: PathBuf,
    /// Output directory, must not exist.
    #[clap(long, short)]
    output: PathBuf,
    /// Number of sentences of context on each side of the target.
    #[clap(long, default_value = "3")]
    window: usize,
}

fn main() -> Result<(), Error> {
    env_logger::init();
    let opts = Opts::parse();

    create_output_dir(&opts.output)?;
    let wordnet = WordNet::from_dict(&opts.wordnet)?;

    let items = semeval2013::convert(
        &opts.xml,
        &opts.key,
        &wordnet,
        ContextBuilder::new(opts.window),
    )?;
    save_items(&items, &opts.output)?;

    let instances: usize = items.iter().map(|x| x.len()).sum();
    println!(
        "Converted {} instances into {} items in {}.",
        instances,
        items.len(),
        opts.output.display()
    );
    Ok(())
}
