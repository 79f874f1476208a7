use clap::Parser;
use lexelt::{
    resource::WordNet,
    score::{evaluate, load_answers},
    Error,
};
use std::path::PathBuf;

/// Scores system answers against gold answers, split into most and less frequent senses.
#[derive(Parser)]
#[clap(version)]
struct Opts {
    /// System answers, `doc_id instance_id key...` per line.
    system: PathBuf,
    /// Gold answers in the same format.
    #[clap(long, short)]
    gold: PathBuf,
    /// The WordNet directory (or its `dict` subdirectory).
    #[clap(long)]
    wordnet: PathBuf,
}

fn main() -> Result<(), Error> {
    env_logger::init();
    let opts = Opts::parse();

    let wordnet = WordNet::from_dict(&opts.wordnet)?;
    let gold = load_answers(&opts.gold)?;
    let system = load_answers(&opts.system)?;

    print!("{}", evaluate(&gold, &system, &wordnet));
    Ok(())
}
