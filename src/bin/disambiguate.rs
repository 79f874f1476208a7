use clap::Parser;
use lexelt::{
    classifier::LearnerConfig,
    pipeline::{disambiguate_all, read_lemma_list},
    resource::WordNet,
    Error,
};
use std::{io, path::PathBuf};

/// Disambiguates the listed lexical items. Answers go to stdout, the summary to stderr.
#[derive(Parser)]
#[clap(version)]
struct Opts {
    /// Folder with `<key>.bin` items.
    #[clap(long, short)]
    items: PathBuf,
    /// File with one item key (e.g. `bank.n`) per line.
    #[clap(long, short)]
    lemmas: PathBuf,
    /// Folder with trained models.
    #[clap(long, short)]
    models: PathBuf,
    /// The WordNet directory (or its `dict` subdirectory), used for the most frequent sense.
    #[clap(long)]
    wordnet: PathBuf,
    /// Learner configuration (JSON).
    #[clap(long)]
    learner: Option<PathBuf>,
    /// Overrides the learner timeout in seconds.
    #[clap(long)]
    timeout: Option<u64>,
}

fn main() -> Result<(), Error> {
    env_logger::init();
    let opts = Opts::parse();

    let mut learner = match &opts.learner {
        Some(path) => LearnerConfig::load(path)?,
        None => LearnerConfig::default(),
    };
    if let Some(timeout) = opts.timeout {
        learner.timeout_secs = timeout;
    }

    let wordnet = WordNet::from_dict(&opts.wordnet)?;
    let lemmas = read_lemma_list(&opts.lemmas)?;

    let summary = disambiguate_all(&opts.items, &lemmas, &opts.models, &wordnet, &learner);
    eprint!("{}", summary);

    let stdout = io::stdout();
    summary.write_answers(stdout.lock())?;
    Ok(())
}
