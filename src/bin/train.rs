use clap::Parser;
use lexelt::{
    classifier::LearnerConfig,
    features::FeatureConfig,
    pipeline::{read_lemma_list, train_all},
    Error,
};
use std::path::PathBuf;

/// Trains one classifier per listed lexical item.
#[derive(Parser)]
#[clap(version)]
struct Opts {
    /// Folder with `<key>.bin` items.
    #[clap(long, short)]
    items: PathBuf,
    /// File with one item key (e.g. `bank.n`) per line.
    #[clap(long, short)]
    lemmas: PathBuf,
    /// Folder the models are written to.
    #[clap(long, short)]
    models: PathBuf,
    /// Feature configuration (JSON). The bundled default if not given.
    #[clap(long, short)]
    features: Option<PathBuf>,
    /// Learner configuration (JSON).
    #[clap(long)]
    learner: Option<PathBuf>,
    /// Overrides the regularisation constant of the learner.
    #[clap(long)]
    c: Option<f64>,
    /// Overrides the learner timeout in seconds.
    #[clap(long)]
    timeout: Option<u64>,
}

fn main() -> Result<(), Error> {
    env_logger::init();
    let opts = Opts::parse();

    let config = match &opts.features {
        Some(path) => FeatureConfig::load(path)?,
        None => FeatureConfig::default(),
    };
    let mut learner = match &opts.learner {
        Some(path) => LearnerConfig::load(path)?,
        None => LearnerConfig::default(),
    };
    if let Some(c) = opts.c {
        learner.c = c;
    }
    if let Some(timeout) = opts.timeout {
        learner.timeout_secs = timeout;
    }

    let lemmas = read_lemma_list(&opts.lemmas)?;
    let summary = train_all(&opts.items, &lemmas, &config, &learner, &opts.models)?;

    print!("{}", summary);
    println!("Models created in {}", opts.models.display());
    Ok(())
}
