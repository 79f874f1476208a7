//! Batch processing over a list of lexical items. Failures of single items are logged and recorded
//! in the summary, they never abort the batch.

use fs_err as fs;
use indexmap::IndexMap;
use log::{info, warn};
use std::{
    fmt,
    io::{BufRead, BufReader, Write},
    path::{Path, PathBuf},
    str::FromStr,
};

use crate::{
    classifier::{self, Classifier, LearnerConfig, Prediction},
    features::FeatureConfig,
    item::{item_key, parse_item_key, LexicalItem},
    resource::LexicalResource,
    utils::artifact_paths,
    Artifact, Error,
};

/// Reads a newline-delimited list of item keys like `bank.n`. Blank lines are ignored.
pub fn read_lemma_list<P: AsRef<Path>>(path: P) -> Result<Vec<String>, Error> {
    let reader = BufReader::new(fs::File::open(path.as_ref())?);
    let mut keys = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if !line.is_empty() {
            keys.push(line.to_string());
        }
    }
    Ok(keys)
}

/// Resolves a listed key to the path of its item artifact, `None` if the key is not of the form
/// `lemma.p`.
fn item_path(items_dir: &Path, listed: &str) -> Option<(String, PathBuf)> {
    let (lemma, pos) = parse_item_key(listed)?;
    let key = item_key(&lemma, pos);
    let path = items_dir.join(format!("{}.bin", key));
    Some((key, path))
}

fn join(keys: &[String]) -> String {
    if keys.is_empty() {
        "-".to_string()
    } else {
        keys.join(", ")
    }
}

#[derive(Debug, Default)]
pub struct TrainSummary {
    pub trained: Vec<String>,
    /// Listed items without an artifact or without instances.
    pub missing: Vec<String>,
    /// Items whose training failed, with the reason.
    pub failed: Vec<(String, String)>,
}

impl fmt::Display for TrainSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Trained {} classifiers, {} items missing, {} failed.",
            self.trained.len(),
            self.missing.len(),
            self.failed.len()
        )?;
        writeln!(f, "Missing: {}", join(&self.missing))?;
        for (key, reason) in &self.failed {
            writeln!(f, "Failed: {} ({})", key, reason)?;
        }
        Ok(())
    }
}

/// Trains a classifier for every listed item whose artifact exists in `items_dir`.
pub fn train_all<P: AsRef<Path>, Q: AsRef<Path>>(
    items_dir: P,
    lemma_list: &[String],
    config: &FeatureConfig,
    learner: &LearnerConfig,
    model_dir: Q,
) -> Result<TrainSummary, Error> {
    let items_dir = items_dir.as_ref();
    let model_dir = model_dir.as_ref();

    config.chain()?;
    fs::create_dir_all(model_dir)?;
    classifier::store_config(config, model_dir)?;

    let mut summary = TrainSummary::default();

    for listed in lemma_list {
        let (key, path) = match item_path(items_dir, listed) {
            Some(x) => x,
            None => {
                warn!("'{}' is not an item key. Skipping.", listed);
                summary.missing.push(listed.clone());
                continue;
            }
        };

        if !path.exists() {
            info!("No artifact for {}, nothing trained.", key);
            summary.missing.push(key);
            continue;
        }

        let result = LexicalItem::new(&path).and_then(|item| {
            if item.is_empty() {
                return Ok(false);
            }
            Classifier::train(&item, config, learner, model_dir).map(|_| true)
        });

        match result {
            Ok(true) => summary.trained.push(key),
            Ok(false) => {
                info!("{} has no instances, nothing trained.", key);
                summary.missing.push(key);
            }
            Err(error) => {
                warn!("Training {} failed: {}", key, error);
                summary.failed.push((key, error.to_string()));
            }
        }
    }

    Ok(summary)
}

/// One line of a disambiguation output or gold file: `doc_id instance_id key`.
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub doc_id: String,
    pub instance_id: String,
    pub key: String,
}

impl Answer {
    /// The document id is the instance id up to its first `.`.
    pub fn new<S: Into<String>>(instance_id: S, key: S) -> Self {
        let instance_id = instance_id.into();
        let doc_id = instance_id
            .split('.')
            .next()
            .unwrap_or_default()
            .to_string();
        Answer {
            doc_id,
            instance_id,
            key: key.into(),
        }
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.doc_id, self.instance_id, self.key)
    }
}

impl FromStr for Answer {
    type Err = Error;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut fields = line.split_whitespace();
        match (fields.next(), fields.next(), fields.next()) {
            (Some(doc_id), Some(instance_id), Some(key)) => Ok(Answer {
                doc_id: doc_id.to_string(),
                instance_id: instance_id.to_string(),
                key: key.to_string(),
            }),
            _ => Err(Error::Corpus(format!("not an answer line: '{}'", line))),
        }
    }
}

#[derive(Debug, Default)]
pub struct DisambiguationSummary {
    /// The best sense of every predicted instance, sorted by instance id.
    pub answers: Vec<Answer>,
    pub items: usize,
    pub with_classifier: usize,
    pub without_classifier: Vec<String>,
    /// Items that could not be loaded or classified, with the reason.
    pub failed: Vec<(String, String)>,
    pub instances_predicted: usize,
    pub instances_skipped: usize,
}

impl DisambiguationSummary {
    pub fn write_answers<W: Write>(&self, mut writer: W) -> Result<(), Error> {
        for answer in &self.answers {
            writeln!(writer, "{}", answer)?;
        }
        Ok(())
    }
}

impl fmt::Display for DisambiguationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Processed {} items: {} with classifier, {} without, {} failed.",
            self.items,
            self.with_classifier,
            self.without_classifier.len(),
            self.failed.len()
        )?;
        writeln!(
            f,
            "Output generated for {} instances, {} skipped.",
            self.instances_predicted, self.instances_skipped
        )?;
        writeln!(f, "No classifier for: {}", join(&self.without_classifier))?;
        for (key, reason) in &self.failed {
            writeln!(f, "Failed: {} ({})", key, reason)?;
        }
        Ok(())
    }
}

fn predict<R: LexicalResource + ?Sized>(
    item: &LexicalItem,
    model_dir: &Path,
    resource: &R,
    learner: &LearnerConfig,
    summary: &mut DisambiguationSummary,
) -> Vec<Prediction> {
    let key = item.key();
    let classified = Classifier::load(item.lemma(), item.pos(), model_dir).and_then(|classifier| {
        classifier
            .map(|classifier| classifier.classify(item, learner))
            .transpose()
    });

    match classified {
        Ok(Some(predictions)) => {
            summary.with_classifier += 1;
            predictions
        }
        Ok(None) => {
            info!("No classifier for {}, using the most frequent sense.", key);
            summary.without_classifier.push(key);
            classifier::most_frequent_sense(item, resource)
        }
        Err(error) => {
            warn!(
                "Classifying {} failed: {}. Using the most frequent sense.",
                key, error
            );
            summary.failed.push((key, error.to_string()));
            classifier::most_frequent_sense(item, resource)
        }
    }
}

/// Disambiguates every listed item of `items_dir`. Items without a usable classifier get the most
/// frequent sense of the resource.
pub fn disambiguate_all<P: AsRef<Path>, Q: AsRef<Path>, R: LexicalResource + ?Sized>(
    items_dir: P,
    lemma_list: &[String],
    model_dir: Q,
    resource: &R,
    learner: &LearnerConfig,
) -> DisambiguationSummary {
    let items_dir = items_dir.as_ref();
    let model_dir = model_dir.as_ref();
    let mut summary = DisambiguationSummary::default();

    for listed in lemma_list {
        let (key, path) = match item_path(items_dir, listed) {
            Some(x) => x,
            None => {
                warn!("'{}' is not an item key. Skipping.", listed);
                continue;
            }
        };
        if !path.exists() {
            warn!("No artifact for {} in {}.", key, items_dir.display());
            continue;
        }

        let mut item = match LexicalItem::new(&path) {
            Ok(item) => item,
            Err(error) => {
                warn!("Loading {} failed: {}", key, error);
                summary.failed.push((key, error.to_string()));
                continue;
            }
        };

        info!("Running classification for {}.", key);
        summary.items += 1;

        let predictions = predict(&item, model_dir, resource, learner, &mut summary);
        classifier::attach(&mut item, &predictions);

        for instance in &item {
            match instance.confidence().first() {
                Some((best, _)) => {
                    summary.instances_predicted += 1;
                    summary
                        .answers
                        .push(Answer::new(instance.id(), best.as_str()));
                }
                None => summary.instances_skipped += 1,
            }
        }
    }

    summary
        .answers
        .sort_by(|a, b| a.instance_id.cmp(&b.instance_id));
    summary
}

/// Merges the items of several shard folders into `output`, which must not exist yet. Items with the
/// same key are merged, duplicate instances across shards are dropped. Returns the number of items
/// written.
pub fn merge_folders<P: AsRef<Path>, Q: AsRef<Path>>(inputs: &[P], output: Q) -> Result<usize, Error> {
    let output = output.as_ref();
    if output.exists() {
        return Err(Error::OutputExists(output.to_path_buf()));
    }

    let mut items: IndexMap<String, LexicalItem> = IndexMap::new();

    for input in inputs {
        for path in artifact_paths(input)? {
            let item = LexicalItem::new(&path)?;
            let key = item.key();

            match items.get_mut(&key) {
                Some(existing) => {
                    let before = existing.len();
                    let added = existing.merge(item);
                    info!(
                        "{}: merged {}, {} -> {} instances.",
                        key,
                        path.display(),
                        before,
                        before + added
                    );
                }
                None => {
                    items.insert(key, item);
                }
            }
        }
    }

    fs::create_dir_all(output)?;
    for item in items.values() {
        item.save_in(output)?;
    }

    Ok(items.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        resource::WordNet,
        types::{Instance, Pos, SenseGroupId, Token},
    };

    fn item(lemma: &str, ids: &[&str]) -> LexicalItem {
        let mut item = LexicalItem::empty(lemma, Pos::Noun);
        for id in ids {
            let tokens = vec![Token::new(format!("{}.t", id), id.to_string(), None, None)];
            item.add_instance(Instance::new(
                id.to_string(),
                "d".into(),
                lemma.into(),
                Pos::Noun,
                tokens,
                vec![0],
            ));
        }
        item
    }

    #[test]
    fn answers_use_document_prefix() {
        let answer = Answer::new("d001.s002.t003", "bank%1:14:00::");

        assert_eq!(answer.doc_id, "d001");
        assert_eq!(answer.to_string(), "d001 d001.s002.t003 bank%1:14:00::");
        assert_eq!(answer.to_string().parse::<Answer>().unwrap(), answer);
        assert!("d001 d001.s002".parse::<Answer>().is_err());
    }

    #[test]
    fn reads_lemma_lists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lemmas.txt");
        std::fs::write(&path, "bank.n\n\n  run.v \n").unwrap();

        assert_eq!(read_lemma_list(&path).unwrap(), vec!["bank.n", "run.v"]);
    }

    #[test]
    fn falls_back_without_models() {
        let items = tempfile::tempdir().unwrap();
        let models = tempfile::tempdir().unwrap();
        item("bank", &["d2.s1.t1", "d1.s1.t1"])
            .save_in(items.path())
            .unwrap();
        item("zyzzyva", &["d1.s2.t1"]).save_in(items.path()).unwrap();

        let wordnet = WordNet::builder()
            .synset(SenseGroupId::new(Pos::Noun, 1), &["bank%1:14:00::"])
            .build();
        let list = vec![
            "bank.n".to_string(),
            "zyzzyva.n".to_string(),
            "absent.n".to_string(),
        ];

        let summary = disambiguate_all(
            items.path(),
            &list,
            models.path(),
            &wordnet,
            &LearnerConfig::default(),
        );

        assert_eq!(summary.items, 2);
        assert_eq!(summary.with_classifier, 0);
        assert_eq!(summary.without_classifier, vec!["bank.n", "zyzzyva.n"]);
        assert_eq!(summary.instances_predicted, 2);
        assert_eq!(summary.instances_skipped, 1);
        assert_eq!(
            summary.answers,
            vec![
                Answer::new("d1.s1.t1", "bank%1:14:00::"),
                Answer::new("d2.s1.t1", "bank%1:14:00::"),
            ]
        );

        let mut buffer = Vec::new();
        summary.write_answers(&mut buffer).unwrap();
        assert_eq!(
            String::from_utf8(buffer).unwrap(),
            "d1 d1.s1.t1 bank%1:14:00::\nd2 d2.s1.t1 bank%1:14:00::\n"
        );
        assert!(summary.to_string().contains("Processed 2 items"));
    }

    #[test]
    fn train_all_records_missing_and_failed_items() {
        let items = tempfile::tempdir().unwrap();
        let models = tempfile::tempdir().unwrap();
        // no gold keys, so training fails before the learner runs
        item("bank", &["a"]).save_in(items.path()).unwrap();
        LexicalItem::empty("run", Pos::Verb)
            .save_in(items.path())
            .unwrap();

        let list = vec!["bank.n".to_string(), "run.v".to_string(), "x.n".to_string()];
        let summary = train_all(
            items.path(),
            &list,
            &FeatureConfig::default(),
            &LearnerConfig::default(),
            models.path().join("models"),
        )
        .unwrap();

        assert!(summary.trained.is_empty());
        assert_eq!(summary.missing, vec!["run.v", "x.n"]);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].0, "bank.n");
        assert!(models
            .path()
            .join("models")
            .join(crate::features::CONFIG_FILENAME)
            .exists());
    }

    #[test]
    fn merges_shards() {
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        item("bank", &["x", "y"]).save_in(a.path()).unwrap();
        item("bank", &["y", "z"]).save_in(b.path()).unwrap();
        item("run", &["r"]).save_in(b.path()).unwrap();

        let output = out.path().join("merged");
        assert_eq!(merge_folders(&[a.path(), b.path()], &output).unwrap(), 2);

        let merged = LexicalItem::new(output.join("bank.n.bin")).unwrap();
        assert_eq!(merged.len(), 3);

        assert!(matches!(
            merge_folders(&[a.path()], &output),
            Err(Error::OutputExists(_))
        ));
    }
}
