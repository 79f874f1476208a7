//! One classifier per lexical item, trained and applied through the external [learner](LearnerConfig).
//!
//! A model directory holds, per item key, the learner's model (`<key>.model`), its training log
//! (`<key>.model.log`), the feature index (`<key>.features.bin`) and the class index
//! (`<key>.classes.bin`), plus one [FeatureConfig] shared by all items of the directory.

use fs_err as fs;
use log::{debug, info, warn};
use std::{
    cmp::Ordering,
    collections::HashMap,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use crate::{
    features::{FeatureChain, FeatureConfig, CONFIG_FILENAME},
    index::{ClassIndex, FeatureIndex},
    item::{item_key, LexicalItem},
    resource::LexicalResource,
    types::Pos,
    Artifact, Error,
};

mod learner;

pub use learner::LearnerConfig;

/// The ranked sense hypotheses for one instance.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub instance: String,
    /// Sense keys with their confidence, best first. Confidences are on the learner's own scale.
    pub senses: Vec<(String, f64)>,
}

impl Prediction {
    pub fn best(&self) -> Option<&str> {
        self.senses.first().map(|(key, _)| key.as_str())
    }
}

struct ModelPaths {
    model: PathBuf,
    log: PathBuf,
    features: PathBuf,
    classes: PathBuf,
}

impl ModelPaths {
    fn new(dir: &Path, key: &str) -> Self {
        ModelPaths {
            model: dir.join(format!("{}.model", key)),
            log: dir.join(format!("{}.model.log", key)),
            features: dir.join(format!("{}.features.bin", key)),
            classes: dir.join(format!("{}.classes.bin", key)),
        }
    }
}

/// A trained classifier, ready for inference. The indices are frozen.
#[derive(Debug)]
pub struct Classifier {
    key: String,
    model: PathBuf,
    chain: FeatureChain,
    features: FeatureIndex,
    classes: ClassIndex,
}

/// Writes the feature configuration of a model directory, or checks it against the existing one.
pub(crate) fn store_config(config: &FeatureConfig, dir: &Path) -> Result<(), Error> {
    let path = dir.join(CONFIG_FILENAME);
    if path.exists() {
        if &FeatureConfig::load(&path)? != config {
            warn!(
                "{} differs from the configuration used for training. Keeping the existing one.",
                path.display()
            );
        }
        return Ok(());
    }
    config.save(path)
}

impl Classifier {
    /// Trains a classifier for the item and stores it in `dir`. The first gold key of each instance
    /// is its label.
    pub fn train<P: AsRef<Path>>(
        item: &LexicalItem,
        config: &FeatureConfig,
        learner: &LearnerConfig,
        dir: P,
    ) -> Result<Classifier, Error> {
        let dir = dir.as_ref();
        let key = item.key();
        let chain = config.chain()?;

        let mut features = FeatureIndex::default();
        let mut classes = ClassIndex::default();

        // staged next to the final artifacts so they can be moved into place with a rename
        fs::create_dir_all(dir)?;
        let scratch = tempfile::Builder::new().prefix(".lexelt").tempdir_in(dir)?;
        let training = scratch.path().join(format!("{}.train", key));
        let mut writer = BufWriter::new(fs::File::create(&training)?);

        let mut n_features = 0;
        for instance in item {
            let label = instance
                .gold()
                .first()
                .ok_or_else(|| Error::MissingLabel {
                    instance: instance.id().to_string(),
                })?;
            let class = classes.id_or_insert(label);

            let extracted = chain.extract(instance);
            n_features += extracted.len();
            let vector = features.encode_and_update(&extracted);
            learner::write_line(&mut writer, class, &vector)?;
        }
        writer.flush()?;
        drop(writer);

        info!(
            "Training {} on {} instances, {} features ({} distinct), {} classes.",
            key,
            item.len(),
            n_features,
            features.len(),
            classes.len()
        );

        let paths = ModelPaths::new(dir, &key);
        let staged = ModelPaths::new(scratch.path(), &key);
        learner.learn(&key, &training, &staged.model, &paths.log)?;
        features.save(&staged.features)?;
        classes.save(&staged.classes)?;

        // earlier artifacts are only replaced once the learner succeeded
        fs::rename(&staged.features, &paths.features)?;
        fs::rename(&staged.classes, &paths.classes)?;
        fs::rename(&staged.model, &paths.model)?;
        store_config(config, dir)?;

        Ok(Classifier {
            key,
            model: paths.model,
            chain,
            features,
            classes,
        })
    }

    /// Loads the classifier of an item from `dir`. `Ok(None)` if no classifier was trained for it.
    pub fn load<P: AsRef<Path>>(lemma: &str, pos: Pos, dir: P) -> Result<Option<Classifier>, Error> {
        let dir = dir.as_ref();
        let key = item_key(lemma, pos);
        let paths = ModelPaths::new(dir, &key);

        if !(paths.model.exists() && paths.features.exists() && paths.classes.exists()) {
            debug!("No classifier for {} in {}.", key, dir.display());
            return Ok(None);
        }

        let config_path = dir.join(CONFIG_FILENAME);
        if !config_path.exists() {
            return Err(Error::MalformedArtifact {
                path: config_path,
                reason: "model directory has no feature configuration".into(),
            });
        }

        Ok(Some(Classifier {
            chain: FeatureConfig::load(&config_path)?.chain()?,
            features: FeatureIndex::new(&paths.features)?,
            classes: ClassIndex::new(&paths.classes)?,
            model: paths.model,
            key,
        }))
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn classes(&self) -> &ClassIndex {
        &self.classes
    }

    /// Ranks the senses of every instance of the item, in instance order. Ties keep ascending class
    /// order.
    pub fn classify(
        &self,
        item: &LexicalItem,
        learner: &LearnerConfig,
    ) -> Result<Vec<Prediction>, Error> {
        if item.is_empty() {
            return Ok(Vec::new());
        }

        let scratch = tempfile::Builder::new().prefix("lexelt").tempdir()?;
        let test = scratch.path().join(format!("{}.test", self.key));
        let output = scratch.path().join(format!("{}.out", self.key));

        let mut writer = BufWriter::new(fs::File::create(&test)?);
        for instance in item {
            let vector = self.features.encode(&self.chain.extract(instance));
            learner::write_line(&mut writer, 1, &vector)?;
        }
        writer.flush()?;
        drop(writer);

        learner.classify(&self.key, &test, &self.model, &output)?;

        let scores = learner::read_scores(fs::File::open(&output)?, &output)?;
        if scores.len() != item.len() {
            return Err(Error::OutputMismatch {
                expected: item.len(),
                found: scores.len(),
            });
        }

        Ok(item
            .iter()
            .zip(scores)
            .map(|(instance, scores)| Prediction {
                instance: instance.id().to_string(),
                senses: self.rank(&scores),
            })
            .collect())
    }

    fn rank(&self, scores: &[f64]) -> Vec<(String, f64)> {
        let mut ranked: Vec<_> = scores
            .iter()
            .enumerate()
            .filter_map(|(i, score)| {
                self.classes
                    .string(i as u32 + 1)
                    .map(|key| (key.to_string(), *score))
            })
            .collect();

        // stable, so equal scores stay in class order
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        ranked
    }
}

/// Predicts the most frequent sense of the item for every instance, with confidence 1.0. If the
/// resource has no sense for the item, the predictions are empty.
pub fn most_frequent_sense<R: LexicalResource + ?Sized>(
    item: &LexicalItem,
    resource: &R,
) -> Vec<Prediction> {
    let mfs = resource.most_frequent_sense(item.lemma(), item.pos());
    if mfs.is_none() {
        warn!("No senses for {}, its instances stay unlabeled.", item.key());
    }

    item.iter()
        .map(|instance| Prediction {
            instance: instance.id().to_string(),
            senses: mfs.iter().map(|key| (key.clone(), 1.0)).collect(),
        })
        .collect()
}

/// Stores the predictions as the confidences of the instances they belong to.
pub fn attach(item: &mut LexicalItem, predictions: &[Prediction]) {
    let by_id: HashMap<_, _> = predictions
        .iter()
        .map(|prediction| (prediction.instance.as_str(), prediction))
        .collect();

    for instance in item.instances_mut() {
        if let Some(prediction) = by_id.get(instance.id()) {
            instance.set_predictions(&prediction.senses);
        }
    }
}
