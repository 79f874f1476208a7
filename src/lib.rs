//! Word sense disambiguation over a unified, sense-annotated corpus representation.
//! # Overview
//!
//! lexelt has the following core abstractions:
//! - A [LexicalItem][item::LexicalItem] holding every [Instance][types::Instance] of one lemma and
//!   coarse part-of-speech, deduplicated by content and annotated with the senses a
//!   [LexicalResource][resource::LexicalResource] knows for the lemma.
//! - The [enricher][enrich] computing co-occurring and cohyponym senses of each instance by walking
//!   the sense graph of the resource.
//! - A chain of [feature extractors][features::FeatureChain] turning an instance into string features,
//!   an [index][index::FeatureIndex] turning those into sparse integer vectors, and a per-item
//!   [Classifier][classifier::Classifier] driving an external learner over them.
//!
//! # Examples
//!
//! Train a classifier for one item and use it:
//!
//! ```no_run
//! use lexelt::{
//!     classifier::{Classifier, LearnerConfig},
//!     features::FeatureConfig,
//!     item::LexicalItem,
//!     types::Pos,
//!     Artifact,
//! };
//!
//! let item = LexicalItem::new("items/bank.n.bin")?;
//! let config = FeatureConfig::default();
//! let learner = LearnerConfig::default();
//!
//! Classifier::train(&item, &config, &learner, "models")?;
//!
//! if let Some(classifier) = Classifier::load("bank", Pos::Noun, "models")? {
//!     for prediction in classifier.classify(&item, &learner)? {
//!         println!("{} {:?}", prediction.instance, prediction.best());
//!     }
//! }
//! # Ok::<(), lexelt::Error>(())
//! ```

use std::{
    io::{self, BufReader, BufWriter, Read, Write},
    path::{Path, PathBuf},
};

use bincode::Options;
use fs_err::File;
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

pub mod classifier;
pub mod corpus;
pub mod enrich;
#[cfg(feature = "corpus")]
pub mod export;
pub mod features;
pub mod index;
pub mod item;
pub mod pipeline;
pub mod resource;
pub mod score;
pub mod types;
pub(crate) mod utils;

#[derive(Error, Debug)]
#[allow(missing_docs)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] io::Error),
    /// (De)serialization error. Can have occured during deserialization or during serialization.
    #[error(transparent)]
    Serialization(#[from] bincode::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("learner `{program}` failed for {item} with exit code {code:?}")]
    Subprocess {
        item: String,
        program: String,
        code: Option<i32>,
    },
    #[error("learner `{program}` did not finish within {seconds}s for {item}")]
    Timeout {
        item: String,
        program: String,
        seconds: u64,
    },
    #[error("malformed artifact at {path}: {reason}")]
    MalformedArtifact { path: PathBuf, reason: String },
    #[error("unknown feature extractor '{0}'")]
    UnknownExtractor(String),
    #[error("invalid option {option}='{value}' for extractor '{extractor}'")]
    InvalidOption {
        extractor: String,
        option: String,
        value: String,
    },
    #[error("instance '{instance}' has no gold sense to train on")]
    MissingLabel { instance: String },
    #[error("learner produced {found} output lines for {expected} instances")]
    OutputMismatch { expected: usize, found: usize },
    #[error("output {0} already exists, refusing to overwrite it")]
    OutputExists(PathBuf),
    #[error("corpus error: {0}")]
    Corpus(String),
    #[error("xml error: {0}")]
    Xml(String),
}

/// Upper bound in bytes for artifacts read from a reader of unknown length.
pub const MAX_ARTIFACT_SIZE: u64 = 1 << 32;

/// Deserializes with the encoding of [bincode::serialize_into], reading at most `limit` bytes. A
/// corrupted length prefix is then an error instead of a huge allocation.
pub(crate) fn deserialize_from<T: DeserializeOwned, R: Read>(
    reader: R,
    limit: u64,
) -> Result<T, Error> {
    Ok(bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .allow_trailing_bytes()
        .with_limit(limit)
        .deserialize_from(reader)?)
}

/// Something that is persisted as a bincode blob, e.g. a [LexicalItem][item::LexicalItem] or an
/// [index][index::FeatureIndex].
pub trait Artifact: Serialize + DeserializeOwned {
    fn new<P: AsRef<Path>>(p: P) -> Result<Self, Error> {
        let path = p.as_ref();
        let file = File::open(path)?;
        let size = file.metadata()?.len();

        Self::from_limited_reader(BufReader::new(file), size).map_err(|error| match error {
            Error::Serialization(error) => Error::MalformedArtifact {
                path: path.to_path_buf(),
                reason: error.to_string(),
            },
            error => error,
        })
    }

    fn from_reader<R: Read>(reader: R) -> Result<Self, Error> {
        Self::from_limited_reader(reader, MAX_ARTIFACT_SIZE)
    }

    /// Reads the artifact, failing if it would need more than `limit` bytes.
    fn from_limited_reader<R: Read>(reader: R, limit: u64) -> Result<Self, Error> {
        deserialize_from(reader, limit)
    }

    fn to_writer<W: Write>(&self, writer: W) -> Result<(), Error> {
        Ok(bincode::serialize_into(writer, self)?)
    }

    fn save<P: AsRef<Path>>(&self, p: P) -> Result<(), Error> {
        let mut writer = BufWriter::new(File::create(p.as_ref())?);
        self.to_writer(&mut writer)?;
        writer.flush()?;
        Ok(())
    }
}
