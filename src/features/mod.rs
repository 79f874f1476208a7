//! Feature extraction. An instance is turned into a list of opaque string features by a chain of
//! [Extractor]s, configured by an ordered [FeatureConfig]. The same configuration must be used at
//! training and at inference time, so it is persisted next to the models.

use enum_dispatch::enum_dispatch;
use fs_err::File;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::{
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
};

use crate::{types::Instance, Error};

mod extractors;

pub use extractors::{BagOfWords, Collocations, PosWindow};

/// File name of the feature configuration stored in a model directory.
pub const CONFIG_FILENAME: &str = "features.json";

#[enum_dispatch]
#[derive(Debug, Clone, PartialEq)]
pub enum Extractor {
    BagOfWords,
    PosWindow,
    Collocations,
}

#[enum_dispatch(Extractor)]
pub trait Extract {
    /// Appends the features of the instance. Never removes or reorders existing features.
    fn extract(&self, instance: &Instance, features: &mut Vec<String>);
}

/// Options of one extractor, by name.
pub type Options = IndexMap<String, serde_json::Value>;

/// Name and options of one extractor in a [FeatureConfig].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtractorSpec {
    pub name: String,
    #[serde(default)]
    pub options: Options,
}

impl ExtractorSpec {
    pub fn new<S: Into<String>>(name: S) -> Self {
        ExtractorSpec {
            name: name.into(),
            options: Options::new(),
        }
    }

    pub fn option<S: Into<String>, V: Into<serde_json::Value>>(mut self, key: S, value: V) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }
}

impl Extractor {
    /// Builds an extractor from its configuration. Accepts the names used by older feature files
    /// (`extract_bow_lemmas`, `extract_pos`, `extract_collocations`).
    pub fn from_spec(spec: &ExtractorSpec) -> Result<Self, Error> {
        let options = extractors::OptionReader::new(&spec.name, &spec.options);

        Ok(match spec.name.as_str() {
            "bag_of_words" | "extract_bow_lemmas" => BagOfWords::from_options(options)?.into(),
            "pos_window" | "extract_pos" => PosWindow::from_options(options)?.into(),
            "collocations" | "extract_collocations" => {
                Collocations::from_options(options)?.into()
            }
            _ => return Err(Error::UnknownExtractor(spec.name.clone())),
        })
    }
}

/// The ordered extractor configuration of a model directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct FeatureConfig(Vec<ExtractorSpec>);

impl Default for FeatureConfig {
    /// Bag of words in a window of three sentences, part-of-speech tags of the three tokens around the
    /// target and the usual collocations of up to three tokens.
    fn default() -> Self {
        serde_json::from_str(include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/configs/features.json"
        )))
        .expect("bundled feature config is valid")
    }
}

impl FeatureConfig {
    pub fn new(specs: Vec<ExtractorSpec>) -> Self {
        FeatureConfig(specs)
    }

    pub fn specs(&self) -> &[ExtractorSpec] {
        &self.0
    }

    /// Reads a JSON configuration and checks that every extractor and option is known.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, Error> {
        let config: FeatureConfig = serde_json::from_reader(reader)?;
        config.chain()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        Self::from_reader(BufReader::new(File::open(path.as_ref())?))
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        let mut writer = BufWriter::new(File::create(path.as_ref())?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }

    /// Builds the extractors in configuration order.
    pub fn chain(&self) -> Result<FeatureChain, Error> {
        Ok(FeatureChain(
            self.0
                .iter()
                .map(Extractor::from_spec)
                .collect::<Result<_, _>>()?,
        ))
    }
}

/// Extractors applied one after another.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureChain(Vec<Extractor>);

impl FeatureChain {
    pub fn extractors(&self) -> &[Extractor] {
        &self.0
    }

    pub fn extract(&self, instance: &Instance) -> Vec<String> {
        let mut features = Vec::new();
        for extractor in &self.0 {
            extractor.extract(instance, &mut features);
        }
        features
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Pos, Token};

    #[test]
    fn default_config_is_valid() {
        let chain = FeatureConfig::default().chain().unwrap();

        assert_eq!(chain.extractors().len(), 3);
        assert!(matches!(chain.extractors()[2], Extractor::Collocations(_)));
    }

    #[test]
    fn unknown_extractors_are_rejected_at_load_time() {
        let json = r#"[{ "name": "bag_of_words" }, { "name": "extract_synonyms" }]"#;

        assert!(matches!(
            FeatureConfig::from_reader(json.as_bytes()),
            Err(Error::UnknownExtractor(name)) if name == "extract_synonyms"
        ));
    }

    #[test]
    fn bad_options_are_rejected_at_load_time() {
        let json = r#"[{ "name": "pos_window", "options": { "window": "wide" } }]"#;
        assert!(matches!(
            FeatureConfig::from_reader(json.as_bytes()),
            Err(Error::InvalidOption { .. })
        ));

        let json = r#"[{ "name": "pos_window", "options": { "size": 2 } }]"#;
        assert!(matches!(
            FeatureConfig::from_reader(json.as_bytes()),
            Err(Error::InvalidOption { .. })
        ));
    }

    #[test]
    fn accepts_legacy_names_and_numbers() {
        let json = r#"[
            { "name": "extract_pos", "options": { "window": 1 } },
            { "name": "extract_collocations", "options": { "collocations": "C#-1#-1" } }
        ]"#;
        let chain = FeatureConfig::from_reader(json.as_bytes())
            .unwrap()
            .chain()
            .unwrap();

        assert_eq!(chain.extractors()[0], Extractor::from(PosWindow { window: 1 }));
    }

    #[test]
    fn config_survives_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        let config = FeatureConfig::new(vec![
            ExtractorSpec::new("pos_window").option("window", "2"),
            ExtractorSpec::new("bag_of_words"),
        ]);

        config.save(&path).unwrap();
        assert_eq!(FeatureConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn chain_concatenates_in_order() {
        let tokens = vec![
            Token::new("t0", "Money", Some("money"), Some("NN")),
            Token::new("t1", "bank", Some("bank"), Some("NN")),
        ];
        let instance = Instance::new("i", "d", "bank", Pos::Noun, tokens, vec![1]);
        let chain = FeatureConfig::new(vec![
            ExtractorSpec::new("pos_window").option("window", 1),
            ExtractorSpec::new("bag_of_words"),
        ])
        .chain()
        .unwrap();

        assert_eq!(
            chain.extract(&instance),
            vec!["POS#-1#NN", "POS#0#NN", "BOW#money", "BOW#bank"]
        );
    }
}
