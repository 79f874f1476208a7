use fs_err::File;
use log::info;
use std::{
    collections::HashMap,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

use super::{lemma_of, normalize_lemma, pos_of, LexicalResource, SenseEntry};
use crate::{
    types::{Pos, SenseGroupId},
    Error,
};

const DATA_FILES: &[(&str, Pos)] = &[
    ("data.noun", Pos::Noun),
    ("data.verb", Pos::Verb),
    ("data.adj", Pos::Adjective),
    ("data.adv", Pos::Adverb),
];

/// An in-memory WordNet. Built once per run and only read afterwards.
#[derive(Debug, Default, Clone)]
pub struct WordNet {
    senses: HashMap<(String, Pos), Vec<SenseEntry>>,
    group_keys: HashMap<SenseGroupId, Vec<String>>,
    hypernyms: HashMap<SenseGroupId, Vec<SenseGroupId>>,
    hyponyms: HashMap<SenseGroupId, Vec<SenseGroupId>>,
}

fn malformed(path: &Path, line: usize, reason: &str) -> Error {
    Error::MalformedArtifact {
        path: path.to_path_buf(),
        reason: format!("line {}: {}", line + 1, reason),
    }
}

impl WordNet {
    pub fn builder() -> WordNetBuilder {
        WordNetBuilder::default()
    }

    /// Loads WordNet from its database directory. Accepts both the `dict` directory itself and the
    /// WordNet root containing it.
    pub fn from_dict<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let mut dir: PathBuf = path.as_ref().to_path_buf();
        if !dir.join("index.sense").exists() && dir.join("dict").join("index.sense").exists() {
            dir = dir.join("dict");
        }

        let mut wordnet = WordNet::default();
        wordnet.read_index_sense(&dir.join("index.sense"))?;
        for (filename, pos) in DATA_FILES {
            let path = dir.join(filename);
            if path.exists() {
                wordnet.read_data(&path, *pos)?;
            }
        }

        for entries in wordnet.senses.values_mut() {
            entries.sort_by_key(|x| x.rank);
        }

        info!(
            "Loaded WordNet from {}: {} lemmas, {} sense groups.",
            dir.display(),
            wordnet.senses.len(),
            wordnet.group_keys.len()
        );

        Ok(wordnet)
    }

    fn read_index_sense(&mut self, path: &Path) -> Result<(), Error> {
        let reader = BufReader::new(File::open(path)?);

        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            let mut parts = line.split_whitespace();
            let (key, offset, rank) = match (parts.next(), parts.next(), parts.next()) {
                (Some(key), Some(offset), Some(rank)) => (key, offset, rank),
                _ => return Err(malformed(path, i, "expected at least three fields")),
            };

            let offset: u32 = offset
                .parse()
                .map_err(|_| malformed(path, i, "synset offset is not a number"))?;
            let rank: u32 = rank
                .parse()
                .map_err(|_| malformed(path, i, "sense number is not a number"))?;
            let (lemma, pos) = match (lemma_of(key), pos_of(key)) {
                (Some(lemma), Some(pos)) => (lemma, pos),
                _ => return Err(malformed(path, i, "invalid sense key")),
            };

            let group = SenseGroupId::new(pos, offset);
            self.group_keys
                .entry(group)
                .or_insert_with(Vec::new)
                .push(key.to_string());
            self.senses
                .entry((normalize_lemma(lemma), pos))
                .or_insert_with(Vec::new)
                .push(SenseEntry {
                    key: key.to_string(),
                    rank,
                    group,
                });
        }

        Ok(())
    }

    /// Reads the hypernym / hyponym pointers from a `data.*` file.
    fn read_data(&mut self, path: &Path, pos: Pos) -> Result<(), Error> {
        let reader = BufReader::new(File::open(path)?);

        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            // license header lines start with spaces
            if line.starts_with(' ') || line.trim().is_empty() {
                continue;
            }

            let fields: Vec<_> = line
                .split(" | ")
                .next()
                .unwrap_or("")
                .split_whitespace()
                .collect();
            if fields.len() < 4 {
                return Err(malformed(path, i, "synset line is too short"));
            }

            let offset: u32 = fields[0]
                .parse()
                .map_err(|_| malformed(path, i, "synset offset is not a number"))?;
            let group = SenseGroupId::new(pos, offset);

            let n_words = usize::from_str_radix(fields[3], 16)
                .map_err(|_| malformed(path, i, "word count is not a hex number"))?;
            let pointer_start = 4 + 2 * n_words;
            let n_pointers: usize = fields
                .get(pointer_start)
                .ok_or_else(|| malformed(path, i, "missing pointer count"))?
                .parse()
                .map_err(|_| malformed(path, i, "pointer count is not a number"))?;

            for p in 0..n_pointers {
                let base = pointer_start + 1 + 4 * p;
                let pointer = fields
                    .get(base..base + 4)
                    .ok_or_else(|| malformed(path, i, "truncated pointer"))?;

                let target_offset: u32 = pointer[1]
                    .parse()
                    .map_err(|_| malformed(path, i, "pointer offset is not a number"))?;
                let target_pos = Pos::from_tag(pointer[2])
                    .ok_or_else(|| malformed(path, i, "unknown pointer part-of-speech"))?;
                let target = SenseGroupId::new(target_pos, target_offset);

                match pointer[0] {
                    "@" => self
                        .hypernyms
                        .entry(group)
                        .or_insert_with(Vec::new)
                        .push(target),
                    "~" => self
                        .hyponyms
                        .entry(group)
                        .or_insert_with(Vec::new)
                        .push(target),
                    _ => {}
                }
            }
        }

        Ok(())
    }
}

impl LexicalResource for WordNet {
    fn senses(&self, lemma: &str, pos: Pos) -> Vec<SenseEntry> {
        self.senses
            .get(&(normalize_lemma(lemma), pos))
            .cloned()
            .unwrap_or_default()
    }

    fn group_keys(&self, group: SenseGroupId) -> Vec<String> {
        self.group_keys.get(&group).cloned().unwrap_or_default()
    }

    fn hypernyms(&self, group: SenseGroupId) -> Vec<SenseGroupId> {
        self.hypernyms.get(&group).cloned().unwrap_or_default()
    }

    fn hyponyms(&self, group: SenseGroupId) -> Vec<SenseGroupId> {
        self.hyponyms.get(&group).cloned().unwrap_or_default()
    }
}

/// Builds a [WordNet] in memory. Senses are ranked in the order they are added.
#[derive(Debug, Default)]
pub struct WordNetBuilder {
    wordnet: WordNet,
}

impl WordNetBuilder {
    /// Adds a sense group with the given sense keys.
    ///
    /// # Panics
    /// If a key is not a valid sense key.
    pub fn synset(mut self, group: SenseGroupId, keys: &[&str]) -> Self {
        for key in keys {
            let lemma = lemma_of(key).expect("sense key must contain '%'");
            let pos = pos_of(key).expect("sense key must have a valid type code");

            self.wordnet
                .group_keys
                .entry(group)
                .or_insert_with(Vec::new)
                .push(key.to_string());
            let entries = self
                .wordnet
                .senses
                .entry((normalize_lemma(lemma), pos))
                .or_insert_with(Vec::new);
            let rank = entries.len() as u32 + 1;
            entries.push(SenseEntry {
                key: key.to_string(),
                rank,
                group,
            });
        }
        self
    }

    /// Makes `parent` a hypernym of `child` and `child` a hyponym of `parent`.
    pub fn hypernym(mut self, child: SenseGroupId, parent: SenseGroupId) -> Self {
        self.wordnet
            .hypernyms
            .entry(child)
            .or_insert_with(Vec::new)
            .push(parent);
        self.wordnet
            .hyponyms
            .entry(parent)
            .or_insert_with(Vec::new)
            .push(child);
        self
    }

    pub fn build(self) -> WordNet {
        self.wordnet
    }
}
