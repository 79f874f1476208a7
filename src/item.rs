//! The lexical item: all instances of one lemma and coarse part-of-speech.

use indexmap::IndexMap;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::{
    collections::HashSet,
    io::Read,
    path::{Path, PathBuf},
};

use crate::{
    resource::LexicalResource,
    types::{Instance, Pos, Sense},
    Artifact, Error,
};

/// Bumped whenever the serialized layout of [LexicalItem] changes.
const FORMAT_VERSION: u16 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LexicalItem {
    version: u16,
    lemma: String,
    pos: Pos,
    instances: Vec<Instance>,
    checksums: HashSet<String>,
    senses: IndexMap<String, Sense>,
}

impl Artifact for LexicalItem {
    fn from_limited_reader<R: Read>(reader: R, limit: u64) -> Result<Self, Error> {
        let item: LexicalItem = crate::deserialize_from(reader, limit)?;

        if item.version != FORMAT_VERSION {
            return Err(Error::Serialization(Box::new(bincode::ErrorKind::Custom(
                format!(
                    "lexical item has format version {}, expected {}",
                    item.version, FORMAT_VERSION
                ),
            ))));
        }

        Ok(item)
    }
}

/// The key of a lexical item e. g. `bank.n`. Used as file stem of the persisted item and its models.
pub fn item_key(lemma: &str, pos: Pos) -> String {
    format!("{}.{}", lemma.to_lowercase(), pos).replace('/', "_")
}

/// Parses an item key like `bank.n` into lemma and part-of-speech. The lemma may itself contain dots.
pub fn parse_item_key(key: &str) -> Option<(String, Pos)> {
    let key = key.trim();
    let i = key.rfind('.')?;
    let pos = Pos::from_tag(&key[i + 1..])?;
    if i == 0 {
        return None;
    }
    Some((key[..i].to_string(), pos))
}

impl LexicalItem {
    /// Creates an item without instances and without senses.
    pub fn empty<S: Into<String>>(lemma: S, pos: Pos) -> Self {
        LexicalItem {
            version: FORMAT_VERSION,
            lemma: lemma.into(),
            pos,
            instances: Vec::new(),
            checksums: HashSet::new(),
            senses: IndexMap::new(),
        }
    }

    pub fn lemma(&self) -> &str {
        &self.lemma
    }

    pub fn pos(&self) -> Pos {
        self.pos
    }

    pub fn key(&self) -> String {
        item_key(&self.lemma, self.pos)
    }

    /// The senses of this item by key, in the order of the resource.
    pub fn senses(&self) -> &IndexMap<String, Sense> {
        &self.senses
    }

    pub fn is_valid_key(&self, key: &str) -> bool {
        self.senses.contains_key(key)
    }

    /// Whether any of the keys is a sense of this item.
    pub fn contains_valid_key<S: AsRef<str>>(&self, keys: &[S]) -> bool {
        keys.iter().any(|key| self.is_valid_key(key.as_ref()))
    }

    /// Looks up the senses of the item in the resource. The sense map is populated only once, later
    /// calls do nothing. Returns the number of senses.
    pub fn set_senses<R: LexicalResource + ?Sized>(&mut self, resource: &R) -> usize {
        if !self.senses.is_empty() {
            return self.senses.len();
        }

        for entry in resource.senses(&self.lemma, self.pos) {
            self.senses.insert(
                entry.key.clone(),
                Sense {
                    key: entry.key,
                    rank: entry.rank,
                    group: entry.group,
                },
            );
        }

        if self.senses.is_empty() {
            debug!("No senses found for {}.", self.key());
        }

        let senses = &self.senses;
        self.instances
            .iter_mut()
            .for_each(|instance| instance.set_sense_rank(senses));

        self.senses.len()
    }

    /// Adds an instance unless an instance with the same content exists already.
    /// Returns whether the instance was added.
    pub fn add_instance(&mut self, mut instance: Instance) -> bool {
        let checksum = instance.checksum();
        if self.checksums.contains(&checksum) {
            debug!(
                "Instance {} already exists for {}. Not added.",
                instance.id(),
                self.key()
            );
            return false;
        }

        if !self.senses.is_empty() {
            instance.set_sense_rank(&self.senses);
        }

        self.instances.push(instance);
        self.checksums.insert(checksum);
        true
    }

    /// Adds all instances of another item with the same key. Returns the number of instances added.
    pub fn merge(&mut self, other: LexicalItem) -> usize {
        debug_assert_eq!(self.key(), other.key());

        if self.senses.is_empty() && !other.senses.is_empty() {
            self.senses = other.senses;
            let senses = &self.senses;
            self.instances
                .iter_mut()
                .for_each(|instance| instance.set_sense_rank(senses));
        }

        other
            .instances
            .into_iter()
            .map(|instance| self.add_instance(instance))
            .filter(|added| *added)
            .count()
    }

    pub fn instances(&self) -> &[Instance] {
        &self.instances
    }

    pub(crate) fn instances_mut(&mut self) -> &mut [Instance] {
        &mut self.instances
    }

    /// The instances ordered by source document and id.
    pub fn sorted_instances(&self) -> Vec<&Instance> {
        let mut instances: Vec<_> = self.instances.iter().collect();
        instances.sort_by(|a, b| a.output_order(b));
        instances
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Instance> {
        self.instances.iter()
    }

    /// Writes the item to `<dir>/<key>.bin` and returns the path.
    pub fn save_in<P: AsRef<Path>>(&self, dir: P) -> Result<PathBuf, Error> {
        let path = dir.as_ref().join(format!("{}.bin", self.key()));
        self.save(&path)?;
        info!(
            "Saved {} with {} instances to {}.",
            self.key(),
            self.len(),
            path.display()
        );
        Ok(path)
    }
}

impl<'a> IntoIterator for &'a LexicalItem {
    type Item = &'a Instance;
    type IntoIter = std::slice::Iter<'a, Instance>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
