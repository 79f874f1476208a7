//! Append-only mappings from strings to positive integers, used for features and for classes.
//! Ids are 1-based and assigned in first-seen order. Once persisted next to a model, an index is only
//! read: unseen strings are dropped instead of being assigned an id.

use bimap::BiMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::Artifact;

/// Feature ids with their number of occurences, sorted by id.
pub type SparseVector = Vec<(u32, u32)>;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Index {
    map: BiMap<String, u32>,
}

/// Maps string features to feature ids.
pub type FeatureIndex = Index;
/// Maps sense keys to class ids.
pub type ClassIndex = Index;

impl Artifact for Index {}

impl Index {
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// The id of `string`, assigning the next free id if it has none yet.
    pub fn id_or_insert(&mut self, string: &str) -> u32 {
        if let Some(id) = self.map.get_by_left(string) {
            return *id;
        }

        let id = self.map.len() as u32 + 1;
        self.map.insert(string.to_string(), id);
        id
    }

    pub fn id(&self, string: &str) -> Option<u32> {
        self.map.get_by_left(string).copied()
    }

    pub fn string(&self, id: u32) -> Option<&str> {
        self.map.get_by_right(&id).map(|x| x.as_str())
    }

    /// Entries sorted by id.
    pub fn entries(&self) -> Vec<(&str, u32)> {
        let mut entries: Vec<_> = self.map.iter().map(|(s, id)| (s.as_str(), *id)).collect();
        entries.sort_by_key(|x| x.1);
        entries
    }

    fn count<I: IntoIterator<Item = u32>>(ids: I) -> SparseVector {
        let mut counts = BTreeMap::new();
        for id in ids {
            *counts.entry(id).or_insert(0) += 1;
        }
        counts.into_iter().collect()
    }

    /// Encodes features at training time: every feature gets an id, unseen ones are added to the index.
    pub fn encode_and_update<S: AsRef<str>>(&mut self, features: &[S]) -> SparseVector {
        let ids: Vec<_> = features
            .iter()
            .map(|feature| self.id_or_insert(feature.as_ref()))
            .collect();
        Self::count(ids)
    }

    /// Encodes features at inference time: unseen features are dropped and the index is left as is.
    pub fn encode<S: AsRef<str>>(&self, features: &[S]) -> SparseVector {
        Self::count(
            features
                .iter()
                .filter_map(|feature| self.id(feature.as_ref())),
        )
    }

    /// Encodes features, updating the index only if `update_index` is set.
    pub fn encode_with<S: AsRef<str>>(&mut self, features: &[S], update_index: bool) -> SparseVector {
        if update_index {
            self.encode_and_update(features)
        } else {
            self.encode(features)
        }
    }

    /// Turns a sparse vector back into the features it was encoded from, in id order.
    pub fn decode(&self, vector: &[(u32, u32)]) -> Vec<&str> {
        vector
            .iter()
            .filter_map(|(id, count)| {
                self.string(*id)
                    .map(|string| std::iter::repeat(string).take(*count as usize))
            })
            .flatten()
            .collect()
    }
}
