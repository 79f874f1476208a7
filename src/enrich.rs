//! Computes the [SenseRelations] of instances by walking the sense graph of a [LexicalResource].
//!
//! For each gold sense of an instance known to the item:
//! - the *co-occurring* senses are the other keys of its sense group,
//! - the *cohyponym* senses are the keys of the groups sharing a parent with its sense group,
//!   minus the keys of its own group.
//!
//! Both sets are additionally filtered down to keys whose lemma is monosemous.

use log::debug;
use std::collections::{BTreeSet, HashMap};

use crate::{
    item::LexicalItem,
    resource::LexicalResource,
    types::{Instance, SenseGroupId, SenseRelations},
};

/// Walks the sense graph, caching lookups so instances sharing a gold sense group are cheap.
pub struct Enricher<'r, R: LexicalResource + ?Sized> {
    resource: &'r R,
    group_keys: HashMap<SenseGroupId, Vec<String>>,
    cohyponyms: HashMap<SenseGroupId, BTreeSet<String>>,
    monosemous: HashMap<String, bool>,
}

impl<'r, R: LexicalResource + ?Sized> Enricher<'r, R> {
    pub fn new(resource: &'r R) -> Self {
        Enricher {
            resource,
            group_keys: HashMap::new(),
            cohyponyms: HashMap::new(),
            monosemous: HashMap::new(),
        }
    }

    fn group_keys(&mut self, group: SenseGroupId) -> &[String] {
        let resource = self.resource;
        self.group_keys
            .entry(group)
            .or_insert_with(|| resource.group_keys(group))
            .as_slice()
    }

    fn cohyponym_keys(&mut self, group: SenseGroupId) -> BTreeSet<String> {
        if let Some(keys) = self.cohyponyms.get(&group) {
            return keys.clone();
        }

        let own: BTreeSet<String> = self.group_keys(group).iter().cloned().collect();
        let mut keys = BTreeSet::new();

        for parent in self.resource.hypernyms(group) {
            for sibling in self.resource.hyponyms(parent) {
                if sibling == group {
                    continue;
                }
                keys.extend(
                    self.group_keys(sibling)
                        .iter()
                        .filter(|key| !own.contains(*key))
                        .cloned(),
                );
            }
        }

        self.cohyponyms.insert(group, keys.clone());
        keys
    }

    fn monosemous(&mut self, keys: &BTreeSet<String>) -> BTreeSet<String> {
        let resource = self.resource;
        keys.iter()
            .filter(|key| {
                *self
                    .monosemous
                    .entry((*key).clone())
                    .or_insert_with(|| resource.is_monosemous_key(key))
            })
            .cloned()
            .collect()
    }

    /// Computes the relations of the given (key, sense group) pairs.
    pub fn relations(&mut self, gold: &[(&str, SenseGroupId)]) -> SenseRelations {
        let mut co_senses = BTreeSet::new();
        let mut cohyponym_senses = BTreeSet::new();

        for (key, group) in gold {
            co_senses.extend(
                self.group_keys(*group)
                    .iter()
                    .filter(|other| other != key)
                    .cloned(),
            );
            cohyponym_senses.extend(self.cohyponym_keys(*group));
        }

        SenseRelations {
            mono_co_senses: self.monosemous(&co_senses),
            mono_cohyponym_senses: self.monosemous(&cohyponym_senses),
            co_senses,
            cohyponym_senses,
        }
    }

    fn enrich_instance(&mut self, item: &LexicalItem, instance: &Instance) -> SenseRelations {
        let gold: Vec<_> = instance
            .gold()
            .iter()
            .filter_map(|key| {
                item.senses()
                    .get(key)
                    .map(|sense| (key.as_str(), sense.group))
            })
            .collect();

        self.relations(&gold)
    }

    /// Sets the relations of every instance of the item. The senses of the item must be populated.
    pub fn enrich(&mut self, mut item: LexicalItem) -> LexicalItem {
        let relations: Vec<_> = item
            .iter()
            .map(|instance| self.enrich_instance(&item, instance))
            .collect();

        for (instance, relations) in item.instances_mut().iter_mut().zip(relations) {
            debug!(
                "{}: {} co-senses, {} cohyponym senses.",
                instance.id(),
                relations.co_senses.len(),
                relations.cohyponym_senses.len()
            );
            instance.relations = relations;
        }

        item
    }
}

/// Returns the item with the [SenseRelations] of all its instances set.
pub fn enrich<R: LexicalResource + ?Sized>(item: LexicalItem, resource: &R) -> LexicalItem {
    Enricher::new(resource).enrich(item)
}
