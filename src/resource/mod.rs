//! The lexical resource the senses come from.
//! Treated as a read-only graph: lemmas map to ordered senses, senses belong to sense groups and sense
//! groups have parents (hypernyms) and children (hyponyms). Every lookup tolerates unknown input by
//! returning an empty result.

use crate::types::{Pos, SenseGroupId};

mod wordnet;

pub use wordnet::{WordNet, WordNetBuilder};

/// One entry of the ordered sense list of a lemma.
#[derive(Debug, Clone, PartialEq)]
pub struct SenseEntry {
    pub key: String,
    /// 1-based, 1 is the most frequent sense.
    pub rank: u32,
    pub group: SenseGroupId,
}

pub trait LexicalResource {
    /// The ordered senses of a lemma. Empty if the lemma is unknown.
    fn senses(&self, lemma: &str, pos: Pos) -> Vec<SenseEntry>;

    /// All sense keys attached to a sense group.
    fn group_keys(&self, group: SenseGroupId) -> Vec<String>;

    /// The parents of a sense group.
    fn hypernyms(&self, group: SenseGroupId) -> Vec<SenseGroupId>;

    /// The children of a sense group.
    fn hyponyms(&self, group: SenseGroupId) -> Vec<SenseGroupId>;

    /// The number of distinct sense groups a lemma belongs to.
    fn sense_group_count(&self, lemma: &str, pos: Pos) -> usize {
        let mut groups: Vec<_> = self
            .senses(lemma, pos)
            .into_iter()
            .map(|x| x.group)
            .collect();
        groups.sort_unstable();
        groups.dedup();
        groups.len()
    }

    /// The key of the rank 1 sense.
    fn most_frequent_sense(&self, lemma: &str, pos: Pos) -> Option<String> {
        self.senses(lemma, pos).into_iter().next().map(|x| x.key)
    }

    /// Whether the lemma of a sense key has exactly one sense group for the part-of-speech of the key.
    /// Keys with an unknown type code are never monosemous.
    fn is_monosemous_key(&self, key: &str) -> bool {
        match (lemma_of(key), pos_of(key)) {
            (Some(lemma), Some(pos)) => self.sense_group_count(lemma, pos) == 1,
            _ => false,
        }
    }
}

impl<'a, T> LexicalResource for &'a T
where
    T: LexicalResource + ?Sized,
{
    fn senses(&self, lemma: &str, pos: Pos) -> Vec<SenseEntry> {
        (*self).senses(lemma, pos)
    }

    fn group_keys(&self, group: SenseGroupId) -> Vec<String> {
        (*self).group_keys(group)
    }

    fn hypernyms(&self, group: SenseGroupId) -> Vec<SenseGroupId> {
        (*self).hypernyms(group)
    }

    fn hyponyms(&self, group: SenseGroupId) -> Vec<SenseGroupId> {
        (*self).hyponyms(group)
    }
}

/// The lemma part of a sense key: `life%1:09:00::` -> `life`.
pub fn lemma_of(key: &str) -> Option<&str> {
    key.find('%').map(|i| &key[..i])
}

/// The part-of-speech encoded in the type code of a sense key: `life%1:09:00::` -> noun.
pub fn pos_of(key: &str) -> Option<Pos> {
    let i = key.find('%')?;
    key[i + 1..].chars().next().and_then(Pos::from_type_code)
}

/// Normalizes a lemma for lookup: lower case, spaces replaced by `_`.
pub fn normalize_lemma(lemma: &str) -> String {
    lemma.trim().to_lowercase().replace(' ', "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sense_key_parts() {
        assert_eq!(lemma_of("life%1:09:00::"), Some("life"));
        assert_eq!(pos_of("life%1:09:00::"), Some(Pos::Noun));
        assert_eq!(pos_of("poky%5:00:00:slow:01"), Some(Pos::Adjective));
        assert_eq!(pos_of("run%2:38:00::"), Some(Pos::Verb));
        assert_eq!(pos_of("fast%4:02:00::"), Some(Pos::Adverb));
        assert_eq!(pos_of("odd%7:00:00::"), None);
        assert_eq!(lemma_of("nokey"), None);
        assert_eq!(pos_of("nokey"), None);
    }

    #[test]
    fn lemmas_are_normalized() {
        assert_eq!(normalize_lemma("New York"), "new_york");
        assert_eq!(normalize_lemma(" Bank "), "bank");
    }
}
