//! Turning annotated corpora into lexical items.
//!
//! Every corpus dialect gets its own adapter. Adapters read documents into [Sentence]s and let a
//! [ContextBuilder] assemble the [Instance]s, which an [ItemCollector] groups into items. Format quirks
//! stay in the adapters.

use indexmap::IndexMap;
use log::{debug, info};
use std::{
    collections::HashMap,
    path::Path,
};

use crate::{
    enrich::Enricher,
    item::{item_key, LexicalItem},
    resource::LexicalResource,
    types::{Instance, Pos, Token},
    Error,
};

#[cfg(feature = "corpus")]
pub mod semeval2013;

/// A sentence of a document.
#[derive(Debug, Clone, PartialEq)]
pub struct Sentence {
    pub id: String,
    pub tokens: Vec<Token>,
}

/// A target occurence inside a sentence.
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    pub instance_id: String,
    pub lemma: String,
    pub pos: Pos,
    /// Positions of the target tokens in its sentence.
    pub positions: Vec<usize>,
    pub gold: Vec<String>,
}

/// Builds instances whose context is the sentence of the target plus up to `window` sentences on
/// each side.
#[derive(Debug, Clone, Copy)]
pub struct ContextBuilder {
    window: usize,
}

impl Default for ContextBuilder {
    fn default() -> Self {
        ContextBuilder { window: 3 }
    }
}

impl ContextBuilder {
    pub fn new(window: usize) -> Self {
        ContextBuilder { window }
    }

    /// Builds the instance of a target in `sentences[sentence]`. Every context token records the
    /// distance of its sentence to the sentence of the target.
    ///
    /// # Panics
    /// If `sentence` is out of range or the target has no positions.
    pub fn build(
        &self,
        docsrc: &str,
        sentences: &[Sentence],
        sentence: usize,
        target: Target,
    ) -> Instance {
        let start = sentence.saturating_sub(self.window);
        let end = (sentence + self.window).min(sentences.len() - 1);

        let mut tokens = Vec::new();
        let mut positions = HashMap::new();
        let mut heads = Vec::new();

        for (index, current) in sentences.iter().enumerate().take(end + 1).skip(start) {
            let relative = index as i32 - sentence as i32;

            if index == sentence {
                heads.extend(target.positions.iter().map(|position| tokens.len() + position));
            }

            for token in &current.tokens {
                positions.insert(token.id().to_string(), relative);
                tokens.push(token.clone());
            }
        }

        Instance::new(
            target.instance_id,
            docsrc.to_string(),
            target.lemma,
            target.pos,
            tokens,
            heads,
        )
        .with_sentence_positions(positions)
        .with_gold(target.gold)
    }
}

/// Collects instances into lexical items, created on first sighting of their lemma and
/// part-of-speech with the senses of the resource.
pub struct ItemCollector<'r, R: LexicalResource + ?Sized> {
    resource: &'r R,
    items: IndexMap<String, LexicalItem>,
    added: usize,
    duplicates: usize,
}

impl<'r, R: LexicalResource + ?Sized> ItemCollector<'r, R> {
    pub fn new(resource: &'r R) -> Self {
        ItemCollector {
            resource,
            items: IndexMap::new(),
            added: 0,
            duplicates: 0,
        }
    }

    /// Adds an instance to its item. Returns false for duplicates.
    pub fn add(&mut self, instance: Instance) -> bool {
        let key = item_key(instance.lemma(), instance.pos());
        let resource = self.resource;
        let item = self.items.entry(key).or_insert_with(|| {
            let mut item = LexicalItem::empty(instance.lemma(), instance.pos());
            item.set_senses(resource);
            item
        });

        if item.add_instance(instance) {
            self.added += 1;
            true
        } else {
            self.duplicates += 1;
            false
        }
    }

    /// The number of instances added, and the number dropped as duplicates.
    pub fn counts(&self) -> (usize, usize) {
        (self.added, self.duplicates)
    }

    /// Enriches every item and returns them in first-seen order.
    pub fn finish(self) -> Vec<LexicalItem> {
        info!(
            "Collected {} instances in {} items, {} duplicates dropped.",
            self.added,
            self.items.len(),
            self.duplicates
        );

        let mut enricher = Enricher::new(self.resource);
        self.items
            .into_iter()
            .map(|(key, item)| {
                debug!("Enriching {}.", key);
                enricher.enrich(item)
            })
            .collect()
    }
}

/// Creates the output directory of a conversion. Fails if it exists already.
pub fn create_output_dir<P: AsRef<Path>>(path: P) -> Result<(), Error> {
    let path = path.as_ref();
    if path.exists() {
        return Err(Error::OutputExists(path.to_path_buf()));
    }
    fs_err::create_dir_all(path)?;
    Ok(())
}

/// Saves items as `<key>.bin` into `dir`.
pub fn save_items<P: AsRef<Path>>(items: &[LexicalItem], dir: P) -> Result<(), Error> {
    for item in items {
        item.save_in(dir.as_ref())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{resource::WordNet, types::SenseGroupId};

    fn sentences(n: usize) -> Vec<Sentence> {
        (0..n)
            .map(|i| Sentence {
                id: format!("s{}", i),
                tokens: (0..2)
                    .map(|j| Token::new(format!("s{}_{}", i, j), format!("w{}{}", i, j), None, None))
                    .collect(),
            })
            .collect()
    }

    fn target(id: &str, positions: Vec<usize>) -> Target {
        Target {
            instance_id: id.to_string(),
            lemma: "bank".to_string(),
            pos: Pos::Noun,
            positions,
            gold: vec!["bank%1:14:00::".to_string()],
        }
    }

    #[test]
    fn window_is_clipped_at_document_bounds() {
        let sentences = sentences(6);
        let instance = ContextBuilder::new(2).build("d", &sentences, 1, target("i", vec![1]));

        // sentences 0 to 3
        assert_eq!(instance.tokens().len(), 8);
        assert_eq!(instance.heads(), &[3]);
        assert_eq!(instance.tokens()[3].id(), "s1_1");
        assert_eq!(instance.sentence_position("s0_0"), -1);
        assert_eq!(instance.sentence_position("s3_1"), 2);
        assert_eq!(instance.gold(), &["bank%1:14:00::"]);
        assert_eq!(instance.docsrc(), "d");
    }

    #[test]
    fn multiword_targets_keep_all_heads() {
        let sentences = sentences(1);
        let instance = ContextBuilder::default().build("d", &sentences, 0, target("i", vec![0, 1]));

        assert_eq!(instance.heads(), &[0, 1]);
        assert_eq!(instance.whole_text(), "w00#w01");
    }

    #[test]
    fn collector_groups_and_deduplicates() {
        let wordnet = WordNet::builder()
            .synset(SenseGroupId::new(Pos::Noun, 1), &["bank%1:14:00::"])
            .build();
        let sentences = sentences(2);
        let builder = ContextBuilder::default();

        let mut collector = ItemCollector::new(&wordnet);
        assert!(collector.add(builder.build("d", &sentences, 0, target("a", vec![0]))));
        assert!(!collector.add(builder.build("d", &sentences, 0, target("b", vec![0]))));
        assert!(collector.add(builder.build("d", &sentences, 1, target("c", vec![0]))));
        assert_eq!(collector.counts(), (2, 1));

        let items = collector.finish();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].key(), "bank.n");
        assert_eq!(items[0].len(), 2);
        assert!(items[0].iter().all(|x| x.sense_rank() == 1));
    }

    #[test]
    fn refuses_existing_output() {
        let dir = tempfile::tempdir().unwrap();

        assert!(matches!(
            create_output_dir(dir.path()),
            Err(Error::OutputExists(_))
        ));
        assert!(create_output_dir(dir.path().join("new")).is_ok());
    }
}
