//! Adapter for the SemEval-2013 task 12 multilingual all-words data (the English WordNet part).
//!
//! Documents look like
//! ```xml
//! <corpus lang="en">
//!   <text id="d001">
//!     <sentence id="d001.s001">
//!       <wf lemma="the" pos="DT">The</wf>
//!       <instance id="d001.s001.t001" lemma="group" pos="NOUN">group</instance>
//!     </sentence>
//!   </text>
//! </corpus>
//! ```
//! and the key file has one `doc_id instance_id key...` line per annotated instance. Only instances
//! listed in the key file are converted.

use fs_err as fs;
use log::{debug, info};
use std::{
    collections::HashMap,
    io::{BufRead, BufReader, Read},
    path::Path,
};

use super::{ContextBuilder, ItemCollector, Sentence, Target};
use crate::{
    item::LexicalItem,
    resource::LexicalResource,
    types::{Pos, Token},
    Error,
};

impl From<roxmltree::Error> for Error {
    fn from(error: roxmltree::Error) -> Self {
        Error::Corpus(error.to_string())
    }
}

/// Reads the gold keys by instance id.
pub fn read_keys<R: Read>(reader: R) -> Result<HashMap<String, Vec<String>>, Error> {
    let mut keys = HashMap::new();

    for line in BufReader::new(reader).lines() {
        let line = line?;
        let mut fields = line.split_whitespace();
        let _doc_id = fields.next();
        if let Some(id) = fields.next() {
            keys.insert(id.to_string(), fields.map(String::from).collect());
        }
    }

    Ok(keys)
}

/// A parsed document: its id, sentences and the targets by sentence index.
pub struct Document {
    pub id: String,
    pub sentences: Vec<Sentence>,
    pub targets: Vec<(usize, Target)>,
}

fn attribute(node: roxmltree::Node, name: &str) -> Result<String, Error> {
    node.attribute(name).map(String::from).ok_or_else(|| {
        Error::Corpus(format!(
            "<{}> without '{}' attribute",
            node.tag_name().name(),
            name
        ))
    })
}

/// Parses the documents of a corpus file, keeping the targets listed in `keys`.
pub fn parse_documents(
    xml: &str,
    keys: &HashMap<String, Vec<String>>,
) -> Result<Vec<Document>, Error> {
    let document = roxmltree::Document::parse(xml)?;
    let mut documents = Vec::new();

    for text in document
        .root_element()
        .children()
        .filter(|x| x.has_tag_name("text"))
    {
        let text_id = attribute(text, "id")?;
        let mut sentences = Vec::new();
        let mut targets = Vec::new();

        for sentence in text.children().filter(|x| x.has_tag_name("sentence")) {
            let sentence_id = attribute(sentence, "id")?;
            let mut tokens = Vec::new();

            for (i, element) in sentence.children().filter(|x| x.is_element()).enumerate() {
                tokens.push(Token::new(
                    format!("{}_{}_{}", text_id, sentence_id, i),
                    element.text().unwrap_or_default().to_string(),
                    element.attribute("lemma").map(String::from),
                    element.attribute("pos").map(String::from),
                ));

                if !element.has_tag_name("instance") {
                    continue;
                }

                let id = attribute(element, "id")?;
                let gold = match keys.get(&id) {
                    Some(gold) => gold.clone(),
                    None => continue,
                };
                let pos_tag = attribute(element, "pos")?;
                let pos = match Pos::from_tag(&pos_tag) {
                    Some(pos) => pos,
                    None => {
                        debug!("{} has part-of-speech {}. Skipping.", id, pos_tag);
                        continue;
                    }
                };

                targets.push((
                    sentences.len(),
                    Target {
                        instance_id: id,
                        lemma: attribute(element, "lemma")?,
                        pos,
                        positions: vec![i],
                        gold,
                    },
                ));
            }

            sentences.push(Sentence {
                id: sentence_id,
                tokens,
            });
        }

        documents.push(Document {
            id: text_id,
            sentences,
            targets,
        });
    }

    Ok(documents)
}

/// Converts a corpus file and its key file into enriched lexical items.
pub fn convert<P: AsRef<Path>, Q: AsRef<Path>, R: LexicalResource + ?Sized>(
    xml_path: P,
    key_path: Q,
    resource: &R,
    builder: ContextBuilder,
) -> Result<Vec<LexicalItem>, Error> {
    let keys = read_keys(fs::File::open(key_path.as_ref())?)?;
    let xml = fs::read_to_string(xml_path.as_ref())?;
    let documents = parse_documents(&xml, &keys)?;

    let mut collector = ItemCollector::new(resource);
    for document in documents {
        for (sentence, target) in document.targets {
            collector.add(builder.build(&document.id, &document.sentences, sentence, target));
        }
    }

    let (added, _) = collector.counts();
    info!("Converted {} of {} keyed instances.", added, keys.len());
    Ok(collector.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{resource::WordNet, types::SenseGroupId};

    const XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<corpus lang="en">
  <text id="d001">
    <sentence id="d001.s001">
      <wf lemma="the" pos="DT">The</wf>
      <instance id="d001.s001.t001" lemma="bank" pos="NOUN">bank</instance>
      <wf lemma="close" pos="VBD">closed</wf>
    </sentence>
    <sentence id="d001.s002">
      <instance id="d001.s002.t001" lemma="quickly" pos="ADV">Quickly</instance>
      <instance id="d001.s002.t002" lemma="bank" pos="NOUN">banks</instance>
    </sentence>
  </text>
</corpus>"#;

    const KEYS: &str = "d001 d001.s001.t001 bank%1:14:00::\n\
                        d001 d001.s002.t001 quickly%4:02:00::\n";

    #[test]
    fn keeps_keyed_instances_only() {
        let keys = read_keys(KEYS.as_bytes()).unwrap();
        let documents = parse_documents(XML, &keys).unwrap();

        assert_eq!(documents.len(), 1);
        let document = &documents[0];
        assert_eq!(document.sentences.len(), 2);
        assert_eq!(document.sentences[0].tokens[1].id(), "d001_d001.s001_1");
        assert_eq!(document.sentences[1].tokens[0].lemma(), Some("quickly"));

        let ids: Vec<_> = document
            .targets
            .iter()
            .map(|(sentence, target)| (*sentence, target.instance_id.as_str(), target.pos))
            .collect();
        assert_eq!(
            ids,
            vec![
                (0, "d001.s001.t001", Pos::Noun),
                (1, "d001.s002.t001", Pos::Adverb)
            ]
        );
    }

    #[test]
    fn converts_into_items() {
        let dir = tempfile::tempdir().unwrap();
        let xml = dir.path().join("corpus.xml");
        let key = dir.path().join("corpus.key");
        std::fs::write(&xml, XML).unwrap();
        std::fs::write(&key, KEYS).unwrap();
        let wordnet = WordNet::builder()
            .synset(SenseGroupId::new(Pos::Noun, 1), &["bank%1:14:00::"])
            .build();

        let items = convert(&xml, &key, &wordnet, ContextBuilder::default()).unwrap();

        assert_eq!(items.len(), 2);
        let bank = &items[0];
        assert_eq!(bank.key(), "bank.n");
        let instance = &bank.instances()[0];
        assert_eq!(instance.docsrc(), "d001");
        assert_eq!(instance.tokens().len(), 5);
        assert_eq!(instance.head(), 1);
        assert_eq!(instance.sense_rank(), 1);
        assert_eq!(instance.sentence_position("d001_d001.s002_0"), 1);
        assert_eq!(items[1].key(), "quickly.r");
    }

    #[test]
    fn broken_xml_is_a_corpus_error() {
        assert!(matches!(
            parse_documents("<corpus><text>", &HashMap::new()),
            Err(Error::Corpus(_))
        ));
    }
}
