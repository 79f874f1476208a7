//! Fundamental types used by this crate.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::{
    cmp::Ordering,
    collections::{BTreeSet, HashMap},
    fmt,
    str::FromStr,
};

/// Coarse part-of-speech of a lexical item, as distinguished by the lexical resource.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Pos {
    Noun,
    Verb,
    Adjective,
    Adverb,
}

impl Pos {
    /// Maps a corpus tag to its coarse part-of-speech. Understands Penn tags (`NN*`, `VB*`, `JJ*`,
    /// `RB*`), universal tags (`NOUN`, `PROPN`, `VERB`, `ADJ`, `ADV`) and the one letter codes of
    /// the lexical resource (`n`, `v`, `a`, `s`, `j`, `r`). Any other tag, e.g. `ADP`, `NUM` or `RP`,
    /// is not a content word and gives `None`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let tag = tag.to_ascii_uppercase();

        match tag.as_str() {
            "N" | "NOUN" | "PROPN" => Some(Pos::Noun),
            "V" | "VERB" => Some(Pos::Verb),
            "A" | "S" | "J" | "ADJ" => Some(Pos::Adjective),
            "R" | "ADV" => Some(Pos::Adverb),
            x if x.starts_with("NN") => Some(Pos::Noun),
            x if x.starts_with("VB") => Some(Pos::Verb),
            x if x.starts_with("JJ") => Some(Pos::Adjective),
            x if x.starts_with("RB") => Some(Pos::Adverb),
            _ => None,
        }
    }

    /// Maps the type code embedded in a sense key (`1` to `5`) to a part-of-speech.
    pub fn from_type_code(code: char) -> Option<Self> {
        match code {
            '1' => Some(Pos::Noun),
            '2' => Some(Pos::Verb),
            '3' | '5' => Some(Pos::Adjective),
            '4' => Some(Pos::Adverb),
            _ => None,
        }
    }

    /// The one letter code used in item keys and resource lookups.
    pub fn as_char(&self) -> char {
        match self {
            Pos::Noun => 'n',
            Pos::Verb => 'v',
            Pos::Adjective => 'a',
            Pos::Adverb => 'r',
        }
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl FromStr for Pos {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Pos::from_tag(s).ok_or_else(|| format!("unknown part-of-speech '{}'", s))
    }
}

/// Identifies a sense group (a synset) in the lexical resource.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SenseGroupId {
    pub pos: Pos,
    pub offset: u32,
}

impl SenseGroupId {
    pub fn new(pos: Pos, offset: u32) -> Self {
        SenseGroupId { pos, offset }
    }
}

impl fmt::Display for SenseGroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08}-{}", self.offset, self.pos)
    }
}

/// One sense of a lexical item as known by the resource.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Sense {
    /// The resource-native sense key e.g. `bank%1:14:00::`.
    pub key: String,
    /// 1-based position in the resource's ordered sense list of the item.
    pub rank: u32,
    pub group: SenseGroupId,
}

/// How the gold senses of an instance were obtained.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AnnotationType {
    Manual,
    Automatic,
    Ignored,
}

impl FromStr for AnnotationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "man" | "manual" => Ok(AnnotationType::Manual),
            "auto" | "automatic" => Ok(AnnotationType::Automatic),
            "ignore" | "ignored" => Ok(AnnotationType::Ignored),
            _ => Err(format!("unknown annotation type '{}'", s)),
        }
    }
}

/// A token of a corpus. Never changed once created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Token {
    id: String,
    text: String,
    lemma: Option<String>,
    pos: Option<String>,
}

impl Token {
    pub fn new<S: Into<String>>(id: S, text: S, lemma: Option<S>, pos: Option<S>) -> Self {
        Token {
            id: id.into(),
            text: text.into(),
            lemma: lemma.map(Into::into),
            pos: pos.map(Into::into),
        }
    }

    /// Globally unique identifier of this token.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn lemma(&self) -> Option<&str> {
        self.lemma.as_deref()
    }

    /// The corpus part-of-speech tag.
    pub fn pos(&self) -> Option<&str> {
        self.pos.as_deref()
    }
}

/// Senses related to the gold senses of an instance through the sense graph.
/// Set by [enrich][crate::enrich].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SenseRelations {
    /// Other keys in the sense groups of the gold senses.
    pub co_senses: BTreeSet<String>,
    /// Subset of `co_senses` whose lemma is monosemous.
    pub mono_co_senses: BTreeSet<String>,
    /// Keys in the sense groups sharing a parent with a gold sense group.
    pub cohyponym_senses: BTreeSet<String>,
    /// Subset of `cohyponym_senses` whose lemma is monosemous.
    pub mono_cohyponym_senses: BTreeSet<String>,
}

impl SenseRelations {
    pub fn is_empty(&self) -> bool {
        self.co_senses.is_empty()
            && self.mono_co_senses.is_empty()
            && self.cohyponym_senses.is_empty()
            && self.mono_cohyponym_senses.is_empty()
    }
}

/// A target word in its context together with its gold senses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Instance {
    id: String,
    docsrc: String,
    lemma: String,
    pos: Pos,
    tokens: Vec<Token>,
    heads: Vec<usize>,
    gold: Vec<String>,
    pub(crate) confidence: IndexMap<String, f64>,
    pub(crate) sense_rank: u32,
    sentence_positions: HashMap<String, i32>,
    annotation: Option<AnnotationType>,
    pub(crate) relations: SenseRelations,
}

impl Instance {
    /// Creates a new instance. `heads` are the positions of the target in `tokens`, more than one for
    /// multiword targets.
    ///
    /// # Panics
    /// If `heads` is empty.
    pub fn new<S: Into<String>>(
        id: S,
        docsrc: S,
        lemma: S,
        pos: Pos,
        tokens: Vec<Token>,
        heads: Vec<usize>,
    ) -> Self {
        assert!(!heads.is_empty(), "an instance needs at least one head");

        Instance {
            id: id.into(),
            docsrc: docsrc.into(),
            lemma: lemma.into(),
            pos,
            tokens,
            heads,
            gold: Vec::new(),
            confidence: IndexMap::new(),
            sense_rank: 0,
            sentence_positions: HashMap::new(),
            annotation: None,
            relations: SenseRelations::default(),
        }
    }

    /// Sets the gold senses. Duplicates are removed, the first occurence decides the order.
    /// Each gold sense gets a confidence of 1.0.
    pub fn with_gold<I: IntoIterator<Item = S>, S: Into<String>>(mut self, keys: I) -> Self {
        self.gold.clear();
        for key in keys {
            let key = key.into();
            if !self.gold.contains(&key) {
                self.gold.push(key);
            }
        }
        self.confidence = self.gold.iter().map(|key| (key.clone(), 1.0)).collect();
        self
    }

    pub fn with_sentence_positions(mut self, positions: HashMap<String, i32>) -> Self {
        self.sentence_positions = positions;
        self
    }

    pub fn with_annotation(mut self, annotation: AnnotationType) -> Self {
        self.annotation = Some(annotation);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Identifier of the source document.
    pub fn docsrc(&self) -> &str {
        &self.docsrc
    }

    pub fn lemma(&self) -> &str {
        &self.lemma
    }

    pub fn pos(&self) -> Pos {
        self.pos
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn heads(&self) -> &[usize] {
        &self.heads
    }

    /// The position of the (first) target token.
    pub fn head(&self) -> usize {
        self.heads[0]
    }

    /// Gets the token at a signed position, `None` if out of range.
    pub fn token(&self, index: isize) -> Option<&Token> {
        if index < 0 {
            return None;
        }
        self.tokens.get(index as usize)
    }

    /// The gold sense keys, empty for test instances.
    pub fn gold(&self) -> &[String] {
        &self.gold
    }

    /// Confidence for each sense, either from gold or from a classifier.
    pub fn confidence(&self) -> &IndexMap<String, f64> {
        &self.confidence
    }

    /// Replaces the confidences with ranked sense hypotheses.
    pub fn set_predictions(&mut self, ranked: &[(String, f64)]) {
        self.confidence = ranked.iter().cloned().collect();
    }

    /// 1 if the gold sense is the most frequent one, 0 if unknown.
    pub fn sense_rank(&self) -> u32 {
        self.sense_rank
    }

    /// The distance in sentences between the token and the sentence of the target.
    pub fn sentence_position(&self, token_id: &str) -> i32 {
        self.sentence_positions.get(token_id).copied().unwrap_or(0)
    }

    pub fn annotation(&self) -> Option<AnnotationType> {
        self.annotation
    }

    pub fn relations(&self) -> &SenseRelations {
        &self.relations
    }

    /// The tokens joined by `#`.
    pub fn whole_text(&self) -> String {
        self.tokens
            .iter()
            .map(|token| token.text())
            .collect::<Vec<_>>()
            .join("#")
    }

    /// Identifies the content of an instance. Two instances with the same checksum are duplicates.
    pub fn checksum(&self) -> String {
        format!(
            "{}_{}_{}_{:?}",
            self.whole_text(),
            self.lemma,
            self.pos,
            self.heads
        )
    }

    pub(crate) fn set_sense_rank(&mut self, senses: &IndexMap<String, Sense>) {
        self.sense_rank = self
            .gold
            .iter()
            .filter_map(|key| senses.get(key).map(|sense| sense.rank))
            .min()
            .unwrap_or(0);
    }

    /// Orders instances by source document, then by id.
    pub fn output_order(&self, other: &Instance) -> Ordering {
        (&self.docsrc, &self.id).cmp(&(&other.docsrc, &other.id))
    }
}
