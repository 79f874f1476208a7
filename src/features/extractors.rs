use std::{convert::TryFrom, str::FromStr};

use super::{Extract, Options};
use crate::{
    types::Instance,
    utils::{is_punctuation, is_stop_word, normalize_lemma},
    Error,
};

/// Reads typed option values, rejecting unknown keys.
pub(crate) struct OptionReader<'a> {
    extractor: &'a str,
    options: &'a Options,
}

impl<'a> OptionReader<'a> {
    pub fn new(extractor: &'a str, options: &'a Options) -> Self {
        OptionReader { extractor, options }
    }

    fn invalid(&self, option: &str, value: String) -> Error {
        Error::InvalidOption {
            extractor: self.extractor.to_string(),
            option: option.to_string(),
            value,
        }
    }

    fn raw(&self, key: &str) -> Option<String> {
        self.options.get(key).map(|value| match value {
            serde_json::Value::String(string) => string.clone(),
            value => value.to_string(),
        })
    }

    /// Fails if an option other than `known` is set.
    fn only(&self, known: &[&str]) -> Result<(), Error> {
        match self.options.keys().find(|key| !known.contains(&key.as_str())) {
            Some(key) => Err(self.invalid(key, self.raw(key).unwrap_or_default())),
            None => Ok(()),
        }
    }

    fn parse_or<T: FromStr>(&self, key: &str, default: T) -> Result<T, Error> {
        match self.raw(key) {
            Some(value) => value
                .trim()
                .parse()
                .map_err(|_| self.invalid(key, value.clone())),
            None => Ok(default),
        }
    }
}

/// Lemmas of the context tokens at most `sentence_window` sentences away from the target.
/// Stop words and punctuation are skipped, numbers collapsed into one placeholder.
#[derive(Debug, Clone, PartialEq)]
pub struct BagOfWords {
    pub(crate) sentence_window: u32,
}

impl BagOfWords {
    pub(crate) fn from_options(options: OptionReader) -> Result<Self, Error> {
        options.only(&["sentence_window"])?;
        Ok(BagOfWords {
            sentence_window: options.parse_or("sentence_window", 3)?,
        })
    }
}

impl Extract for BagOfWords {
    fn extract(&self, instance: &Instance, features: &mut Vec<String>) {
        for token in instance.tokens() {
            if instance.sentence_position(token.id()).unsigned_abs() > self.sentence_window {
                continue;
            }

            if let Some(lemma) = token.lemma() {
                let lemma = normalize_lemma(lemma);
                if !lemma.is_empty() && !is_stop_word(&lemma) && !is_punctuation(&lemma) {
                    features.push(format!("BOW#{}", lemma));
                }
            }
        }
    }
}

/// Part-of-speech tags of the tokens at most `window` tokens away from the target, with their offset.
#[derive(Debug, Clone, PartialEq)]
pub struct PosWindow {
    pub(crate) window: usize,
}

impl PosWindow {
    pub(crate) fn from_options(options: OptionReader) -> Result<Self, Error> {
        options.only(&["window"])?;
        let window: usize = options.parse_or("window", 3)?;
        // offsets are signed
        isize::try_from(window).map_err(|_| options.invalid("window", window.to_string()))?;

        Ok(PosWindow { window })
    }
}

impl Extract for PosWindow {
    fn extract(&self, instance: &Instance, features: &mut Vec<String>) {
        let tokens = instance.tokens();
        let head = instance.head();
        if head >= tokens.len() {
            return;
        }

        let start = head.saturating_sub(self.window);
        let end = head.saturating_add(self.window).min(tokens.len() - 1);

        for (index, token) in tokens.iter().enumerate().take(end + 1).skip(start) {
            let offset = index as isize - head as isize;
            features.push(format!("POS#{}#{}", offset, token.pos().unwrap_or("UNK")));
        }
    }
}

/// Surface text of fixed token ranges around the target. A range reaching outside the context is
/// skipped as a whole.
#[derive(Debug, Clone, PartialEq)]
pub struct Collocations {
    pub(crate) ranges: Vec<(isize, isize)>,
}

impl Collocations {
    /// Parses `C#-1#1;C#1#2`-style lists. The last two `#`-separated fields of each entry are the start
    /// and end offsets (inclusive), anything before them is ignored.
    fn parse_ranges(string: &str) -> Option<Vec<(isize, isize)>> {
        string
            .split(';')
            .map(str::trim)
            .filter(|x| !x.is_empty())
            .map(|entry| {
                let mut fields = entry.rsplit('#');
                let end: isize = fields.next()?.trim().parse().ok()?;
                let start: isize = fields.next()?.trim().parse().ok()?;
                if start > end {
                    return None;
                }
                Some((start, end))
            })
            .collect()
    }

    pub(crate) fn from_options(options: OptionReader) -> Result<Self, Error> {
        options.only(&["collocations"])?;

        let raw = options.raw("collocations").unwrap_or_default();
        let ranges =
            Self::parse_ranges(&raw).ok_or_else(|| options.invalid("collocations", raw.clone()))?;

        Ok(Collocations { ranges })
    }
}

impl Extract for Collocations {
    fn extract(&self, instance: &Instance, features: &mut Vec<String>) {
        let head = instance.head() as isize;

        for (start, end) in &self.ranges {
            let range = match (head.checked_add(*start), head.checked_add(*end)) {
                (Some(first), Some(last)) => first..=last,
                _ => continue,
            };
            let texts: Option<Vec<&str>> = range
                .map(|index| instance.token(index).map(|token| token.text()))
                .collect();

            if let Some(texts) = texts {
                features.push(format!("C#{}#{}#{}", start, end, texts.join("_")));
            }
        }
    }
}
