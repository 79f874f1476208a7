//! Scoring of system answers against gold answers, separately for instances whose gold sense is the
//! most frequent one (MFS) and for the others (LFS).
//!
//! Follows the Senseval scorer: an instance with `n` system answers scores the fraction of them found
//! in its gold answers. Precision is relative to the attempted instances, recall to all gold instances.

use fs_err::File;
use std::{
    collections::{BTreeSet, HashMap},
    fmt,
    io::{BufRead, BufReader, Read},
    path::Path,
};

use crate::{
    resource::{lemma_of, pos_of, LexicalResource},
    Error,
};

/// Answers by instance id.
pub type Answers = HashMap<String, Vec<String>>;

/// Reads `doc_id instance_id key...` lines.
pub fn read_answers<R: Read>(reader: R) -> Result<Answers, Error> {
    let mut answers = Answers::new();
    for line in BufReader::new(reader).lines() {
        let line = line?;
        let mut fields = line.split_whitespace();
        let _doc_id = fields.next();
        if let Some(id) = fields.next() {
            answers.insert(id.to_string(), fields.map(String::from).collect());
        }
    }
    Ok(answers)
}

pub fn load_answers<P: AsRef<Path>>(path: P) -> Result<Answers, Error> {
    read_answers(File::open(path.as_ref())?)
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Score {
    pub instances: usize,
    pub attempted: usize,
    pub correct: f64,
}

fn percent(part: f64, total: usize) -> f64 {
    if total == 0 {
        0.
    } else {
        part * 100. / total as f64
    }
}

impl Score {
    /// Scores the answers for the given gold instance ids.
    pub fn compute<'a, I: IntoIterator<Item = &'a String>>(
        ids: I,
        gold: &Answers,
        system: &Answers,
    ) -> Self {
        let mut score = Score::default();

        for id in ids {
            score.instances += 1;

            let answers = match system.get(id) {
                Some(answers) if !answers.is_empty() => answers,
                _ => continue,
            };
            score.attempted += 1;

            if let Some(expected) = gold.get(id) {
                let hits = answers.iter().filter(|x| expected.contains(x)).count();
                score.correct += hits as f64 / answers.len() as f64;
            }
        }

        score
    }

    pub fn precision(&self) -> f64 {
        percent(self.correct, self.attempted)
    }

    pub fn recall(&self) -> f64 {
        percent(self.correct, self.instances)
    }

    pub fn attempted(&self) -> f64 {
        percent(self.attempted as f64, self.instances)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub mfs: Score,
    pub lfs: Score,
    pub all: Score,
}

/// Whether the gold answers of an instance contain the most frequent sense of the lemma and
/// part-of-speech of its first key.
fn is_mfs<R: LexicalResource + ?Sized>(keys: &[String], resource: &R) -> bool {
    let first = match keys.first() {
        Some(first) => first,
        None => return false,
    };

    match (lemma_of(first), pos_of(first)) {
        (Some(lemma), Some(pos)) => resource
            .most_frequent_sense(lemma, pos)
            .map_or(false, |mfs| keys.contains(&mfs)),
        _ => false,
    }
}

/// Scores the system answers on the MFS and the LFS part of the gold answers, and on all of them.
pub fn evaluate<R: LexicalResource + ?Sized>(
    gold: &Answers,
    system: &Answers,
    resource: &R,
) -> Evaluation {
    let (mfs, lfs): (BTreeSet<&String>, BTreeSet<&String>) = gold
        .iter()
        .filter(|(_, keys)| !keys.is_empty())
        .map(|(id, _)| id)
        .partition(|id| is_mfs(&gold[*id], resource));

    Evaluation {
        mfs: Score::compute(mfs.iter().copied(), gold, system),
        lfs: Score::compute(lfs.iter().copied(), gold, system),
        all: Score::compute(mfs.union(&lfs).copied(), gold, system),
    }
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, score) in &[("MFS", self.mfs), ("LFS", self.lfs), ("ALL", self.all)] {
            writeln!(f, "{} evaluation:", name)?;
            writeln!(f, "\tNum instances: {}", score.instances)?;
            writeln!(f, "\tPrecision: {:.2}", score.precision())?;
            writeln!(f, "\tRecall   : {:.2}", score.recall())?;
            writeln!(f, "\tAttempted: {:.2}", score.attempted())?;
        }
        Ok(())
    }
}
