use fs_err as fs;
use lazy_static::lazy_static;
use std::{
    collections::HashSet,
    io,
    path::{Path, PathBuf},
};

/// Placeholder every all-digit lemma is collapsed to.
pub const NUMBER_PLACEHOLDER: &str = "#NUMBER#";

lazy_static! {
    static ref STOP_WORDS: HashSet<&'static str> = [
        "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "your", "yours",
        "yourself", "yourselves", "he", "him", "his", "himself", "she", "her", "hers", "herself",
        "it", "its", "itself", "they", "them", "their", "theirs", "themselves", "what", "which",
        "who", "whom", "this", "that", "these", "those", "am", "is", "are", "was", "were", "be",
        "been", "being", "have", "has", "had", "having", "do", "does", "did", "doing", "a", "an",
        "the", "and", "but", "if", "or", "because", "as", "until", "while", "of", "at", "by",
        "for", "with", "about", "against", "between", "into", "through", "during", "before",
        "after", "above", "below", "to", "from", "up", "down", "in", "out", "on", "off", "over",
        "under", "again", "further", "then", "once", "here", "there", "when", "where", "why",
        "how", "all", "any", "both", "each", "few", "more", "most", "other", "some", "such", "no",
        "nor", "not", "only", "own", "same", "so", "than", "too", "very", "s", "t", "can", "will",
        "just", "don", "should", "now", "d", "ll", "m", "o", "re", "ve", "y", "ain", "aren",
        "couldn", "didn", "doesn", "hadn", "hasn", "haven", "isn", "ma", "mightn", "mustn",
        "needn", "shan", "shouldn", "wasn", "weren", "won", "wouldn",
    ]
    .iter()
    .copied()
    .collect();
}

pub fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.contains(word)
}

pub fn is_punctuation(word: &str) -> bool {
    let mut chars = word.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => c.is_ascii_punctuation(),
        _ => false,
    }
}

/// Lower cases a lemma and collapses pure numbers into [NUMBER_PLACEHOLDER].
pub fn normalize_lemma(lemma: &str) -> String {
    let lower = lemma.to_lowercase();
    if !lower.is_empty() && lower.chars().all(|c| c.is_ascii_digit()) {
        NUMBER_PLACEHOLDER.to_string()
    } else {
        lower
    }
}

/// The `*.bin` files of a directory, sorted by path.
pub fn artifact_paths<P: AsRef<Path>>(dir: P) -> io::Result<Vec<PathBuf>> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir.as_ref())?
        .map(|entry| entry.map(|entry| entry.path()))
        .collect::<Result<_, _>>()?;
    paths.retain(|path| path.extension().map_or(false, |ext| ext == "bin"));
    paths.sort();
    Ok(paths)
}
