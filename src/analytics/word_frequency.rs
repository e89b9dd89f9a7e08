//! Repeated-word analysis over translated titles

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;

use crate::models::WordCount;

lazy_static! {
    // Anything that is not a word char, whitespace or apostrophe
    static ref PUNCTUATION: Regex = Regex::new(r"[^\w\s']").expect("Invalid regex pattern");
}

/// Lowercased tokens of `text`, punctuation replaced by spaces
pub fn tokenize(text: &str) -> Vec<String> {
    PUNCTUATION
        .replace_all(text, " ")
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Count tokens across texts, keeping those seen at least `min_count` times
///
/// Ordered by descending count, ties by first appearance.
pub fn word_frequency<'a, I>(texts: I, min_count: usize) -> Vec<WordCount>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
    let mut next_rank = 0;

    for text in texts {
        for token in tokenize(text) {
            let entry = counts.entry(token).or_insert_with(|| {
                next_rank += 1;
                (0, next_rank)
            });
            entry.0 += 1;
        }
    }

    let mut repeated: Vec<(String, usize, usize)> = counts
        .into_iter()
        .filter(|(_, (count, _))| *count >= min_count)
        .map(|(word, (count, rank))| (word, count, rank))
        .collect();
    repeated.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));

    repeated
        .into_iter()
        .map(|(word, count, _)| WordCount { word, count })
        .collect()
}
