//! Text analytics over aggregated items

pub mod word_frequency;

pub use word_frequency::{tokenize, word_frequency};
