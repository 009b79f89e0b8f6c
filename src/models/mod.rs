//! Data models for vocabulary records.

mod stats;
mod word;

pub use stats::{MigrationReport, WordStatistics};
pub use word::{
    Category, Classification, Difficulty, Language, NewWord, Word, WordPage, DEFAULT_TAG,
    LEARNED_THRESHOLD,
};
