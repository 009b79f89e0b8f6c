//! Suffix-based category guessing.

use crate::models::Category;

const VERB_SUFFIXES: &[&str] = &["ar", "er", "ir"];
const ADVERB_SUFFIXES: &[&str] = &["mente"];
const NOUN_SUFFIXES: &[&str] = &["ción", "dad", "ismo"];

/// Guess a word's category from its ending.
///
/// Only used to fill a missing category; never overrides a stored one.
pub fn guess_category(word: &str) -> Category {
    let word = word.to_lowercase();
    let ends_with_any = |suffixes: &[&str]| suffixes.iter().any(|s| word.ends_with(s));

    if ends_with_any(VERB_SUFFIXES) {
        Category::Verb
    } else if ends_with_any(ADVERB_SUFFIXES) {
        Category::Adverb
    } else if ends_with_any(NOUN_SUFFIXES) {
        Category::Noun
    } else {
        Category::Other
    }
}
