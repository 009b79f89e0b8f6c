//! Derivation utilities for presentation fields.
//!
//! - `category`: suffix heuristic for a missing grammatical category
//! - `image`: deterministic placeholder image references

mod category;
mod image;

pub use category::guess_category;
pub use image::{clean_keyword, image_bucket, image_url_for, IMAGE_BUCKETS};
