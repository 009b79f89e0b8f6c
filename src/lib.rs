//! vocab-store - vocabulary record store for a language-learning app.
//!
//! Words live in one document collection per language. The repository layer
//! turns listing, quiz, statistics and backfill requests into bounded
//! operations against a pluggable document store (SQLite or in-memory), and
//! the server exposes them as a JSON API.

pub mod config;
pub mod models;
pub mod repository;
pub mod server;
pub mod store;
pub mod utils;
