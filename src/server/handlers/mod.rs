//! HTTP request handlers for the web server.

mod api;
mod helpers;
mod words;

// Re-export handlers for use by the router
pub use api::{api_test, health};
pub use words::{
    add_word, delete_word, get_word, list_favorites, list_lazy, list_new, list_paginated,
    list_unknown, list_words, migrate, quiz, statistics, toggle_favorite, update_progress,
    update_word,
};
