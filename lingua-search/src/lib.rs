//! Lingua Search - federated catalog search for a language-learning platform
//!
//! One query is matched against courses, lessons, exercises and (for signed-in
//! requesters) user accounts stored in SQLite. Each source contributes typed
//! hits with a fixed relevance prior; hits are merged by a per-type weight into
//! one ranked list of at most 50 results.

pub mod api;
pub mod config;
pub mod database;
pub mod demo_data;
pub mod interface;
pub mod logging;
pub mod models;
pub mod ranking;
pub mod search;
mod store;

pub use interface::*;
pub use store::CatalogStore;
