// configure default clippy lints
#![deny(clippy::correctness)]
#![warn(clippy::complexity, clippy::style, clippy::perf, clippy::pedantic)]
// disable some pedantic lints
#![allow(
    clippy::default_trait_access,
    clippy::missing_errors_doc,
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::non_ascii_literal,
    clippy::similar_names,
    clippy::single_match_else,
    clippy::wildcard_imports
)]

pub mod blobs;
pub mod config;
pub mod content;
pub mod contexts;
pub mod error;
pub mod handlers;
pub mod server;
pub mod users;
pub mod util;
