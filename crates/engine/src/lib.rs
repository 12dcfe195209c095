// trellis-engine: SQLite persistence and the structural mutator.

pub mod auth;
pub mod config;
pub mod error;
pub mod mutator;
pub mod store;
pub mod view;
