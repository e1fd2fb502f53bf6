//! NOA API: library crate for the config generation and review server.
//!
//! Re-exports all modules so the binary (`main.rs`) and external crates
//! (e.g. `noa-e2e-tests`) can access `AppState`, `build_router`, the
//! pipeline and the generation/push boundaries.

pub mod config;
pub mod db;
pub mod error;
pub mod generation;
pub mod pipeline;
pub mod prompt;
pub mod push;
pub mod review;
pub mod routes;
pub mod state;
