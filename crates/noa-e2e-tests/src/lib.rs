//! End-to-end tests for NOA live under `tests/`.
//!
//! They drive the API router with an in-memory database, a mock Ollama
//! server and a recording push gateway.
