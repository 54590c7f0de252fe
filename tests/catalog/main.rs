//! Catalog Integration Tests
//!
//! End-to-end behavior of the public API over the embedded store.

#[path = "../common/mod.rs"]
mod common;

mod persistence;
mod scenarios;
