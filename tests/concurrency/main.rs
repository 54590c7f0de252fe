//! Concurrency Integration Tests
//!
//! SKU and id allocation under thread contention.

#[path = "../common/mod.rs"]
mod common;

mod id_collisions;
mod sku_races;
