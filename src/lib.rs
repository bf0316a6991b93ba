//! NBA Quant Edge: daily NBA betting-edge report generator.
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod types;
pub mod upstream;
pub mod sources;
pub mod model;
pub mod verify;
pub mod strategy;
pub mod report;
pub mod storage;
pub mod server;
