//! Emissions Loader Library
//!
//! This library provides the core functionality for the emissions loader
//! CLI tool. It includes modules for CLI argument parsing, configuration,
//! CSV reading, graph transformation, batching, and concurrent dispatch to
//! the identity graph capture API.

pub mod batch;
pub mod cli;
pub mod client;
pub mod config;
pub mod csv_handler;
pub mod dispatcher;
pub mod error;
pub mod graph;
pub mod transform;
