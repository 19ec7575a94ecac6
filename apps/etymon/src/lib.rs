//! # Etymon - Influence Graph CLI
//!
//! Library surface of the Etymon binary: the CLI definition, command
//! implementations, and configuration loading live here so integration
//! tests can drive them directly.

pub mod cli;
pub mod config;
