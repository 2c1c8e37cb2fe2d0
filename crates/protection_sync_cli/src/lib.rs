//! Protection sync CLI library exports for integration testing.

pub mod cli;
pub mod commands;
pub mod config;
pub mod errors;

