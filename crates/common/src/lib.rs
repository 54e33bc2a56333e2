//! Common utilities and types shared across the group call crates.

#![warn(clippy::pedantic)]

/// Module for peer and session identifiers
pub mod types;

/// Module for configuration loaded from the environment
pub mod config;

/// Module for tracing subscriber setup
pub mod observability;
