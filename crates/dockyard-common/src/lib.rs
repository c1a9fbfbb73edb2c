//! # dockyard-common
//!
//! Shared image configuration model, error definitions, and constants
//! used across the entire dockyard workspace.
//!
//! This crate is the leaf of the dependency graph: it depends on no other
//! internal crate and provides the configuration types that the compose
//! translator reads as a baseline and produces as output.

pub mod config;
pub mod constants;
pub mod error;
pub mod types;
