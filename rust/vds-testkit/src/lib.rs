//! Test utilities for the vds crates.
//!
//! This crate provides:
//! - Synthetic variant records and their row encoding
//! - Writing complete tables (metadata plus partition files) to temporary
//!   directories

pub mod data_gen;
pub mod table_writer;
