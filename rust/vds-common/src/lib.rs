//! Core definitions shared by all vds-* crates: the error type, the `Result` alias
//! and the verification and iteration helper macros.

pub mod error;
pub mod macros;
pub mod result;

pub use result::Result;
