//! Shared types for the mzn-stream workspace.
//!
//! Everything that crosses a crate boundary lives here: the run [`Status`]
//! taxonomy, parsed [`Solution`] records and their [`DznValue`] payloads,
//! solver [`Statistics`], the [`RunSummary`] a producer hands to the consumer
//! when a run ends, and the error types surfaced to stream consumers.

pub mod errors;
pub mod solution;
pub mod statistics;
pub mod status;
pub mod value;

pub use errors::*;
pub use solution::*;
pub use statistics::*;
pub use status::*;
pub use value::*;
