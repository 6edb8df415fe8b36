//! Command-line front end for streaming solver output.
//!
//! # Components
//!
//! - `cli`: argument definitions
//! - `output`: printing of solutions and run summaries

pub mod cli;
pub mod output;
