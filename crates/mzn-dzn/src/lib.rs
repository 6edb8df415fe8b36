//! # MiniZinc data-language parser
//!
//! Turns the body of one solver solution (a sequence of `name = value;`
//! assignments) into an [`Assignment`] map. The parser is exposed through the
//! [`ValueParser`] trait so the output pipeline can swap in another
//! implementation.

use mzn_types::{Assignment, DznError};

mod lexer;
pub mod options;
pub mod parser;

pub use options::{ParseOptions, TypeHint};
pub use parser::parse_dzn;

/// Converts a raw solution body into variable assignments.
pub trait ValueParser: Send + Sync {
	fn parse(&self, body: &str, options: &ParseOptions) -> Result<Assignment, DznError>;
}

/// The built-in data-language parser.
#[derive(Debug, Clone, Copy, Default)]
pub struct DznParser;

impl ValueParser for DznParser {
	fn parse(&self, body: &str, options: &ParseOptions) -> Result<Assignment, DznError> {
		parse_dzn(body, options)
	}
}
