//! Error types surfaced by the parsing layer.

use thiserror::Error;

/// Errors raised while parsing a solution body in the data language.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DznError {
	#[error("Unexpected character '{found}' at offset {offset}")]
	UnexpectedChar { found: char, offset: usize },

	#[error("Unexpected end of input, expected {expected}")]
	UnexpectedEnd { expected: String },

	#[error("Expected {expected} at offset {offset}")]
	Expected { expected: String, offset: usize },

	#[error("Unterminated string starting at offset {0}")]
	UnterminatedString(usize),

	#[error("Invalid number: {0}")]
	InvalidNumber(String),

	#[error("Array dimensions expect {expected} values, found {found}")]
	DimensionMismatch { expected: usize, found: usize },

	#[error("Invalid index set: {0}")]
	InvalidIndexSet(String),

	#[error("Range {lo}..{hi} is too large to expand")]
	RangeTooLarge { lo: i64, hi: i64 },

	#[error("Variable {name} cannot be read as {expected}")]
	TypeMismatch { name: String, expected: String },
}

/// Errors surfaced to a consumer of a solution stream.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StreamError {
	/// A solution body was rejected by the value parser. The offending body
	/// is kept verbatim.
	#[error("Failed to parse solution: {source}\n{body}")]
	Parse {
		body: String,
		#[source]
		source: DznError,
	},

	/// The task reading solver output stopped abnormally.
	#[error("Solution producer failed: {0}")]
	Producer(String),

	/// Indexed access on a stream that does not keep its solutions.
	#[error("Cannot address solutions directly when they are not retained")]
	NotRetained,
}

pub type StreamResult<T> = std::result::Result<T, StreamError>;
