//! # Solver output parsing
//!
//! Consumes the line-oriented output of a constraint solver and exposes the
//! solutions it prints as a lazily populated stream.
//!
//! ## Key Components
//!
//! - [`LineSplitter`] - segments output lines into solution bodies and
//!   detects terminal status markers
//! - [`SolverLineAdapter`] - per-backend filter stripping solver telemetry
//!   and collecting statistics
//! - [`Solutions`] - the consumer-facing stream, either keeping every
//!   solution ([`MaterializedSolutions`]) or discarding them once yielded
//!   ([`StreamingSolutions`])
//! - [`SolutionParser`] - wires a line source, an adapter and the splitter
//!   together and feeds the stream from a background task

use mzn_dzn::ParseOptions;
use serde::{Deserialize, Serialize};

pub mod adapters;
pub mod parser;
pub mod splitter;
pub mod stream;

pub use adapters::{
	adapter_factory, create_adapter, AdapterError, AdapterFactory, SolverLineAdapter, ADAPTER_NAMES,
};
pub use parser::SolutionParser;
pub use splitter::LineSplitter;
pub use stream::{MaterializedSolutions, Solutions, StreamingSolutions};

/// Whether solution bodies are parsed or handed out verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
	/// Parse each body into variable assignments.
	#[default]
	Structured,
	/// Keep each body as text.
	Raw,
}

/// Options for one parsing run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputOptions {
	pub mode: OutputMode,
	/// Options forwarded to the value parser in structured mode.
	pub parse: ParseOptions,
	/// Keep every solution for indexed access and repeated iteration.
	pub keep_solutions: bool,
}

impl Default for OutputOptions {
	fn default() -> Self {
		Self {
			mode: OutputMode::Structured,
			parse: ParseOptions::default(),
			keep_solutions: true,
		}
	}
}

impl OutputOptions {
	pub fn raw() -> Self {
		Self {
			mode: OutputMode::Raw,
			..Self::default()
		}
	}

	pub fn with_mode(mut self, mode: OutputMode) -> Self {
		self.mode = mode;
		self
	}

	pub fn with_parse_options(mut self, parse: ParseOptions) -> Self {
		self.parse = parse;
		self
	}

	pub fn with_keep_solutions(mut self, keep: bool) -> Self {
		self.keep_solutions = keep;
		self
	}
}
