//! Per-solver filters applied to every output line.
//!
//! Solver backends interleave their own telemetry (timings, node counts)
//! with the solution stream. An adapter strips those lines before marker
//! detection and folds them into [`Statistics`].

use mzn_types::Statistics;
use std::sync::Arc;
use thiserror::Error;

mod gecode;
mod mzn_stat;
mod passthrough;

pub use gecode::GecodeAdapter;
pub use mzn_stat::MznStatAdapter;
pub use passthrough::PassthroughAdapter;

/// Names accepted by [`create_adapter`].
pub const ADAPTER_NAMES: &[&str] = &["default", "passthrough", "gecode", "mzn-stat"];

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AdapterError {
	#[error("Unknown solver adapter: {0}")]
	Unknown(String),
}

/// Filters raw solver output one line at a time.
pub trait SolverLineAdapter: Send {
	/// Returns the line to forward, possibly rewritten, or `None` to drop it.
	fn parse_line(&mut self, line: String) -> Option<String>;

	/// Statistics collected so far, if the backend reports any.
	fn statistics(&self) -> Option<Statistics>;
}

/// Builds a fresh adapter for every run.
pub type AdapterFactory = Arc<dyn Fn() -> Box<dyn SolverLineAdapter> + Send + Sync>;

/// Resolves an adapter name to a factory.
pub fn adapter_factory(name: &str) -> Result<AdapterFactory, AdapterError> {
	let factory: AdapterFactory = match name {
		"default" | "passthrough" => {
			Arc::new(|| Box::new(PassthroughAdapter) as Box<dyn SolverLineAdapter>)
		}
		"gecode" => Arc::new(|| Box::new(GecodeAdapter::new()) as Box<dyn SolverLineAdapter>),
		"mzn-stat" => Arc::new(|| Box::new(MznStatAdapter::new()) as Box<dyn SolverLineAdapter>),
		other => return Err(AdapterError::Unknown(other.to_string())),
	};
	Ok(factory)
}

/// Creates a single adapter by name.
pub fn create_adapter(name: &str) -> Result<Box<dyn SolverLineAdapter>, AdapterError> {
	adapter_factory(name).map(|factory| factory())
}

fn non_empty(statistics: &Statistics) -> Option<Statistics> {
	if statistics.is_empty() {
		None
	} else {
		Some(statistics.clone())
	}
}
