//! Configuration for solver runs.
//!
//! Settings come from a TOML, JSON or YAML file with `${VAR}` references
//! resolved from the environment, then `MZN_*` environment overrides.

use mzn_output::{AdapterError, SolutionParser};
use mzn_process::{LineSource, ReaderSource, SolverProcess, SourceError};
use std::path::Path;
use thiserror::Error;
use tracing::info;

pub mod loader;
pub mod types;

pub use loader::{validate_config, ConfigLoader};
pub use types::{LoggingSection, MznConfig, OutputSection, SolverSection};

#[derive(Error, Debug)]
pub enum ConfigError {
	#[error("File not found: {0}")]
	FileNotFound(String),

	#[error("Parse error: {0}")]
	ParseError(String),

	#[error("Validation error: {0}")]
	ValidationError(String),

	#[error("Environment variable not found: {0}")]
	EnvVarNotFound(String),

	#[error("IO error: {0}")]
	IoError(#[from] std::io::Error),

	#[error(transparent)]
	Adapter(#[from] AdapterError),

	#[error(transparent)]
	Source(#[from] SourceError),
}

impl MznConfig {
	/// Builds a parser with the configured output options and adapter.
	pub fn parser(&self) -> Result<SolutionParser, ConfigError> {
		Ok(SolutionParser::new(self.output_options()).with_adapter_name(&self.solver.adapter)?)
	}
}

/// Opens the line source for a run.
///
/// With `replay` set, previously captured solver output is read from that
/// file (`-` for stdin); otherwise the configured solver is spawned.
pub async fn create_source(
	config: &MznConfig,
	replay: Option<&Path>,
) -> Result<Box<dyn LineSource>, ConfigError> {
	match replay {
		Some(path) if path == Path::new("-") => {
			info!("Reading solver output from stdin");
			Ok(Box::new(ReaderSource::stdin()))
		}
		Some(path) => {
			info!("Replaying solver output from {:?}", path);
			Ok(Box::new(ReaderSource::open(path).await?))
		}
		None => Ok(Box::new(SolverProcess::spawn(&config.process_options())?)),
	}
}
