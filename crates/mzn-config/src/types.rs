//! Configuration types.

use mzn_dzn::{ParseOptions, TypeHint};
use mzn_output::{OutputMode, OutputOptions};
use mzn_process::ProcessOptions;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Complete configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MznConfig {
	/// Solver to launch
	pub solver: SolverSection,
	/// Output handling
	pub output: OutputSection,
	/// Logging settings
	pub logging: LoggingSection,
}

/// Solver process settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SolverSection {
	/// Executable, resolved through `PATH` when relative
	pub executable: String,
	/// Arguments passed verbatim
	pub args: Vec<String>,
	/// Working directory (optional)
	pub working_dir: Option<PathBuf>,
	/// Line adapter: "default", "passthrough", "gecode" or "mzn-stat"
	pub adapter: String,
	/// Kill the solver after this many seconds
	pub timeout_secs: Option<u64>,
}

impl Default for SolverSection {
	fn default() -> Self {
		Self {
			executable: "minizinc".to_string(),
			args: Vec::new(),
			working_dir: None,
			adapter: "default".to_string(),
			timeout_secs: None,
		}
	}
}

/// Output settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputSection {
	pub mode: OutputMode,
	pub rebase_arrays: bool,
	pub keep_solutions: bool,
	/// Declared types of output variables
	pub types: HashMap<String, TypeHint>,
}

impl Default for OutputSection {
	fn default() -> Self {
		Self {
			mode: OutputMode::Structured,
			rebase_arrays: true,
			keep_solutions: true,
			types: HashMap::new(),
		}
	}
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingSection {
	/// Default level when `RUST_LOG` is unset
	pub level: String,
}

impl Default for LoggingSection {
	fn default() -> Self {
		Self {
			level: "info".to_string(),
		}
	}
}

impl MznConfig {
	/// How to launch the configured solver.
	pub fn process_options(&self) -> ProcessOptions {
		let mut options =
			ProcessOptions::new(&self.solver.executable).with_args(self.solver.args.clone());
		if let Some(dir) = &self.solver.working_dir {
			options = options.with_working_dir(dir);
		}
		if let Some(secs) = self.solver.timeout_secs {
			options = options.with_timeout(Duration::from_secs(secs));
		}
		options
	}

	/// Parsing options for the configured output section.
	pub fn output_options(&self) -> OutputOptions {
		let parse = ParseOptions {
			rebase_arrays: self.output.rebase_arrays,
			types: if self.output.types.is_empty() {
				None
			} else {
				Some(self.output.types.clone())
			},
		};
		OutputOptions::default()
			.with_mode(self.output.mode)
			.with_parse_options(parse)
			.with_keep_solutions(self.output.keep_solutions)
	}
}
