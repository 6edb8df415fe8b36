//! Command-line interface definitions.

use clap::{Args, Parser, Subcommand};
use mzn_config::MznConfig;
use mzn_output::OutputMode;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "mzn-stream")]
#[command(about = "Stream solutions from MiniZinc-style solver output", long_about = None)]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
	/// Path to configuration file (TOML, JSON or YAML)
	#[arg(short, long, value_name = "FILE", global = true)]
	pub config: Option<PathBuf>,

	/// Log level override (trace, debug, info, warn, error)
	#[arg(short, long, env = "MZN_LOG_LEVEL", global = true)]
	pub log_level: Option<String>,

	#[command(subcommand)]
	pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
	/// Spawn a solver and print its solutions as they arrive
	Run {
		#[command(flatten)]
		output: OutputArgs,

		/// Solver executable followed by its arguments
		#[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
		command: Vec<String>,
	},

	/// Replay captured solver output from a file, or stdin when omitted
	Parse {
		#[command(flatten)]
		output: OutputArgs,

		/// File with captured solver output
		file: Option<PathBuf>,
	},

	/// Validate a configuration file
	Validate {
		/// Configuration file to validate
		config: PathBuf,
	},
}

/// Flags shared by the commands that print solutions.
#[derive(Args, Debug, Default)]
pub struct OutputArgs {
	/// Print solution bodies verbatim instead of parsing them
	#[arg(long)]
	pub raw: bool,

	/// Do not retain solutions once printed
	#[arg(long)]
	pub no_keep: bool,

	/// Solver line adapter (default, passthrough, gecode, mzn-stat)
	#[arg(short, long)]
	pub adapter: Option<String>,
}

impl OutputArgs {
	/// Applies the flags on top of a loaded configuration.
	pub fn apply(&self, config: &mut MznConfig) {
		if self.raw {
			config.output.mode = OutputMode::Raw;
		}
		if self.no_keep {
			config.output.keep_solutions = false;
		}
		if let Some(adapter) = &self.adapter {
			config.solver.adapter = adapter.clone();
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_run_collects_solver_command() {
		let cli = Cli::parse_from([
			"mzn-stream",
			"run",
			"--raw",
			"--adapter",
			"gecode",
			"--",
			"fzn-gecode",
			"-a",
			"model.fzn",
		]);

		let Command::Run { output, command } = cli.command else {
			panic!("expected run command");
		};
		assert!(output.raw);
		assert!(!output.no_keep);
		assert_eq!(command, vec!["fzn-gecode", "-a", "model.fzn"]);

		let mut config = MznConfig::default();
		output.apply(&mut config);
		assert_eq!(config.output.mode, OutputMode::Raw);
		assert_eq!(config.solver.adapter, "gecode");
		assert!(config.output.keep_solutions);
	}

	#[test]
	fn test_parse_defaults_to_stdin() {
		let cli = Cli::parse_from(["mzn-stream", "parse", "--no-keep"]);
		let Command::Parse { output, file } = cli.command else {
			panic!("expected parse command");
		};
		assert!(output.no_keep);
		assert_eq!(file, None);
	}

	#[test]
	fn test_global_config_flag() {
		let cli = Cli::parse_from(["mzn-stream", "parse", "out.txt", "--config", "mzn.toml"]);
		assert_eq!(cli.config, Some(PathBuf::from("mzn.toml")));
	}
}
