use anyhow::{Context, Result};
use clap::Parser;
use mzn_config::{create_source, ConfigLoader, MznConfig};
use mzn_service::cli::{Cli, Command, OutputArgs};
use mzn_service::output::{print_solutions, SolutionWriter};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
	let cli = Cli::parse();

	match cli.command {
		Command::Run { output, command } => {
			let mut config = load_config(cli.config.as_deref(), cli.log_level.as_deref()).await?;
			let (executable, args) = command
				.split_first()
				.context("Missing solver executable")?;
			config.solver.executable = executable.clone();
			config.solver.args = args.to_vec();
			stream_solutions(config, &output, None).await
		}
		Command::Parse { output, file } => {
			let config = load_config(cli.config.as_deref(), cli.log_level.as_deref()).await?;
			let replay = file.unwrap_or_else(|| PathBuf::from("-"));
			stream_solutions(config, &output, Some(replay.as_path())).await
		}
		Command::Validate { config } => {
			validate_config(&config, cli.log_level.as_deref()).await
		}
	}
}

async fn load_config(path: Option<&Path>, log_level: Option<&str>) -> Result<MznConfig> {
	let mut loader = ConfigLoader::new();
	if let Some(path) = path {
		loader = loader.with_file(path);
	}
	let config = loader
		.load()
		.await
		.context("Failed to load configuration")?;

	setup_tracing(log_level.unwrap_or(&config.logging.level))?;
	if let Some(path) = path {
		info!("Configuration loaded from {:?}", path);
	}
	Ok(config)
}

async fn stream_solutions(
	mut config: MznConfig,
	output: &OutputArgs,
	replay: Option<&Path>,
) -> Result<()> {
	output.apply(&mut config);
	mzn_config::validate_config(&config).context("Invalid settings")?;

	let parser = config.parser().context("Failed to set up the output parser")?;
	let source = create_source(&config, replay)
		.await
		.context("Failed to open solver output")?;
	let solutions = parser.parse(source);

	let mut writer = SolutionWriter::new(std::io::stdout());
	let status = print_solutions(solutions, &mut writer, &mut std::io::stderr()).await?;
	info!("Run finished with status {}", status);
	Ok(())
}

async fn validate_config(path: &Path, log_level: Option<&str>) -> Result<()> {
	let config = load_config(Some(path), log_level).await?;

	println!("Configuration is valid: {}", path.display());
	println!("Solver: {} {}", config.solver.executable, config.solver.args.join(" "));
	println!("Adapter: {}", config.solver.adapter);
	println!(
		"Output: {:?}, keep solutions: {}, rebase arrays: {}",
		config.output.mode, config.output.keep_solutions, config.output.rebase_arrays
	);
	if let Some(secs) = config.solver.timeout_secs {
		println!("Timeout: {}s", secs);
	}

	Ok(())
}

fn setup_tracing(log_level: &str) -> Result<()> {
	let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

	tracing_subscriber::registry()
		.with(env_filter)
		.with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
		.try_init()
		.context("Failed to install tracing subscriber")?;

	Ok(())
}
