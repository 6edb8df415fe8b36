//! Configuration loading from files and environment.

use crate::types::MznConfig;
use crate::ConfigError;
use mzn_output::{OutputMode, ADAPTER_NAMES};
use regex::Regex;
use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

/// Configuration loader with environment variable substitution
pub struct ConfigLoader {
	file_path: Option<PathBuf>,
	env_prefix: String,
}

impl Default for ConfigLoader {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigLoader {
	pub fn new() -> Self {
		Self {
			file_path: None,
			env_prefix: "MZN_".to_string(),
		}
	}

	pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
		self.file_path = Some(path.as_ref().to_path_buf());
		self
	}

	pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.env_prefix = prefix.into();
		self
	}

	/// Loads the file if one was given, otherwise starts from defaults, then
	/// applies environment overrides and validates the result.
	pub async fn load(&self) -> Result<MznConfig, ConfigError> {
		let mut config = match &self.file_path {
			Some(path) => Self::load_from_file(path).await?,
			None => MznConfig::default(),
		};

		self.apply_env_overrides(&mut config)?;
		validate_config(&config)?;

		Ok(config)
	}

	async fn load_from_file(path: &Path) -> Result<MznConfig, ConfigError> {
		info!("Loading configuration from {:?}", path);
		let contents = match tokio::fs::read_to_string(path).await {
			Ok(contents) => contents,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
				return Err(ConfigError::FileNotFound(path.display().to_string()));
			}
			Err(e) => return Err(e.into()),
		};

		let contents = substitute_env_vars(&contents)?;

		match path.extension().and_then(|s| s.to_str()) {
			Some("toml") => Self::from_toml(&contents),
			Some("json") => Self::from_json(&contents),
			Some("yaml") | Some("yml") => Self::from_yaml(&contents),
			_ => Err(ConfigError::ParseError(format!(
				"Unsupported config format: {:?}",
				path
			))),
		}
	}

	/// Load from TOML string
	pub fn from_toml(contents: &str) -> Result<MznConfig, ConfigError> {
		toml::from_str(contents)
			.map_err(|e| ConfigError::ParseError(format!("Failed to parse TOML: {}", e)))
	}

	/// Load from JSON string
	pub fn from_json(contents: &str) -> Result<MznConfig, ConfigError> {
		serde_json::from_str(contents)
			.map_err(|e| ConfigError::ParseError(format!("Failed to parse JSON: {}", e)))
	}

	/// Load from YAML string
	pub fn from_yaml(contents: &str) -> Result<MznConfig, ConfigError> {
		serde_yaml::from_str(contents)
			.map_err(|e| ConfigError::ParseError(format!("Failed to parse YAML: {}", e)))
	}

	fn apply_env_overrides(&self, config: &mut MznConfig) -> Result<(), ConfigError> {
		if let Ok(level) = env::var(format!("{}LOG_LEVEL", self.env_prefix)) {
			debug!("Overriding log level from environment");
			config.logging.level = level;
		}

		if let Ok(executable) = env::var(format!("{}SOLVER", self.env_prefix)) {
			debug!("Overriding solver executable from environment");
			config.solver.executable = executable;
		}

		if let Ok(mode) = env::var(format!("{}OUTPUT_MODE", self.env_prefix)) {
			debug!("Overriding output mode from environment");
			config.output.mode = match mode.to_ascii_lowercase().as_str() {
				"structured" => OutputMode::Structured,
				"raw" => OutputMode::Raw,
				_ => {
					return Err(ConfigError::ValidationError(format!(
						"Invalid output mode: {}",
						mode
					)))
				}
			};
		}

		Ok(())
	}
}

/// Replaces `${VAR_NAME}` references with environment values.
fn substitute_env_vars(content: &str) -> Result<String, ConfigError> {
	let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ConfigError::ParseError(e.to_string()))?;
	let mut result = content.to_string();

	for cap in re.captures_iter(content) {
		let full_match = &cap[0];
		let var_name = &cap[1];

		let env_value =
			env::var(var_name).map_err(|_| ConfigError::EnvVarNotFound(var_name.to_string()))?;

		result = result.replace(full_match, &env_value);
	}

	Ok(result)
}

/// Checks a configuration for values the run cannot work with.
pub fn validate_config(config: &MznConfig) -> Result<(), ConfigError> {
	if config.solver.executable.trim().is_empty() {
		return Err(ConfigError::ValidationError(
			"Solver executable must not be empty".to_string(),
		));
	}

	if !ADAPTER_NAMES.contains(&config.solver.adapter.as_str()) {
		return Err(ConfigError::ValidationError(format!(
			"Unknown solver adapter '{}', expected one of {}",
			config.solver.adapter,
			ADAPTER_NAMES.join(", ")
		)));
	}

	if config.solver.timeout_secs == Some(0) {
		return Err(ConfigError::ValidationError(
			"Solver timeout must be positive".to_string(),
		));
	}

	if tracing::Level::from_str(&config.logging.level).is_err() {
		return Err(ConfigError::ValidationError(format!(
			"Invalid log level: {}",
			config.logging.level
		)));
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use mzn_dzn::TypeHint;
	use std::io::Write;

	fn write_config(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
		let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
		file.write_all(contents.as_bytes()).unwrap();
		file
	}

	#[test]
	fn test_toml_parsing() {
		let toml = r#"
[solver]
executable = "fzn-gecode"
args = ["-a", "-s"]
adapter = "gecode"
timeout_secs = 60

[output]
mode = "raw"
keep_solutions = false

[output.types]
cost = "float"

[logging]
level = "debug"
"#;

		let config = ConfigLoader::from_toml(toml).unwrap();
		assert_eq!(config.solver.executable, "fzn-gecode");
		assert_eq!(config.solver.args, vec!["-a", "-s"]);
		assert_eq!(config.solver.timeout_secs, Some(60));
		assert_eq!(config.output.mode, OutputMode::Raw);
		assert!(!config.output.keep_solutions);
		assert!(config.output.rebase_arrays);
		assert_eq!(config.output.types.get("cost"), Some(&TypeHint::Float));
		assert_eq!(config.logging.level, "debug");
		validate_config(&config).unwrap();
	}

	#[test]
	fn test_partial_documents_use_defaults() {
		let config = ConfigLoader::from_json(r#"{"solver": {"adapter": "mzn-stat"}}"#).unwrap();
		assert_eq!(config.solver.executable, "minizinc");
		assert_eq!(config.solver.adapter, "mzn-stat");

		let config = ConfigLoader::from_yaml("output:\n  rebase_arrays: false\n").unwrap();
		assert!(!config.output.rebase_arrays);
		assert_eq!(config.logging.level, "info");
	}

	#[test]
	fn test_validation() {
		validate_config(&MznConfig::default()).unwrap();

		let mut config = MznConfig::default();
		config.solver.executable = "  ".to_string();
		assert!(matches!(
			validate_config(&config),
			Err(ConfigError::ValidationError(_))
		));

		let mut config = MznConfig::default();
		config.solver.adapter = "chuffed".to_string();
		assert!(matches!(
			validate_config(&config),
			Err(ConfigError::ValidationError(_))
		));

		let mut config = MznConfig::default();
		config.logging.level = "loud".to_string();
		assert!(matches!(
			validate_config(&config),
			Err(ConfigError::ValidationError(_))
		));

		let mut config = MznConfig::default();
		config.solver.timeout_secs = Some(0);
		assert!(validate_config(&config).is_err());
	}

	#[test]
	fn test_env_substitution() {
		env::set_var("MZN_CONFIG_TEST_SOLVER_PATH", "/opt/solvers/fzn-chuffed");
		let substituted =
			substitute_env_vars("executable = \"${MZN_CONFIG_TEST_SOLVER_PATH}\"").unwrap();
		assert_eq!(substituted, "executable = \"/opt/solvers/fzn-chuffed\"");

		assert!(matches!(
			substitute_env_vars("executable = \"${MZN_CONFIG_TEST_UNSET_VAR}\""),
			Err(ConfigError::EnvVarNotFound(name)) if name == "MZN_CONFIG_TEST_UNSET_VAR"
		));
	}

	#[tokio::test]
	async fn test_load_from_file_with_overrides() {
		let file = write_config(
			".toml",
			"[solver]\nexecutable = \"fzn-gecode\"\n\n[logging]\nlevel = \"warn\"\n",
		);
		env::set_var("MZN_LOADER_A_LOG_LEVEL", "trace");
		env::set_var("MZN_LOADER_A_OUTPUT_MODE", "RAW");

		let config = ConfigLoader::new()
			.with_file(file.path())
			.with_env_prefix("MZN_LOADER_A_")
			.load()
			.await
			.unwrap();
		assert_eq!(config.solver.executable, "fzn-gecode");
		assert_eq!(config.logging.level, "trace");
		assert_eq!(config.output.mode, OutputMode::Raw);
	}

	#[tokio::test]
	async fn test_invalid_override_is_rejected() {
		env::set_var("MZN_LOADER_B_OUTPUT_MODE", "xml");
		let result = ConfigLoader::new()
			.with_env_prefix("MZN_LOADER_B_")
			.load()
			.await;
		assert!(matches!(result, Err(ConfigError::ValidationError(_))));
	}

	#[tokio::test]
	async fn test_load_errors() {
		let result = ConfigLoader::new()
			.with_file("/nonexistent/mzn-stream.toml")
			.load()
			.await;
		assert!(matches!(result, Err(ConfigError::FileNotFound(_))));

		let file = write_config(".ini", "[solver]\n");
		let result = ConfigLoader::new().with_file(file.path()).load().await;
		assert!(matches!(result, Err(ConfigError::ParseError(_))));

		let file = write_config(".yaml", "solver: [not, a, map]\n");
		let result = ConfigLoader::new().with_file(file.path()).load().await;
		assert!(matches!(result, Err(ConfigError::ParseError(_))));
	}
}
