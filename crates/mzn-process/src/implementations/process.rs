//! Solver process line source.
//!
//! Spawns the solver with piped output, serves its stdout line by line and
//! collects stderr in the background so a chatty solver never blocks on a
//! full pipe.

use crate::{LineSource, SourceError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader, Lines};
use tokio::process::{Child, ChildStdout, Command};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// How to launch a solver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessOptions {
	/// Solver executable, resolved through `PATH` when relative.
	pub executable: PathBuf,
	/// Arguments passed verbatim.
	#[serde(default)]
	pub args: Vec<String>,
	/// Working directory for the solver.
	#[serde(default)]
	pub working_dir: Option<PathBuf>,
	/// Overall time limit for reading the solver output.
	#[serde(default)]
	pub timeout: Option<Duration>,
}

impl ProcessOptions {
	pub fn new(executable: impl Into<PathBuf>) -> Self {
		Self {
			executable: executable.into(),
			args: Vec::new(),
			working_dir: None,
			timeout: None,
		}
	}

	pub fn with_args<I, S>(mut self, args: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.args = args.into_iter().map(Into::into).collect();
		self
	}

	pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
		self.working_dir = Some(dir.into());
		self
	}

	pub fn with_timeout(mut self, timeout: Duration) -> Self {
		self.timeout = Some(timeout);
		self
	}
}

/// A running solver. The child is killed if this handle is dropped early.
pub struct SolverProcess {
	executable: String,
	child: Child,
	stdout: Lines<BufReader<ChildStdout>>,
	stderr: Option<JoinHandle<String>>,
	deadline: Option<Instant>,
	timeout: Option<Duration>,
	timed_out: bool,
}

impl SolverProcess {
	pub fn spawn(options: &ProcessOptions) -> Result<Self, SourceError> {
		let executable = options.executable.display().to_string();
		let mut command = Command::new(&options.executable);
		command
			.args(&options.args)
			.stdin(Stdio::null())
			.stdout(Stdio::piped())
			.stderr(Stdio::piped())
			.kill_on_drop(true);
		if let Some(dir) = &options.working_dir {
			command.current_dir(dir);
		}

		let mut child = command.spawn().map_err(|e| SourceError::Spawn {
			executable: executable.clone(),
			reason: e.to_string(),
		})?;
		info!("Spawned solver {} {}", executable, options.args.join(" "));

		let stdout = child.stdout.take().ok_or_else(|| SourceError::Spawn {
			executable: executable.clone(),
			reason: "stdout not captured".to_string(),
		})?;
		let stderr = child.stderr.take().map(|mut pipe| {
			tokio::spawn(async move {
				let mut buffer = Vec::new();
				if let Err(e) = pipe.read_to_end(&mut buffer).await {
					warn!("Failed to read solver stderr: {}", e);
				}
				String::from_utf8_lossy(&buffer).into_owned()
			})
		});

		Ok(Self {
			executable,
			child,
			stdout: BufReader::new(stdout).lines(),
			stderr,
			deadline: options.timeout.map(|t| Instant::now() + t),
			timeout: options.timeout,
			timed_out: false,
		})
	}

	/// Operating system id of the solver, if it is still running.
	pub fn id(&self) -> Option<u32> {
		self.child.id()
	}

	pub fn timed_out(&self) -> bool {
		self.timed_out
	}
}

#[async_trait]
impl LineSource for SolverProcess {
	async fn next_line(&mut self) -> Result<Option<String>, SourceError> {
		if self.timed_out {
			return Ok(None);
		}

		let Some(deadline) = self.deadline else {
			return Ok(self.stdout.next_line().await?);
		};

		match tokio::time::timeout_at(deadline, self.stdout.next_line()).await {
			Ok(line) => Ok(line?),
			Err(_) => {
				warn!("Solver {} exceeded its time limit, killing it", self.executable);
				self.timed_out = true;
				self.cancel();
				Ok(None)
			}
		}
	}

	fn cancel(&mut self) {
		if let Err(e) = self.child.start_kill() {
			debug!("Failed to kill solver {}: {}", self.executable, e);
		}
	}

	async fn finish(&mut self) -> Option<String> {
		match self.child.wait().await {
			Ok(status) if !status.success() && !self.timed_out => {
				warn!("Solver {} exited with {}", self.executable, status);
			}
			Ok(status) => debug!("Solver {} exited with {}", self.executable, status),
			Err(e) => warn!("Failed to wait for solver {}: {}", self.executable, e),
		}

		let mut text = match self.stderr.take() {
			Some(handle) => handle.await.unwrap_or_default(),
			None => String::new(),
		};
		if self.timed_out {
			if let Some(timeout) = self.timeout {
				if !text.is_empty() && !text.ends_with('\n') {
					text.push('\n');
				}
				text.push_str(&SourceError::Timeout(timeout).to_string());
			}
		}

		if text.is_empty() {
			None
		} else {
			Some(text)
		}
	}
}
