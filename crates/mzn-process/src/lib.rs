//! Line sources for solver output.
//!
//! The output pipeline reads solver output one line at a time through the
//! [`LineSource`] trait. Implementations cover a spawned solver process, any
//! async reader (files, stdin), and fixed in-memory lines.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod memory;
	pub mod process;
	pub mod reader;
}

pub use implementations::memory::MemorySource;
pub use implementations::process::{ProcessOptions, SolverProcess};
pub use implementations::reader::ReaderSource;

/// Errors that can occur while producing lines.
#[derive(Debug, Error)]
pub enum SourceError {
	/// The solver executable could not be started.
	#[error("Failed to spawn {executable}: {reason}")]
	Spawn { executable: String, reason: String },
	/// Reading from the underlying stream failed.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// The run exceeded its time limit.
	#[error("Timed out after {0:?}")]
	Timeout(Duration),
}

/// A blocking-style producer of output lines.
///
/// Line endings are stripped. After `next_line` has returned `Ok(None)` (or
/// an error), `finish` releases the source and returns whatever the producer
/// wrote to its error stream.
#[async_trait]
pub trait LineSource: Send {
	/// Returns the next line, or `None` once the output is exhausted.
	async fn next_line(&mut self) -> Result<Option<String>, SourceError>;

	/// Waits for the producer to end and returns its captured error text.
	async fn finish(&mut self) -> Option<String>;

	/// Asks the producer to stop early. `finish` must still be called.
	fn cancel(&mut self) {}
}

#[async_trait]
impl<S: LineSource + ?Sized> LineSource for Box<S> {
	async fn next_line(&mut self) -> Result<Option<String>, SourceError> {
		(**self).next_line().await
	}

	async fn finish(&mut self) -> Option<String> {
		(**self).finish().await
	}

	fn cancel(&mut self) {
		(**self).cancel()
	}
}
