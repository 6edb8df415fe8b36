//! In-memory line source, used for replays and tests.

use crate::{LineSource, SourceError};
use async_trait::async_trait;
use std::collections::VecDeque;

/// Serves a fixed list of lines, then an optional error text.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
	lines: VecDeque<String>,
	stderr: Option<String>,
}

impl MemorySource {
	pub fn new<I, S>(lines: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self {
			lines: lines.into_iter().map(Into::into).collect(),
			stderr: None,
		}
	}

	/// Splits a captured output dump into lines.
	pub fn from_text(text: &str) -> Self {
		Self::new(text.lines())
	}

	pub fn with_stderr(mut self, stderr: impl Into<String>) -> Self {
		self.stderr = Some(stderr.into());
		self
	}
}

#[async_trait]
impl LineSource for MemorySource {
	async fn next_line(&mut self) -> Result<Option<String>, SourceError> {
		Ok(self.lines.pop_front())
	}

	async fn finish(&mut self) -> Option<String> {
		self.stderr.take()
	}
}
