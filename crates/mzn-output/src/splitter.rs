//! Segmentation of solver output into solution bodies.

use mzn_types::{markers, Status};
use tracing::debug;

/// Line-at-a-time state machine over solver output.
///
/// Every non-empty line that is not a marker is buffered. A solution
/// separator emits the buffer as one body; a terminal marker records the
/// run status. Marker lines themselves are never buffered.
#[derive(Debug, Default)]
pub struct LineSplitter {
	buffer: Vec<String>,
	status: Status,
}

impl LineSplitter {
	pub fn new() -> Self {
		Self::default()
	}

	/// Consumes one line, returning a completed solution body if the line
	/// closed one. Surrounding whitespace is ignored.
	pub fn consume(&mut self, line: &str) -> Option<String> {
		let line = line.trim();

		if line == markers::SOLUTION_SEPARATOR {
			let body = self.buffer.join("\n");
			self.buffer.clear();
			return Some(body);
		}

		if let Some(status) = Status::from_marker(line) {
			// Last marker wins if a solver prints more than one
			if self.status != Status::Incomplete && self.status != status {
				debug!("Status {} overridden by {}", self.status, status);
			}
			self.status = status;
			if status == Status::Complete {
				self.buffer.clear();
			}
			return None;
		}

		if !line.is_empty() {
			self.buffer.push(line.to_string());
		}
		None
	}

	/// Status announced so far; `Incomplete` until a terminal marker is seen.
	pub fn status(&self) -> Status {
		self.status
	}

	/// Number of lines buffered since the last boundary.
	pub fn pending(&self) -> usize {
		self.buffer.len()
	}
}
