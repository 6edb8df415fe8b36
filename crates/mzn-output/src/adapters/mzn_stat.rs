//! MiniZinc standard statistics lines.
//!
//! Solvers run with `--statistics` print `%%%mzn-stat: key=value` lines,
//! optionally closed by `%%%mzn-stat-end`.

use super::{non_empty, SolverLineAdapter};
use mzn_types::Statistics;

const STAT_PREFIX: &str = "%%%mzn-stat:";
const CONTROL_PREFIX: &str = "%%%mzn-";

/// Records `%%%mzn-stat` lines and drops every `%%%mzn-` control line.
#[derive(Debug, Clone, Default)]
pub struct MznStatAdapter {
	statistics: Statistics,
}

impl MznStatAdapter {
	pub fn new() -> Self {
		Self::default()
	}
}

/// Handles a `%%%mzn-` line. Returns false if the line is not one.
pub(super) fn absorb_control_line(statistics: &mut Statistics, line: &str) -> bool {
	let line = line.trim_start();
	if let Some(entry) = line.strip_prefix(STAT_PREFIX) {
		if let Some((key, value)) = entry.split_once('=') {
			statistics.record(key.trim(), value);
		}
		true
	} else {
		line.starts_with(CONTROL_PREFIX)
	}
}

impl SolverLineAdapter for MznStatAdapter {
	fn parse_line(&mut self, line: String) -> Option<String> {
		if absorb_control_line(&mut self.statistics, &line) {
			None
		} else {
			Some(line)
		}
	}

	fn statistics(&self) -> Option<Statistics> {
		non_empty(&self.statistics)
	}
}
