use super::SolverLineAdapter;
use mzn_types::Statistics;

/// Forwards every line unchanged and reports no statistics.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughAdapter;

impl SolverLineAdapter for PassthroughAdapter {
	fn parse_line(&mut self, line: String) -> Option<String> {
		Some(line)
	}

	fn statistics(&self) -> Option<Statistics> {
		None
	}
}
