//! Gecode's FlatZinc statistics block.
//!
//! With `-s`, `fzn-gecode` appends lines such as
//!
//! ```text
//! %%  runtime:       0.004 (4.123 ms)
//! %%  solutions:     2
//! %%  peak depth:    3
//! ```

use super::mzn_stat::absorb_control_line;
use super::{non_empty, SolverLineAdapter};
use mzn_types::Statistics;

#[derive(Debug, Clone, Default)]
pub struct GecodeAdapter {
	statistics: Statistics,
}

impl GecodeAdapter {
	pub fn new() -> Self {
		Self::default()
	}

	fn record(&mut self, entry: &str) {
		let Some((key, value)) = entry.split_once(':') else {
			return;
		};
		let key = key.trim().replace(' ', "_");
		// Keep the leading number, drop unit annotations such as "(4.123 ms)"
		if let Some(value) = value.split_whitespace().next() {
			self.statistics.record(key, value);
		}
	}
}

impl SolverLineAdapter for GecodeAdapter {
	fn parse_line(&mut self, line: String) -> Option<String> {
		if absorb_control_line(&mut self.statistics, &line) {
			return None;
		}
		match line.trim_start().strip_prefix("%%") {
			Some(entry) => {
				self.record(entry);
				None
			}
			None => Some(line),
		}
	}

	fn statistics(&self) -> Option<Statistics> {
		non_empty(&self.statistics)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::Value;

	#[test]
	fn test_strips_statistics_block() {
		let mut adapter = GecodeAdapter::new();
		let lines = [
			"x = 3;",
			"----------",
			"==========",
			"%%  runtime:       0.004 (4.123 ms)",
			"%%  solutions:     1",
			"%%  peak depth:    3",
			"%%%mzn-stat: failures=0",
		];
		let forwarded: Vec<String> = lines
			.iter()
			.filter_map(|l| adapter.parse_line(l.to_string()))
			.collect();

		assert_eq!(forwarded, vec!["x = 3;", "----------", "=========="]);
		let stats = adapter.statistics().unwrap();
		assert_eq!(stats.get("runtime").and_then(Value::as_f64), Some(0.004));
		assert_eq!(stats.get("solutions"), Some(&Value::from(1)));
		assert_eq!(stats.get("peak_depth"), Some(&Value::from(3)));
		assert_eq!(stats.get("failures"), Some(&Value::from(0)));
	}

	#[test]
	fn test_single_percent_comment_is_forwarded() {
		let mut adapter = GecodeAdapter::new();
		assert_eq!(
			adapter.parse_line("% a comment".into()),
			Some("% a comment".to_string())
		);
		assert!(adapter.statistics().is_none());
	}
}
