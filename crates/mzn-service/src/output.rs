//! Printing of solutions and run summaries.
//!
//! Output mirrors the solver convention: every solution is followed by the
//! separator line, the run ends with its status marker and statistics are
//! written as `%%%mzn-stat` lines. Raw output can therefore be replayed
//! through `mzn-stream parse`.

use anyhow::{Context, Result};
use mzn_output::Solutions;
use mzn_types::{markers, Solution, Statistics, Status};
use std::io::Write;
use tracing::{debug, warn};

pub struct SolutionWriter<W> {
	out: W,
	written: usize,
}

impl<W: Write> SolutionWriter<W> {
	pub fn new(out: W) -> Self {
		Self { out, written: 0 }
	}

	pub fn written(&self) -> usize {
		self.written
	}

	pub fn write_solution(&mut self, solution: &Solution) -> Result<()> {
		match solution {
			Solution::Raw(text) => writeln!(self.out, "{}", text)?,
			Solution::Structured(_) => {
				let json = serde_json::to_string(solution).context("Failed to encode solution")?;
				writeln!(self.out, "{}", json)?;
			}
		}
		writeln!(self.out, "{}", markers::SOLUTION_SEPARATOR)?;
		self.out.flush()?;
		self.written += 1;
		Ok(())
	}

	pub fn write_summary(&mut self, status: Status, statistics: Option<&Statistics>) -> Result<()> {
		if let Some(marker) = status.marker() {
			writeln!(self.out, "{}", marker)?;
		}
		if let Some(statistics) = statistics {
			for (key, value) in statistics.iter() {
				let value = match value {
					serde_json::Value::String(text) => text.clone(),
					other => other.to_string(),
				};
				writeln!(self.out, "%%%mzn-stat: {}={}", key, value)?;
			}
			writeln!(self.out, "%%%mzn-stat-end")?;
		}
		self.out.flush()?;
		Ok(())
	}

	pub fn into_inner(self) -> W {
		self.out
	}
}

/// Prints every solution as it arrives, then the run summary.
///
/// Solver stderr is forwarded to `errors`. A solution that fails to parse
/// aborts the run with an error.
pub async fn print_solutions<W: Write, E: Write>(
	mut solutions: Solutions,
	writer: &mut SolutionWriter<W>,
	errors: &mut E,
) -> Result<Status> {
	let outcome = loop {
		match solutions.next_solution().await {
			Ok(Some(solution)) => writer.write_solution(&solution)?,
			Ok(None) => break Ok(()),
			Err(e) => {
				// Wait for the producer to publish the run summary
				while let Ok(Some(_)) = solutions.next_solution().await {}
				break Err(e);
			}
		}
	};

	if let Some(stderr) = solutions.stderr() {
		errors.write_all(stderr.as_bytes())?;
		if !stderr.ends_with('\n') {
			writeln!(errors)?;
		}
	}

	outcome.context("Solver output could not be parsed")?;

	let status = solutions.status();
	writer.write_summary(status, solutions.statistics())?;
	debug!("Printed {} solutions", writer.written());
	if status == Status::Error {
		warn!("Solver reported an error");
	}
	Ok(status)
}

#[cfg(test)]
mod tests {
	use super::*;
	use mzn_output::{OutputOptions, SolutionParser};

	async fn print(parser: SolutionParser, lines: &[&str]) -> (Result<Status>, String, String) {
		let solutions = parser.parse_lines(lines.iter().copied());
		let mut writer = SolutionWriter::new(Vec::new());
		let mut errors = Vec::new();
		let result = print_solutions(solutions, &mut writer, &mut errors).await;
		(
			result,
			String::from_utf8(writer.into_inner()).unwrap(),
			String::from_utf8(errors).unwrap(),
		)
	}

	#[tokio::test]
	async fn test_structured_output_is_json() {
		let (status, out, _) = print(
			SolutionParser::default(),
			&["x = 1;", "b = true;", "----------", "=========="],
		)
		.await;

		assert_eq!(status.unwrap(), Status::Complete);
		assert_eq!(out, "{\"b\":true,\"x\":1}\n----------\n==========\n");
	}

	#[tokio::test]
	async fn test_raw_output_replays() {
		let parser = SolutionParser::new(OutputOptions::raw())
			.with_adapter_name("mzn-stat")
			.unwrap();
		let (status, out, _) = print(
			parser,
			&["x = 1;", "----------", "=====UNKNOWN=====", "%%%mzn-stat: nodes=3"],
		)
		.await;

		assert_eq!(status.unwrap(), Status::Unknown);
		assert_eq!(
			out,
			"x = 1;\n----------\n=====UNKNOWN=====\n%%%mzn-stat: nodes=3\n%%%mzn-stat-end\n"
		);
	}

	#[tokio::test]
	async fn test_parse_error_fails() {
		let (status, out, _) = print(
			SolutionParser::default(),
			&["x = 1;", "----------", "x = = 2;", "----------"],
		)
		.await;

		assert!(status.is_err());
		assert_eq!(out, "{\"x\":1}\n----------\n");
	}

	#[tokio::test]
	async fn test_unsatisfiable_prints_marker_only() {
		let (status, out, errors) =
			print(SolutionParser::default(), &["=====UNSATISFIABLE====="]).await;
		assert_eq!(status.unwrap(), Status::Unsatisfiable);
		assert_eq!(out, "=====UNSATISFIABLE=====\n");
		assert!(errors.is_empty());
	}
}
