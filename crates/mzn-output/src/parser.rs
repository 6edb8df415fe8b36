//! Orchestration of a parsing run.
//!
//! [`SolutionParser::parse`] spawns a task that reads a [`LineSource`] line
//! by line, filters each line through the solver adapter, segments the
//! result with a [`LineSplitter`] and pushes every completed solution into
//! the returned [`Solutions`] stream. A second task watches the producer
//! and turns a panic into a stream error and an `Error` status.

use crate::adapters::{adapter_factory, AdapterError, AdapterFactory, SolverLineAdapter};
use crate::splitter::LineSplitter;
use crate::stream::{RecordSender, Solutions, SummaryCell};
use crate::{OutputMode, OutputOptions};
use mzn_dzn::{DznParser, ValueParser};
use mzn_process::{LineSource, MemorySource};
use mzn_types::{RunSummary, Solution, Status, StreamError, StreamResult};
use std::any::Any;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Turns solver output into a [`Solutions`] stream.
///
/// One parser can serve many runs; every run gets a fresh adapter and
/// splitter.
#[derive(Clone)]
pub struct SolutionParser {
	options: OutputOptions,
	adapter: AdapterFactory,
	value_parser: Arc<dyn ValueParser>,
}

impl Default for SolutionParser {
	fn default() -> Self {
		Self::new(OutputOptions::default())
	}
}

impl SolutionParser {
	pub fn new(options: OutputOptions) -> Self {
		Self {
			options,
			adapter: Arc::new(|| {
				Box::new(crate::adapters::PassthroughAdapter) as Box<dyn SolverLineAdapter>
			}),
			value_parser: Arc::new(DznParser),
		}
	}

	pub fn with_adapter(mut self, factory: AdapterFactory) -> Self {
		self.adapter = factory;
		self
	}

	/// Selects one of the built-in adapters by name.
	pub fn with_adapter_name(self, name: &str) -> Result<Self, AdapterError> {
		Ok(self.with_adapter(adapter_factory(name)?))
	}

	pub fn with_value_parser<P: ValueParser + 'static>(mut self, parser: P) -> Self {
		self.value_parser = Arc::new(parser);
		self
	}

	pub fn options(&self) -> &OutputOptions {
		&self.options
	}

	/// Starts consuming `source` in the background and returns the stream it
	/// feeds. Must be called from within a tokio runtime.
	///
	/// Dropping the returned stream stops the run and cancels the source.
	pub fn parse<S: LineSource + 'static>(&self, source: S) -> Solutions {
		let (sender, receiver) = mpsc::unbounded_channel();
		let summary = SummaryCell::default();
		let run = Run {
			adapter: (self.adapter)(),
			splitter: LineSplitter::new(),
			value_parser: self.value_parser.clone(),
			options: self.options.clone(),
			sender: sender.clone(),
			summary: summary.clone(),
		};

		let run_id = Uuid::new_v4();
		let span = info_span!("solver_run", %run_id);
		let producer = tokio::spawn(run.produce(source).instrument(span.clone()));
		tokio::spawn(supervise(producer, sender, summary.clone()).instrument(span));

		Solutions::new(receiver, summary, self.options.keep_solutions)
	}

	/// Parses a fixed set of output lines.
	pub fn parse_lines<I, L>(&self, lines: I) -> Solutions
	where
		I: IntoIterator<Item = L>,
		L: Into<String>,
	{
		self.parse(MemorySource::new(lines))
	}
}

/// State owned by the producing task.
struct Run {
	adapter: Box<dyn SolverLineAdapter>,
	splitter: LineSplitter,
	value_parser: Arc<dyn ValueParser>,
	options: OutputOptions,
	sender: RecordSender,
	summary: SummaryCell,
}

impl Run {
	async fn produce<S: LineSource>(mut self, mut source: S) {
		debug!("Reading solver output");
		let mut read_error = None;
		let mut produced = 0usize;

		loop {
			let line = tokio::select! {
				line = source.next_line() => line,
				_ = self.sender.closed() => {
					debug!("Solution stream dropped, stopping the run");
					source.cancel();
					source.finish().await;
					return;
				}
			};

			let line = match line {
				Ok(Some(line)) => line,
				Ok(None) => break,
				Err(e) => {
					warn!("Failed to read solver output: {}", e);
					read_error = Some(e.to_string());
					break;
				}
			};

			let Some(line) = self.adapter.parse_line(line) else {
				continue;
			};
			let Some(body) = self.splitter.consume(&line) else {
				continue;
			};

			let record = self.convert(body);
			let failed = match &record {
				Ok(_) => {
					produced += 1;
					debug!("Solution {} received", produced);
					false
				}
				Err(e) => {
					warn!("{}", e);
					true
				}
			};

			if self.sender.send(record).is_err() {
				debug!("Solution stream dropped, stopping the run");
				source.cancel();
				source.finish().await;
				return;
			}
			if failed {
				source.cancel();
				break;
			}
		}

		let mut stderr = source.finish().await;
		if let Some(error) = read_error {
			stderr = Some(match stderr {
				Some(text) => format!("{}\n{}", text.trim_end(), error),
				None => error,
			});
		}

		let summary = RunSummary {
			status: self.splitter.status(),
			statistics: self.adapter.statistics(),
			stderr,
		};
		info!(
			"Solver output finished with status {} after {} solutions",
			summary.status, produced
		);

		// Published before the sender drops, so a closed channel implies a
		// final summary
		let _ = self.summary.set(summary);
	}

	fn convert(&self, body: String) -> StreamResult<Solution> {
		match self.options.mode {
			OutputMode::Raw => Ok(Solution::Raw(body)),
			OutputMode::Structured => self
				.value_parser
				.parse(&body, &self.options.parse)
				.map(Solution::Structured)
				.map_err(|source| StreamError::Parse { body, source }),
		}
	}
}

/// Waits for the producer and reports a panic through the stream.
///
/// Holds its own sender, so the consumer only sees the channel close after
/// the outcome is known.
async fn supervise(producer: JoinHandle<()>, sender: RecordSender, summary: SummaryCell) {
	let Err(e) = producer.await else {
		return;
	};

	let message = failure_message(e);
	error!("Solution producer failed: {}", message);
	let _ = summary.set(RunSummary {
		status: Status::Error,
		statistics: None,
		stderr: Some(format!("Solution producer failed: {}", message)),
	});
	let _ = sender.send(Err(StreamError::Producer(message)));
}

fn failure_message(e: JoinError) -> String {
	if !e.is_panic() {
		return "task was cancelled".to_string();
	}
	let payload: Box<dyn Any + Send> = e.into_panic();
	if let Some(text) = payload.downcast_ref::<&str>() {
		text.to_string()
	} else if let Some(text) = payload.downcast_ref::<String>() {
		text.clone()
	} else {
		"panicked".to_string()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use async_trait::async_trait;
	use futures::StreamExt;
	use mzn_dzn::ParseOptions;
	use mzn_process::SourceError;
	use mzn_types::{Assignment, DznError, DznValue};
	use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
	use std::time::Duration;

	fn raw_parser() -> SolutionParser {
		SolutionParser::new(OutputOptions::raw())
	}

	async fn collect(solutions: &mut Solutions) -> Vec<Solution> {
		match solutions {
			Solutions::Materialized(s) => s.iter().await.unwrap().cloned().collect(),
			Solutions::Streaming(_) => panic!("expected retained solutions"),
		}
	}

	#[tokio::test]
	async fn test_two_solutions_then_complete() {
		let mut solutions = raw_parser().parse_lines([
			"x = 1;",
			"----------",
			"x = 2;",
			"----------",
			"==========",
		]);

		assert_eq!(
			collect(&mut solutions).await,
			vec![Solution::Raw("x = 1;".into()), Solution::Raw("x = 2;".into())]
		);
		assert_eq!(solutions.len(), 2);
		assert_eq!(solutions.status(), Status::Complete);
	}

	#[tokio::test]
	async fn test_unsatisfiable() {
		let mut solutions = raw_parser().parse_lines(["=====UNSATISFIABLE====="]);

		assert!(collect(&mut solutions).await.is_empty());
		assert_eq!(solutions.len(), 0);
		assert_eq!(solutions.status(), Status::Unsatisfiable);
		assert_eq!(solutions.to_string(), "UNSATISFIABLE");
	}

	#[tokio::test]
	async fn test_partial_then_error() {
		let mut solutions = raw_parser().parse_lines(["partial", "----------", "=====ERROR====="]);

		assert_eq!(
			collect(&mut solutions).await,
			vec![Solution::Raw("partial".into())]
		);
		assert_eq!(solutions.status(), Status::Error);
	}

	#[tokio::test]
	async fn test_empty_output() {
		let mut solutions = raw_parser().parse(MemorySource::default());

		assert!(collect(&mut solutions).await.is_empty());
		assert_eq!(solutions.status(), Status::Incomplete);
		assert_eq!(solutions.stderr(), None);
	}

	#[tokio::test]
	async fn test_no_separator_no_solutions() {
		for marker in ["==========", "=====UNKNOWN=====", "=====UNBOUNDED====="] {
			let mut solutions = raw_parser().parse_lines(["x = 1;", "y = 2;", marker]);
			assert!(collect(&mut solutions).await.is_empty());
			assert_eq!(solutions.len(), 0);
		}
	}

	#[tokio::test]
	async fn test_structured_solutions() {
		let parser = SolutionParser::new(
			OutputOptions::default()
				.with_parse_options(ParseOptions::default().with_rebase_arrays(true)),
		);
		let mut solutions = parser.parse_lines([
			"x = 3;",
			"q = array1d(1..3, [2, 4, 1]);",
			"----------",
			"==========",
		]);

		let all = collect(&mut solutions).await;
		assert_eq!(all.len(), 1);
		assert_eq!(all[0].get("x"), Some(&DznValue::Int(3)));
		assert_eq!(
			all[0].get("q"),
			Some(&DznValue::Array(vec![
				DznValue::Int(2),
				DznValue::Int(4),
				DznValue::Int(1)
			]))
		);
	}

	#[tokio::test]
	async fn test_parse_error_is_tagged_with_body() {
		let parser = SolutionParser::default();
		let mut solutions = parser.parse(
			MemorySource::new(["x = 1;", "----------", "not dzn at all", "----------", "x = 3;", "----------"])
				.with_stderr("warning: something"),
		);

		let Solutions::Materialized(retained) = &mut solutions else {
			panic!("expected retained solutions");
		};
		match retained.drain().await {
			Err(StreamError::Parse { body, source }) => {
				assert_eq!(body, "not dzn at all");
				assert!(matches!(source, DznError::Expected { .. }));
			}
			other => panic!("expected parse error, got {:?}", other),
		}

		// The run stops at the failing body but its metadata is kept
		retained.drain().await.unwrap();
		assert_eq!(retained.len(), 1);
		assert_eq!(retained.status(), Status::Incomplete);
		assert_eq!(retained.stderr(), Some("warning: something"));
	}

	#[tokio::test]
	async fn test_adapter_statistics_and_stderr() {
		let parser = raw_parser().with_adapter_name("gecode").unwrap();
		let source = MemorySource::new([
			"x = 1;",
			"----------",
			"==========",
			"%%  nodes:  12",
			"%%  runtime:  0.010 (10.000 ms)",
		])
		.with_stderr("done\n");
		let mut solutions = parser.parse(source);

		assert_eq!(collect(&mut solutions).await.len(), 1);
		let stats = solutions.statistics().unwrap();
		assert_eq!(stats.get("nodes").and_then(|v| v.as_i64()), Some(12));
		assert_eq!(solutions.stderr(), Some("done\n"));
	}

	#[tokio::test]
	async fn test_streaming_mode() {
		let parser = SolutionParser::new(OutputOptions::raw().with_keep_solutions(false));
		let mut solutions = parser.parse_lines(["a", "----------", "b", "----------", "=========="]);

		assert_eq!(solutions.get(0).await, Err(StreamError::NotRetained));
		let Solutions::Streaming(stream) = &mut solutions else {
			panic!("expected a streaming result");
		};
		let first = stream.next().await.unwrap().unwrap();
		assert_eq!(first, Solution::Raw("a".into()));
		assert_eq!(stream.finish().await, Ok(Status::Complete));
		assert_eq!(stream.len(), 2);
	}

	#[tokio::test]
	async fn test_streaming_parse_error() {
		let parser = SolutionParser::new(OutputOptions::default().with_keep_solutions(false));
		let source = MemorySource::new(["x = 1;", "----------", "x = ;", "----------", "x = 3;", "----------"])
			.with_stderr("warning: something");
		let mut solutions = parser.parse(source);

		let Solutions::Streaming(stream) = &mut solutions else {
			panic!("expected a streaming result");
		};
		let first = stream.next().await.unwrap().unwrap();
		assert_eq!(first.get("x"), Some(&DznValue::Int(1)));
		match stream.next().await {
			Some(Err(StreamError::Parse { body, .. })) => assert_eq!(body, "x = ;"),
			other => panic!("expected parse error, got {:?}", other),
		}
		assert!(stream.next().await.is_none());

		assert!(stream.is_finished());
		assert_eq!(stream.len(), 1);
		assert_eq!(stream.status(), Status::Incomplete);
		assert_eq!(stream.stderr(), Some("warning: something"));
	}

	#[tokio::test]
	async fn test_streaming_status_known_before_reading() {
		let parser = SolutionParser::new(OutputOptions::raw().with_keep_solutions(false));
		let solutions = parser.parse_lines(["x = 1;", "----------", "=========="]);

		tokio::time::timeout(Duration::from_secs(5), async {
			while solutions.status() != Status::Complete {
				tokio::time::sleep(Duration::from_millis(5)).await;
			}
		})
		.await
		.expect("status should be published without reading the stream");

		assert_eq!(solutions.len(), 0);
		assert_eq!(solutions.to_string(), "COMPLETE");
	}

	#[tokio::test]
	async fn test_huge_range_is_a_parse_error() {
		let mut solutions = SolutionParser::default().parse_lines([
			"x = 0..9223372036854775807;",
			"----------",
			"==========",
		]);

		let Solutions::Materialized(retained) = &mut solutions else {
			panic!("expected retained solutions");
		};
		match retained.drain().await {
			Err(StreamError::Parse { source, .. }) => assert_eq!(
				source,
				DznError::RangeTooLarge {
					lo: 0,
					hi: i64::MAX
				}
			),
			other => panic!("expected parse error, got {:?}", other),
		}
		retained.drain().await.unwrap();
		assert_eq!(retained.len(), 0);
	}

	struct Exploding;

	impl ValueParser for Exploding {
		fn parse(&self, body: &str, _options: &ParseOptions) -> Result<Assignment, DznError> {
			panic!("cannot handle {}", body)
		}
	}

	#[tokio::test]
	async fn test_producer_panic_is_reported() {
		let parser = SolutionParser::default().with_value_parser(Exploding);
		let mut solutions = parser.parse_lines(["x = 1;", "----------", "=========="]);

		let Solutions::Materialized(retained) = &mut solutions else {
			panic!("expected retained solutions");
		};
		assert_eq!(
			retained.drain().await,
			Err(StreamError::Producer("cannot handle x = 1;".into()))
		);
		retained.drain().await.unwrap();
		assert!(retained.is_drained());
		assert_eq!(retained.len(), 0);
		assert_eq!(retained.status(), Status::Error);
		assert!(retained.stderr().unwrap().contains("cannot handle x = 1;"));
		assert_eq!(retained.render().await.unwrap(), "ERROR");
	}

	#[tokio::test]
	async fn test_uniform_stream() {
		let parser = raw_parser();
		let solutions = parser.parse_lines(["a", "----------", "=====UNKNOWN====="]);
		let all: Vec<_> = solutions.into_stream().collect().await;
		assert_eq!(all, vec![Ok(Solution::Raw("a".into()))]);
	}

	#[tokio::test]
	async fn test_read_error_is_recorded() {
		struct Failing {
			served: bool,
		}

		#[async_trait]
		impl LineSource for Failing {
			async fn next_line(&mut self) -> Result<Option<String>, SourceError> {
				if self.served {
					return Err(SourceError::Io(std::io::Error::new(
						std::io::ErrorKind::InvalidData,
						"stream did not contain valid UTF-8",
					)));
				}
				self.served = true;
				Ok(Some("=====UNKNOWN=====".to_string()))
			}

			async fn finish(&mut self) -> Option<String> {
				Some("solver crashed\n".to_string())
			}
		}

		let mut solutions = raw_parser().parse(Failing { served: false });
		assert!(collect(&mut solutions).await.is_empty());
		assert_eq!(solutions.status(), Status::Unknown);
		assert_eq!(
			solutions.stderr(),
			Some("solver crashed\nIO error: stream did not contain valid UTF-8")
		);
	}

	/// Endless solver output, recording how the run was ended.
	struct Endless {
		lines: usize,
		cancelled: Arc<AtomicBool>,
		read: Arc<AtomicUsize>,
	}

	#[async_trait]
	impl LineSource for Endless {
		async fn next_line(&mut self) -> Result<Option<String>, SourceError> {
			tokio::task::yield_now().await;
			self.lines += 1;
			self.read.fetch_add(1, Ordering::SeqCst);
			if self.lines % 2 == 1 {
				Ok(Some(format!("x = {};", self.lines)))
			} else {
				Ok(Some("----------".to_string()))
			}
		}

		async fn finish(&mut self) -> Option<String> {
			None
		}

		fn cancel(&mut self) {
			self.cancelled.store(true, Ordering::SeqCst);
		}
	}

	#[tokio::test]
	async fn test_dropping_stream_stops_producer() {
		let cancelled = Arc::new(AtomicBool::new(false));
		let read = Arc::new(AtomicUsize::new(0));
		let parser = SolutionParser::new(OutputOptions::raw().with_keep_solutions(false));
		let mut solutions = parser.parse(Endless {
			lines: 0,
			cancelled: cancelled.clone(),
			read: read.clone(),
		});

		let Solutions::Streaming(stream) = &mut solutions else {
			panic!("expected a streaming result");
		};
		let first: Vec<_> = stream.take(3).collect().await;
		assert_eq!(first.len(), 3);
		drop(solutions);

		tokio::time::timeout(Duration::from_secs(5), async {
			while !cancelled.load(Ordering::SeqCst) {
				tokio::time::sleep(Duration::from_millis(5)).await;
			}
		})
		.await
		.expect("producer should stop once the stream is dropped");

		let after_stop = read.load(Ordering::SeqCst);
		tokio::time::sleep(Duration::from_millis(20)).await;
		assert_eq!(read.load(Ordering::SeqCst), after_stop);
	}

	#[cfg(unix)]
	#[tokio::test]
	async fn test_solver_process() {
		let options = mzn_process::ProcessOptions::new("sh").with_args([
			"-c",
			"printf 'x = 1;\\n----------\\nx = 2;\\n----------\\n==========\\n%%%%%%mzn-stat: nodes=4\\n'; echo note >&2",
		]);
		let process = mzn_process::SolverProcess::spawn(&options).unwrap();
		let parser = SolutionParser::default().with_adapter_name("mzn-stat").unwrap();
		let mut solutions = parser.parse(process);

		let all = collect(&mut solutions).await;
		assert_eq!(all.len(), 2);
		assert_eq!(all[1].get("x"), Some(&DznValue::Int(2)));
		assert_eq!(solutions.status(), Status::Complete);
		assert_eq!(
			solutions.statistics().and_then(|s| s.get("nodes")).and_then(|v| v.as_i64()),
			Some(4)
		);
		assert_eq!(solutions.stderr(), Some("note\n"));
	}
}
