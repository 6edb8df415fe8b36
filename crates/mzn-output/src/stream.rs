//! Lazily populated solution streams.
//!
//! A producing task pushes parsed solutions into an unbounded channel and,
//! once the solver output is exhausted, publishes a [`RunSummary`] in a cell
//! shared with the consumer. The consumer side comes in two flavours:
//! [`MaterializedSolutions`] keeps every solution so it can be indexed and
//! iterated repeatedly, [`StreamingSolutions`] hands each solution out once
//! and forgets it. [`Solutions`] wraps either for callers that pick the mode
//! at runtime.

use futures::stream::{BoxStream, Stream, StreamExt};
use mzn_types::{RunSummary, Solution, Statistics, Status, StreamError, StreamResult};
use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::{mpsc, OnceCell};

pub(crate) type RecordSender = mpsc::UnboundedSender<StreamResult<Solution>>;
pub(crate) type RecordReceiver = mpsc::UnboundedReceiver<StreamResult<Solution>>;

/// Run summary, set exactly once by the producing side before it closes the
/// record channel.
pub(crate) type SummaryCell = Arc<OnceCell<RunSummary>>;

/// Receiving half of the channel and everything observed through it.
#[derive(Debug)]
struct Channel {
	receiver: Option<RecordReceiver>,
	seen: usize,
	summary: SummaryCell,
}

impl Channel {
	fn new(receiver: RecordReceiver, summary: SummaryCell) -> Self {
		Self {
			receiver: Some(receiver),
			seen: 0,
			summary,
		}
	}

	fn poll_recv(&mut self, cx: &mut Context<'_>) -> Poll<Option<StreamResult<Solution>>> {
		let Some(receiver) = self.receiver.as_mut() else {
			return Poll::Ready(None);
		};
		match receiver.poll_recv(cx) {
			Poll::Ready(Some(result)) => {
				if result.is_ok() {
					self.seen += 1;
				}
				Poll::Ready(Some(result))
			}
			Poll::Ready(None) => {
				self.receiver = None;
				Poll::Ready(None)
			}
			Poll::Pending => Poll::Pending,
		}
	}

	async fn recv(&mut self) -> Option<StreamResult<Solution>> {
		futures::future::poll_fn(|cx| self.poll_recv(cx)).await
	}

	fn is_closed(&self) -> bool {
		self.receiver.is_none()
	}

	/// `Incomplete` until the producer has finished.
	fn status(&self) -> Status {
		self.summary.get().map(|s| s.status).unwrap_or_default()
	}

	fn statistics(&self) -> Option<&Statistics> {
		self.summary.get().and_then(|s| s.statistics.as_ref())
	}

	fn stderr(&self) -> Option<&str> {
		self.summary.get().and_then(|s| s.stderr.as_deref())
	}
}

fn pretty(solutions: &[Solution]) -> String {
	match solutions {
		[] => "[]".to_string(),
		[only] => format!("[{}]", only),
		_ => {
			let mut out = String::from("[\n");
			for (i, solution) in solutions.iter().enumerate() {
				out.push_str("    ");
				out.push_str(&solution.to_string());
				if i + 1 < solutions.len() {
					out.push(',');
				}
				out.push('\n');
			}
			out.push(']');
			out
		}
	}
}

/// A stream that keeps every solution it receives.
#[derive(Debug)]
pub struct MaterializedSolutions {
	channel: Channel,
	solutions: Vec<Solution>,
}

impl MaterializedSolutions {
	pub(crate) fn new(receiver: RecordReceiver, summary: SummaryCell) -> Self {
		Self {
			channel: Channel::new(receiver, summary),
			solutions: Vec::new(),
		}
	}

	/// Pulls everything the producer sends until it closes the channel.
	///
	/// A parse error stops the drain and is returned; solutions received
	/// before it stay retained. Once the channel is closed this is a no-op.
	pub async fn drain(&mut self) -> StreamResult<()> {
		while let Some(result) = self.channel.recv().await {
			self.solutions.push(result?);
		}
		Ok(())
	}

	/// Waits for one more solution, retains it and returns it.
	///
	/// Returns `Ok(None)` once the producer has finished.
	pub async fn next_solution(&mut self) -> StreamResult<Option<&Solution>> {
		match self.channel.recv().await {
			Some(result) => {
				self.solutions.push(result?);
				Ok(self.solutions.last())
			}
			None => Ok(None),
		}
	}

	/// Drains the stream, then iterates over all retained solutions.
	pub async fn iter(&mut self) -> StreamResult<std::slice::Iter<'_, Solution>> {
		self.drain().await?;
		Ok(self.solutions.iter())
	}

	/// Drains the stream, then returns the solution at `index`.
	pub async fn get(&mut self, index: usize) -> StreamResult<Option<&Solution>> {
		self.drain().await?;
		Ok(self.solutions.get(index))
	}

	/// Drains the stream, then returns all solutions.
	pub async fn solutions(&mut self) -> StreamResult<&[Solution]> {
		self.drain().await?;
		Ok(&self.solutions)
	}

	/// Solutions received so far, without waiting for more.
	pub fn retained(&self) -> &[Solution] {
		&self.solutions
	}

	/// Number of solutions received so far.
	pub fn len(&self) -> usize {
		self.channel.seen
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// True once the producer has closed the channel and everything was read.
	pub fn is_drained(&self) -> bool {
		self.channel.is_closed()
	}

	/// Final status once the producer has finished, `Incomplete` before.
	pub fn status(&self) -> Status {
		self.channel.status()
	}

	pub fn statistics(&self) -> Option<&Statistics> {
		self.channel.statistics()
	}

	pub fn stderr(&self) -> Option<&str> {
		self.channel.stderr()
	}

	/// Drains the stream and renders it like [`fmt::Display`].
	pub async fn render(&mut self) -> StreamResult<String> {
		self.drain().await?;
		Ok(self.to_string())
	}

	/// Yields the retained solutions followed by any still to arrive.
	pub fn into_stream(self) -> BoxStream<'static, StreamResult<Solution>> {
		let MaterializedSolutions {
			mut channel,
			solutions,
		} = self;
		async_stream::stream! {
			for solution in solutions {
				yield Ok(solution);
			}
			while let Some(result) = channel.recv().await {
				yield result;
			}
		}
		.boxed()
	}
}

/// Shows the retained solutions, or only the status when the run cannot
/// carry any.
///
/// Formatting never waits for the producer: it shows the solutions drained
/// so far, which is a partial list while the run is still going. Use
/// [`MaterializedSolutions::render`] to drain first.
impl fmt::Display for MaterializedSolutions {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.status().has_solutions() {
			f.write_str(&pretty(&self.solutions))
		} else {
			write!(f, "{}", self.status())
		}
	}
}

/// A one-shot stream that discards each solution after yielding it.
///
/// Consume it through [`futures::StreamExt`]. Run metadata is available as
/// soon as the producer has finished, even if solutions remain unread.
#[derive(Debug)]
pub struct StreamingSolutions {
	channel: Channel,
}

impl StreamingSolutions {
	pub(crate) fn new(receiver: RecordReceiver, summary: SummaryCell) -> Self {
		Self {
			channel: Channel::new(receiver, summary),
		}
	}

	/// Number of solutions yielded so far.
	pub fn len(&self) -> usize {
		self.channel.seen
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn is_finished(&self) -> bool {
		self.channel.is_closed()
	}

	/// Final status once the producer has finished, `Incomplete` before.
	pub fn status(&self) -> Status {
		self.channel.status()
	}

	pub fn statistics(&self) -> Option<&Statistics> {
		self.channel.statistics()
	}

	pub fn stderr(&self) -> Option<&str> {
		self.channel.stderr()
	}

	/// Discards the remaining solutions and returns the final status.
	pub async fn finish(&mut self) -> StreamResult<Status> {
		while let Some(result) = self.channel.recv().await {
			result?;
		}
		Ok(self.status())
	}
}

impl Stream for StreamingSolutions {
	type Item = StreamResult<Solution>;

	fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
		self.get_mut().channel.poll_recv(cx)
	}
}

impl fmt::Display for StreamingSolutions {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.status())
	}
}

/// Solution stream in either retention mode.
#[derive(Debug)]
pub enum Solutions {
	Materialized(MaterializedSolutions),
	Streaming(StreamingSolutions),
}

impl Solutions {
	pub(crate) fn new(receiver: RecordReceiver, summary: SummaryCell, keep: bool) -> Self {
		if keep {
			Solutions::Materialized(MaterializedSolutions::new(receiver, summary))
		} else {
			Solutions::Streaming(StreamingSolutions::new(receiver, summary))
		}
	}

	pub fn is_retained(&self) -> bool {
		matches!(self, Solutions::Materialized(_))
	}

	pub fn len(&self) -> usize {
		match self {
			Solutions::Materialized(s) => s.len(),
			Solutions::Streaming(s) => s.len(),
		}
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn status(&self) -> Status {
		match self {
			Solutions::Materialized(s) => s.status(),
			Solutions::Streaming(s) => s.status(),
		}
	}

	pub fn statistics(&self) -> Option<&Statistics> {
		match self {
			Solutions::Materialized(s) => s.statistics(),
			Solutions::Streaming(s) => s.statistics(),
		}
	}

	pub fn stderr(&self) -> Option<&str> {
		match self {
			Solutions::Materialized(s) => s.stderr(),
			Solutions::Streaming(s) => s.stderr(),
		}
	}

	/// Indexed access; fails with [`StreamError::NotRetained`] when the
	/// solutions are not kept.
	pub async fn get(&mut self, index: usize) -> StreamResult<Option<&Solution>> {
		match self {
			Solutions::Materialized(s) => s.get(index).await,
			Solutions::Streaming(_) => Err(StreamError::NotRetained),
		}
	}

	/// Waits for the next solution in either mode.
	pub async fn next_solution(&mut self) -> StreamResult<Option<Solution>> {
		match self {
			Solutions::Materialized(s) => Ok(s.next_solution().await?.cloned()),
			Solutions::Streaming(s) => s.next().await.transpose(),
		}
	}

	/// Renders the stream, draining it first when solutions are retained.
	pub async fn render(&mut self) -> StreamResult<String> {
		match self {
			Solutions::Materialized(s) => s.render().await,
			Solutions::Streaming(s) => Ok(s.to_string()),
		}
	}

	/// Consumes the wrapper into a uniform stream of solutions.
	pub fn into_stream(self) -> BoxStream<'static, StreamResult<Solution>> {
		match self {
			Solutions::Materialized(s) => s.into_stream(),
			Solutions::Streaming(s) => s.boxed(),
		}
	}
}

impl fmt::Display for Solutions {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Solutions::Materialized(s) => fmt::Display::fmt(s, f),
			Solutions::Streaming(s) => fmt::Display::fmt(s, f),
		}
	}
}
