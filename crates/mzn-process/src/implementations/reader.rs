//! Line source over any async reader.

use crate::{LineSource, SourceError};
use async_trait::async_trait;
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};

/// Reads lines from a buffered async reader such as a file or stdin.
///
/// Readers have no error stream, so `finish` always returns `None`.
pub struct ReaderSource<R> {
	lines: Lines<R>,
}

impl<R: AsyncBufRead + Unpin + Send> ReaderSource<R> {
	pub fn new(reader: R) -> Self {
		Self {
			lines: reader.lines(),
		}
	}
}

impl ReaderSource<BufReader<File>> {
	/// Opens a file containing captured solver output.
	pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self, SourceError> {
		let file = File::open(path).await?;
		Ok(Self::new(BufReader::new(file)))
	}
}

impl ReaderSource<BufReader<Stdin>> {
	pub fn stdin() -> Self {
		Self::new(BufReader::new(tokio::io::stdin()))
	}
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> LineSource for ReaderSource<R> {
	async fn next_line(&mut self) -> Result<Option<String>, SourceError> {
		Ok(self.lines.next_line().await?)
	}

	async fn finish(&mut self) -> Option<String> {
		None
	}
}
