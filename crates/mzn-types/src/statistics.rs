//! Solver statistics gathered while reading output.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Key/value statistics reported by a solver backend.
///
/// Values that look numeric are stored as JSON numbers, everything else as
/// strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Statistics {
	entries: BTreeMap<String, Value>,
}

impl Statistics {
	pub fn new() -> Self {
		Self::default()
	}

	/// Records a raw textual value, converting it to a number when possible.
	/// Later values for the same key replace earlier ones.
	pub fn record(&mut self, key: impl Into<String>, raw: &str) {
		let raw = raw.trim();
		let value = if let Ok(i) = raw.parse::<i64>() {
			Value::from(i)
		} else if let Some(n) = raw.parse::<f64>().ok().and_then(serde_json::Number::from_f64) {
			Value::Number(n)
		} else {
			Value::String(raw.to_string())
		};
		self.entries.insert(key.into(), value);
	}

	pub fn insert(&mut self, key: impl Into<String>, value: Value) {
		self.entries.insert(key.into(), value);
	}

	pub fn get(&self, key: &str) -> Option<&Value> {
		self.entries.get(key)
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
		self.entries.iter()
	}
}
