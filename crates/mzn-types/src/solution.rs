//! Solution records and the end-of-run summary.

use crate::{DznValue, Statistics, Status};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Output variables of one solution, keyed by name.
pub type Assignment = BTreeMap<String, DznValue>;

/// One solution emitted by the solver.
#[derive(Debug, Clone, PartialEq)]
pub enum Solution {
	/// Body parsed into variable assignments.
	Structured(Assignment),
	/// Body kept verbatim, lines joined with `\n`.
	Raw(String),
}

impl Solution {
	/// Looks up a variable in a structured solution.
	pub fn get(&self, name: &str) -> Option<&DznValue> {
		match self {
			Solution::Structured(assignment) => assignment.get(name),
			Solution::Raw(_) => None,
		}
	}

	pub fn as_raw(&self) -> Option<&str> {
		match self {
			Solution::Raw(text) => Some(text),
			Solution::Structured(_) => None,
		}
	}

	pub fn as_assignment(&self) -> Option<&Assignment> {
		match self {
			Solution::Structured(assignment) => Some(assignment),
			Solution::Raw(_) => None,
		}
	}
}

impl Serialize for Solution {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		match self {
			Solution::Structured(assignment) => assignment.serialize(serializer),
			Solution::Raw(text) => serializer.serialize_str(text),
		}
	}
}

impl fmt::Display for Solution {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Solution::Raw(text) => write!(f, "{:?}", text),
			Solution::Structured(assignment) => {
				f.write_str("{")?;
				for (i, (name, value)) in assignment.iter().enumerate() {
					if i > 0 {
						f.write_str(", ")?;
					}
					write!(f, "{}: {}", name, value)?;
				}
				f.write_str("}")
			}
		}
	}
}

/// What a producer knows once the solver output is exhausted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunSummary {
	/// Status announced by the last terminal marker, if any.
	pub status: Status,
	/// Statistics collected by the solver-line adapter.
	pub statistics: Option<Statistics>,
	/// Captured standard error of the solver, if it wrote any.
	pub stderr: Option<String>,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_structured_display() {
		let mut assignment = Assignment::new();
		assignment.insert("y".into(), DznValue::Array(vec![DznValue::Int(1)]));
		assignment.insert("x".into(), DznValue::Int(2));
		let solution = Solution::Structured(assignment);

		assert_eq!(solution.to_string(), "{x: 2, y: [1]}");
		assert_eq!(solution.get("x"), Some(&DznValue::Int(2)));
		assert!(solution.as_raw().is_none());
	}

	#[test]
	fn test_raw_serializes_as_string() {
		let solution = Solution::Raw("x = 1;\ny = 2;".into());
		assert_eq!(serde_json::to_string(&solution).unwrap(), r#""x = 1;\ny = 2;""#);
		assert_eq!(solution.to_string(), r#""x = 1;\ny = 2;""#);
		assert!(solution.get("x").is_none());
	}
}
