//! Outcome of a solver run.
//!
//! Solvers following the MiniZinc output conventions end their output with at
//! most one terminal marker line. The marker tells whether the enumeration was
//! exhausted, whether no solution exists, or whether the solver gave up.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Marker lines recognized in solver output.
pub mod markers {
	/// Printed after every solution.
	pub const SOLUTION_SEPARATOR: &str = "----------";
	/// Printed once the search space has been fully explored.
	pub const SEARCH_COMPLETE: &str = "==========";
	pub const UNKNOWN: &str = "=====UNKNOWN=====";
	pub const UNSATISFIABLE: &str = "=====UNSATISFIABLE=====";
	pub const UNBOUNDED: &str = "=====UNBOUNDED=====";
	pub const UNSAT_OR_UNBOUNDED: &str = "=====UNSATorUNBOUNDED=====";
	pub const ERROR: &str = "=====ERROR=====";
}

/// How a solving run ended.
///
/// Variants are declared in their conventional order. Callers that need to
/// know whether a run can carry solutions should use [`Status::has_solutions`]
/// rather than comparing ordinals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Status {
	/// All solutions were enumerated, or the optimum was proven.
	#[serde(rename = "COMPLETE")]
	Complete,
	/// Solutions may have been found but the search did not finish.
	#[serde(rename = "INCOMPLETE")]
	Incomplete,
	#[serde(rename = "UNKNOWN")]
	Unknown,
	#[serde(rename = "UNSATISFIABLE")]
	Unsatisfiable,
	#[serde(rename = "UNBOUNDED")]
	Unbounded,
	#[serde(rename = "UNSATorUNBOUNDED")]
	UnsatOrUnbounded,
	#[serde(rename = "ERROR")]
	Error,
}

impl Default for Status {
	fn default() -> Self {
		Status::Incomplete
	}
}

impl Status {
	/// Returns true when the run may have produced solutions worth inspecting.
	pub fn has_solutions(self) -> bool {
		matches!(self, Status::Complete | Status::Incomplete)
	}

	/// Maps a terminal marker line to the status it announces.
	///
	/// The solution separator is not a terminal marker and yields `None`.
	pub fn from_marker(line: &str) -> Option<Self> {
		match line {
			markers::SEARCH_COMPLETE => Some(Status::Complete),
			markers::UNKNOWN => Some(Status::Unknown),
			markers::UNSATISFIABLE => Some(Status::Unsatisfiable),
			markers::UNBOUNDED => Some(Status::Unbounded),
			markers::UNSAT_OR_UNBOUNDED => Some(Status::UnsatOrUnbounded),
			markers::ERROR => Some(Status::Error),
			_ => None,
		}
	}

	/// Marker line announcing this status. `Incomplete` has none.
	pub fn marker(self) -> Option<&'static str> {
		match self {
			Status::Complete => Some(markers::SEARCH_COMPLETE),
			Status::Incomplete => None,
			Status::Unknown => Some(markers::UNKNOWN),
			Status::Unsatisfiable => Some(markers::UNSATISFIABLE),
			Status::Unbounded => Some(markers::UNBOUNDED),
			Status::UnsatOrUnbounded => Some(markers::UNSAT_OR_UNBOUNDED),
			Status::Error => Some(markers::ERROR),
		}
	}

	/// Canonical upper-case name, as used in solver output markers.
	pub fn name(self) -> &'static str {
		match self {
			Status::Complete => "COMPLETE",
			Status::Incomplete => "INCOMPLETE",
			Status::Unknown => "UNKNOWN",
			Status::Unsatisfiable => "UNSATISFIABLE",
			Status::Unbounded => "UNBOUNDED",
			Status::UnsatOrUnbounded => "UNSATorUNBOUNDED",
			Status::Error => "ERROR",
		}
	}
}

impl fmt::Display for Status {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

impl FromStr for Status {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"COMPLETE" => Ok(Status::Complete),
			"INCOMPLETE" => Ok(Status::Incomplete),
			"UNKNOWN" => Ok(Status::Unknown),
			"UNSATISFIABLE" => Ok(Status::Unsatisfiable),
			"UNBOUNDED" => Ok(Status::Unbounded),
			"UNSATorUNBOUNDED" => Ok(Status::UnsatOrUnbounded),
			"ERROR" => Ok(Status::Error),
			other => Err(format!("Unknown status: {}", other)),
		}
	}
}
