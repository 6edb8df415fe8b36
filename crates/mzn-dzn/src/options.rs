//! Options controlling how solution bodies are interpreted.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Declared type of an output variable, used to settle ambiguous literals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeHint {
	Int,
	Float,
	Bool,
	String,
	Enum,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
	/// Re-index every array from zero, nesting multi-dimensional arrays.
	pub rebase_arrays: bool,
	/// Per-variable type hints. Applied element-wise to arrays and sets.
	pub types: Option<HashMap<String, TypeHint>>,
}

impl Default for ParseOptions {
	fn default() -> Self {
		Self {
			rebase_arrays: true,
			types: None,
		}
	}
}

impl ParseOptions {
	pub fn with_rebase_arrays(mut self, rebase: bool) -> Self {
		self.rebase_arrays = rebase;
		self
	}

	pub fn with_type(mut self, name: impl Into<String>, hint: TypeHint) -> Self {
		self.types
			.get_or_insert_with(HashMap::new)
			.insert(name.into(), hint);
		self
	}

	pub fn type_of(&self, name: &str) -> Option<TypeHint> {
		self.types.as_ref().and_then(|types| types.get(name).copied())
	}
}
