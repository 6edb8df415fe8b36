//! Values of the MiniZinc data language.

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use std::fmt;

/// A single value assigned to an output variable.
#[derive(Debug, Clone, PartialEq)]
pub enum DznValue {
	Bool(bool),
	Int(i64),
	Float(f64),
	Str(String),
	/// A bare identifier, typically a member of an enumerated type.
	Enum(String),
	/// Set literal. Integer ranges are expanded and kept sorted.
	Set(Vec<DznValue>),
	/// Array re-indexed from zero. Multi-dimensional arrays are nested.
	Array(Vec<DznValue>),
	/// Array keeping its declared index sets; values are in row-major order.
	Indexed {
		index_sets: Vec<(i64, i64)>,
		values: Vec<DznValue>,
	},
}

impl DznValue {
	pub fn as_int(&self) -> Option<i64> {
		match self {
			DznValue::Int(i) => Some(*i),
			_ => None,
		}
	}

	/// Integers widen to floats.
	pub fn as_float(&self) -> Option<f64> {
		match self {
			DznValue::Float(f) => Some(*f),
			DznValue::Int(i) => Some(*i as f64),
			_ => None,
		}
	}

	pub fn as_bool(&self) -> Option<bool> {
		match self {
			DznValue::Bool(b) => Some(*b),
			_ => None,
		}
	}

	pub fn as_str(&self) -> Option<&str> {
		match self {
			DznValue::Str(s) | DznValue::Enum(s) => Some(s),
			_ => None,
		}
	}

	/// Elements of an array or set, in order.
	pub fn as_slice(&self) -> Option<&[DznValue]> {
		match self {
			DznValue::Array(items) | DznValue::Set(items) => Some(items),
			DznValue::Indexed { values, .. } => Some(values),
			_ => None,
		}
	}
}

impl Serialize for DznValue {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		match self {
			DznValue::Bool(b) => serializer.serialize_bool(*b),
			DznValue::Int(i) => serializer.serialize_i64(*i),
			DznValue::Float(f) => serializer.serialize_f64(*f),
			DznValue::Str(s) | DznValue::Enum(s) => serializer.serialize_str(s),
			DznValue::Array(items) => {
				let mut seq = serializer.serialize_seq(Some(items.len()))?;
				for item in items {
					seq.serialize_element(item)?;
				}
				seq.end()
			}
			DznValue::Set(items) => {
				let mut map = serializer.serialize_map(Some(1))?;
				map.serialize_entry("set", items)?;
				map.end()
			}
			DznValue::Indexed { index_sets, values } => {
				let mut map = serializer.serialize_map(Some(2))?;
				map.serialize_entry("index_sets", index_sets)?;
				map.serialize_entry("values", values)?;
				map.end()
			}
		}
	}
}

fn write_joined(f: &mut fmt::Formatter<'_>, items: &[DznValue]) -> fmt::Result {
	for (i, item) in items.iter().enumerate() {
		if i > 0 {
			f.write_str(", ")?;
		}
		write!(f, "{}", item)?;
	}
	Ok(())
}

/// Renders the value back in data-language syntax.
impl fmt::Display for DznValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			DznValue::Bool(b) => write!(f, "{}", b),
			DznValue::Int(i) => write!(f, "{}", i),
			DznValue::Float(x) => write!(f, "{:?}", x),
			DznValue::Str(s) => write!(f, "{:?}", s),
			DznValue::Enum(s) => f.write_str(s),
			DznValue::Set(items) => {
				f.write_str("{")?;
				write_joined(f, items)?;
				f.write_str("}")
			}
			DznValue::Array(items) => {
				f.write_str("[")?;
				write_joined(f, items)?;
				f.write_str("]")
			}
			DznValue::Indexed { index_sets, values } => {
				write!(f, "array{}d(", index_sets.len())?;
				for (lo, hi) in index_sets {
					write!(f, "{}..{}, ", lo, hi)?;
				}
				f.write_str("[")?;
				write_joined(f, values)?;
				f.write_str("])")
			}
		}
	}
}
