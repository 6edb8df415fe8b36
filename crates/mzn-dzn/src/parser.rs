//! Recursive-descent parser producing [`Assignment`] maps.

use crate::lexer::{tokenize, Spanned, Token};
use crate::options::{ParseOptions, TypeHint};
use mzn_types::{Assignment, DznError, DznValue};
use tracing::trace;

/// Parses a solution body such as `x = 3;\ny = [1, 2];`.
///
/// The semicolon after the last assignment is optional. Type hints from
/// `options` are applied after parsing.
pub fn parse_dzn(body: &str, options: &ParseOptions) -> Result<Assignment, DznError> {
	let tokens = tokenize(body)?;
	let mut parser = Parser {
		tokens,
		pos: 0,
		rebase: options.rebase_arrays,
	};

	let mut assignment = Assignment::new();
	while !parser.at_end() {
		let name = parser.expect_ident()?;
		parser.expect(Token::Eq)?;
		let mut value = parser.value()?;
		if let Some(hint) = options.type_of(&name) {
			value = coerce(&name, value, hint)?;
		}
		trace!("Parsed {} = {}", name, value);
		assignment.insert(name, value);

		if !parser.at_end() {
			parser.expect(Token::Semi)?;
		}
	}

	Ok(assignment)
}

struct Parser {
	tokens: Vec<Spanned>,
	pos: usize,
	rebase: bool,
}

impl Parser {
	fn at_end(&self) -> bool {
		self.pos >= self.tokens.len()
	}

	fn peek(&self) -> Option<&Token> {
		self.tokens.get(self.pos).map(|s| &s.token)
	}

	fn next(&mut self, expected: &str) -> Result<Spanned, DznError> {
		let spanned = self
			.tokens
			.get(self.pos)
			.cloned()
			.ok_or_else(|| DznError::UnexpectedEnd {
				expected: expected.to_string(),
			})?;
		self.pos += 1;
		Ok(spanned)
	}

	fn eat(&mut self, token: &Token) -> bool {
		if self.peek() == Some(token) {
			self.pos += 1;
			true
		} else {
			false
		}
	}

	fn expect(&mut self, token: Token) -> Result<(), DznError> {
		let expected = token.describe();
		let spanned = self.next(&expected)?;
		if spanned.token == token {
			Ok(())
		} else {
			Err(DznError::Expected {
				expected,
				offset: spanned.offset,
			})
		}
	}

	fn expect_ident(&mut self) -> Result<String, DznError> {
		let spanned = self.next("identifier")?;
		match spanned.token {
			Token::Ident(name) => Ok(name),
			_ => Err(DznError::Expected {
				expected: "identifier".to_string(),
				offset: spanned.offset,
			}),
		}
	}

	fn value(&mut self) -> Result<DznValue, DznError> {
		let spanned = self.next("value")?;
		match spanned.token {
			Token::Int(lo) => {
				if self.eat(&Token::DotDot) {
					let hi = self.int()?;
					expand_range(lo, hi)
				} else {
					Ok(DznValue::Int(lo))
				}
			}
			Token::Float(f) => Ok(DznValue::Float(f)),
			Token::Str(s) => Ok(DznValue::Str(s)),
			Token::Ident(name) => {
				if name == "true" {
					Ok(DznValue::Bool(true))
				} else if name == "false" {
					Ok(DznValue::Bool(false))
				} else if self.peek() == Some(&Token::LParen) {
					self.array_nd(&name, spanned.offset)
				} else {
					Ok(DznValue::Enum(name))
				}
			}
			Token::LBrace => {
				let items = self.items(Token::RBrace)?;
				Ok(DznValue::Set(normalize_set(items)))
			}
			Token::LBracket => {
				let items = self.items(Token::RBracket)?;
				// A literal array is implicitly indexed from 1
				Ok(DznValue::Array(items))
			}
			other => Err(DznError::Expected {
				expected: format!("value, found {}", other.describe()),
				offset: spanned.offset,
			}),
		}
	}

	fn int(&mut self) -> Result<i64, DznError> {
		let spanned = self.next("integer")?;
		match spanned.token {
			Token::Int(i) => Ok(i),
			_ => Err(DznError::Expected {
				expected: "integer".to_string(),
				offset: spanned.offset,
			}),
		}
	}

	/// Comma separated values up to `close`; a trailing comma is allowed.
	fn items(&mut self, close: Token) -> Result<Vec<DznValue>, DznError> {
		let mut items = Vec::new();
		loop {
			if self.eat(&close) {
				return Ok(items);
			}
			items.push(self.value()?);
			if !self.eat(&Token::Comma) {
				self.expect(close)?;
				return Ok(items);
			}
		}
	}

	/// Parses `arrayNd(s1, ..., sN, [values])` after the function name.
	fn array_nd(&mut self, name: &str, offset: usize) -> Result<DznValue, DznError> {
		let dims = name
			.strip_prefix("array")
			.and_then(|rest| rest.strip_suffix('d'))
			.and_then(|n| n.parse::<usize>().ok())
			.filter(|n| *n > 0)
			.ok_or_else(|| DznError::Expected {
				expected: "arrayNd".to_string(),
				offset,
			})?;

		self.expect(Token::LParen)?;
		let mut raw_sets = Vec::with_capacity(dims);
		for _ in 0..dims {
			raw_sets.push(self.value()?);
			self.expect(Token::Comma)?;
		}
		let values = match self.value()? {
			DznValue::Array(values) => values,
			_ => {
				return Err(DznError::Expected {
					expected: "array literal".to_string(),
					offset,
				})
			}
		};
		self.expect(Token::RParen)?;

		let index_sets = raw_sets
			.into_iter()
			.map(|set| index_bounds(set, dims, values.len()))
			.collect::<Result<Vec<_>, _>>()?;

		let sizes = index_sets
			.iter()
			.map(|(lo, hi)| extent(*lo, *hi))
			.collect::<Result<Vec<_>, _>>()?;
		let expected = sizes
			.iter()
			.try_fold(1usize, |acc, size| acc.checked_mul(*size))
			.ok_or_else(|| DznError::InvalidIndexSet("index sets are too large".to_string()))?;
		if expected != values.len() {
			return Err(DznError::DimensionMismatch {
				expected,
				found: values.len(),
			});
		}

		if self.rebase || index_sets.iter().all(|(lo, _)| *lo == 1) {
			Ok(reshape(&sizes, values))
		} else {
			Ok(DznValue::Indexed { index_sets, values })
		}
	}
}

/// Largest integer range expanded into a set literal.
const MAX_RANGE_LEN: usize = 1 << 20;

/// Number of integers in `lo..hi`.
fn extent(lo: i64, hi: i64) -> Result<usize, DznError> {
	if hi < lo {
		return Ok(0);
	}
	hi.checked_sub(lo)
		.and_then(|span| span.checked_add(1))
		.and_then(|len| usize::try_from(len).ok())
		.ok_or_else(|| DznError::InvalidIndexSet(format!("{}..{}", lo, hi)))
}

fn expand_range(lo: i64, hi: i64) -> Result<DznValue, DznError> {
	match extent(lo, hi) {
		Ok(len) if len <= MAX_RANGE_LEN => {
			Ok(DznValue::Set((lo..=hi).map(DznValue::Int).collect()))
		}
		_ => Err(DznError::RangeTooLarge { lo, hi }),
	}
}

/// Resolves one index set argument to inclusive bounds.
fn index_bounds(set: DznValue, dims: usize, len: usize) -> Result<(i64, i64), DznError> {
	match set {
		DznValue::Set(items) if items.is_empty() => Ok((1, 0)),
		DznValue::Set(items) => {
			let ints = items
				.iter()
				.map(DznValue::as_int)
				.collect::<Option<Vec<_>>>()
				.ok_or_else(|| DznError::InvalidIndexSet("non-integer index set".to_string()))?;
			let (lo, hi) = (ints[0], ints[ints.len() - 1]);
			if extent(lo, hi)? != ints.len() {
				return Err(DznError::InvalidIndexSet(format!(
					"index set {{{}..{}}} is not contiguous",
					lo, hi
				)));
			}
			Ok((lo, hi))
		}
		// An enum-typed index set of a one dimensional array covers every value
		DznValue::Enum(_) if dims == 1 => Ok((1, len as i64)),
		other => Err(DznError::InvalidIndexSet(other.to_string())),
	}
}

/// Nests row-major `values` into zero-based arrays of the given sizes.
fn reshape(sizes: &[usize], values: Vec<DznValue>) -> DznValue {
	match sizes {
		[] | [_] => DznValue::Array(values),
		[_, rest @ ..] => {
			let stride: usize = rest.iter().product();
			if stride == 0 {
				return DznValue::Array(
					(0..sizes[0]).map(|_| reshape(rest, Vec::new())).collect(),
				);
			}
			let mut rows = Vec::with_capacity(sizes[0]);
			let mut values = values.into_iter();
			for _ in 0..sizes[0] {
				let chunk: Vec<DznValue> = values.by_ref().take(stride).collect();
				rows.push(reshape(rest, chunk));
			}
			DznValue::Array(rows)
		}
	}
}

/// Integer sets are sorted and deduplicated, other sets keep literal order.
fn normalize_set(items: Vec<DznValue>) -> Vec<DznValue> {
	let mut flat = Vec::with_capacity(items.len());
	for item in items {
		// `{1..3}` parses as a set nested in a set
		match item {
			DznValue::Set(inner) if inner.iter().all(|v| v.as_int().is_some()) => {
				flat.extend(inner)
			}
			other => flat.push(other),
		}
	}

	match flat.iter().map(DznValue::as_int).collect::<Option<Vec<i64>>>() {
		Some(mut ints) => {
			ints.sort_unstable();
			ints.dedup();
			ints.into_iter().map(DznValue::Int).collect()
		}
		None => flat,
	}
}

fn coerce(name: &str, value: DznValue, hint: TypeHint) -> Result<DznValue, DznError> {
	let mismatch = || DznError::TypeMismatch {
		name: name.to_string(),
		expected: format!("{:?}", hint).to_lowercase(),
	};

	match value {
		DznValue::Array(items) => Ok(DznValue::Array(
			items
				.into_iter()
				.map(|v| coerce(name, v, hint))
				.collect::<Result<_, _>>()?,
		)),
		DznValue::Set(items) => Ok(DznValue::Set(
			items
				.into_iter()
				.map(|v| coerce(name, v, hint))
				.collect::<Result<_, _>>()?,
		)),
		DznValue::Indexed { index_sets, values } => Ok(DznValue::Indexed {
			index_sets,
			values: values
				.into_iter()
				.map(|v| coerce(name, v, hint))
				.collect::<Result<_, _>>()?,
		}),
		scalar => match (hint, scalar) {
			(TypeHint::Int, v @ DznValue::Int(_)) => Ok(v),
			(TypeHint::Int, DznValue::Float(f)) if f.fract() == 0.0 => Ok(DznValue::Int(f as i64)),
			(TypeHint::Float, DznValue::Int(i)) => Ok(DznValue::Float(i as f64)),
			(TypeHint::Float, v @ DznValue::Float(_)) => Ok(v),
			(TypeHint::Bool, v @ DznValue::Bool(_)) => Ok(v),
			(TypeHint::String, v @ DznValue::Str(_)) => Ok(v),
			(TypeHint::String, DznValue::Enum(s)) => Ok(DznValue::Str(s)),
			(TypeHint::Enum, v @ DznValue::Enum(_)) => Ok(v),
			(TypeHint::Enum, DznValue::Str(s)) => Ok(DznValue::Enum(s)),
			_ => Err(mismatch()),
		},
	}
}
