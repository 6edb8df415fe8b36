//! Tokenizer for the data language.

use mzn_types::DznError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
	Ident(String),
	Int(i64),
	Float(f64),
	Str(String),
	Eq,
	Semi,
	Comma,
	DotDot,
	LBracket,
	RBracket,
	LBrace,
	RBrace,
	LParen,
	RParen,
}

impl Token {
	pub(crate) fn describe(&self) -> String {
		match self {
			Token::Ident(name) => format!("identifier '{}'", name),
			Token::Int(i) => format!("integer {}", i),
			Token::Float(f) => format!("float {}", f),
			Token::Str(_) => "string".to_string(),
			Token::Eq => "'='".to_string(),
			Token::Semi => "';'".to_string(),
			Token::Comma => "','".to_string(),
			Token::DotDot => "'..'".to_string(),
			Token::LBracket => "'['".to_string(),
			Token::RBracket => "']'".to_string(),
			Token::LBrace => "'{'".to_string(),
			Token::RBrace => "'}'".to_string(),
			Token::LParen => "'('".to_string(),
			Token::RParen => "')'".to_string(),
		}
	}
}

/// A token with the byte offset it starts at.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Spanned {
	pub token: Token,
	pub offset: usize,
}

pub(crate) fn tokenize(input: &str) -> Result<Vec<Spanned>, DznError> {
	let bytes = input.as_bytes();
	let mut tokens = Vec::new();
	let mut pos = 0;

	while pos < bytes.len() {
		let c = bytes[pos];
		let start = pos;
		let single = match c {
			b' ' | b'\t' | b'\r' | b'\n' => {
				pos += 1;
				continue;
			}
			// Comment until end of line
			b'%' => {
				while pos < bytes.len() && bytes[pos] != b'\n' {
					pos += 1;
				}
				continue;
			}
			b'=' => Some(Token::Eq),
			b';' => Some(Token::Semi),
			b',' => Some(Token::Comma),
			b'[' => Some(Token::LBracket),
			b']' => Some(Token::RBracket),
			b'{' => Some(Token::LBrace),
			b'}' => Some(Token::RBrace),
			b'(' => Some(Token::LParen),
			b')' => Some(Token::RParen),
			_ => None,
		};
		if let Some(token) = single {
			tokens.push(Spanned {
				token,
				offset: start,
			});
			pos += 1;
			continue;
		}

		let token = match c {
			b'.' if bytes.get(pos + 1) == Some(&b'.') => {
				pos += 2;
				Token::DotDot
			}
			b'"' => {
				let (text, next) = lex_string(input, pos)?;
				pos = next;
				Token::Str(text)
			}
			b'-' if bytes.get(pos + 1).is_some_and(u8::is_ascii_digit) => {
				let (token, next) = lex_number(input, pos)?;
				pos = next;
				token
			}
			b'0'..=b'9' => {
				let (token, next) = lex_number(input, pos)?;
				pos = next;
				token
			}
			c if c.is_ascii_alphabetic() || c == b'_' => {
				while pos < bytes.len() && (bytes[pos].is_ascii_alphanumeric() || bytes[pos] == b'_')
				{
					pos += 1;
				}
				Token::Ident(input[start..pos].to_string())
			}
			_ => {
				let found = input[start..].chars().next().unwrap_or('\0');
				return Err(DznError::UnexpectedChar {
					found,
					offset: start,
				});
			}
		};
		tokens.push(Spanned {
			token,
			offset: start,
		});
	}

	Ok(tokens)
}

fn lex_number(input: &str, start: usize) -> Result<(Token, usize), DznError> {
	let bytes = input.as_bytes();
	let mut pos = start;
	if bytes[pos] == b'-' {
		pos += 1;
	}
	while pos < bytes.len() && bytes[pos].is_ascii_digit() {
		pos += 1;
	}

	let mut is_float = false;
	// A dot followed by a digit is a fraction, a second dot starts a range
	if bytes.get(pos) == Some(&b'.') && bytes.get(pos + 1).is_some_and(u8::is_ascii_digit) {
		is_float = true;
		pos += 1;
		while pos < bytes.len() && bytes[pos].is_ascii_digit() {
			pos += 1;
		}
	}
	if matches!(bytes.get(pos), Some(b'e') | Some(b'E')) {
		let mut exp = pos + 1;
		if matches!(bytes.get(exp), Some(b'+') | Some(b'-')) {
			exp += 1;
		}
		if bytes.get(exp).is_some_and(u8::is_ascii_digit) {
			is_float = true;
			pos = exp;
			while pos < bytes.len() && bytes[pos].is_ascii_digit() {
				pos += 1;
			}
		}
	}

	let text = &input[start..pos];
	let token = if is_float {
		Token::Float(
			text.parse()
				.map_err(|_| DznError::InvalidNumber(text.to_string()))?,
		)
	} else {
		Token::Int(
			text.parse()
				.map_err(|_| DznError::InvalidNumber(text.to_string()))?,
		)
	};
	Ok((token, pos))
}

fn lex_string(input: &str, start: usize) -> Result<(String, usize), DznError> {
	let mut text = String::new();
	let mut chars = input[start + 1..].char_indices();

	while let Some((i, c)) = chars.next() {
		match c {
			'"' => return Ok((text, start + 1 + i + 1)),
			'\\' => match chars.next() {
				Some((_, 'n')) => text.push('\n'),
				Some((_, 't')) => text.push('\t'),
				Some((_, other)) => text.push(other),
				None => break,
			},
			c => text.push(c),
		}
	}

	Err(DznError::UnterminatedString(start))
}
