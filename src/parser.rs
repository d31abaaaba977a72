use crate::types::*;

use thiserror::Error;

#[derive(Debug, PartialEq, Eq, Clone, Copy, Error)]
pub enum ParseError {
	#[error("pipe with no left argument")]
	PipeWithNoLeftArg,
	#[error("pipe with a left argument that is not a command")]
	PipeWithLeftArgNotACommand,
	#[error("bad output redirect argument")]
	OutputRedirectBadArg,
	#[error("arguments after the output redirect")]
	TooLateArguments,
	#[error("command line does not end with a command")]
	EndsNotWithACommand,
	#[error("unsupported operator '{0}'")]
	UnsupportedOperator(&'static str),
}

type ParseResult<T> = Result<T, ParseError>;

#[derive(Debug, PartialEq, Eq)]
enum Token {
	Word(Vec<u8>),
	Pipe,
	Redirect(RedirectType),
	Unsupported(&'static str),
}

/// The buffered input ends inside a line that may still be continued.
struct Incomplete;

struct Lexer<'a> {
	input: &'a [u8],
	i: usize,
	at_end: bool,
}

impl<'a> Lexer<'a> {
	fn is_blank(c: u8) -> bool {
		c == b' ' || c == b'\t'
	}

	fn is_delimiter(c: u8) -> bool {
		match c {
			b' ' | b'\t' | b'\n' | b'|' | b'>' | b'&' => true,
			_ => false,
		}
	}

	fn peek(&self, ahead: usize) -> Option<u8> {
		self.input.get(self.i + ahead).cloned()
	}

	fn skip_blanks(&mut self) {
		while self.peek(0).map_or(false, Lexer::is_blank) {
			self.i += 1;
		}
	}

	fn skip_comment(&mut self) {
		while self.peek(0).map_or(false, |c| c != b'\n') {
			self.i += 1;
		}
	}

	/// Consumes a quoted section whose opening quote is at `self.i`.
	fn read_quoted(&mut self, word: &mut Vec<u8>) -> Result<(), Incomplete> {
		let quote = self.input[self.i];
		self.i += 1;
		loop {
			match self.peek(0) {
				None => return if self.at_end { Ok(()) } else { Err(Incomplete) },
				Some(c) if c == quote => { self.i += 1; return Ok(()); },
				Some(b'\\') if quote == b'"' => match self.peek(1) {
					Some(b'\n') => self.i += 2,
					Some(c @ b'"') | Some(c @ b'\\') => { word.push(c); self.i += 2; },
					Some(_) => { word.push(b'\\'); self.i += 1; },
					None => return if self.at_end { word.push(b'\\'); self.i += 1; Ok(()) } else { Err(Incomplete) },
				},
				Some(c) => { word.push(c); self.i += 1; },
			}
		}
	}

	fn read_word(&mut self) -> Result<Option<Vec<u8>>, Incomplete> {
		let mut word = vec![];
		let mut started = false;
		while let Some(c) = self.peek(0) {
			match c {
				_ if Lexer::is_delimiter(c) => break,
				b'\\' => match self.peek(1) {
					Some(b'\n') => self.i += 2,
					Some(e) => { word.push(e); started = true; self.i += 2; },
					None if self.at_end => self.i += 1,
					None => return Err(Incomplete),
				},
				b'\'' | b'"' => { self.read_quoted(&mut word)?; started = true; },
				_ => { word.push(c); started = true; self.i += 1; },
			}
		}
		if !started && self.peek(0).is_none() && !self.at_end {
			return Err(Incomplete);
		}
		Ok(if started { Some(word) } else { None })
	}

	/// Tokens of the next complete line, `None` while more input is needed.
	fn next_line(&mut self) -> Option<Vec<Token>> {
		let mut tokens = vec![];
		loop {
			self.skip_blanks();
			let token = match self.peek(0) {
				None => return if self.at_end { Some(tokens) } else { None },
				Some(b'\n') => { self.i += 1; return Some(tokens); },
				Some(b'#') => { self.skip_comment(); continue; },
				Some(b'|') => if self.peek(1) == Some(b'|') {
					self.i += 2;
					Token::Unsupported("||")
				} else {
					self.i += 1;
					Token::Pipe
				},
				Some(b'&') => if self.peek(1) == Some(b'&') {
					self.i += 2;
					Token::Unsupported("&&")
				} else {
					self.i += 1;
					Token::Unsupported("&")
				},
				Some(b'>') => if self.peek(1) == Some(b'>') {
					self.i += 2;
					Token::Redirect(RedirectType::Append)
				} else {
					self.i += 1;
					Token::Redirect(RedirectType::Truncate)
				},
				Some(_) => match self.read_word() {
					Ok(Some(word)) => Token::Word(word),
					Ok(None) => continue,
					Err(Incomplete) => return None,
				},
			};
			tokens.push(token);
		}
	}
}

fn build_command_line(tokens: Vec<Token>) -> ParseResult<Option<CommandLine>> {
	let mut nodes: Vec<Node> = vec![];
	let mut current: Option<Command> = None;
	let mut pending: Option<RedirectType> = None;
	let mut redirect: Option<Redirect> = None;

	for token in tokens {
		if redirect.is_some() {
			return Err(match token {
				Token::Redirect(_) => ParseError::OutputRedirectBadArg,
				_ => ParseError::TooLateArguments,
			});
		}
		match token {
			Token::Word(word) => if let Some(typ) = pending.take() {
				redirect = Some(Redirect { target: word, typ: typ });
			} else if let Some(ref mut command) = current {
				command.arguments.push(word);
			} else {
				current = Some(Command { name: word, arguments: vec![] });
			},
			Token::Pipe => {
				if pending.is_some() {
					return Err(ParseError::OutputRedirectBadArg);
				}
				match current.take() {
					Some(command) => {
						nodes.push(Node::Command(command));
						nodes.push(Node::PipeOperator);
					},
					None if nodes.is_empty() => return Err(ParseError::PipeWithNoLeftArg),
					None => return Err(ParseError::PipeWithLeftArgNotACommand),
				}
			},
			Token::Redirect(typ) => {
				if pending.is_some() {
					return Err(ParseError::OutputRedirectBadArg);
				}
				pending = Some(typ);
			},
			Token::Unsupported(op) => return Err(ParseError::UnsupportedOperator(op)),
		}
	}

	if pending.is_some() {
		return Err(ParseError::OutputRedirectBadArg);
	}
	match current {
		Some(command) => nodes.push(Node::Command(command)),
		None if nodes.is_empty() && redirect.is_none() => return Ok(None),
		None => return Err(ParseError::EndsNotWithACommand),
	}
	Ok(Some(CommandLine { nodes: nodes, redirect: redirect }))
}

/// Incremental parser: bytes go in through `feed`, command lines come out of `pop`.
#[derive(Debug, Default)]
pub struct Parser {
	buf: Vec<u8>,
	finished: bool,
}

impl Parser {
	pub fn new() -> Parser {
		Parser::default()
	}

	pub fn feed(&mut self, bytes: &[u8]) {
		self.buf.extend_from_slice(bytes);
	}

	/// No more input will come; a trailing line without newline becomes poppable.
	pub fn finish(&mut self) {
		self.finished = true;
	}

	/// Next complete command line. A line with a parse error is dropped and
	/// its error returned; the following lines stay available.
	pub fn pop(&mut self) -> ParseResult<Option<CommandLine>> {
		loop {
			if self.buf.is_empty() {
				return Ok(None);
			}
			let (tokens, consumed) = {
				let mut lexer = Lexer { input: &self.buf, i: 0, at_end: self.finished };
				match lexer.next_line() {
					Some(tokens) => (tokens, lexer.i),
					None => return Ok(None),
				}
			};
			self.buf.drain(.. consumed);
			if let Some(line) = build_command_line(tokens)? {
				return Ok(Some(line));
			}
		}
	}
}

/// Parses the first command line of `input`, treating it as complete.
pub fn parse_line(input: &[u8]) -> ParseResult<Option<CommandLine>> {
	let mut parser = Parser::new();
	parser.feed(input);
	parser.finish();
	parser.pop()
}

#[cfg(test)]
mod tests {
	use super::*;

	fn parse(s: &str) -> CommandLine {
		parse_line(s.as_bytes()).unwrap().unwrap()
	}

	fn names(line: &CommandLine) -> Vec<String> {
		line.commands().map(|c| String::from_utf8(c.name.clone()).unwrap()).collect()
	}

	#[test]
	fn simple_command() {
		let line = parse("echo hello  world\n");
		assert_eq!(line.nodes, vec![Node::Command(Command::new("echo", vec!["hello", "world"]))]);
		assert_eq!(line.redirect, None);
	}

	#[test]
	fn pipeline_nodes_alternate() {
		let line = parse("a | b|c");
		assert_eq!(line.nodes.len(), 5);
		assert_eq!(line.nodes[1], Node::PipeOperator);
		assert_eq!(line.nodes[3], Node::PipeOperator);
		assert_eq!(names(&line), vec!["a", "b", "c"]);
		assert!(line.has_pipes());
	}

	#[test]
	fn redirections() {
		let line = parse("echo hi > out.txt");
		assert_eq!(line.redirect, Some(Redirect { target: b"out.txt".to_vec(), typ: RedirectType::Truncate }));
		let line = parse("echo hi >>out.txt");
		assert_eq!(line.redirect, Some(Redirect { target: b"out.txt".to_vec(), typ: RedirectType::Append }));
		let line = parse("a | b > f");
		assert_eq!(names(&line), vec!["a", "b"]);
		assert!(line.redirect.is_some());
	}

	#[test]
	fn quotes_and_escapes() {
		let line = parse(r#"printf 'a | b' "say \"hi\"" x\ y '' "c\d""#);
		let c = line.sole_command().unwrap();
		let args: Vec<&[u8]> = c.arguments.iter().map(|a| a.as_slice()).collect();
		assert_eq!(args, vec![&b"a | b"[..], b"say \"hi\"", b"x y", b"", b"c\\d"]);
	}

	#[test]
	fn comments_and_blank_lines_are_skipped() {
		let mut parser = Parser::new();
		parser.feed(b"\n   \n# just a comment\necho a # trailing\n");
		let line = parser.pop().unwrap().unwrap();
		assert_eq!(line.sole_command().unwrap(), &Command::new("echo", vec!["a"]));
		assert_eq!(parser.pop(), Ok(None));
	}

	#[test]
	fn waits_for_complete_lines() {
		let mut parser = Parser::new();
		parser.feed(b"echo 'multi");
		assert_eq!(parser.pop(), Ok(None));
		parser.feed(b"\nline' | cat\necho tail");
		let line = parser.pop().unwrap().unwrap();
		assert_eq!(line.commands().next().unwrap().arguments, vec![b"multi\nline".to_vec()]);
		assert_eq!(parser.pop(), Ok(None));
		parser.finish();
		assert_eq!(parser.pop().unwrap().unwrap().sole_command().unwrap(), &Command::new("echo", vec!["tail"]));
		assert_eq!(parser.pop(), Ok(None));
	}

	#[test]
	fn backslash_newline_joins_lines() {
		let mut parser = Parser::new();
		parser.feed(b"echo a \\\n b\n");
		let line = parser.pop().unwrap().unwrap();
		assert_eq!(line.sole_command().unwrap(), &Command::new("echo", vec!["a", "b"]));
	}

	#[test]
	fn errors() {
		assert_eq!(parse_line(b"| cat"), Err(ParseError::PipeWithNoLeftArg));
		assert_eq!(parse_line(b"a | | b"), Err(ParseError::PipeWithLeftArgNotACommand));
		assert_eq!(parse_line(b"echo >"), Err(ParseError::OutputRedirectBadArg));
		assert_eq!(parse_line(b"echo > | cat"), Err(ParseError::OutputRedirectBadArg));
		assert_eq!(parse_line(b"echo > f > g"), Err(ParseError::OutputRedirectBadArg));
		assert_eq!(parse_line(b"echo > f extra"), Err(ParseError::TooLateArguments));
		assert_eq!(parse_line(b"echo > f | cat"), Err(ParseError::TooLateArguments));
		assert_eq!(parse_line(b"echo a |"), Err(ParseError::EndsNotWithACommand));
		assert_eq!(parse_line(b"> f"), Err(ParseError::EndsNotWithACommand));
		assert_eq!(parse_line(b"a && b"), Err(ParseError::UnsupportedOperator("&&")));
		assert_eq!(parse_line(b"a || b"), Err(ParseError::UnsupportedOperator("||")));
		assert_eq!(parse_line(b"sleep 1 &"), Err(ParseError::UnsupportedOperator("&")));
	}

	#[test]
	fn bad_line_does_not_poison_the_next() {
		let mut parser = Parser::new();
		parser.feed(b"| oops\necho ok\n");
		assert_eq!(parser.pop(), Err(ParseError::PipeWithNoLeftArg));
		assert_eq!(parser.pop().unwrap().unwrap().sole_command().unwrap(), &Command::new("echo", vec!["ok"]));
	}
}
