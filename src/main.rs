mod builtin;
mod eval;
mod global;
mod job;
mod parser;
mod pipe;
mod redirect;
mod search;
mod types;

use std::io;
use std::io::{IsTerminal, Read, Write};
use std::process;

const PROMPT: &'static [u8] = b"> ";
const READ_CHUNK: usize = 4096;

fn run_ready(state: &mut global::State, parser: &mut parser::Parser) {
	loop {
		match parser.pop() {
			Ok(Some(line)) => { eval::eval(state, &line); },
			Ok(None) => break,
			Err(e) => { let _ = writeln!(io::stderr(), "msh: {}", e); },
		}
	}
}

fn main() {
	let mut state = global::State::new();
	let mut parser = parser::Parser::new();
	let interactive = io::stdin().is_terminal();
	let mut stdout = io::stdout();
	let stdin = io::stdin();
	let mut stdin_locked = stdin.lock();
	let mut chunk = [0u8; READ_CHUNK];
	loop {
		if interactive {
			let _ = stdout.write_all(PROMPT);
			let _ = stdout.flush();
		}
		let n = match stdin_locked.read(&mut chunk) {
			Ok(0) => break,
			Ok(n) => n,
			Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
			Err(_) => break,
		};
		parser.feed(&chunk[.. n]);
		run_ready(&mut state, &mut parser);
	}
	parser.finish();
	run_ready(&mut state, &mut parser);
	let _ = stdout.flush();
	process::exit(state.last_status as i32)
}
