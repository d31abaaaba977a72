use std::io;
use std::io::Write;
use std::process;
use nix::unistd;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Builtin { Cd, Exit }

pub fn match_builtin(name: &[u8]) -> Option<Builtin> {
	match name {
		b"cd" => Some(Builtin::Cd),
		b"exit" => Some(Builtin::Exit),
		_ => None,
	}
}

/// Changes the working directory of the calling process. `cd` alone stays in `.`.
pub fn builtin_cd(arguments: &[Vec<u8>]) -> u8 {
	let target: &[u8] = arguments.first().map_or(b".", |a| a.as_slice());
	match unistd::chdir(target) {
		Ok(()) => 0,
		Err(_) => 1,
	}
}

/// Exit code requested by `exit`, parsed the way `atoi` would.
pub fn exit_code(arguments: &[Vec<u8>]) -> i32 {
	arguments.first().map_or(0, |a| parse_int_prefix(a))
}

pub fn builtin_exit(arguments: &[Vec<u8>]) -> ! {
	let _ = io::stdout().flush();
	process::exit(exit_code(arguments))
}

fn parse_int_prefix(s: &[u8]) -> i32 {
	let mut bytes = s.iter().skip_while(|&&c| match c {
		b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c => true,
		_ => false,
	}).peekable();
	let negative = match bytes.peek() {
		Some(&&b'-') => { bytes.next(); true },
		Some(&&b'+') => { bytes.next(); false },
		_ => false,
	};
	let mut n: i32 = 0;
	for &c in bytes.take_while(|c| c.is_ascii_digit()) {
		n = n.wrapping_mul(10).wrapping_add((c - b'0') as i32);
	}
	if negative { n.wrapping_neg() } else { n }
}
