use crate::builtin::{self, Builtin};
use crate::global::State;
use crate::job::{self, JobBuilder};
use crate::pipe::{self, PipeLink};
use crate::redirect;
use crate::search;
use crate::types::{Command, CommandLine, Redirect};

use std::{ffi, fmt, io};
use std::convert::Infallible;
use std::ffi::CString;
use std::io::Write;
use std::os::fd::AsRawFd;
use nix::unistd::{self, ForkResult};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecError {
	#[error("nix error: {0}")]
	Nix(#[from] nix::Error),
	#[error("io error: {0}")]
	Io(#[from] io::Error),
	#[error("nul char error: {0}")]
	Nul(#[from] ffi::NulError),
}

fn report(what: &str, e: &dyn fmt::Display) {
	let _ = writeln!(io::stderr(), "msh: {}: {}", what, e);
}

fn terminate(status: i32) -> ! {
	unsafe { libc::_exit(status) }
}

fn do_exec_command(state: &State, command: &Command) -> Result<Infallible, ExecError> {
	redirect::silence_stderr(&state.null_sink)?;
	let name = CString::new(command.name.clone())?;
	let mut argv = Vec::with_capacity(command.arguments.len() + 1);
	argv.push(name.clone());
	for argument in &command.arguments {
		argv.push(CString::new(argument.clone())?);
	}
	match unistd::execvp(&name, &argv)? {}
}

/// Runs `command` inside an already forked child whose streams are wired.
fn exec_command(state: &State, command: &Command, is_terminal: bool) -> ! {
	match builtin::match_builtin(&command.name) {
		Some(Builtin::Exit) => {
			if !is_terminal {
				let _ = unistd::close(libc::STDOUT_FILENO);
			}
			terminate(builtin::exit_code(&command.arguments))
		},
		Some(Builtin::Cd) => terminate(builtin::builtin_cd(&command.arguments) as i32),
		None => {
			let _ = do_exec_command(state, command);
			terminate(1)
		},
	}
}

/// Forks one child running `child` and waits for it.
fn fork_and_wait<F>(child: F) -> u8 where F: FnOnce() {
	let mut job_builder = JobBuilder::new(1);
	match job_builder.push_fork() {
		Ok(ForkResult::Child) => {
			child();
			terminate(1)
		},
		Ok(ForkResult::Parent { .. }) => {},
		Err(e) => {
			report("fork", &e);
			return 1;
		},
	}
	let mut job = job_builder.build();
	if let Err(e) = job.wait() {
		report("wait", &e);
	}
	job.terminal().map_or(1, |stage| stage.code())
}

/// Runs a lone command: built-ins in this process, externals in a waited child.
pub fn run_single(state: &State, command: &Command) -> u8 {
	match builtin::match_builtin(&command.name) {
		Some(Builtin::Cd) => builtin::builtin_cd(&command.arguments),
		Some(Builtin::Exit) => builtin::builtin_exit(&command.arguments),
		None => {
			if !search::resolvable(state.search_path(), &command.name) {
				return 1;
			}
			fork_and_wait(|| exec_command(state, command, true))
		},
	}
}

/// Runs a lone command in a child whose stdout goes to `redirect`.
fn run_redirected(state: &State, command: &Command, redirect: &Redirect) -> u8 {
	fork_and_wait(|| {
		let _ = redirect::silence_stderr(&state.null_sink);
		if redirect::redirect_stdout(redirect).is_err() {
			terminate(1);
		}
		if builtin::match_builtin(&command.name).is_none()
			&& !search::resolvable(state.search_path(), &command.name) {
			terminate(1);
		}
		exec_command(state, command, true)
	})
}

fn wire_stage(i: usize, links: &[PipeLink], redirect: Option<&Redirect>) -> Result<(), ExecError> {
	if i > 0 {
		unistd::dup2(links[i - 1].read.as_raw_fd(), libc::STDIN_FILENO)?;
	}
	if i < links.len() {
		unistd::dup2(links[i].write.as_raw_fd(), libc::STDOUT_FILENO)?;
	} else if let Some(redirect) = redirect {
		redirect::redirect_stdout(redirect)?;
	}
	Ok(())
}

fn spawn_stages(state: &State, commands: &[&Command], links: &[PipeLink],
                redirect: Option<&Redirect>) -> nix::Result<job::Job> {
	let mut job_builder = JobBuilder::new(commands.len());
	for (i, command) in commands.iter().enumerate() {
		if let ForkResult::Child = job_builder.push_fork()? {
			let wired = wire_stage(i, links, redirect);
			pipe::close_inherited(links);
			if wired.is_err() {
				terminate(1);
			}
			exec_command(state, command, i + 1 == commands.len());
		}
	}
	Ok(job_builder.build())
}

/// Overall status of a finished pipeline. The highest-index `exit` stage wins;
/// without one, the terminal stage's status is used.
fn pipeline_status(commands: &[&Command], terminal_status: u8) -> u8 {
	let last_exit = commands.iter().rposition(|c| builtin::match_builtin(&c.name) == Some(Builtin::Exit));
	match last_exit {
		Some(i) => builtin::exit_code(&commands[i].arguments) as u8,
		None => terminal_status,
	}
}

pub fn run_pipeline(state: &State, line: &CommandLine) -> u8 {
	run_pipeline_with(state, line, PipeLink::new)
}

fn run_pipeline_with<F>(state: &State, line: &CommandLine, open_link: F) -> u8
	where F: FnMut() -> nix::Result<PipeLink> {
	let commands: Vec<&Command> = line.commands().collect();
	if commands.is_empty() {
		return 0;
	}

	let links = match pipe::open_links(commands.len() - 1, open_link) {
		Ok(links) => links,
		Err(e) => {
			report("pipe", &e);
			return 1;
		},
	};
	let mut job = match spawn_stages(state, &commands, &links, line.redirect.as_ref()) {
		Ok(job) => job,
		Err(e) => {
			report("fork", &e);
			return 1;
		},
	};
	drop(links);

	if let Err(e) = job.wait() {
		report("wait", &e);
	}
	let terminal_status = job.terminal().map_or(1, |stage| stage.code());
	pipeline_status(&commands, terminal_status)
}

fn eval_line(state: &State, line: &CommandLine) -> u8 {
	if let Some(command) = line.sole_command() {
		match builtin::match_builtin(&command.name) {
			Some(Builtin::Exit) => builtin::builtin_exit(&command.arguments),
			Some(Builtin::Cd) if line.redirect.is_none() => {
				return builtin::builtin_cd(&command.arguments);
			},
			_ => {},
		}
	}
	if line.has_pipes() {
		return run_pipeline(state, line);
	}
	let command = match line.commands().next() {
		Some(command) => command,
		None => { return 0; },
	};
	match line.redirect {
		Some(ref redirect) => run_redirected(state, command, redirect),
		None => run_single(state, command),
	}
}

/// Executes one command line and records its status as the last status.
pub fn eval(state: &mut State, line: &CommandLine) -> u8 {
	let status = eval_line(state, line);
	state.last_status = status;
	status
}
