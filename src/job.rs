use std::mem;
use nix::errno::Errno;
use nix::unistd::{self, ForkResult, Pid};
use nix::sys::signal::{self, SigHandler, Signal};
use nix::sys::wait::{self, WaitStatus};

pub trait WaitStatusExt {
	fn code(self) -> u8;
}

impl WaitStatusExt for WaitStatus {
	/// Shell-style status: the exit code, or 128 + signal number.
	fn code(self) -> u8 {
		match self {
			WaitStatus::Exited(_, code) => code as u8,
			WaitStatus::Signaled(_, sig, _) => (128 + sig as i32) as u8,
			_ => 1,
		}
	}
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Stage {
	pub pid: Pid,
	pub index: usize,
	pub is_terminal: bool,
	pub status: Option<WaitStatus>,
}

impl Stage {
	pub fn code(&self) -> u8 {
		self.status.map_or(1, |s| s.code())
	}
}

/// Forks the stages of one job. Stages forked by an unfinished builder are
/// sent SIGTERM when it is dropped; they are not waited for.
#[derive(Debug)]
pub struct JobBuilder {
	size: usize,
	stages: Vec<Stage>,
}

impl JobBuilder {
	pub fn new(size: usize) -> JobBuilder {
		JobBuilder { size: size, stages: Vec::with_capacity(size) }
	}

	pub fn push_fork(&mut self) -> nix::Result<ForkResult> {
		let index = self.stages.len();
		assert!(index < self.size);
		// The child side never returns into code that touches shared state:
		// it either replaces its image or calls _exit.
		let r = unsafe { unistd::fork() }?;
		match r {
			ForkResult::Parent { child } => {
				self.stages.push(Stage { pid: child, index: index, is_terminal: index + 1 == self.size, status: None });
			},
			ForkResult::Child => {
				// The Rust runtime ignores SIGPIPE, and an ignored signal survives exec.
				let _ = unsafe { signal::signal(Signal::SIGPIPE, SigHandler::SigDfl) };
			},
		}
		Ok(r)
	}

	pub fn build(mut self) -> Job {
		assert_eq!(self.stages.len(), self.size);
		debug_assert!(self.stages.iter().enumerate().all(|(i, s)| s.index == i));
		Job { stages: mem::take(&mut self.stages) }
	}
}

impl Drop for JobBuilder {
	fn drop(&mut self) {
		for stage in &self.stages {
			let _ = signal::kill(stage.pid, Signal::SIGTERM);
		}
	}
}

#[derive(Debug)]
pub struct Job {
	pub stages: Vec<Stage>,
}

impl Job {
	/// Reaps every stage in index order. A stage that cannot be waited for keeps
	/// no status; the first such error is returned after all stages were tried.
	pub fn wait(&mut self) -> nix::Result<()> {
		let mut result = Ok(());
		for stage in self.stages.iter_mut() {
			match wait_retrying(stage.pid) {
				Ok(status) => stage.status = Some(status),
				Err(e) => if result.is_ok() { result = Err(e) },
			}
		}
		result
	}

	pub fn terminal(&self) -> Option<&Stage> {
		self.stages.iter().find(|s| s.is_terminal)
	}
}

pub fn wait_retrying(pid: Pid) -> nix::Result<WaitStatus> {
	loop {
		match wait::waitpid(pid, None) {
			Err(Errno::EINTR) => continue,
			r => return r,
		}
	}
}
