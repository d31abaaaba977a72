use crate::search;

use std::env;
use std::ffi::{OsStr, OsString};
use std::path::PathBuf;

const NULL_SINK: &'static str = "/dev/null";

/// Everything an evaluation needs from its surroundings.
#[derive(Debug, Clone)]
pub struct State {
	pub search_path: Option<OsString>,
	pub null_sink: PathBuf,
	pub last_status: u8,
}

impl State {
	pub fn new() -> State {
		State::with_search_path(env::var_os(search::PATH_KEY))
	}

	pub fn with_search_path(search_path: Option<OsString>) -> State {
		State { search_path: search_path, null_sink: PathBuf::from(NULL_SINK), last_status: 0 }
	}

	pub fn search_path(&self) -> Option<&OsStr> {
		self.search_path.as_ref().map(|p| p.as_os_str())
	}
}
