use std::env;
use std::ffi::OsStr;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;
use nix::unistd::{self, AccessFlags};

pub const PATH_KEY: &'static str = "PATH";

fn is_executable(path: &Path) -> bool {
	unistd::access(path, AccessFlags::X_OK).is_ok()
}

/// Whether `name` can be launched: directly when it contains a slash,
/// otherwise through the first matching directory of `search_path`.
pub fn resolvable(search_path: Option<&OsStr>, name: &[u8]) -> bool {
	if name.is_empty() {
		return false;
	}
	let name = OsStr::from_bytes(name);
	if name.as_bytes().contains(&b'/') {
		return is_executable(Path::new(name));
	}
	let search_path = match search_path {
		Some(p) => p,
		None => { return false; },
	};
	env::split_paths(search_path)
		.filter(|dir| !dir.as_os_str().is_empty())
		.any(|dir| is_executable(&dir.join(name)))
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::fs;
	use std::os::unix::fs::PermissionsExt;

	#[test]
	fn finds_sh_in_bin() {
		assert!(resolvable(Some(OsStr::new("/nonexistent:/bin")), b"sh"));
	}

	#[test]
	fn missing_path_is_not_resolvable() {
		assert!(!resolvable(None, b"sh"));
	}

	#[test]
	fn unknown_name_is_not_resolvable() {
		assert!(!resolvable(Some(OsStr::new("/bin:/usr/bin")), b"nonexistent_cmd_xyz"));
		assert!(!resolvable(Some(OsStr::new("/bin")), b""));
	}

	#[test]
	fn slash_names_skip_path_search() {
		assert!(resolvable(None, b"/bin/sh"));
		assert!(!resolvable(Some(OsStr::new("/bin")), b"/bin/nonexistent_cmd_xyz"));
	}

	#[test]
	fn requires_execute_permission() {
		let dir = tempfile::tempdir().unwrap();
		let file = dir.path().join("tool");
		fs::write(&file, b"#!/bin/sh\n").unwrap();
		fs::set_permissions(&file, fs::Permissions::from_mode(0o644)).unwrap();
		let search = dir.path().as_os_str().to_owned();
		assert!(!resolvable(Some(&search), b"tool"));

		fs::set_permissions(&file, fs::Permissions::from_mode(0o755)).unwrap();
		assert!(resolvable(Some(&search), b"tool"));
	}
}
