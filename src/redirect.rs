use crate::eval::ExecError;
use crate::types::{Redirect, RedirectType};

use std::{fs, io};
use std::ffi::OsStr;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::{IntoRawFd, RawFd};
use std::path::Path;
use nix::unistd;

pub fn open_target(redirect: &Redirect) -> io::Result<fs::File> {
	let mut oopt = fs::OpenOptions::new();
	oopt.write(true).create(true).mode(0o666);
	let _ = match redirect.typ {
		RedirectType::Truncate => oopt.truncate(true),
		RedirectType::Append => oopt.append(true),
	};
	oopt.open(OsStr::from_bytes(&redirect.target))
}

/// Makes `to` refer to `file`, closing the original descriptor.
fn rebind(file: fs::File, to: RawFd) -> Result<(), ExecError> {
	let fd = file.into_raw_fd();
	unistd::dup2(fd, to)?;
	unistd::close(fd)?;
	Ok(())
}

pub fn redirect_stdout(redirect: &Redirect) -> Result<(), ExecError> {
	rebind(open_target(redirect)?, libc::STDOUT_FILENO)
}

pub fn silence_stderr(null_sink: &Path) -> Result<(), ExecError> {
	let sink = fs::OpenOptions::new().write(true).open(null_sink)?;
	rebind(sink, libc::STDERR_FILENO)
}
