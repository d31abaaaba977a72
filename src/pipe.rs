use std::os::fd::{AsRawFd, OwnedFd, RawFd};
use nix::fcntl::OFlag;
use nix::unistd;

/// One pipe between two adjacent stages. Both ends close on drop.
#[derive(Debug)]
pub struct PipeLink {
	pub read: OwnedFd,
	pub write: OwnedFd,
}

impl PipeLink {
	pub fn new() -> nix::Result<PipeLink> {
		let (read, write) = unistd::pipe2(OFlag::O_CLOEXEC)?;
		Ok(PipeLink { read: read, write: write })
	}
}

/// Opens `count` links. If one fails, the ones already opened are dropped.
pub fn open_links<F>(count: usize, mut open: F) -> nix::Result<Vec<PipeLink>>
	where F: FnMut() -> nix::Result<PipeLink> {
	(0 .. count).map(|_| open()).collect()
}

/// Closes every end of `links` in a forked child, leaving the owners alone.
/// Only valid in a process that will never return to the owners' scope.
pub fn close_inherited(links: &[PipeLink]) {
	for link in links {
		let fds: [RawFd; 2] = [link.read.as_raw_fd(), link.write.as_raw_fd()];
		for &fd in &fds {
			let _ = unistd::close(fd);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use nix::errno::Errno;
	use std::io::{Read, Write};
	use std::fs::File;

	#[test]
	fn link_carries_bytes_and_signals_end_of_stream() {
		let link = PipeLink::new().unwrap();
		let mut writer = File::from(link.write);
		let mut reader = File::from(link.read);
		writer.write_all(b"hello").unwrap();
		drop(writer);
		let mut buf = String::new();
		reader.read_to_string(&mut buf).unwrap();
		assert_eq!(buf, "hello");
	}

	#[test]
	fn failed_open_stops_early() {
		let mut calls = 0;
		let r = open_links(4, || {
			calls += 1;
			if calls == 3 { Err(Errno::EMFILE) } else { PipeLink::new() }
		});
		assert_eq!(r.unwrap_err(), Errno::EMFILE);
		assert_eq!(calls, 3);
	}

	#[test]
	fn zero_links_for_a_single_stage() {
		assert!(open_links(0, PipeLink::new).unwrap().is_empty());
	}
}
