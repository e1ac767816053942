use std::os::unix::fs::MetadataExt;

use lib_ring::TaskContext;

use crate::{Error, Result};

const CGROUP2_MOUNT: &str = "/sys/fs/cgroup";

/// Identity of the calling thread, resolved once so the hook itself only reads fields.
#[derive(Debug, Clone)]
pub struct SelfTask {
	pid_tgid: u64,
	cgroup_id: u64,
	comm: Vec<u8>,
}

impl SelfTask {
	/// Must be called on the thread it describes.
	pub fn current(cgroup_id: u64) -> Result<Self> {
		// SAFETY: gettid takes no arguments and cannot fail.
		let tid = unsafe { libc::syscall(libc::SYS_gettid) } as u32;
		let tgid = std::process::id();

		let mut comm = std::fs::read("/proc/thread-self/comm")?;
		if comm.last() == Some(&b'\n') {
			comm.pop();
		}

		Ok(SelfTask {
			pid_tgid: (u64::from(tgid) << 32) | u64::from(tid),
			cgroup_id,
			comm,
		})
	}
}

impl TaskContext for SelfTask {
	fn pid_tgid(&self) -> u64 {
		self.pid_tgid
	}

	fn cgroup_id(&self) -> u64 {
		self.cgroup_id
	}

	fn comm(&self) -> &[u8] {
		&self.comm
	}
}

/// Cgroup v2 id of this process: the inode number of its cgroup directory.
pub fn cgroup_id() -> Result<u64> {
	let content = std::fs::read_to_string("/proc/self/cgroup")?;
	let path = cgroup_v2_path(&content).ok_or_else(|| Error::custom("no cgroup v2 entry in /proc/self/cgroup"))?;
	let meta = std::fs::metadata(format!("{CGROUP2_MOUNT}{path}"))?;

	Ok(meta.ino())
}

/// The `0::<path>` entry of a `/proc/<pid>/cgroup` file.
fn cgroup_v2_path(content: &str) -> Option<&str> {
	content.lines().find_map(|line| line.strip_prefix("0::"))
}

// region:    --- Tests

#[cfg(test)]
mod tests {
	type Result<T> = core::result::Result<T, Box<dyn std::error::Error>>; // For tests.

	use super::*;

	#[test]
	fn cgroup_v2_entry_found_among_v1_lines() -> Result<()> {
		// -- Setup & Fixtures
		let content = "12:pids:/user.slice\n1:name=systemd:/user.slice/session-2.scope\n0::/user.slice/session-2.scope\n";

		// -- Exec
		let path = cgroup_v2_path(content);

		// -- Check
		assert_eq!(path, Some("/user.slice/session-2.scope"));

		Ok(())
	}

	#[test]
	fn cgroup_v1_only_has_no_v2_path() -> Result<()> {
		// -- Exec
		let path = cgroup_v2_path("4:memory:/docker/abc\n3:cpu,cpuacct:/docker/abc\n");

		// -- Check
		assert_eq!(path, None);

		Ok(())
	}

	#[test]
	fn current_reads_thread_name_and_ids() -> Result<()> {
		// -- Setup & Fixtures
		let handle = std::thread::Builder::new()
			.name("st-probe".to_string())
			.spawn(|| SelfTask::current(7).map_err(|e| e.to_string()))?;

		// -- Exec
		let task = handle.join().map_err(|_| "thread panicked")??;

		// -- Check
		assert_eq!(task.comm(), b"st-probe");
		assert_eq!(task.cgroup_id(), 7);
		assert_eq!((task.pid_tgid() >> 32) as u32, std::process::id());
		assert_ne!(task.pid_tgid() as u32, std::process::id());

		Ok(())
	}
}

// endregion: --- Tests
