use zerocopy_derive::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Length of the task short-name snapshot (the kernel's `TASK_COMM_LEN`).
pub const COMM_LEN: usize = 16;

pub const RECORD_SIZE: usize = 32;

/// One syscall-entry identification record.
///
/// Fixed layout with no padding and no pointers, so a record can be moved
/// between contexts as a plain byte copy. The zerocopy derives reject any
/// layout change that would add padding.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct SyscallRecord {
	pub cgroup_id: u64,
	pub syscall_id: u32,
	pub pid: u32,
	pub comm: [u8; COMM_LEN],
}

const _: () = assert!(core::mem::size_of::<SyscallRecord>() == RECORD_SIZE);

impl SyscallRecord {
	pub const EMPTY: SyscallRecord = SyscallRecord {
		cgroup_id: 0,
		syscall_id: 0,
		pid: 0,
		comm: [0u8; COMM_LEN],
	};

	/// Builds a record on the stack. `comm` longer than [`COMM_LEN`] is cut to its
	/// first `COMM_LEN` bytes, shorter names are zero-filled.
	#[inline]
	pub fn capture(cgroup_id: u64, syscall_id: u32, pid: u32, comm: &[u8]) -> Self {
		let mut snapshot = [0u8; COMM_LEN];
		let len = comm.len().min(COMM_LEN);
		snapshot[..len].copy_from_slice(&comm[..len]);

		SyscallRecord {
			cgroup_id,
			syscall_id,
			pid,
			comm: snapshot,
		}
	}

	/// The name bytes up to the first NUL, never past `COMM_LEN`.
	pub fn comm_bytes(&self) -> &[u8] {
		let end = self.comm.iter().position(|&b| b == 0).unwrap_or(COMM_LEN);
		&self.comm[..end]
	}
}

// region:    --- Tests


// endregion: --- Tests
