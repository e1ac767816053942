use std::sync::Arc;

use serde::Serialize;

use crate::SyscallRecord;

/// A record as handed to the sink: the captured fields plus the CPU whose
/// channel delivered it and its arrival sequence number on that CPU.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodedEvent {
	pub cgroup_id: u64,
	pub syscall_id: u32,
	pub pid: u32,
	pub comm: Arc<str>,
	pub cpu: u32,
	pub seq: u64,
}

impl DecodedEvent {
	pub fn from_record(record: &SyscallRecord, cpu: u32, seq: u64) -> Self {
		DecodedEvent {
			cgroup_id: record.cgroup_id,
			syscall_id: record.syscall_id,
			pid: record.pid,
			comm: Arc::from(String::from_utf8_lossy(record.comm_bytes()).as_ref()),
			cpu,
			seq,
		}
	}
}
