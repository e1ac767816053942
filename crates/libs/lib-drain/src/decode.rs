use lib_record::{DecodedEvent, SyscallRecord};
use lib_ring::CpuId;

use crate::error::{Error, Result};

/// Sanity-checks a record taken from `cpu`'s channel and turns it into a sink event.
pub fn decode_record(record: &SyscallRecord, cpu: CpuId, seq: u64, max_syscall_id: u32) -> Result<DecodedEvent> {
	if record.syscall_id > max_syscall_id {
		return Err(Error::SyscallOutOfRange {
			cpu,
			syscall_id: record.syscall_id,
		});
	}

	Ok(DecodedEvent::from_record(record, cpu, seq))
}

// region:    --- Tests


// endregion: --- Tests
