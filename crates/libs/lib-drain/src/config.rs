use std::time::Duration;

/// Sleep between two drain passes that found nothing.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Highest syscall number accepted by the decoder. Only the `u32::MAX` a raw
/// tracepoint leaves for `-1` is rejected, so x32 numbers (bit `0x4000_0000`)
/// and the MIPS ranges from 4000 up still decode.
pub const DEFAULT_MAX_SYSCALL_ID: u32 = u32::MAX - 1;

/// Events the sink channel holds before drain workers wait on it.
pub const DEFAULT_SINK_CAPACITY: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrainConfig {
	pub poll_interval: Duration,
	pub max_syscall_id: u32,
}

impl Default for DrainConfig {
	fn default() -> Self {
		Self {
			poll_interval: DEFAULT_POLL_INTERVAL,
			max_syscall_id: DEFAULT_MAX_SYSCALL_ID,
		}
	}
}
