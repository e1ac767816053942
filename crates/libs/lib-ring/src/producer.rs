use lib_record::SyscallRecord;

use crate::{
	percpu::CpuId,
	ring::{PushOutcome, RingProducer},
};

/// Identity of the task entering a syscall, as seen from the probe.
pub trait TaskContext {
	/// Kernel pid/tgid word: thread id in the low 32 bits, thread-group id in the high 32 bits.
	fn pid_tgid(&self) -> u64;

	/// Cgroup v2 id of the task.
	fn cgroup_id(&self) -> u64;

	/// Short task name. Anything past 16 bytes is cut at capture.
	fn comm(&self) -> &[u8];
}

/// Producer bound to one CPU's channel.
///
/// The attach side must call [`EventProducer::on_sys_enter`] only from the CPU this
/// producer was allocated for. The call builds the record on the stack, takes
/// no lock, never allocates and never blocks: a full channel counts a drop.
pub struct EventProducer {
	cpu: CpuId,
	ring: RingProducer,
}

impl EventProducer {
	pub(crate) fn new(cpu: CpuId, ring: RingProducer) -> Self {
		EventProducer { cpu, ring }
	}

	pub fn cpu(&self) -> CpuId {
		self.cpu
	}

	/// Syscall-entry hook. `syscall_nr` is the raw tracepoint argument, narrowed
	/// to 32 bits the same way the kernel side records it.
	#[inline]
	pub fn on_sys_enter<T>(&mut self, task: &T, syscall_nr: i64) -> PushOutcome
	where
		T: TaskContext + ?Sized,
	{
		let record = SyscallRecord::capture(task.cgroup_id(), syscall_nr as u32, task.pid_tgid() as u32, task.comm());
		self.ring.push(record)
	}

	/// Records this producer discarded so far.
	pub fn dropped(&self) -> u64 {
		self.ring.dropped()
	}

	pub fn capacity(&self) -> usize {
		self.ring.capacity()
	}
}

// region:    --- Tests


// endregion: --- Tests
