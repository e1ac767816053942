use std::collections::HashSet;

use lib_record::SyscallRecord;
use tracing::debug;

use crate::{
	error::{Error, Result},
	producer::EventProducer,
	ring::{channel, RingConsumer},
};

pub type CpuId = u32;

pub const DEFAULT_CAPACITY: usize = 4096;

/// Consumer handle for one CPU's channel.
pub struct CpuConsumer {
	cpu: CpuId,
	ring: RingConsumer,
}

impl CpuConsumer {
	pub fn cpu(&self) -> CpuId {
		self.cpu
	}

	#[inline]
	pub fn try_take(&mut self) -> Option<SyscallRecord> {
		self.ring.try_take()
	}

	pub fn drops(&self) -> u64 {
		self.ring.drops()
	}

	pub fn len(&self) -> usize {
		self.ring.len()
	}

	pub fn is_empty(&self) -> bool {
		self.ring.is_empty()
	}

	pub fn capacity(&self) -> usize {
		self.ring.capacity()
	}
}

/// Allocates one channel per CPU in `cpus`, all with the same capacity.
///
/// Returns the producers (one per CPU, to be bound to that CPU's syscall-entry
/// hook) and the consumers, both in the order of `cpus`.
pub fn allocate(cpus: &[CpuId], capacity: usize) -> Result<(Vec<EventProducer>, Vec<CpuConsumer>)> {
	if cpus.is_empty() {
		return Err(Error::NoCpus);
	}

	let mut seen = HashSet::with_capacity(cpus.len());
	if let Some(dup) = cpus.iter().find(|cpu| !seen.insert(**cpu)) {
		return Err(Error::DuplicateCpu(*dup));
	}

	let mut producers = Vec::with_capacity(cpus.len());
	let mut consumers = Vec::with_capacity(cpus.len());

	for &cpu in cpus {
		let (tx, rx) = channel(capacity)?;
		producers.push(EventProducer::new(cpu, tx));
		consumers.push(CpuConsumer { cpu, ring: rx });
	}

	debug!(
		"allocated {} per-cpu channels, {} slots each ({} bytes of slot storage)",
		cpus.len(),
		capacity,
		cpus.len() * capacity * lib_record::RECORD_SIZE
	);

	Ok((producers, consumers))
}

// region:    --- Tests

#[cfg(test)]
mod tests {
	type Result<T> = core::result::Result<T, Box<dyn std::error::Error>>; // For tests.

	use super::*;

	#[test]
	fn allocate_rejects_bad_topology() -> Result<()> {
		// -- Exec & Check
		assert!(matches!(allocate(&[], 8), Err(Error::NoCpus)));
		assert!(matches!(allocate(&[0, 1, 1], 8), Err(Error::DuplicateCpu(1))));
		assert!(matches!(allocate(&[0, 1], 0), Err(Error::ZeroCapacity)));

		Ok(())
	}

	#[test]
	fn allocate_binds_channels_to_cpus_in_order() -> Result<()> {
		// -- Exec
		let (producers, consumers) = allocate(&[0, 2, 5], 16)?;

		// -- Check
		let producer_cpus = producers.iter().map(EventProducer::cpu).collect::<Vec<_>>();
		let consumer_cpus = consumers.iter().map(CpuConsumer::cpu).collect::<Vec<_>>();
		assert_eq!(producer_cpus, vec![0, 2, 5]);
		assert_eq!(consumer_cpus, vec![0, 2, 5]);
		assert!(consumers.iter().all(|c| c.capacity() == 16 && c.is_empty()));

		Ok(())
	}
}

// endregion: --- Tests
