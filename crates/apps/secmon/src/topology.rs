use aya::util::{nr_cpus, online_cpus};
use lib_ring::CpuId;
use tracing::debug;

use crate::{Error, Result};

/// CPUs as the kernel reports them under `/sys/devices/system/cpu`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topology {
	/// Every CPU that may ever come online. Each one gets a channel.
	pub possible: Vec<CpuId>,
	/// CPUs online now. Only these get a load generator thread.
	pub online: Vec<CpuId>,
}

impl Topology {
	pub fn discover() -> Result<Self> {
		// The possible mask is a dense range starting at 0, its count is enough.
		let count = nr_cpus().map_err(|(path, err)| Error::CpuTopology { path, err })?;
		let possible: Vec<CpuId> = (0..count as CpuId).collect();
		let online = online_cpus().map_err(|(path, err)| Error::CpuTopology { path, err })?;
		debug!("cpu topology: possible {possible:?}, online {online:?}");

		Ok(Topology { possible, online })
	}
}

/// Deals `items` to `workers` buckets round-robin, keeping their relative order.
/// Never returns an empty bucket: with fewer items than workers, the extra
/// workers are left out.
pub fn partition_round_robin<T>(items: Vec<T>, workers: usize) -> Vec<Vec<T>> {
	let workers = workers.clamp(1, items.len().max(1));
	let mut buckets: Vec<Vec<T>> = (0..workers).map(|_| Vec::new()).collect();

	for (i, item) in items.into_iter().enumerate() {
		buckets[i % workers].push(item);
	}

	buckets.retain(|b| !b.is_empty());
	buckets
}

// region:    --- Tests

#[cfg(test)]
mod tests {
	type Result<T> = core::result::Result<T, Box<dyn std::error::Error>>; // For tests.

	use super::*;

	#[test]
	fn partition_deals_round_robin() -> Result<()> {
		// -- Exec
		let parts = partition_round_robin(vec![0, 1, 2, 3, 4, 5, 6], 3);

		// -- Check
		assert_eq!(parts, vec![vec![0, 3, 6], vec![1, 4], vec![2, 5]]);

		Ok(())
	}

	#[test]
	fn partition_caps_workers_at_item_count() -> Result<()> {
		// -- Exec
		let parts = partition_round_robin(vec![10, 11], 8);

		// -- Check
		assert_eq!(parts, vec![vec![10], vec![11]]);

		Ok(())
	}

	#[test]
	fn partition_of_nothing_is_empty() -> Result<()> {
		// -- Exec
		let parts = partition_round_robin(Vec::<u32>::new(), 4);

		// -- Check
		assert!(parts.is_empty());

		Ok(())
	}

	#[test]
	fn discover_sees_at_least_one_online_cpu() -> Result<()> {
		// -- Exec
		let topology = Topology::discover()?;

		// -- Check
		assert!(!topology.online.is_empty());
		assert_eq!(topology.possible.first(), Some(&0));
		assert!(topology.possible.windows(2).all(|w| w[1] == w[0] + 1));
		assert!(topology.online.iter().all(|cpu| topology.possible.contains(cpu)));

		Ok(())
	}
}

// endregion: --- Tests
