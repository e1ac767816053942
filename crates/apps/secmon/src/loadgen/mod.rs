//! Drives the per-CPU producers from pinned OS threads, standing in for the
//! kernel's syscall-entry hook.

mod self_task;

pub use self_task::{cgroup_id, SelfTask};

use std::{
	sync::{
		atomic::{AtomicBool, Ordering},
		Arc,
	},
	thread::JoinHandle,
	time::{Duration, Instant},
};

use lib_ring::{CpuId, EventProducer, PushOutcome};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{Error, Result};

/// Argument-less syscalls issued after each hook call, so the load is real kernel work.
const SYSCALLS: [libc::c_long; 4] = [libc::SYS_getpid, libc::SYS_getppid, libc::SYS_gettid, libc::SYS_getuid];

/// What one producer saw over the run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadStats {
	pub cpu: CpuId,
	pub attempts: u64,
	pub published: u64,
	pub dropped: u64,
}

pub struct LoadGenerator {
	stop: Arc<AtomicBool>,
	threads: Vec<(CpuId, JoinHandle<Result<LoadStats>>)>,
	idle: Vec<EventProducer>,
}

impl LoadGenerator {
	/// Starts one thread per online CPU, each owning that CPU's producer.
	/// Producers of CPUs that are not online stay idle.
	pub fn start(producers: Vec<EventProducer>, online: &[CpuId], rate: u64, cgroup_id: u64) -> Result<Self> {
		if rate == 0 {
			return Err(Error::InvalidRate);
		}

		let stop = Arc::new(AtomicBool::new(false));
		let mut threads = Vec::with_capacity(online.len());
		let mut idle = Vec::new();

		for producer in producers {
			let cpu = producer.cpu();
			if !online.contains(&cpu) {
				idle.push(producer);
				continue;
			}

			let stop = stop.clone();
			let handle = std::thread::Builder::new()
				.name(format!("secmon-load-{cpu}"))
				.spawn(move || run_load(producer, rate, cgroup_id, stop))?;
			threads.push((cpu, handle));
		}

		info!(
			"load generator started: {} threads at {rate}/s, {} idle channels",
			threads.len(),
			idle.len()
		);

		Ok(LoadGenerator { stop, threads, idle })
	}

	/// Stops every thread and waits for it. Blocking.
	///
	/// Once this returns no producer publishes anymore, so every channel's
	/// counters are final. A failed or panicked thread is reported only after
	/// all of them have been joined.
	pub fn stop(self) -> Result<Vec<LoadStats>> {
		self.stop.store(true, Ordering::Relaxed);

		// Join every thread before looking at any result, so none outlives a failure.
		let results = self
			.threads
			.into_iter()
			.map(|(cpu, handle)| handle.join().map_err(|_| Error::LoadThreadPanicked(cpu)))
			.collect::<Vec<_>>();

		let mut stats = Vec::with_capacity(results.len() + self.idle.len());
		for res in results {
			stats.push(res??);
		}
		stats.extend(self.idle.iter().map(|producer| LoadStats {
			cpu: producer.cpu(),
			dropped: producer.dropped(),
			..LoadStats::default()
		}));
		stats.sort_by_key(|s| s.cpu);

		Ok(stats)
	}
}

fn run_load(mut producer: EventProducer, rate: u64, cgroup_id: u64, stop: Arc<AtomicBool>) -> Result<LoadStats> {
	let cpu = producer.cpu();
	if let Err(err) = pin_to_cpu(cpu) {
		warn!("cpu {cpu}: could not pin load thread, it will float: {err}");
	}

	let task = SelfTask::current(cgroup_id)?;
	let period = Duration::from_nanos((1_000_000_000 / rate).max(1));
	let mut stats = LoadStats {
		cpu,
		..LoadStats::default()
	};
	let mut next = Instant::now();

	while !stop.load(Ordering::Relaxed) {
		let nr = SYSCALLS[(stats.attempts % SYSCALLS.len() as u64) as usize];

		if producer.on_sys_enter(&task, i64::from(nr)) == PushOutcome::Published {
			stats.published += 1;
		}
		stats.attempts += 1;

		// SAFETY: every entry of SYSCALLS takes no arguments and has no side effects.
		unsafe { libc::syscall(nr) };

		next += period;
		let now = Instant::now();
		if next > now {
			std::thread::sleep(next - now);
		}
	}

	stats.dropped = producer.dropped();
	debug!("cpu {cpu}: load thread done, {stats:?}");

	Ok(stats)
}

fn pin_to_cpu(cpu: CpuId) -> std::io::Result<()> {
	if cpu as usize >= libc::CPU_SETSIZE as usize {
		return Err(std::io::Error::from_raw_os_error(libc::EINVAL));
	}

	// SAFETY: cpu_set_t is plain data and all zeroes is the empty set; the index is checked above.
	let ret = unsafe {
		let mut set: libc::cpu_set_t = std::mem::zeroed();
		libc::CPU_SET(cpu as usize, &mut set);
		libc::sched_setaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), &set)
	};
	if ret != 0 {
		return Err(std::io::Error::last_os_error());
	}

	Ok(())
}

// region:    --- Tests

#[cfg(test)]
mod tests {
	type Result<T> = core::result::Result<T, Box<dyn std::error::Error>>; // For tests.

	use lib_ring::allocate;

	use super::*;

	#[test]
	fn zero_rate_is_rejected() -> Result<()> {
		// -- Setup & Fixtures
		let (producers, _consumers) = allocate(&[0], 4)?;

		// -- Exec
		let res = LoadGenerator::start(producers, &[0], 0, 0);

		// -- Check
		assert!(matches!(res, Err(Error::InvalidRate)));

		Ok(())
	}

	#[test]
	fn attempts_match_channel_contents() -> Result<()> {
		// -- Setup & Fixtures
		let (producers, consumers) = allocate(&[0, 1], 16)?;

		// -- Exec
		let load = LoadGenerator::start(producers, &[0], 20_000, 3)?;
		std::thread::sleep(Duration::from_millis(30));
		let stats = load.stop()?;

		// -- Check
		assert_eq!(stats.len(), 2);
		let busy = stats[0];
		assert_eq!(busy.cpu, 0);
		assert!(busy.attempts > 0);
		assert_eq!(busy.attempts, busy.published + busy.dropped);
		assert_eq!(consumers[0].len() as u64, busy.published);
		assert_eq!(consumers[0].drops(), busy.dropped);

		let idle = stats[1];
		assert_eq!((idle.cpu, idle.attempts, idle.dropped), (1, 0, 0));
		assert!(consumers[1].is_empty());

		Ok(())
	}

	#[test]
	fn failed_thread_is_reported_after_the_others_are_joined() -> Result<()> {
		// -- Setup & Fixtures
		let stop = Arc::new(AtomicBool::new(false));
		let finished = Arc::new(AtomicBool::new(false));
		let failing = std::thread::spawn(|| -> crate::Result<LoadStats> { Err(Error::custom("cpu 0 load failed")) });
		let slow = {
			let stop = stop.clone();
			let finished = finished.clone();
			std::thread::spawn(move || -> crate::Result<LoadStats> {
				while !stop.load(Ordering::Relaxed) {
					std::thread::sleep(Duration::from_millis(1));
				}
				std::thread::sleep(Duration::from_millis(20));
				finished.store(true, Ordering::Relaxed);
				Ok(LoadStats {
					cpu: 1,
					..LoadStats::default()
				})
			})
		};
		let load = LoadGenerator {
			stop,
			threads: vec![(0, failing), (1, slow)],
			idle: Vec::new(),
		};

		// -- Exec
		let res = load.stop();

		// -- Check
		assert!(matches!(res, Err(Error::Custom(_))));
		assert!(finished.load(Ordering::Relaxed), "second thread was joined before returning");

		Ok(())
	}
}

// endregion: --- Tests
