use std::future::Future;

use lib_drain::DrainSummary;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::{Error, Result};

/// Owns the drain workers and the token that stops them.
pub struct Supervisor {
	shutdown: CancellationToken,
	tasks: JoinSet<lib_drain::Result<DrainSummary>>,
	finished: Vec<DrainSummary>,
}

impl Supervisor {
	pub fn new() -> Self {
		Self {
			shutdown: CancellationToken::new(),
			tasks: JoinSet::new(),
			finished: Vec::new(),
		}
	}

	pub fn token(&self) -> CancellationToken {
		self.shutdown.clone()
	}

	pub fn spawn<F>(&mut self, fut: F)
	where
		F: Future<Output = lib_drain::Result<DrainSummary>> + Send + 'static,
	{
		self.tasks.spawn(fut);
	}

	/// Resolves with the error of the first worker that fails. Workers ending
	/// cleanly are kept for `shutdown`; once none is left this never resolves.
	/// Cancel safe.
	pub async fn first_failure(&mut self) -> Error {
		loop {
			match self.tasks.join_next().await {
				Some(Ok(Ok(summary))) => self.finished.push(summary),
				Some(Ok(Err(err))) => return err.into(),
				Some(Err(err)) => return err.into(),
				None => return std::future::pending().await,
			}
		}
	}

	/// Cancels every worker and collects their summaries. The first failing worker
	/// fails the shutdown.
	pub async fn shutdown(mut self) -> Result<Vec<DrainSummary>> {
		info!("Supervisor shutdown starting");
		self.shutdown.cancel();

		let mut summaries = std::mem::take(&mut self.finished);
		while let Some(res) = self.tasks.join_next().await {
			summaries.push(res??);
		}
		info!("Supervisor shutdown complete");

		Ok(summaries)
	}
}

// region:    --- Tests

#[cfg(test)]
mod tests {
	type Result<T> = core::result::Result<T, Box<dyn std::error::Error>>; // For tests.

	use std::time::Duration;

	use lib_drain::{DrainConfig, DrainWorker, SinkEvent};
	use lib_event::trx::new_channel;
	use lib_ring::{allocate, TaskContext};

	use super::*;

	struct Task;

	impl TaskContext for Task {
		fn pid_tgid(&self) -> u64 {
			1
		}

		fn cgroup_id(&self) -> u64 {
			1
		}

		fn comm(&self) -> &[u8] {
			b"init"
		}
	}

	#[tokio::test]
	async fn shutdown_collects_one_summary_per_worker() -> Result<()> {
		// -- Setup & Fixtures
		let (_producers, mut consumers) = allocate(&[0, 1], 8)?;
		let (tx, _rx) = new_channel::<SinkEvent>("sink", 8);
		let mut supervisor = Supervisor::new();
		let second = consumers.split_off(1);
		for part in [consumers, second] {
			let worker = DrainWorker::start(part, tx.clone(), DrainConfig::default(), supervisor.token())?;
			supervisor.spawn(worker.run());
		}

		// -- Exec
		let summaries = supervisor.shutdown().await?;

		// -- Check
		let mut cpus = summaries
			.iter()
			.flat_map(|s| s.channels.iter().map(|c| c.cpu))
			.collect::<Vec<_>>();
		cpus.sort();
		assert_eq!(cpus, vec![0, 1]);

		Ok(())
	}

	#[tokio::test]
	async fn first_failure_reports_a_worker_that_lost_its_sink() -> Result<()> {
		// -- Setup & Fixtures
		let (mut producers, consumers) = allocate(&[0], 8)?;
		let (tx, rx) = new_channel::<SinkEvent>("sink", 8);
		drop(rx);
		let mut supervisor = Supervisor::new();
		let worker = DrainWorker::start(consumers, tx, DrainConfig::default(), supervisor.token())?;
		producers[0].on_sys_enter(&Task, 0);
		supervisor.spawn(worker.run());

		// -- Exec
		let err = tokio::time::timeout(Duration::from_secs(1), supervisor.first_failure()).await?;

		// -- Check
		assert!(matches!(
			err,
			Error::Drain(lib_drain::Error::Event(lib_event::Error::EventSend("sink")))
		));

		Ok(())
	}

	#[tokio::test]
	async fn first_failure_stays_pending_while_workers_are_healthy() -> Result<()> {
		// -- Setup & Fixtures
		let (_producers, consumers) = allocate(&[0], 8)?;
		let (tx, _rx) = new_channel::<SinkEvent>("sink", 8);
		let mut supervisor = Supervisor::new();
		let worker = DrainWorker::start(consumers, tx, DrainConfig::default(), supervisor.token())?;
		supervisor.spawn(worker.run());

		// -- Exec
		let res = tokio::time::timeout(Duration::from_millis(30), supervisor.first_failure()).await;

		// -- Check
		assert!(res.is_err());
		assert_eq!(supervisor.shutdown().await?.len(), 1);

		Ok(())
	}
}

// endregion: --- Tests
