use std::collections::BTreeMap;

use lib_event::trx::Tx;
use lib_ring::{CpuConsumer, CpuId};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::{
	config::DrainConfig,
	decode::decode_record,
	error::{Error, Result},
	report::{ChannelDrops, ChannelStats, DrainSummary, DropReport, SinkEvent},
};

struct ChannelState {
	consumer: CpuConsumer,
	next_seq: u64,
	decode_failures: u64,
	reported: ChannelDrops,
}

impl ChannelState {
	fn drops(&self) -> ChannelDrops {
		ChannelDrops {
			capacity_drops: self.consumer.drops(),
			decode_failures: self.decode_failures,
		}
	}

	fn stats(&self) -> ChannelStats {
		ChannelStats {
			cpu: self.consumer.cpu(),
			delivered: self.next_seq,
			capacity_drops: self.consumer.drops(),
			decode_failures: self.decode_failures,
			undrained: self.consumer.len() as u64,
		}
	}
}

/// Drains a set of per-CPU channels into the sink.
///
/// One worker can own every channel or a single one; a channel is never owned
/// by two workers since `CpuConsumer` cannot be cloned.
pub struct DrainWorker {
	channels: Vec<ChannelState>,
	tx: Tx<SinkEvent>,
	config: DrainConfig,
	shutdown: CancellationToken,
	passes: u64,
}

impl DrainWorker {
	pub fn start(
		consumers: Vec<CpuConsumer>,
		tx: Tx<SinkEvent>,
		config: DrainConfig,
		shutdown: CancellationToken,
	) -> Result<Self> {
		if consumers.is_empty() {
			return Err(Error::NoChannels);
		}

		let channels = consumers
			.into_iter()
			.map(|consumer| ChannelState {
				consumer,
				next_seq: 0,
				decode_failures: 0,
				reported: ChannelDrops::default(),
			})
			.collect();

		Ok(DrainWorker {
			channels,
			tx,
			config,
			shutdown,
			passes: 0,
		})
	}

	pub fn cpus(&self) -> Vec<CpuId> {
		self.channels.iter().map(|c| c.consumer.cpu()).collect()
	}

	/// Poll loop. Cancellation is checked before each pass, so a pass always runs to
	/// completion; whatever is still queued when it stops is left in the channels.
	/// A full sink holds the pass back, and the per-CPU rings absorb the wait and
	/// count what they cannot hold.
	pub async fn run(mut self) -> Result<DrainSummary> {
		info!("drain worker started for cpus {:?}", self.cpus());

		loop {
			if self.shutdown.is_cancelled() {
				break;
			}

			let taken = self.drain_pass().await?;

			if taken > 0 {
				tokio::task::yield_now().await;
				continue;
			}

			tokio::select! {
				_ = self.shutdown.cancelled() => {}
				_ = tokio::time::sleep(self.config.poll_interval) => {}
			}
		}

		let summary = self.summary();
		info!("drain worker for cpus {:?} stopped after {} passes", self.cpus(), summary.passes);

		Ok(summary)
	}

	/// One pass over every owned channel, CPU by CPU. Takes at most one ring's worth
	/// of records per channel so a busy CPU cannot hold the others back.
	/// Returns the number of records taken.
	pub async fn drain_pass(&mut self) -> Result<usize> {
		self.passes += 1;
		let mut taken = 0;

		for chan in self.channels.iter_mut() {
			let cpu = chan.consumer.cpu();

			for _ in 0..chan.consumer.capacity() {
				let Some(record) = chan.consumer.try_take() else {
					break;
				};
				taken += 1;

				match decode_record(&record, cpu, chan.next_seq, self.config.max_syscall_id) {
					Ok(evt) => {
						self.tx.send(evt).await?;
						chan.next_seq += 1;
					}
					Err(err) => {
						chan.decode_failures += 1;
						debug!("discarding record: {err}");
					}
				}
			}
		}

		self.report_drops().await?;

		Ok(taken)
	}

	async fn report_drops(&mut self) -> Result<()> {
		let changed = self.channels.iter().any(|chan| chan.drops() != chan.reported);
		if !changed {
			return Ok(());
		}

		let mut per_cpu = BTreeMap::new();
		for chan in self.channels.iter_mut() {
			let drops = chan.drops();
			chan.reported = drops;
			per_cpu.insert(chan.consumer.cpu(), drops);
		}

		self.tx
			.send(DropReport {
				pass: self.passes,
				per_cpu,
			})
			.await?;

		Ok(())
	}

	pub fn summary(&self) -> DrainSummary {
		DrainSummary {
			passes: self.passes,
			channels: self.channels.iter().map(ChannelState::stats).collect(),
		}
	}
}

// region:    --- Tests


// endregion: --- Tests
