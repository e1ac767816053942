use std::{collections::BTreeMap, fs::File, io::BufWriter, path::Path, time::Duration};

use lib_drain::{ChannelStats, DrainSummary};
use lib_ring::CpuId;
use serde::Serialize;
use tracing::{info, warn};

use super::sink::SinkStats;
use crate::{loadgen::LoadStats, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CpuSummary {
	pub cpu: CpuId,
	pub attempts: u64,
	pub delivered: u64,
	pub capacity_drops: u64,
	pub decode_failures: u64,
	pub undrained: u64,
	/// Every attempt ended up delivered, dropped, rejected or still queued.
	pub conserved: bool,
}

impl CpuSummary {
	pub fn accounted(&self) -> u64 {
		self.delivered + self.capacity_drops + self.decode_failures + self.undrained
	}
}

/// End-of-run accounting, joined from the producer and consumer sides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
	pub elapsed_ms: u64,
	pub passes: u64,
	pub printed: u64,
	pub drop_reports: u64,
	pub cpus: Vec<CpuSummary>,
}

impl RunSummary {
	pub fn build(load: &[LoadStats], drains: &[DrainSummary], sink: SinkStats, elapsed: Duration) -> Self {
		let channels: BTreeMap<CpuId, ChannelStats> = drains
			.iter()
			.flat_map(|d| d.channels.iter())
			.map(|c| (c.cpu, *c))
			.collect();

		let cpus = load
			.iter()
			.map(|l| {
				let chan = channels.get(&l.cpu).copied().unwrap_or(ChannelStats {
					cpu: l.cpu,
					..ChannelStats::default()
				});
				CpuSummary {
					cpu: l.cpu,
					attempts: l.attempts,
					delivered: chan.delivered,
					capacity_drops: chan.capacity_drops,
					decode_failures: chan.decode_failures,
					undrained: chan.undrained,
					conserved: l.attempts == chan.accounted(),
				}
			})
			.collect();

		RunSummary {
			elapsed_ms: elapsed.as_millis() as u64,
			passes: drains.iter().map(|d| d.passes).sum(),
			printed: sink.events,
			drop_reports: sink.drop_reports,
			cpus,
		}
	}

	pub fn conserved(&self) -> bool {
		self.cpus.iter().all(|c| c.conserved)
	}

	pub fn delivered(&self) -> u64 {
		self.cpus.iter().map(|c| c.delivered).sum()
	}

	pub fn log(&self) {
		let attempts: u64 = self.cpus.iter().map(|c| c.attempts).sum();
		let drops: u64 = self.cpus.iter().map(|c| c.capacity_drops).sum();
		let failures: u64 = self.cpus.iter().map(|c| c.decode_failures).sum();
		let undrained: u64 = self.cpus.iter().map(|c| c.undrained).sum();

		info!(
			"run summary: {attempts} attempts, {} delivered, {drops} dropped, {failures} rejected, {undrained} undrained",
			self.delivered()
		);
		info!("{} drain passes in {}ms", self.passes, self.elapsed_ms);

		for c in self.cpus.iter().filter(|c| !c.conserved) {
			warn!(
				"cpu {}: {} attempts but only {} accounted for",
				c.cpu,
				c.attempts,
				c.accounted()
			);
		}
		if self.printed != self.delivered() {
			warn!("sink printed {} events, workers delivered {}", self.printed, self.delivered());
		}
		if self.conserved() {
			info!("every attempt accounted for on all {} cpus", self.cpus.len());
		}
	}

	pub fn write_json(&self, path: &Path) -> Result<()> {
		let file = BufWriter::new(File::create(path)?);
		serde_json::to_writer_pretty(file, self)?;
		info!("run summary written to {}", path.display());

		Ok(())
	}
}

// region:    --- Tests

#[cfg(test)]
mod tests {
	type Result<T> = core::result::Result<T, Box<dyn std::error::Error>>; // For tests.

	use super::*;

	fn fx_drains() -> Vec<DrainSummary> {
		vec![
			DrainSummary {
				passes: 10,
				channels: vec![ChannelStats {
					cpu: 0,
					delivered: 90,
					capacity_drops: 8,
					decode_failures: 0,
					undrained: 2,
				}],
			},
			DrainSummary {
				passes: 12,
				channels: vec![ChannelStats {
					cpu: 1,
					delivered: 50,
					capacity_drops: 0,
					decode_failures: 1,
					undrained: 0,
				}],
			},
		]
	}

	fn fx_load(attempts: [u64; 3]) -> Vec<LoadStats> {
		attempts
			.iter()
			.enumerate()
			.map(|(cpu, &attempts)| LoadStats {
				cpu: cpu as CpuId,
				attempts,
				..LoadStats::default()
			})
			.collect()
	}

	#[test]
	fn build_joins_producer_and_consumer_sides() -> Result<()> {
		// -- Setup & Fixtures
		let sink = SinkStats {
			events: 140,
			drop_reports: 3,
		};

		// -- Exec
		let summary = RunSummary::build(&fx_load([100, 51, 0]), &fx_drains(), sink, Duration::from_secs(2));

		// -- Check
		assert_eq!(summary.passes, 22);
		assert_eq!(summary.elapsed_ms, 2000);
		assert_eq!(summary.cpus.len(), 3);
		assert_eq!(summary.cpus[0].undrained, 2);
		assert_eq!(summary.cpus[2].delivered, 0, "cpu without a drained channel");
		assert!(summary.conserved());
		assert_eq!(summary.delivered(), 140);

		Ok(())
	}

	#[test]
	fn missing_records_break_conservation() -> Result<()> {
		// -- Exec
		let summary = RunSummary::build(&fx_load([101, 51, 0]), &fx_drains(), SinkStats::default(), Duration::ZERO);

		// -- Check
		assert!(!summary.cpus[0].conserved);
		assert_eq!(summary.cpus[0].accounted(), 100);
		assert!(summary.cpus[1].conserved);
		assert!(!summary.conserved());

		Ok(())
	}

	#[test]
	fn stats_file_is_pretty_json() -> Result<()> {
		// -- Setup & Fixtures
		let summary = RunSummary::build(&fx_load([100, 51, 0]), &fx_drains(), SinkStats::default(), Duration::ZERO);
		let path = std::env::temp_dir().join(format!("secmon-summary-{}.json", std::process::id()));

		// -- Exec
		summary.write_json(&path)?;

		// -- Check
		let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
		std::fs::remove_file(&path)?;
		assert_eq!(value["passes"], 22);
		assert_eq!(value["cpus"][1]["decode_failures"], 1);
		assert_eq!(value["cpus"][1]["conserved"], true);

		Ok(())
	}
}

// endregion: --- Tests
