use std::collections::BTreeMap;

use derive_more::From;
use lib_record::DecodedEvent;
use lib_ring::CpuId;
use serde::Serialize;

/// What a drain worker hands to the sink.
#[derive(From, Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SinkEvent {
	#[from]
	Event(DecodedEvent),
	#[from]
	Drops(DropReport),
}

/// Cumulative loss on one channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChannelDrops {
	/// Records discarded by the producer because the channel was full.
	pub capacity_drops: u64,
	/// Records taken but rejected by the decoder.
	pub decode_failures: u64,
}

/// Per-CPU cumulative drops, emitted after a pass in which any of them changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DropReport {
	pub pass: u64,
	pub per_cpu: BTreeMap<CpuId, ChannelDrops>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChannelStats {
	pub cpu: CpuId,
	pub delivered: u64,
	pub capacity_drops: u64,
	pub decode_failures: u64,
	/// Published but never taken because the worker stopped first.
	pub undrained: u64,
}

impl ChannelStats {
	/// Every publish attempt on this channel, however it ended.
	pub fn accounted(&self) -> u64 {
		self.delivered + self.capacity_drops + self.decode_failures + self.undrained
	}
}

/// Final state of a drain worker once it stops.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DrainSummary {
	pub passes: u64,
	pub channels: Vec<ChannelStats>,
}
