//! Userspace side of the per-CPU syscall channels.
//!
//! A [`DrainWorker`] owns one or more `CpuConsumer`s, polls them in passes,
//! decodes each record and forwards it to the sink together with
//! [`DropReport`]s whenever a channel lost something.

mod config;
mod decode;
mod error;
mod report;
mod worker;

pub use config::{DrainConfig, DEFAULT_MAX_SYSCALL_ID, DEFAULT_POLL_INTERVAL, DEFAULT_SINK_CAPACITY};
pub use decode::decode_record;
pub use error::{Error, Result};
pub use report::{ChannelDrops, ChannelStats, DrainSummary, DropReport, SinkEvent};
pub use worker::DrainWorker;
