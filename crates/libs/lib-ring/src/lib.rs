//! Per-CPU single-producer/single-consumer channels for syscall-entry records.
//!
//! ```text
//!  cpu 0: EventProducer ──► [ ring, 4096 slots, drops ] ──► CpuConsumer
//!  cpu 1: EventProducer ──► [ ring, 4096 slots, drops ] ──► CpuConsumer
//!  ...
//! ```
//!
//! Each ring has exactly one producer and one consumer handle. When a ring is
//! full the newest record is discarded and counted, undrained records are
//! never overwritten.

mod error;
mod percpu;
mod producer;
mod ring;

pub use error::{Error, Result};
pub use percpu::{allocate, CpuConsumer, CpuId, DEFAULT_CAPACITY};
pub use producer::{EventProducer, TaskContext};
pub use ring::{channel, PushOutcome, Reserve, ReservedSlot, RingConsumer, RingProducer, WrittenSlot};
