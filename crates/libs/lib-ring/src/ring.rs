use std::{
	cell::UnsafeCell,
	sync::{
		atomic::{AtomicU64, Ordering},
		Arc,
	},
};

use lib_record::SyscallRecord;

use crate::error::{Error, Result};

/// Cursor on its own cache line so the producer and consumer do not false-share.
#[repr(C, align(64))]
struct Cursor(AtomicU64);

impl Cursor {
	const fn new() -> Self {
		Cursor(AtomicU64::new(0))
	}
}

/// Fixed-capacity single-producer/single-consumer record ring.
///
/// Positions are monotonically increasing `u64`s; a slot index is the position
/// modulo capacity. `write` is only stored by the producer, `read` only by the
/// consumer, `drops` only by the producer.
struct Ring {
	slots: Box<[UnsafeCell<SyscallRecord>]>,
	write: Cursor,
	read: Cursor,
	drops: Cursor,
}

// Slot access is partitioned by the cursors: the producer only writes the slot at
// `write` once `read` shows it released, the consumer only reads slots in
// `[read, write)`.
unsafe impl Sync for Ring {}

impl Ring {
	fn capacity(&self) -> u64 {
		self.slots.len() as u64
	}

	fn slot(&self, pos: u64) -> &UnsafeCell<SyscallRecord> {
		&self.slots[(pos % self.capacity()) as usize]
	}
}

/// Allocates one ring and returns its only producer and only consumer handle.
pub fn channel(capacity: usize) -> Result<(RingProducer, RingConsumer)> {
	if capacity == 0 {
		return Err(Error::ZeroCapacity);
	}

	let slots = (0..capacity)
		.map(|_| UnsafeCell::new(SyscallRecord::EMPTY))
		.collect::<Vec<_>>()
		.into_boxed_slice();

	let ring = Arc::new(Ring {
		slots,
		write: Cursor::new(),
		read: Cursor::new(),
		drops: Cursor::new(),
	});

	let producer = RingProducer {
		ring: ring.clone(),
		head: 0,
		cached_tail: 0,
		dropped: 0,
	};
	let consumer = RingConsumer {
		ring,
		tail: 0,
		cached_head: 0,
	};

	Ok((producer, consumer))
}

// region:    --- Producer

/// Producer side of a ring. Not `Clone`: one producer per ring.
pub struct RingProducer {
	ring: Arc<Ring>,
	head: u64,
	cached_tail: u64,
	dropped: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reserve {
	Full,
}

impl RingProducer {
	/// Reserves the next free slot, or `Full` when the consumer has not released one.
	///
	/// Only re-reads the consumer cursor when the cached copy says the ring is full.
	#[inline]
	pub fn try_reserve(&mut self) -> core::result::Result<ReservedSlot<'_>, Reserve> {
		let capacity = self.ring.capacity();

		if self.head - self.cached_tail == capacity {
			self.cached_tail = self.ring.read.0.load(Ordering::Acquire);
			if self.head - self.cached_tail == capacity {
				return Err(Reserve::Full);
			}
		}

		Ok(ReservedSlot { producer: self })
	}

	/// Counts one discarded record. Single writer, so a plain release store is enough.
	#[inline]
	pub fn record_drop(&mut self) {
		self.dropped += 1;
		self.ring.drops.0.store(self.dropped, Ordering::Release);
	}

	/// Reserve, write and publish in one call; on a full ring the record is dropped and counted.
	#[inline]
	pub fn push(&mut self, record: SyscallRecord) -> PushOutcome {
		match self.try_reserve() {
			Ok(slot) => {
				slot.write(record).publish();
				PushOutcome::Published
			}
			Err(Reserve::Full) => {
				self.record_drop();
				PushOutcome::Dropped
			}
		}
	}

	pub fn capacity(&self) -> usize {
		self.ring.slots.len()
	}

	pub fn dropped(&self) -> u64 {
		self.dropped
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
	Published,
	Dropped,
}

/// A reserved but not yet written slot. Dropping it releases the reservation.
pub struct ReservedSlot<'a> {
	producer: &'a mut RingProducer,
}

impl<'a> ReservedSlot<'a> {
	#[inline]
	pub fn write(self, record: SyscallRecord) -> WrittenSlot<'a> {
		let slot = self.producer.ring.slot(self.producer.head);
		// The slot at `head` was released by the consumer (checked in `try_reserve`)
		// and is not visible to it until `publish` advances the write cursor.
		unsafe { slot.get().write(record) };

		WrittenSlot { producer: self.producer }
	}
}

/// A fully written slot waiting to be made visible to the consumer.
pub struct WrittenSlot<'a> {
	producer: &'a mut RingProducer,
}

impl WrittenSlot<'_> {
	/// Release-stores the advanced write cursor, ordering it after the slot write.
	#[inline]
	pub fn publish(self) {
		let producer = self.producer;
		producer.head += 1;
		producer.ring.write.0.store(producer.head, Ordering::Release);
	}
}

// endregion: --- Producer

// region:    --- Consumer

/// Consumer side of a ring. Not `Clone`: one consumer per ring.
pub struct RingConsumer {
	ring: Arc<Ring>,
	tail: u64,
	cached_head: u64,
}

impl RingConsumer {
	/// Copies out the oldest published record and releases its slot.
	#[inline]
	pub fn try_take(&mut self) -> Option<SyscallRecord> {
		if self.tail == self.cached_head {
			self.cached_head = self.ring.write.0.load(Ordering::Acquire);
			if self.tail == self.cached_head {
				return None;
			}
		}

		let slot = self.ring.slot(self.tail);
		// Published: the acquire load above synchronizes with the producer's
		// release store, and the producer cannot reuse the slot until `read` moves.
		let record = unsafe { slot.get().read() };

		self.tail += 1;
		self.ring.read.0.store(self.tail, Ordering::Release);

		Some(record)
	}

	/// Cumulative records discarded because the ring was full. May lag the
	/// producer by one increment.
	pub fn drops(&self) -> u64 {
		self.ring.drops.0.load(Ordering::Acquire)
	}

	/// Published records not yet taken.
	pub fn len(&self) -> usize {
		let head = self.ring.write.0.load(Ordering::Acquire);
		(head - self.tail) as usize
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn capacity(&self) -> usize {
		self.ring.slots.len()
	}
}

// endregion: --- Consumer

// region:    --- Tests


// endregion: --- Tests
