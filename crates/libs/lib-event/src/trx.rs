use crate::error::{Error, Result};

/// Bounded named channel. A full channel makes `Tx::send` wait, so a slow
/// receiver pushes back on the sender instead of growing the queue.
pub fn new_channel<T>(name: &'static str, capacity: usize) -> (Tx<T>, Rx<T>) {
	let (tx, rx) = flume::bounded(capacity);

	(Tx(tx, name), Rx(rx, name))
}

pub struct Tx<T>(flume::Sender<T>, &'static str);

impl<T> Tx<T> {
	pub async fn send(&self, value: impl Into<T>) -> Result<()> {
		self.0.send_async(value.into()).await.map_err(|_| Error::EventSend(self.1))
	}

	pub fn name(&self) -> &'static str {
		self.1
	}
}

impl<T> Clone for Tx<T> {
	fn clone(&self) -> Self {
		Self(self.0.clone(), self.1)
	}
}

pub struct Rx<T>(flume::Receiver<T>, &'static str);

impl<T> Rx<T> {
	/// Blocks the calling thread until a value arrives or every sender is gone.
	pub fn recv_sync(&self) -> Result<T> {
		let res = self.0.recv()?;
		Ok(res)
	}

	/// Everything queued right now, without waiting.
	pub fn drain_ready(&self) -> Vec<T> {
		self.0.try_iter().collect()
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn name(&self) -> &'static str {
		self.1
	}
}

// region:    --- Tests


// endregion: --- Tests
