use derive_more::{Display, From};
use tokio::task::JoinError;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Display, From)]
#[display("{self:?}")]
pub enum Error {
	#[from(String, &String, &str)]
	Custom(String),
	InvalidRate,
	InvalidConsumers,
	CpuTopology {
		path: &'static str,
		err: std::io::Error,
	},
	LoadThreadPanicked(u32),
	SinkClosed,

	// -- Externals
	#[from]
	JoinError(JoinError),
	#[from]
	Ring(lib_ring::Error),
	#[from]
	Drain(lib_drain::Error),
	#[from]
	Event(lib_event::Error),
	#[from]
	Json(serde_json::Error),
	#[from]
	Io(std::io::Error),
}

// region:    --- Custom

impl Error {
	pub fn custom(val: impl Into<String>) -> Self {
		Self::Custom(val.into())
	}
}

// endregion: --- Custom

// region:    --- Error Boilerplate

impl std::error::Error for Error {}

// endregion: --- Error Boilerplate
