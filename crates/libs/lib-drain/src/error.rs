use derive_more::{Display, From};

use lib_ring::CpuId;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Display, From)]
#[display("{self:?}")]
pub enum Error {
	SyscallOutOfRange { cpu: CpuId, syscall_id: u32 },
	NoChannels,

	// -- Externals
	#[from]
	Event(lib_event::Error),
}

// region:    --- Error Boilerplate

impl std::error::Error for Error {}

// endregion: --- Error Boilerplate
