use derive_more::Display;

pub type Result<T> = core::result::Result<T, Error>;

/// Setup-time failures. Nothing on the producer path returns an error.
#[derive(Debug, Display)]
#[display("{self:?}")]
pub enum Error {
	ZeroCapacity,
	NoCpus,
	DuplicateCpu(u32),
}

// region:    --- Error Boilerplate

impl std::error::Error for Error {}

// endregion: --- Error Boilerplate
