#![cfg_attr(not(any(test, feature = "user")), no_std)]

mod record;

#[cfg(feature = "user")]
mod decoded;

pub use record::{SyscallRecord, COMM_LEN, RECORD_SIZE};

#[cfg(feature = "user")]
pub use decoded::DecodedEvent;
