use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use humantime::Duration;
use lib_drain::{DEFAULT_MAX_SYSCALL_ID, DEFAULT_POLL_INTERVAL};
use lib_ring::DEFAULT_CAPACITY;

#[derive(Parser, Debug)]
#[command(name = "secmon", about = "Per-CPU syscall-entry event pipeline")]
pub struct Cli {
	#[arg(long, help = "Run duration (e.g., 20s, 5m, 1h). Runs until Ctrl-C when omitted")]
	pub time: Option<Duration>,

	#[arg(long, default_value_t = DEFAULT_CAPACITY, help = "Slots per CPU channel")]
	pub capacity: usize,

	#[arg(long, default_value_t = Duration::from(DEFAULT_POLL_INTERVAL), help = "Sleep between empty drain passes")]
	pub poll_interval: Duration,

	#[arg(long, default_value_t = DEFAULT_MAX_SYSCALL_ID, help = "Highest syscall number the decoder accepts")]
	pub max_syscall_id: u32,

	#[arg(long, default_value_t = 1, help = "Drain workers; CPUs are dealt to them round-robin")]
	pub consumers: usize,

	#[arg(long, default_value_t = 1000, help = "Simulated syscall entries per second per online CPU")]
	pub rate: u64,

	#[arg(long, value_enum, default_value = "text")]
	pub format: OutputFormat,

	#[arg(long, help = "Write a JSON run summary to this path at exit")]
	pub stats_file: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
	Text,
	Json,
}

// region:    --- Tests


// endregion: --- Tests
