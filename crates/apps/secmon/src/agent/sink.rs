use std::io::{BufWriter, Write};

use lib_drain::{DropReport, SinkEvent};
use lib_event::trx::Rx;
use lib_record::DecodedEvent;
use tracing::{info, warn};

use crate::{cli::args::OutputFormat, Result};

/// What the sink saw before its channel closed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SinkStats {
	pub events: u64,
	pub drop_reports: u64,
}

/// Formats sink items onto `out`: a column table, or one JSON object per line.
pub struct Printer<W: Write> {
	out: W,
	format: OutputFormat,
	stats: SinkStats,
}

impl<W: Write> Printer<W> {
	pub fn new(out: W, format: OutputFormat) -> Self {
		Printer {
			out,
			format,
			stats: SinkStats::default(),
		}
	}

	pub fn header(&mut self) -> Result<()> {
		if self.format == OutputFormat::Text {
			writeln!(
				self.out,
				"{:<16} {:>8} {:>10} {:>4} {:>10} {:>20}",
				"COMM", "PID", "SYSCALL_ID", "CPU", "SEQ", "CGROUP"
			)?;
		}
		Ok(())
	}

	pub fn write(&mut self, item: &SinkEvent) -> Result<()> {
		match item {
			SinkEvent::Event(evt) => {
				self.stats.events += 1;
				self.event(item, evt)
			}
			SinkEvent::Drops(report) => {
				self.stats.drop_reports += 1;
				self.drops(item, report)
			}
		}
	}

	fn event(&mut self, item: &SinkEvent, evt: &DecodedEvent) -> Result<()> {
		match self.format {
			OutputFormat::Text => writeln!(
				self.out,
				"{:<16} {:>8} {:>10} {:>4} {:>10} {:>20}",
				evt.comm, evt.pid, evt.syscall_id, evt.cpu, evt.seq, evt.cgroup_id
			)?,
			OutputFormat::Json => self.json_line(item)?,
		}
		Ok(())
	}

	fn drops(&mut self, item: &SinkEvent, report: &DropReport) -> Result<()> {
		match self.format {
			OutputFormat::Text => {
				for (cpu, drops) in report.per_cpu.iter() {
					if drops.capacity_drops > 0 || drops.decode_failures > 0 {
						warn!(
							"[pass {}] cpu {cpu}: {} capacity drops, {} decode failures",
							report.pass, drops.capacity_drops, drops.decode_failures
						);
					}
				}
			}
			OutputFormat::Json => self.json_line(item)?,
		}
		Ok(())
	}

	fn json_line(&mut self, item: &SinkEvent) -> Result<()> {
		serde_json::to_writer(&mut self.out, item)?;
		self.out.write_all(b"\n")?;
		Ok(())
	}

	pub fn flush(&mut self) -> Result<()> {
		self.out.flush()?;
		Ok(())
	}

	pub fn stats(&self) -> SinkStats {
		self.stats
	}
}

/// Prints everything the drain workers send until the last of them hangs up.
///
/// Blocks on the channel and on stdout, so it runs on a blocking thread.
pub fn run_sink(rx: Rx<SinkEvent>, format: OutputFormat) -> Result<SinkStats> {
	let mut printer = Printer::new(BufWriter::new(std::io::stdout().lock()), format);
	printer.header()?;

	loop {
		let first = match rx.recv_sync() {
			Ok(item) => item,
			Err(err) => {
				info!("{} channel closed: {err}", rx.name());
				break;
			}
		};

		for item in std::iter::once(first).chain(rx.drain_ready()) {
			printer.write(&item)?;
		}
		printer.flush()?;
	}

	Ok(printer.stats())
}

// region:    --- Tests


// endregion: --- Tests
