// region:    --- Modules
mod agent;
mod cli;
mod error;
mod loadgen;
mod supervisor;
mod topology;
// endregion: --- Modules

pub use self::error::{Error, Result};

use std::time::{Duration, Instant};

use agent::{run_sink, RunSummary, SinkStats};
use clap::Parser;
use cli::args::Cli;
use lib_drain::{DrainConfig, DrainWorker, SinkEvent, DEFAULT_SINK_CAPACITY};
use lib_event::trx::new_channel;
use lib_ring::allocate;
use loadgen::LoadGenerator;
use supervisor::Supervisor;
use tokio::task::JoinHandle;
use topology::{partition_round_robin, Topology};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
	let args = Cli::parse();
	// Events go to stdout, logs to stderr.
	tracing_subscriber::fmt()
		.with_target(false)
		.with_writer(std::io::stderr)
		.with_env_filter(EnvFilter::from_default_env())
		.init();

	if args.rate == 0 {
		return Err(Error::InvalidRate);
	}
	if args.consumers == 0 {
		return Err(Error::InvalidConsumers);
	}

	let topology = Topology::discover()?;
	let (producers, consumers) = allocate(&topology.possible, args.capacity)?;

	let config = DrainConfig {
		poll_interval: *args.poll_interval,
		max_syscall_id: args.max_syscall_id,
	};
	let (sink_tx, sink_rx) = new_channel::<SinkEvent>("sink", DEFAULT_SINK_CAPACITY);

	let mut supervisor = Supervisor::new();
	for part in partition_round_robin(consumers, args.consumers) {
		let worker = DrainWorker::start(part, sink_tx.clone(), config, supervisor.token())?;
		supervisor.spawn(worker.run());
	}
	// The sink stops once every worker has dropped its sender.
	drop(sink_tx);
	let format = args.format;
	let mut sink_handle = tokio::task::spawn_blocking(move || run_sink(sink_rx, format));

	let cgroup_id = loadgen::cgroup_id().unwrap_or_else(|err| {
		warn!("cgroup id unavailable, recording 0: {err}");
		0
	});

	let started = Instant::now();
	let load = LoadGenerator::start(producers, &topology.online, args.rate, cgroup_id)?;

	let stopped = wait_for_stop(args.time.map(Into::into), &mut supervisor, &mut sink_handle).await;

	// Producers are joined before the workers stop, so the counters the workers
	// summarise are final. They are joined on failure too.
	let load_stats = tokio::task::spawn_blocking(move || load.stop()).await??;
	stopped?;
	let drains = supervisor.shutdown().await?;
	let sink_stats = sink_handle.await??;

	let summary = RunSummary::build(&load_stats, &drains, sink_stats, started.elapsed());
	summary.log();
	if let Some(path) = args.stats_file.as_deref() {
		summary.write_json(path)?;
	}

	Ok(())
}

/// Returns once the run time is up or Ctrl-C arrives. A drain worker failing or
/// the sink stopping before that ends the wait with its error.
async fn wait_for_stop(
	time: Option<Duration>,
	supervisor: &mut Supervisor,
	sink: &mut JoinHandle<Result<SinkStats>>,
) -> Result<()> {
	let run_time = async {
		match time {
			Some(time) => {
				tokio::time::sleep(time).await;
				info!("run time of {} elapsed", humantime::format_duration(time));
			}
			None => {
				info!("running until Ctrl-C");
				std::future::pending::<()>().await;
			}
		}
	};

	tokio::select! {
		_ = run_time => {}
		res = tokio::signal::ctrl_c() => {
			res?;
			info!("Ctrl-C received");
		}
		err = supervisor.first_failure() => {
			warn!("drain worker failed, stopping: {err}");
			return Err(err);
		}
		res = sink => {
			let err = match res {
				Ok(Ok(_)) => Error::SinkClosed,
				Ok(Err(err)) => err,
				Err(err) => err.into(),
			};
			warn!("sink stopped early: {err}");
			return Err(err);
		}
	}

	Ok(())
}

// region:    --- Tests


// endregion: --- Tests
