mod sink;
mod summary;

pub use sink::{run_sink, SinkStats};
pub use summary::RunSummary;
