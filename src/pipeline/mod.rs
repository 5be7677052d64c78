//! Pipeline components: work queue, workers, batch driver, summary.

pub mod context;
pub mod orchestrator;
pub mod queue;
pub mod summary;
pub mod workers;

use std::time::Duration;

pub use context::{PipelineChannels, WorkerShared, create_pipeline_channels};
pub use orchestrator::{BatchDriver, build_list};
pub use queue::WorkQueue;
pub use summary::{log_batch_summary, write_summary_json};
pub use workers::spawn_workers;

/// How long the driver waits on the report channel before checking that workers are alive.
pub const REPORT_POLL_INTERVAL: Duration = Duration::from_millis(500);
