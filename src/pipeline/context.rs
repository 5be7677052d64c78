//! Shared state handed to each worker thread.

use crossbeam_channel::{Receiver, Sender, unbounded};
use std::sync::Arc;

use crate::engine::archive::Archiver;
use crate::engine::builder::{SerializedBuilder, TreeBuilder};
use crate::engine::job::{Job, JobContext};
use crate::pipeline::queue::WorkQueue;
use crate::{BuildOpts, DecompressFailurePolicy, JobReport};

/// What every worker holds: the queue it pops from, the collaborators jobs run against,
/// and the sender for finished reports.
#[derive(Clone)]
pub struct WorkerShared {
    pub queue: Arc<WorkQueue<Job>>,
    pub builder: Arc<dyn TreeBuilder>,
    pub archiver: Arc<dyn Archiver>,
    pub on_decompress_failure: DecompressFailurePolicy,
    pub report_tx: Sender<JobReport>,
}

impl WorkerShared {
    pub fn job_context(&self) -> JobContext<'_> {
        JobContext {
            builder: self.builder.as_ref(),
            archiver: self.archiver.as_ref(),
            on_decompress_failure: self.on_decompress_failure,
        }
    }
}

/// Queue and report channel for one driver. Workers get `shared`; the driver keeps `report_rx`.
pub struct PipelineChannels {
    pub shared: WorkerShared,
    pub report_rx: Receiver<JobReport>,
}

pub fn create_pipeline_channels(
    opts: &BuildOpts,
    builder: Arc<dyn TreeBuilder>,
    archiver: Arc<dyn Archiver>,
) -> PipelineChannels {
    let (report_tx, report_rx) = unbounded::<JobReport>();
    let builder: Arc<dyn TreeBuilder> = if opts.serialize_builds {
        Arc::new(SerializedBuilder::new(builder))
    } else {
        builder
    };
    PipelineChannels {
        shared: WorkerShared {
            queue: Arc::new(WorkQueue::new()),
            builder,
            archiver,
            on_decompress_failure: opts.on_decompress_failure,
            report_tx,
        },
        report_rx,
    }
}
