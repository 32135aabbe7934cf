//! Stage 1: make a Job's band files available locally.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use super::{Job, StageContext, StageError};

/// Consumes Jobs in FIFO order until the queue closes or `shutdown` fires.
pub(crate) async fn run(
    mut queue: mpsc::UnboundedReceiver<Job>,
    extraction: mpsc::UnboundedSender<Job>,
    context: Arc<StageContext>,
    shutdown: CancellationToken,
) {
    info!("Acquisition worker starting");

    loop {
        let job = tokio::select! {
            biased;

            _ = shutdown.cancelled() => break,

            job = queue.recv() => match job {
                Some(job) => job,
                None => break,
            },
        };

        let output = job.output.clone();
        match acquire(job, &context).await {
            Ok(job) => {
                context.metrics.acquisition_completed();
                if let Err(mpsc::error::SendError(job)) = extraction.send(job) {
                    warn!(job = %job, "Extraction queue closed, dropping job");
                    context.release(&output);
                }
            }
            Err(error) => {
                warn!(output = %output.display(), error = %error, "Dropping job");
                context.metrics.acquisition_failed();
                context.release(&output);
            }
        }
    }

    let discarded = context.discard(&mut queue);
    info!(discarded, "Acquisition worker stopped");
}

/// Fetches the Job's bands on a blocking thread and attaches their paths.
#[instrument(skip_all, fields(zone = %job.zone, date = %job.date))]
async fn acquire(mut job: Job, context: &StageContext) -> Result<Job, StageError> {
    let provider = Arc::clone(&context.provider);
    let zone = job.zone.clone();
    let date = job.date;
    let bands = job.bands;

    let band_paths = tokio::task::spawn_blocking(move || {
        provider.find_product_in_zone(&zone, date, &bands)
    })
    .await
    .map_err(|e| StageError::Worker(e.to_string()))??;

    info!(bands = %job.bands, "Bands acquired");
    job.band_paths = Some(band_paths);
    Ok(job)
}
