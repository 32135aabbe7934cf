//! Stage 2: turn acquired bands into the tile image.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument};

use super::{Job, StageContext, StageError};
use crate::imagery::{ExtractionRequest, TileExtractor};
use crate::tile::BandTriple;

/// Outcome of one extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Extracted {
    Written,
    AlreadyPresent,
}

/// One worker of the extraction pool. Workers share `queue`; whichever is
/// free takes the next Job.
pub(crate) async fn run(
    worker: usize,
    queue: Arc<Mutex<mpsc::UnboundedReceiver<Job>>>,
    context: Arc<StageContext>,
    shutdown: CancellationToken,
) {
    debug!(worker, "Extraction worker starting");

    loop {
        let job = tokio::select! {
            biased;

            _ = shutdown.cancelled() => break,

            job = async { queue.lock().await.recv().await } => match job {
                Some(job) => job,
                None => break,
            },
        };

        let output = job.output.clone();
        match process(worker, job, &context).await {
            Ok(Extracted::Written) => {
                info!(worker, output = %output.display(), "Tile written");
                context.metrics.tile_written();
            }
            Ok(Extracted::AlreadyPresent) => {
                debug!(worker, output = %output.display(), "Tile already present");
            }
            Err(err) => {
                error!(worker, output = %output.display(), error = %err, "Dropping job");
                context.metrics.extraction_failed();
            }
        }
        context.release(&output);
    }

    let discarded = context.discard(&mut *queue.lock().await);
    debug!(worker, discarded, "Extraction worker stopped");
}

#[instrument(skip(job, context), fields(zone = %job.zone, date = %job.date))]
async fn process(worker: usize, job: Job, context: &StageContext) -> Result<Extracted, StageError> {
    if tokio::fs::try_exists(&job.output).await.unwrap_or(false) {
        return Ok(Extracted::AlreadyPresent);
    }

    let extractor = Arc::clone(&context.extractor);
    tokio::task::spawn_blocking(move || extract(&extractor, &job))
        .await
        .map_err(|e| StageError::Worker(e.to_string()))??;

    Ok(Extracted::Written)
}

/// Maps the Job's bands onto the red, green and blue channels and runs the
/// extractor.
fn extract(extractor: &TileExtractor, job: &Job) -> Result<(), StageError> {
    let indices = job.bands.indices();
    let slots = BandTriple::rgb_slots();
    let band_paths = job
        .band_paths
        .as_ref()
        .ok_or(StageError::BandNotAcquired(indices[slots[0]]))?;

    let mut paths = [Path::new(""); 3];
    for (path, slot) in paths.iter_mut().zip(slots) {
        let band = indices[slot];
        *path = band_paths
            .get(&band)
            .ok_or(StageError::BandNotAcquired(band))?
            .as_path();
    }
    let clips = slots.map(|slot| job.clips[slot]);

    extractor.extract(&ExtractionRequest {
        band_paths: paths,
        clips: &clips,
        bounds: job.bounds,
        output: &job.output,
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::{GeoBounds, LonLat};
    use crate::raster::mock::MockOpener;
    use crate::tile::ClipRange;
    use chrono::NaiveDate;
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn job(output: PathBuf, bands: &[(u8, &str)]) -> Job {
        Job {
            zone: "31TCJ".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            bounds: GeoBounds::new(LonLat::new(0.2, 43.3), LonLat::new(0.6, 43.7)),
            output,
            bands: BandTriple::new([8, 4, 3]).unwrap(),
            clips: [
                ClipRange::new(0.0, 1000.0).unwrap(),
                ClipRange::default(),
                ClipRange::default(),
            ],
            band_paths: Some(
                bands
                    .iter()
                    .map(|(band, path)| (*band, PathBuf::from(path)))
                    .collect::<HashMap<_, _>>(),
            ),
        }
    }

    fn extractor() -> TileExtractor {
        let opener = MockOpener::new()
            .with_band("b08", 1000.0)
            .with_band("b04", 0.0)
            .with_band("b03", 2500.0);
        TileExtractor::new(Arc::new(opener), 16)
    }

    #[test]
    fn test_bands_map_to_channels_with_their_clips() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("tile.png");
        let job = job(output.clone(), &[(8, "b08"), (4, "b04"), (3, "b03")]);

        extract(&extractor(), &job).unwrap();

        let tile = image::open(&output).unwrap().to_rgb8();
        // B03 feeds red, B04 green and B08 blue with its own 0..1000 clip
        assert_eq!(tile.get_pixel(8, 8).0, [255, 0, 255]);
    }

    #[test]
    fn test_missing_band_path() {
        let dir = tempfile::tempdir().unwrap();
        let job = job(dir.path().join("tile.png"), &[(8, "b08"), (3, "b03")]);

        let result = extract(&extractor(), &job);
        assert!(matches!(result, Err(StageError::BandNotAcquired(4))));
    }

    #[test]
    fn test_unacquired_job() {
        let dir = tempfile::tempdir().unwrap();
        let mut job = job(dir.path().join("tile.png"), &[]);
        job.band_paths = None;

        let result = extract(&extractor(), &job);
        assert!(matches!(result, Err(StageError::BandNotAcquired(_))));
    }
}
