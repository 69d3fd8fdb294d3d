//! Async boundary around the watermark pipeline.
//!
//! Decoding, compositing and encoding are CPU-bound, so each upload runs as
//! a job on a dedicated `rayon` pool and the async caller awaits a oneshot
//! reply. I/O threads never block on pixel work. An optional timeout lets
//! the caller give up; a late result is dropped when it arrives.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;

use crate::codec::{decode, DecodeLimits};
use crate::config::{Config, WorkerConfig};
use crate::error::{FailureCause, ProcessingFailed, Stage};
use crate::metrics::PipelineMetrics;
use crate::watermark::{LogoSource, WatermarkPipeline, WatermarkRequest, WatermarkedImage};

/// One upload as received at the boundary.
#[derive(Debug, Clone, Default)]
pub struct Upload {
    /// Encoded image bytes
    pub bytes: Vec<u8>,
    pub author: String,
    pub location: String,
    /// Name the file was uploaded under
    pub filename: Option<String>,
    pub logo: LogoSource,
}

impl Upload {
    pub fn new(bytes: Vec<u8>, author: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            bytes,
            author: author.into(),
            location: location.into(),
            filename: None,
            logo: LogoSource::default(),
        }
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn with_logo(mut self, logo: LogoSource) -> Self {
        self.logo = logo;
        self
    }
}

/// Stateless watermarking entry point backed by a worker pool.
#[derive(Clone)]
pub struct WatermarkService {
    pipeline: Arc<WatermarkPipeline>,
    pool: Arc<rayon::ThreadPool>,
    limits: DecodeLimits,
    timeout: Option<Duration>,
}

impl WatermarkService {
    pub fn new(config: &Config) -> Result<Self, rayon::ThreadPoolBuildError> {
        Self::with_pipeline(
            WatermarkPipeline::new(config),
            &config.workers,
            config.limits.clone(),
        )
    }

    pub fn with_pipeline(
        pipeline: WatermarkPipeline,
        workers: &WorkerConfig,
        limits: DecodeLimits,
    ) -> Result<Self, rayon::ThreadPoolBuildError> {
        let threads = match workers.threads {
            0 => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            n => n,
        };

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("photomark-worker-{}", i))
            .panic_handler(|_| tracing::error!("Watermark job panicked"))
            .build()?;

        tracing::info!(
            threads,
            timeout_ms = workers.timeout_ms,
            format = pipeline.output_format().as_str(),
            "Watermark service ready"
        );

        Ok(Self {
            pipeline: Arc::new(pipeline),
            pool: Arc::new(pool),
            limits,
            timeout: workers.timeout(),
        })
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    pub fn pipeline(&self) -> &WatermarkPipeline {
        &self.pipeline
    }

    /// Decode, watermark and encode one upload on the worker pool.
    pub async fn process(&self, upload: Upload) -> Result<WatermarkedImage, ProcessingFailed> {
        let (tx, rx) = oneshot::channel();
        let pipeline = Arc::clone(&self.pipeline);
        let limits = self.limits.clone();

        self.pool.spawn(move || {
            let result = run(&pipeline, &limits, upload);
            // Receiver is gone when the caller timed out
            let _ = tx.send(result);
        });

        let reply = match self.timeout {
            Some(after) => match tokio::time::timeout(after, rx).await {
                Ok(reply) => reply,
                Err(_) => {
                    PipelineMetrics::global().record_run("timeout");
                    tracing::warn!(timeout_ms = after.as_millis() as u64, "Watermark timed out");
                    return Err(ProcessingFailed::new(
                        Stage::Queued,
                        FailureCause::Timeout(after),
                    ));
                }
            },
            None => rx.await,
        };

        reply.unwrap_or_else(|_| {
            Err(ProcessingFailed::new(
                Stage::Queued,
                FailureCause::WorkerUnavailable,
            ))
        })
    }

    /// Same as [`process`](Self::process) on the calling thread.
    pub fn process_blocking(&self, upload: Upload) -> Result<WatermarkedImage, ProcessingFailed> {
        run(&self.pipeline, &self.limits, upload)
    }
}

impl std::fmt::Debug for WatermarkService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatermarkService")
            .field("threads", &self.pool.current_num_threads())
            .field("timeout", &self.timeout)
            .field("pipeline", &self.pipeline)
            .finish()
    }
}

fn run(
    pipeline: &WatermarkPipeline,
    limits: &DecodeLimits,
    upload: Upload,
) -> Result<WatermarkedImage, ProcessingFailed> {
    let canvas = decode(&upload.bytes, limits).map_err(|e| {
        PipelineMetrics::global().record_run("failure");
        tracing::warn!(error = %e, bytes = upload.bytes.len(), "Rejected upload");
        ProcessingFailed::decode(e)
    })?;

    let mut request = WatermarkRequest::new(canvas, upload.author, upload.location)
        .with_logo(upload.logo);
    request.upload_name = upload.filename;

    pipeline.process(request)
}
