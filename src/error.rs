// Error types module

use std::fmt;
use std::time::Duration;

use crate::codec::CodecError;

/// Pipeline stage reached by a watermark request.
///
/// Stages advance strictly in declaration order. `Queued` covers the time a
/// request spends waiting for (or being lost by) the worker pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    Queued,
    Decoded,
    Normalized,
    Planned,
    PlateBuilt,
    TextComposited,
    LogoComposited,
    Encoded,
}

impl Stage {
    /// Metric/log label for this stage
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Queued => "queued",
            Stage::Decoded => "decoded",
            Stage::Normalized => "normalized",
            Stage::Planned => "planned",
            Stage::PlateBuilt => "plate_built",
            Stage::TextComposited => "text_composited",
            Stage::LogoComposited => "logo_composited",
            Stage::Encoded => "encoded",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Underlying reason a watermark request failed
#[derive(Debug, Clone)]
pub enum FailureCause {
    /// Input could not be turned into a canvas
    Decode(CodecError),
    /// Canvas could not be resampled
    Resize(String),
    /// Encoder rejected the canvas
    Encode(CodecError),
    /// The boundary gave up waiting for the result
    Timeout(Duration),
    /// Worker pool dropped the job without answering
    WorkerUnavailable,
}

impl fmt::Display for FailureCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureCause::Decode(e) => write!(f, "{}", e),
            FailureCause::Resize(msg) => write!(f, "Resize failed: {}", msg),
            FailureCause::Encode(e) => write!(f, "{}", e),
            FailureCause::Timeout(after) => {
                write!(f, "Processing timeout after {}ms", after.as_millis())
            }
            FailureCause::WorkerUnavailable => write!(f, "Worker pool unavailable"),
        }
    }
}

/// The single outward failure of a watermark request.
///
/// Carries the last stage that completed successfully and the cause that
/// stopped the pipeline. No partial output accompanies a failure.
#[derive(Debug, Clone)]
pub struct ProcessingFailed {
    pub stage: Stage,
    pub cause: FailureCause,
}

impl ProcessingFailed {
    pub fn new(stage: Stage, cause: FailureCause) -> Self {
        Self { stage, cause }
    }

    pub fn decode(error: CodecError) -> Self {
        Self::new(Stage::Queued, FailureCause::Decode(error))
    }

    pub fn encode(stage: Stage, error: CodecError) -> Self {
        Self::new(stage, FailureCause::Encode(error))
    }
}

impl fmt::Display for ProcessingFailed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "processing failed at {}: {}", self.stage, self.cause)
    }
}

impl std::error::Error for ProcessingFailed {}
