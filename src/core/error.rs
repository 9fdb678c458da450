// Copyright @yucwang 2026

use std::fmt;

/// Errors that abort a render job. Cancellation is not one of them: it is
/// reported as `Ok(false)` by `SamplingIntegrator::render`.
#[derive(Debug)]
pub enum RenderError {
    /// Invalid settings, detected before any work is dispatched.
    Config(String),
    /// The sample count is not a multiple of the per-pass budget.
    SampleCount { sample_count: u32, samples_per_pass: u32 },
    /// The block generator produced a block of zero area.
    EmptyBlock,
    /// Failure raised by a light-transport estimator.
    Estimator(String),
    /// A worker thread panicked.
    Worker(String),
    /// Encoding or writing the output image failed.
    Output(String),
    Io(std::io::Error),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::Config(msg) => write!(f, "invalid configuration: {}", msg),
            RenderError::SampleCount { sample_count, samples_per_pass } => write!(
                f,
                "sample_count ({}) must be a multiple of samples_per_pass ({})",
                sample_count, samples_per_pass
            ),
            RenderError::EmptyBlock => write!(f, "internal error: generated empty image block"),
            RenderError::Estimator(msg) => write!(f, "estimator failed: {}", msg),
            RenderError::Worker(msg) => write!(f, "render worker panicked: {}", msg),
            RenderError::Output(msg) => write!(f, "failed to write image: {}", msg),
            RenderError::Io(e) => write!(f, "i/o error: {}", e),
        }
    }
}

impl std::error::Error for RenderError {}

impl From<std::io::Error> for RenderError {
    fn from(err: std::io::Error) -> Self {
        RenderError::Io(err)
    }
}
