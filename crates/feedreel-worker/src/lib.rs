//! Feed-to-compilation pipeline.
//!
//! This crate provides:
//! - Run configuration and the command-line surface
//! - The compliance filter over probed items
//! - Acquisition with on-disk caching
//! - Chunked normalization to one shared frame
//! - The final cross-fade compilation render
//! - Run orchestration and reporting

pub mod acquisition;
pub mod cli;
pub mod compiler;
pub mod compliance;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod normalizer;
pub mod pipeline;
pub mod progress;

#[cfg(test)]
mod testing;

pub use acquisition::Acquirer;
pub use cli::Cli;
pub use compiler::{CompileOutcome, Compiler};
pub use compliance::ComplianceFilter;
pub use config::WorkerConfig;
pub use error::{WorkerError, WorkerResult};
pub use logging::{init_tracing, RunLogger};
pub use normalizer::{NormalizedClip, Normalizer};
pub use pipeline::{Pipeline, RunReport};
pub use progress::{LoggingObserver, NoopObserver, ProgressObserver, Stage};
