//! The media engine boundary.
//!
//! Every encode, remux, frame grab and probe in the pipeline goes through
//! [`MediaEngine`]. [`FfmpegEngine`] is the production implementation; tests
//! substitute their own.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, warn};

use crate::command::{FfmpegCommand, FfmpegInput, FfmpegRunner};
use crate::error::MediaResult;
use crate::filter_graph::FilterGraph;
use crate::frame::frame_job;
use crate::metrics;
use crate::probe::probe_media;
use crate::progress::ProgressCallback;
use feedreel_models::MediaInfo;

/// One engine invocation: inputs, an optional filter graph, and one output file.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderJob {
    /// Short name used in logs and metrics (`normalize`, `compile`, ...)
    pub label: String,
    pub inputs: Vec<FfmpegInput>,
    pub graph: Option<FilterGraph>,
    /// Graph output labels or input stream specifiers to map, in order
    pub maps: Vec<String>,
    pub output_args: Vec<String>,
    pub output: PathBuf,
    /// Expected output duration in seconds, used for progress percentages
    pub expected_duration: Option<f64>,
}

impl RenderJob {
    pub fn new(label: impl Into<String>, output: impl AsRef<Path>) -> Self {
        Self {
            label: label.into(),
            inputs: Vec::new(),
            graph: None,
            maps: Vec::new(),
            output_args: Vec::new(),
            output: output.as_ref().to_path_buf(),
            expected_duration: None,
        }
    }

    pub fn input(mut self, input: FfmpegInput) -> Self {
        self.inputs.push(input);
        self
    }

    pub fn graph(mut self, graph: FilterGraph) -> Self {
        self.graph = Some(graph);
        self
    }

    pub fn map(mut self, label: impl Into<String>) -> Self {
        self.maps.push(label.into());
        self
    }

    pub fn output_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn expected_duration(mut self, seconds: f64) -> Self {
        self.expected_duration = Some(seconds);
        self
    }

    /// Lower the job onto an FFmpeg command line.
    pub fn to_command(&self) -> FfmpegCommand {
        let mut cmd = FfmpegCommand::new(&self.output).inputs(self.inputs.iter().cloned());
        if let Some(graph) = &self.graph {
            cmd = cmd.filter_graph(graph);
        }
        for label in &self.maps {
            cmd = cmd.map(label);
        }
        cmd.output_args(self.output_args.iter().cloned())
    }
}

/// External media-processing engine.
#[async_trait]
pub trait MediaEngine: Send + Sync {
    /// Report stream-level metadata for a file.
    async fn probe(&self, path: &Path) -> MediaResult<MediaInfo>;

    /// Run one job to completion. The output file exists on `Ok`.
    async fn render(&self, job: &RenderJob, progress: Option<ProgressCallback>)
        -> MediaResult<()>;

    /// Write one representative still frame of `video` to `output`.
    ///
    /// `duration` is the clip length already known to the caller; it only
    /// positions the frame, so no metadata read happens here.
    async fn extract_frame(&self, video: &Path, duration: f64, output: &Path) -> MediaResult<()> {
        self.render(&frame_job(video, output, duration), None).await
    }
}

/// FFmpeg/FFprobe subprocess engine.
#[derive(Debug, Clone, Default)]
pub struct FfmpegEngine {
    runner: FfmpegRunner,
}

impl FfmpegEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forward FFmpeg's log output to `debug!`.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.runner = self.runner.with_stderr_forwarding(debug);
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.runner = self.runner.with_timeout(secs);
        self
    }
}

#[async_trait]
impl MediaEngine for FfmpegEngine {
    async fn probe(&self, path: &Path) -> MediaResult<MediaInfo> {
        probe_media(path).await
    }

    async fn render(
        &self,
        job: &RenderJob,
        progress: Option<ProgressCallback>,
    ) -> MediaResult<()> {
        let started = Instant::now();
        let cmd = job.to_command();
        let total_ms = job.expected_duration.map(|d| (d * 1000.0).round() as i64);

        let result = self.runner.run_with_progress(&cmd, total_ms, progress).await;
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        metrics::record_render(&job.label, result.is_ok(), elapsed_ms);

        match &result {
            Ok(()) => debug!(
                job = %job.label,
                output = %job.output.display(),
                elapsed_ms = elapsed_ms as u64,
                "Render finished"
            ),
            Err(e) => warn!(
                job = %job.label,
                output = %job.output.display(),
                error = %e,
                "Render failed"
            ),
        }
        result
    }
}
