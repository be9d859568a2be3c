//! Final compilation render.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use crate::error::{WorkerError, WorkerResult};
use crate::metrics;
use crate::normalizer::NormalizedClip;
use crate::progress::{ProgressObserver, Stage};
use feedreel_media::fs_utils::{copy_file, remove_quietly};
use feedreel_media::{
    build_chain, FfmpegInput, MediaEngine, ProgressCallback, RenderJob, TransitionPlan,
    DEFAULT_SAFE_MARGIN, DEFAULT_TRANSITION_DURATION,
};
use feedreel_models::EncodingConfig;

/// What the final stage produced.
#[derive(Debug, Clone, PartialEq)]
pub enum CompileOutcome {
    /// No clip survived; nothing was written
    Empty,
    /// A single clip, copied as-is
    Single(PathBuf),
    /// Cross-faded compilation
    Rendered { path: PathBuf, offsets: Vec<f64> },
}

impl CompileOutcome {
    pub fn output(&self) -> Option<&Path> {
        match self {
            CompileOutcome::Empty => None,
            CompileOutcome::Single(path) | CompileOutcome::Rendered { path, .. } => Some(path),
        }
    }

    pub fn offsets(&self) -> &[f64] {
        match self {
            CompileOutcome::Rendered { offsets, .. } => offsets,
            _ => &[],
        }
    }
}

pub struct Compiler {
    engine: Arc<dyn MediaEngine>,
    encoding: EncodingConfig,
    transition_duration: f64,
    safe_margin: f64,
    cleanup: bool,
}

impl Compiler {
    pub fn new(engine: Arc<dyn MediaEngine>, encoding: EncodingConfig) -> Self {
        Self {
            engine,
            encoding,
            transition_duration: DEFAULT_TRANSITION_DURATION,
            safe_margin: DEFAULT_SAFE_MARGIN,
            cleanup: false,
        }
    }

    pub fn with_transition(mut self, duration: f64, safe_margin: f64) -> Self {
        self.transition_duration = duration;
        self.safe_margin = safe_margin;
        self
    }

    /// Delete the normalized clips after a successful compile.
    pub fn with_cleanup(mut self, cleanup: bool) -> Self {
        self.cleanup = cleanup;
        self
    }

    /// Stitch `clips` in order into `output`.
    ///
    /// Durations are probed from the normalized files. Clips that do not
    /// outlast the cross-fade are left out with a warning. A render failure
    /// removes the partial output and is returned as [`WorkerError::Render`].
    pub async fn compile(
        &self,
        clips: &[NormalizedClip],
        output: &Path,
        observer: Arc<dyn ProgressObserver>,
    ) -> WorkerResult<CompileOutcome> {
        let outcome = match clips {
            [] => None,
            [single] => Some(self.copy_single(single, output).await?),
            _ => {
                let (usable, durations) = self.usable_clips(clips).await?;
                match usable.as_slice() {
                    [] => None,
                    [single] => Some(self.copy_single(single, output).await?),
                    _ => {
                        let (plan, total) = self.plan(&durations)?;
                        self.render(&usable, &plan, total, output, observer).await?;
                        Some(CompileOutcome::Rendered {
                            path: output.to_path_buf(),
                            offsets: plan.offsets,
                        })
                    }
                }
            }
        };

        let Some(outcome) = outcome else {
            info!("No clips to compile");
            return Ok(CompileOutcome::Empty);
        };

        if self.cleanup {
            for clip in clips {
                remove_quietly(&clip.path).await;
            }
        }

        info!(output = %output.display(), clips = clips.len(), "Compilation written");
        Ok(outcome)
    }

    async fn copy_single(&self, clip: &NormalizedClip, output: &Path) -> WorkerResult<CompileOutcome> {
        copy_file(&clip.path, output)
            .await
            .map_err(|e| WorkerError::render_failed(format!("copy single clip: {}", e)))?;
        Ok(CompileOutcome::Single(output.to_path_buf()))
    }

    /// Probe every clip and keep those longer than the transition.
    async fn usable_clips(
        &self,
        clips: &[NormalizedClip],
    ) -> WorkerResult<(Vec<NormalizedClip>, Vec<f64>)> {
        let mut usable = Vec::with_capacity(clips.len());
        let mut durations = Vec::with_capacity(clips.len());
        for clip in clips {
            let info = self.engine.probe(&clip.path).await.map_err(|e| {
                WorkerError::render_failed(format!("probe {}: {}", clip.path.display(), e))
            })?;
            if info.duration > self.transition_duration {
                usable.push(clip.clone());
                durations.push(info.duration);
            } else {
                warn!(
                    item_id = %clip.id,
                    duration = info.duration,
                    transition = self.transition_duration,
                    "Clip does not outlast the cross-fade, leaving it out"
                );
                metrics::record_item_failure("compile");
            }
        }
        Ok((usable, durations))
    }

    /// Build the chain and the expected output length.
    fn plan(&self, durations: &[f64]) -> WorkerResult<(TransitionPlan, f64)> {
        let plan = build_chain(durations, self.transition_duration, self.safe_margin)
            .map_err(|e| WorkerError::render_failed(e.to_string()))?;
        let total = durations.iter().sum::<f64>()
            - (durations.len() - 1) as f64 * self.transition_duration;
        Ok((plan, total))
    }

    async fn render(
        &self,
        clips: &[NormalizedClip],
        plan: &TransitionPlan,
        expected: f64,
        output: &Path,
        observer: Arc<dyn ProgressObserver>,
    ) -> WorkerResult<()> {
        let mut job = RenderJob::new("compile", output);
        for clip in clips {
            job = job.input(FfmpegInput::file(&clip.path));
        }
        let [video, audio] = plan.output_labels();
        let job = job
            .graph(plan.graph.clone())
            .map(video)
            .map(audio)
            .output_args([
                "-c:v",
                self.encoding.codec.as_str(),
                "-pix_fmt",
                self.encoding.pixel_format.as_str(),
                "-c:a",
                self.encoding.audio_codec.as_str(),
                "-b:a",
                self.encoding.audio_bitrate.as_str(),
                "-movflags",
                "+faststart",
            ]);

        let callback: ProgressCallback =
            Arc::new(move |percent| observer.stage_progress(Stage::Compile, percent));

        let job = if expected > 0.0 {
            job.expected_duration(expected)
        } else {
            job
        };

        if let Err(e) = self.engine.render(&job, Some(callback)).await {
            remove_quietly(output).await;
            return Err(WorkerError::render_failed(e.to_string()));
        }
        Ok(())
    }
}
