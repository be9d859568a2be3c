//! Test doubles shared by the worker's unit tests.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;

use feedreel_media::{MediaEngine, MediaError, MediaResult, ProgressCallback, RenderJob};
use feedreel_models::{MediaInfo, VideoStream};

/// Engine that writes placeholder files and answers probes from a table.
///
/// Probes key on the file name up to the first `_` or `.`, so an original
/// and its normalized variant share metadata. With `stills` set, frame jobs
/// write a real PNG so the production hasher can decode them.
#[derive(Default)]
pub struct FakeEngine {
    pub infos: HashMap<String, MediaInfo>,
    pub failing_labels: HashSet<String>,
    pub jobs: Mutex<Vec<RenderJob>>,
    pub probes: Mutex<Vec<String>>,
    pub stills: bool,
}

impl FakeEngine {
    pub fn with_clip(mut self, id: &str, duration: f64, width: u32, height: u32) -> Self {
        self.infos.insert(
            id.to_string(),
            MediaInfo {
                duration,
                video: Some(VideoStream {
                    width,
                    height,
                    fps: 30.0,
                }),
                has_audio: true,
                size: 4,
            },
        );
        self
    }

    pub fn with_stills(mut self) -> Self {
        self.stills = true;
        self
    }

    pub fn failing(mut self, label: &str) -> Self {
        self.failing_labels.insert(label.to_string());
        self
    }

    pub fn labels(&self) -> Vec<String> {
        self.jobs.lock().unwrap().iter().map(|j| j.label.clone()).collect()
    }

    pub fn count(&self, label: &str) -> usize {
        self.labels().iter().filter(|l| *l == label).count()
    }
}

fn key(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .split(['_', '.'])
        .next()
        .unwrap_or_default()
        .to_string()
}

#[async_trait]
impl MediaEngine for FakeEngine {
    async fn probe(&self, path: &Path) -> MediaResult<MediaInfo> {
        let key = key(path);
        self.probes.lock().unwrap().push(key.clone());
        self.infos
            .get(&key)
            .cloned()
            .ok_or_else(|| MediaError::FileNotFound(path.to_path_buf()))
    }

    async fn render(&self, job: &RenderJob, progress: Option<ProgressCallback>) -> MediaResult<()> {
        self.jobs.lock().unwrap().push(job.clone());
        if let Some(parent) = job.output.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        if self.stills && job.label == "frame" {
            let still = image::RgbaImage::from_fn(320, 240, |x, _| {
                if x < 160 {
                    image::Rgba([240, 240, 240, 255])
                } else {
                    image::Rgba([10, 10, 10, 255])
                }
            });
            still.save(&job.output)?;
        } else {
            tokio::fs::write(&job.output, b"fake").await?;
        }
        if self.failing_labels.contains(&job.label) {
            return Err(MediaError::ffmpeg_failed(
                format!("{} failed", job.label),
                None,
                Some(1),
            ));
        }
        if let Some(cb) = progress {
            cb(100.0);
        }
        Ok(())
    }
}
