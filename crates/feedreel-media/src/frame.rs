//! Representative frame extraction.

use std::path::Path;

use crate::command::FfmpegInput;
use crate::engine::RenderJob;
use feedreel_models::encoding::{HASH_FRAME_HEIGHT, HASH_FRAME_POSITION, HASH_FRAME_WIDTH};

/// Timestamp of the representative frame for a clip of `duration` seconds.
pub fn representative_timestamp(duration: f64) -> f64 {
    if duration.is_finite() && duration > 0.0 {
        duration * HASH_FRAME_POSITION
    } else {
        0.0
    }
}

/// Job that writes one small still of `video` to `output`.
pub fn frame_job(video: &Path, output: &Path, duration: f64) -> RenderJob {
    RenderJob::new("frame", output)
        .input(FfmpegInput::file(video).seek(representative_timestamp(duration)))
        .output_args([
            "-vf".to_string(),
            format!("scale={}:{}", HASH_FRAME_WIDTH, HASH_FRAME_HEIGHT),
            "-frames:v".to_string(),
            "1".to_string(),
        ])
}
