//! Media downloads.
//!
//! Direct files are streamed over HTTP; segmented streams and animated
//! images are handed to the media engine as jobs built here.

use futures::StreamExt;
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::command::FfmpegInput;
use crate::engine::RenderJob;
use crate::error::{MediaError, MediaResult};
use crate::fs_utils::{move_file, part_path, remove_quietly};
use crate::metrics;
use feedreel_models::encoding::{ANIMATED_IMAGE_PRESET, DEFAULT_PIXEL_FORMAT, DEFAULT_VIDEO_CODEC};

/// Stream `url` to `dest`, writing through a `.part` sibling.
///
/// Returns the number of bytes written. On any failure the partial file is
/// removed and `dest` is left untouched.
pub async fn download_file(client: &reqwest::Client, url: &str, dest: &Path) -> MediaResult<u64> {
    let tmp = part_path(dest);
    match stream_to(client, url, &tmp).await {
        Ok(0) => {
            remove_quietly(&tmp).await;
            Err(MediaError::download_failed(format!("Empty response body from {}", url)))
        }
        Ok(bytes) => {
            if let Err(e) = move_file(&tmp, dest).await {
                remove_quietly(&tmp).await;
                return Err(e);
            }
            metrics::record_download_bytes(bytes);
            info!(url = %url, output = %dest.display(), bytes, "Downloaded file");
            Ok(bytes)
        }
        Err(e) => {
            remove_quietly(&tmp).await;
            Err(e)
        }
    }
}

async fn stream_to(client: &reqwest::Client, url: &str, path: &Path) -> MediaResult<u64> {
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(MediaError::download_failed(format!(
            "GET {} returned {}",
            url, status
        )));
    }

    let mut file = tokio::fs::File::create(path).await?;
    let mut body = response.bytes_stream();
    let mut written = 0u64;

    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    debug!(url = %url, bytes = written, "Response body written");

    Ok(written)
}

/// Remux a segmented stream manifest into a single container, copying codecs.
///
/// The container is forced to MP4 so `output` may carry a staging suffix.
pub fn remux_stream_job(manifest_url: &str, output: &Path) -> RenderJob {
    RenderJob::new("remux", output)
        .input(FfmpegInput::url(manifest_url))
        .output_args(["-c", "copy", "-f", "mp4", "-movflags", "+faststart"])
}

/// Transcode an animated image into a playable video at a fast preset.
///
/// Dimensions are truncated to even numbers for `yuv420p`.
pub fn transcode_animation_job(input: &Path, output: &Path) -> RenderJob {
    RenderJob::new("transcode", output)
        .input(FfmpegInput::file(input))
        .output_args([
            "-vf",
            "scale=trunc(iw/2)*2:trunc(ih/2)*2",
            "-c:v",
            DEFAULT_VIDEO_CODEC,
            "-preset",
            ANIMATED_IMAGE_PRESET,
            "-pix_fmt",
            DEFAULT_PIXEL_FORMAT,
            "-an",
            "-f",
            "mp4",
            "-movflags",
            "+faststart",
        ])
}
