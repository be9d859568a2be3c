//! Technical metadata reported by the media engine's probe.

use serde::{Deserialize, Serialize};

/// Primary video stream properties.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VideoStream {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Frame rate (fps)
    pub fps: f64,
}

impl VideoStream {
    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// Width over height; `None` for degenerate streams.
    pub fn aspect_ratio(&self) -> Option<f64> {
        if self.width == 0 || self.height == 0 {
            None
        } else {
            Some(f64::from(self.width) / f64::from(self.height))
        }
    }
}

/// Probe result for one media file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    /// Duration in seconds (0 when unknown)
    pub duration: f64,
    /// Primary video stream, absent when the file has none or its dimensions are unknown
    pub video: Option<VideoStream>,
    /// Whether the container has at least one audio stream
    pub has_audio: bool,
    /// File size in bytes
    #[serde(default)]
    pub size: u64,
}

impl MediaInfo {
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.video.map(|v| (v.width, v.height))
    }

    pub fn duration_ms(&self) -> i64 {
        (self.duration * 1000.0).round() as i64
    }
}
