//! Video encoding configuration.

use serde::{Deserialize, Serialize};

/// Default video codec (H.264)
pub const DEFAULT_VIDEO_CODEC: &str = "libx264";
/// Default audio codec
pub const DEFAULT_AUDIO_CODEC: &str = "aac";
/// Default H.264 profile
pub const DEFAULT_PROFILE: &str = "high";
/// Default H.264 level
pub const DEFAULT_LEVEL: &str = "4.0";
/// Pixel format required by most players
pub const DEFAULT_PIXEL_FORMAT: &str = "yuv420p";
/// Default audio bitrate
pub const DEFAULT_AUDIO_BITRATE: &str = "192k";
/// Audio sample rate shared by every normalized item
pub const DEFAULT_SAMPLE_RATE: u32 = 48_000;
/// Output frame rate shared by every normalized item
pub const DEFAULT_FPS: u32 = 30;

/// Preset used when transcoding animated images into video.
pub const ANIMATED_IMAGE_PRESET: &str = "fast";

/// Frame extraction settings for perceptual hashing
pub const HASH_FRAME_WIDTH: u32 = 320;
pub const HASH_FRAME_HEIGHT: u32 = 240;
/// Relative position (0..1) of the hashed frame within the clip
pub const HASH_FRAME_POSITION: f64 = 0.1;

/// Video encoding configuration for normalized items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodingConfig {
    /// Video codec (e.g., "libx264")
    #[serde(default = "default_video_codec")]
    pub codec: String,

    #[serde(default = "default_profile")]
    pub profile: String,

    #[serde(default = "default_level")]
    pub level: String,

    #[serde(default = "default_pixel_format")]
    pub pixel_format: String,

    /// Output frame rate
    #[serde(default = "default_fps")]
    pub fps: u32,

    /// Audio codec
    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,

    /// Audio bitrate
    #[serde(default = "default_audio_bitrate")]
    pub audio_bitrate: String,

    /// Audio sample rate (Hz)
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Additional FFmpeg output arguments
    #[serde(default)]
    pub extra_args: Vec<String>,
}

fn default_video_codec() -> String {
    DEFAULT_VIDEO_CODEC.to_string()
}
fn default_profile() -> String {
    DEFAULT_PROFILE.to_string()
}
fn default_level() -> String {
    DEFAULT_LEVEL.to_string()
}
fn default_pixel_format() -> String {
    DEFAULT_PIXEL_FORMAT.to_string()
}
fn default_fps() -> u32 {
    DEFAULT_FPS
}
fn default_audio_codec() -> String {
    DEFAULT_AUDIO_CODEC.to_string()
}
fn default_audio_bitrate() -> String {
    DEFAULT_AUDIO_BITRATE.to_string()
}
fn default_sample_rate() -> u32 {
    DEFAULT_SAMPLE_RATE
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            codec: default_video_codec(),
            profile: default_profile(),
            level: default_level(),
            pixel_format: default_pixel_format(),
            fps: DEFAULT_FPS,
            audio_codec: default_audio_codec(),
            audio_bitrate: default_audio_bitrate(),
            sample_rate: DEFAULT_SAMPLE_RATE,
            extra_args: Vec::new(),
        }
    }
}

impl EncodingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convert to FFmpeg output arguments.
    ///
    /// Includes `-shortest` so a synthesized silent track never outlives the video.
    pub fn to_ffmpeg_args(&self) -> Vec<String> {
        let mut args: Vec<String> = [
            "-c:v",
            &self.codec,
            "-profile:v",
            &self.profile,
            "-level",
            &self.level,
            "-pix_fmt",
            &self.pixel_format,
            "-c:a",
            &self.audio_codec,
            "-b:a",
            &self.audio_bitrate,
            "-ar",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        args.push(self.sample_rate.to_string());
        args.extend(
            [
                "-shortest",
                "-movflags",
                "+faststart",
                "-avoid_negative_ts",
                "make_zero",
            ]
            .iter()
            .map(|s| s.to_string()),
        );
        args.extend(self.extra_args.iter().cloned());

        args
    }
}
