//! FFmpeg CLI wrapper for the feedreel pipeline.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building and a runner with `-progress` parsing
//! - FFprobe metadata
//! - Declarative filter graphs, cross-fade chains and normalization planning
//! - Frame extraction, perceptual hashing and duplicate detection
//! - Direct downloads and engine jobs for stream remux / animation transcode
//! - Title-card rendering

pub mod command;
pub mod download;
pub mod duplicate;
pub mod engine;
pub mod error;
pub mod filter_graph;
pub mod frame;
pub mod fs_utils;
pub mod metrics;
pub mod normalize;
pub mod phash;
pub mod probe;
pub mod progress;
pub mod title_card;
pub mod transition;

pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegInput, FfmpegRunner};
pub use download::{download_file, remux_stream_job, transcode_animation_job};
pub use duplicate::{
    DuplicateDetector, EngineFrameHasher, FrameHasher, HashSource, DEFAULT_HASH_CONCURRENCY,
};
pub use engine::{FfmpegEngine, MediaEngine, RenderJob};
pub use error::{MediaError, MediaResult};
pub use filter_graph::{FilterGraph, FilterOption, FilterStage};
pub use normalize::{normalize_job, normalized_file_name, solve_target_frame, NormalizeRequest};
pub use phash::{hamming_distance, hash_image, hash_image_file, HASH_BITS};
pub use probe::probe_media;
pub use progress::{FfmpegProgress, ProgressCallback};
pub use title_card::{truncate_title, TitleCardRenderer, TITLE_MAX_WORDS};
pub use transition::{
    build_chain, TransitionPlan, DEFAULT_SAFE_MARGIN, DEFAULT_TRANSITION_DURATION,
};
