//! Items after download and after probing.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::candidate::{Candidate, SourceId};
use crate::media_info::{MediaInfo, VideoStream};

/// A candidate whose media has been written to local disk.
///
/// The file at `output_path` exists and is non-empty when the item is produced.
/// Whoever holds the item owns the file and may replace or delete it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcquiredItem {
    pub candidate: Candidate,
    pub output_path: PathBuf,
}

impl AcquiredItem {
    pub fn new(candidate: Candidate, output_path: impl Into<PathBuf>) -> Self {
        Self {
            candidate,
            output_path: output_path.into(),
        }
    }

    pub fn id(&self) -> &SourceId {
        &self.candidate.id
    }

    pub fn path(&self) -> &Path {
        &self.output_path
    }
}

/// An acquired item plus the metadata probed from its file.
///
/// The metadata is attached exactly once, at construction, and is read-only
/// afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedItem {
    acquired: AcquiredItem,
    metadata: MediaInfo,
}

impl EnrichedItem {
    pub fn new(acquired: AcquiredItem, metadata: MediaInfo) -> Self {
        Self { acquired, metadata }
    }

    pub fn acquired(&self) -> &AcquiredItem {
        &self.acquired
    }

    pub fn candidate(&self) -> &Candidate {
        &self.acquired.candidate
    }

    pub fn id(&self) -> &SourceId {
        self.acquired.id()
    }

    pub fn index(&self) -> u32 {
        self.acquired.candidate.index
    }

    pub fn title(&self) -> &str {
        &self.acquired.candidate.title
    }

    pub fn path(&self) -> &Path {
        self.acquired.path()
    }

    pub fn metadata(&self) -> &MediaInfo {
        &self.metadata
    }

    pub fn duration(&self) -> f64 {
        self.metadata.duration
    }

    pub fn video(&self) -> Option<&VideoStream> {
        self.metadata.video.as_ref()
    }

    pub fn has_audio(&self) -> bool {
        self.metadata.has_audio
    }
}
