//! Duplicate detection over perceptual frame hashes.

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use crate::engine::MediaEngine;
use crate::error::{MediaError, MediaResult};
use crate::metrics;
use crate::phash::{hamming_distance, hash_image_file};
use feedreel_models::EnrichedItem;

/// Default number of prior-item hashes computed at once.
pub const DEFAULT_HASH_CONCURRENCY: usize = 4;

/// A file to hash together with its already-known duration in seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct HashSource {
    pub path: PathBuf,
    pub duration: f64,
}

impl HashSource {
    pub fn new(path: impl Into<PathBuf>, duration: f64) -> Self {
        Self {
            path: path.into(),
            duration,
        }
    }
}

impl From<&EnrichedItem> for HashSource {
    fn from(item: &EnrichedItem) -> Self {
        Self::new(item.path(), item.duration())
    }
}

/// Produces a perceptual hash for a video file.
#[async_trait]
pub trait FrameHasher: Send + Sync {
    async fn hash(&self, source: &HashSource) -> MediaResult<String>;
}

/// Hashes one representative frame extracted by the media engine.
pub struct EngineFrameHasher {
    engine: Arc<dyn MediaEngine>,
}

impl EngineFrameHasher {
    pub fn new(engine: Arc<dyn MediaEngine>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl FrameHasher for EngineFrameHasher {
    async fn hash(&self, source: &HashSource) -> MediaResult<String> {
        // The still lives only as long as this call.
        let scratch = tempfile::Builder::new()
            .prefix("feedreel-frame-")
            .tempdir()?;
        let frame_path = scratch.path().join("frame.png");

        self.engine
            .extract_frame(&source.path, source.duration, &frame_path)
            .await?;

        tokio::task::spawn_blocking(move || hash_image_file(&frame_path))
            .await
            .map_err(|e| MediaError::internal(format!("Hash task failed: {}", e)))?
    }
}

/// Decides whether a file is a near-copy of any previously accepted file.
///
/// Hashes are cached per path for the lifetime of the detector; a path's
/// content must not change once it has been hashed.
pub struct DuplicateDetector {
    hasher: Arc<dyn FrameHasher>,
    cache: Mutex<HashMap<PathBuf, String>>,
    concurrency: usize,
}

impl DuplicateDetector {
    pub fn new(hasher: Arc<dyn FrameHasher>) -> Self {
        Self {
            hasher,
            cache: Mutex::new(HashMap::new()),
            concurrency: DEFAULT_HASH_CONCURRENCY,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// True when any prior file is within `threshold` (inclusive) of `candidate`.
    ///
    /// The candidate is hashed first; prior hashes are then computed in
    /// order with bounded concurrency and the comparison stops at the first
    /// match. Any hashing failure is returned as an error.
    pub async fn is_duplicate(
        &self,
        candidate: &HashSource,
        prior: &[HashSource],
        threshold: u32,
    ) -> MediaResult<bool> {
        if prior.is_empty() {
            return Ok(false);
        }

        let candidate_hash = self.hash_cached(candidate).await?;

        let mut hashes = stream::iter(prior.iter())
            .map(|source| async move { (source, self.hash_cached(source).await) })
            .buffered(self.concurrency);

        while let Some((source, hash)) = hashes.next().await {
            let distance = hamming_distance(&candidate_hash, &hash?);
            if distance <= threshold {
                debug!(
                    candidate = %candidate.path.display(),
                    prior = %source.path.display(),
                    distance,
                    "Duplicate found"
                );
                return Ok(true);
            }
        }

        Ok(false)
    }

    /// Number of cached hashes.
    pub async fn cached(&self) -> usize {
        self.cache.lock().await.len()
    }

    async fn hash_cached(&self, source: &HashSource) -> MediaResult<String> {
        if let Some(hash) = self.cache.lock().await.get(&source.path) {
            metrics::record_hash_cache_hit();
            return Ok(hash.clone());
        }

        let hash = self.hasher.hash(source).await?;
        self.cache
            .lock()
            .await
            .insert(source.path.clone(), hash.clone());
        Ok(hash)
    }
}
