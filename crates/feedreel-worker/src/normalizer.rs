//! Chunked normalization of the compiled work list.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::metrics;
use crate::progress::{ChunkProgress, ProgressObserver, Stage};
use feedreel_media::fs_utils::{is_nonempty_file, move_file, part_path, remove_quietly};
use feedreel_media::{
    normalize_job, normalized_file_name, solve_target_frame, truncate_title, MediaEngine,
    MediaResult, NormalizeRequest, ProgressCallback, TitleCardRenderer, TITLE_MAX_WORDS,
};
use feedreel_models::{EncodingConfig, EnrichedItem, SourceId, TargetFrame};

use crate::config::DEFAULT_NORMALIZE_CHUNK;

/// A work-list item rendered at the shared target frame.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedClip {
    pub id: SourceId,
    pub index: u32,
    pub path: PathBuf,
}

pub struct Normalizer {
    engine: Arc<dyn MediaEngine>,
    encoding: EncodingConfig,
    titles: TitleCardRenderer,
    chunk_size: usize,
    keep_title_cards: bool,
}

impl Normalizer {
    pub fn new(engine: Arc<dyn MediaEngine>, encoding: EncodingConfig) -> Self {
        Self {
            engine,
            encoding,
            titles: TitleCardRenderer::new(),
            chunk_size: DEFAULT_NORMALIZE_CHUNK,
            keep_title_cards: false,
        }
    }

    pub fn with_title_renderer(mut self, titles: TitleCardRenderer) -> Self {
        self.titles = titles;
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn with_keep_title_cards(mut self, keep: bool) -> Self {
        self.keep_title_cards = keep;
        self
    }

    /// Shared output frame for the work list.
    pub fn target_frame(items: &[EnrichedItem]) -> Option<TargetFrame> {
        solve_target_frame(items.iter().filter_map(|item| item.video()))
    }

    /// Normalize every item, keeping work-list order.
    ///
    /// Items in a chunk run concurrently; chunks run one after another. An
    /// item that fails is reported to the observer and left out.
    pub async fn normalize_all(
        &self,
        items: &[EnrichedItem],
        dir: &Path,
        observer: Arc<dyn ProgressObserver>,
    ) -> Vec<NormalizedClip> {
        let Some(frame) = Self::target_frame(items) else {
            warn!("No item has usable video dimensions, nothing to normalize");
            return Vec::new();
        };
        info!(frame = %frame, items = items.len(), "Normalizing work list");

        let chunk_count = items.len().div_ceil(self.chunk_size);
        let mut clips = Vec::with_capacity(items.len());

        for (chunk_index, chunk) in items.chunks(self.chunk_size).enumerate() {
            let tracker = ChunkProgress::new(
                Arc::clone(&observer),
                Stage::Normalize,
                chunk_index,
                chunk_count,
                chunk.len(),
            );

            let results = join_all(chunk.iter().enumerate().map(|(slot, item)| {
                let tracker = Arc::clone(&tracker);
                async move {
                    let result = self
                        .normalize_one(item, frame, dir, tracker.callback(slot))
                        .await;
                    tracker.complete(slot);
                    (item, result)
                }
            }))
            .await;

            for (item, result) in results {
                match result {
                    Ok(path) => clips.push(NormalizedClip {
                        id: item.id().clone(),
                        index: item.index(),
                        path,
                    }),
                    Err(e) => {
                        metrics::record_item_failure("normalize");
                        observer.item_failed(item.candidate(), &e.to_string());
                    }
                }
            }
        }

        clips
    }

    async fn normalize_one(
        &self,
        item: &EnrichedItem,
        frame: TargetFrame,
        dir: &Path,
        progress: ProgressCallback,
    ) -> MediaResult<PathBuf> {
        let output = dir.join(normalized_file_name(item.id(), frame));
        if is_nonempty_file(&output).await {
            debug!(item_id = %item.id(), "Using cached normalized clip");
            metrics::record_cache_hit("normalize");
            return Ok(output);
        }

        let title_path = dir.join(format!("{}_title.png", item.id()));
        let title_card = self.render_title(item, &title_path).await;

        let staging = part_path(&output);
        let request = NormalizeRequest {
            input: item.path(),
            info: item.metadata(),
            title_card: title_card.as_deref(),
            frame,
            output: &staging,
        };
        let job = normalize_job(&request, &self.encoding).output_args(["-f", "mp4"]);
        let result = self.engine.render(&job, Some(progress)).await;

        if !self.keep_title_cards {
            remove_quietly(&title_path).await;
        }

        match result {
            Ok(()) => {
                move_file(&staging, &output).await?;
                Ok(output)
            }
            Err(e) => {
                remove_quietly(&staging).await;
                Err(e)
            }
        }
    }

    /// Render the title card; a failure only loses the overlay.
    async fn render_title(&self, item: &EnrichedItem, path: &Path) -> Option<PathBuf> {
        let title = truncate_title(item.title(), TITLE_MAX_WORDS);
        if title.is_empty() {
            return None;
        }
        match self.engine.render(&self.titles.job(&title, path), None).await {
            Ok(()) => Some(path.to_path_buf()),
            Err(e) => {
                warn!(item_id = %item.id(), "Title card failed, continuing without overlay: {}", e);
                remove_quietly(path).await;
                None
            }
        }
    }
}
