//! Acquisition: candidate to file on disk, then to probed item.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::metrics;
use feedreel_media::fs_utils::{is_nonempty_file, move_file, part_path, remove_quietly};
use feedreel_media::{
    download_file, remux_stream_job, transcode_animation_job, MediaEngine, MediaError, MediaResult,
};
use feedreel_models::{AcquiredItem, Candidate, EnrichedItem, MediaKind};

/// Downloads candidates into a per-source cache directory.
///
/// Originals are stored as `<dir>/<id>.mp4`; an existing non-empty file under
/// that name is reused without any network or engine work.
pub struct Acquirer {
    http: reqwest::Client,
    engine: Arc<dyn MediaEngine>,
    dir: PathBuf,
}

impl Acquirer {
    pub fn new(http: reqwest::Client, engine: Arc<dyn MediaEngine>, dir: impl Into<PathBuf>) -> Self {
        Self {
            http,
            engine,
            dir: dir.into(),
        }
    }

    /// Cache path for a candidate's original.
    pub fn original_path(&self, candidate: &Candidate) -> PathBuf {
        self.dir.join(format!("{}.mp4", candidate.id))
    }

    /// Fetch the candidate's media.
    ///
    /// On failure nothing is left under the cache key.
    pub async fn acquire(&self, candidate: &Candidate) -> MediaResult<AcquiredItem> {
        let dest = self.original_path(candidate);

        if is_nonempty_file(&dest).await {
            debug!(item_id = %candidate.id, "Using cached original");
            metrics::record_cache_hit("acquire");
            return Ok(AcquiredItem::new(candidate.clone(), dest));
        }

        let result = match &candidate.media {
            MediaKind::SegmentedStream { manifest_url } => {
                self.remux(manifest_url, &dest).await
            }
            MediaKind::AnimatedImage { url } => self.transcode(candidate, url, &dest).await,
            MediaKind::DirectFile { url } => download_file(&self.http, url, &dest).await.map(|_| ()),
        };

        if let Err(e) = result {
            remove_quietly(&part_path(&dest)).await;
            remove_quietly(&dest).await;
            return Err(e);
        }

        if !is_nonempty_file(&dest).await {
            remove_quietly(&dest).await;
            return Err(MediaError::download_failed(format!(
                "{} produced an empty file",
                candidate.media
            )));
        }

        info!(
            item_id = %candidate.id,
            kind = %candidate.media,
            output = %dest.display(),
            "Acquired media"
        );
        Ok(AcquiredItem::new(candidate.clone(), dest))
    }

    async fn remux(&self, manifest_url: &str, dest: &Path) -> MediaResult<()> {
        let staging = part_path(dest);
        self.engine
            .render(&remux_stream_job(manifest_url, &staging), None)
            .await?;
        move_file(&staging, dest).await
    }

    async fn transcode(&self, candidate: &Candidate, url: &str, dest: &Path) -> MediaResult<()> {
        let image = self.dir.join(format!("{}.gif", candidate.id));
        let staging = part_path(dest);

        let result = async {
            download_file(&self.http, url, &image).await?;
            self.engine
                .render(&transcode_animation_job(&image, &staging), None)
                .await?;
            move_file(&staging, dest).await
        }
        .await;

        remove_quietly(&image).await;
        result
    }

    /// Probe an acquired file once and attach the metadata.
    pub async fn enrich(&self, acquired: AcquiredItem) -> MediaResult<EnrichedItem> {
        let metadata = self.engine.probe(acquired.path()).await?;
        Ok(EnrichedItem::new(acquired, metadata))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeEngine;
    use feedreel_models::SourceId;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn candidate(id: &str, media: MediaKind) -> Candidate {
        Candidate {
            id: SourceId::from(id),
            index: 0,
            title: "t".into(),
            author: "a".into(),
            media,
            permalink: String::new(),
        }
    }

    fn stream(id: &str) -> Candidate {
        candidate(
            id,
            MediaKind::SegmentedStream {
                manifest_url: format!("https://v.example/{}/HLSPlaylist.m3u8", id),
            },
        )
    }

    #[tokio::test]
    async fn test_segmented_stream_is_remuxed() {
        let dir = TempDir::new().unwrap();
        let engine = Arc::new(FakeEngine::default());
        let acquirer = Acquirer::new(reqwest::Client::new(), engine.clone(), dir.path());

        let item = acquirer.acquire(&stream("s1")).await.unwrap();

        assert_eq!(item.path(), dir.path().join("s1.mp4"));
        assert!(item.path().exists());
        assert!(!part_path(item.path()).exists());
        assert_eq!(engine.labels(), vec!["remux"]);
    }

    #[tokio::test]
    async fn test_cached_original_skips_work() {
        let dir = TempDir::new().unwrap();
        tokio::fs::write(dir.path().join("s1.mp4"), b"cached").await.unwrap();
        let engine = Arc::new(FakeEngine::default());
        let acquirer = Acquirer::new(reqwest::Client::new(), engine.clone(), dir.path());

        acquirer.acquire(&stream("s1")).await.unwrap();
        assert!(engine.labels().is_empty());
    }

    #[tokio::test]
    async fn test_failed_remux_leaves_nothing() {
        let dir = TempDir::new().unwrap();
        let engine = Arc::new(FakeEngine::default().failing("remux"));
        let acquirer = Acquirer::new(reqwest::Client::new(), engine, dir.path());

        assert!(acquirer.acquire(&stream("s1")).await.is_err());
        assert!(!dir.path().join("s1.mp4").exists());
        assert!(!dir.path().join("s1.mp4.part").exists());
    }

    #[tokio::test]
    async fn test_direct_file_download() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/d1.mp4"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1u8; 128]))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let engine = Arc::new(FakeEngine::default());
        let acquirer = Acquirer::new(reqwest::Client::new(), engine.clone(), dir.path());
        let c = candidate(
            "d1",
            MediaKind::DirectFile {
                url: format!("{}/d1.mp4", server.uri()),
            },
        );

        let item = acquirer.acquire(&c).await.unwrap();
        assert_eq!(tokio::fs::read(item.path()).await.unwrap().len(), 128);
        assert!(engine.labels().is_empty());
    }

    #[tokio::test]
    async fn test_animated_image_is_transcoded_and_source_removed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cat.gif"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"GIF89a".to_vec()))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let engine = Arc::new(FakeEngine::default());
        let acquirer = Acquirer::new(reqwest::Client::new(), engine.clone(), dir.path());
        let c = candidate(
            "g1",
            MediaKind::AnimatedImage {
                url: format!("{}/cat.gif", server.uri()),
            },
        );

        let item = acquirer.acquire(&c).await.unwrap();
        assert!(item.path().exists());
        assert!(!dir.path().join("g1.gif").exists());
        assert_eq!(engine.labels(), vec!["transcode"]);
    }

    #[tokio::test]
    async fn test_enrich_probes_once() {
        let dir = TempDir::new().unwrap();
        let engine = Arc::new(FakeEngine::default().with_clip("s1", 7.5, 1280, 720));
        let acquirer = Acquirer::new(reqwest::Client::new(), engine.clone(), dir.path());

        let acquired = acquirer.acquire(&stream("s1")).await.unwrap();
        let item = acquirer.enrich(acquired).await.unwrap();

        assert_eq!(item.duration(), 7.5);
        assert_eq!(engine.probes.lock().unwrap().len(), 1);
    }
}
