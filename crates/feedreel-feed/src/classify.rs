//! Candidate classification.
//!
//! Media kind precedence: native segmented video, then a third-party embed
//! whose direct file can be derived from its poster thumbnail, then an
//! animated image link. Anything else is not a candidate.

use std::sync::OnceLock;

use regex::Regex;
use url::Url;

use crate::listing::RawEntry;
use feedreel_models::{Candidate, MediaKind, SourceId};

const REDGIFS_PROVIDER: &str = "redgifs.com";
const REDGIFS_MEDIA_BASE: &str = "https://media.redgifs.com";

fn poster_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"/([^/]+)-poster\.jpg$").ok())
        .as_ref()
}

/// Derive the direct file URL from an embed's poster thumbnail.
pub fn redgifs_direct_url(thumbnail_url: &str) -> Option<String> {
    poster_pattern()?
        .captures(thumbnail_url)
        .and_then(|caps| caps.get(1))
        .map(|slug| format!("{}/{}.mp4", REDGIFS_MEDIA_BASE, slug.as_str()))
}

/// True when `raw` points at a `.gif`, ignoring case, query and fragment.
pub fn is_animated_image_url(raw: &str) -> bool {
    let path = match Url::parse(raw) {
        Ok(url) => url.path().to_string(),
        Err(_) => raw.split(['?', '#']).next().unwrap_or(raw).to_string(),
    };
    path.to_ascii_lowercase().ends_with(".gif")
}

/// Media kind of an entry, or `None` when it has nothing downloadable.
pub fn media_kind(entry: &RawEntry) -> Option<MediaKind> {
    let media = entry.media.as_ref();

    if entry.is_video {
        if let Some(manifest_url) = media
            .and_then(|m| m.reddit_video.as_ref())
            .and_then(|v| v.hls_url.as_ref())
        {
            return Some(MediaKind::SegmentedStream {
                manifest_url: manifest_url.clone(),
            });
        }
    }

    if let Some(media) = media.filter(|m| m.provider.as_deref() == Some(REDGIFS_PROVIDER)) {
        if let Some(url) = media
            .oembed
            .as_ref()
            .and_then(|o| o.thumbnail_url.as_deref())
            .and_then(redgifs_direct_url)
        {
            return Some(MediaKind::DirectFile { url });
        }
    }

    entry
        .url
        .as_deref()
        .filter(|url| is_animated_image_url(url))
        .map(|url| MediaKind::AnimatedImage {
            url: url.to_string(),
        })
}

/// Turn a raw entry into a candidate with the given sequence index.
///
/// Pinned and stickied entries are skipped.
pub fn classify_entry(entry: &RawEntry, index: u32, permalink_base: &str) -> Option<Candidate> {
    if entry.pinned || entry.stickied || entry.id.is_empty() {
        return None;
    }

    let media = media_kind(entry)?;
    Some(Candidate {
        id: SourceId::from(entry.id.as_str()),
        index,
        title: entry.title.clone(),
        author: entry.author.clone(),
        media,
        permalink: format!("{}{}", permalink_base.trim_end_matches('/'), entry.permalink),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::{NativeVideo, OEmbed, RawMedia};

    fn entry(id: &str) -> RawEntry {
        RawEntry {
            id: id.to_string(),
            title: format!("title {}", id),
            author: "someone".to_string(),
            permalink: format!("/r/aww/comments/{}/", id),
            ..Default::default()
        }
    }

    fn native(id: &str) -> RawEntry {
        RawEntry {
            is_video: true,
            media: Some(RawMedia {
                reddit_video: Some(NativeVideo {
                    hls_url: Some(format!("https://v.redd.it/{}/HLSPlaylist.m3u8", id)),
                    duration: None,
                }),
                ..Default::default()
            }),
            ..entry(id)
        }
    }

    #[test]
    fn test_redgifs_direct_url() {
        assert_eq!(
            redgifs_direct_url("https://thumbs2.redgifs.com/SleepyHappyCat-poster.jpg").as_deref(),
            Some("https://media.redgifs.com/SleepyHappyCat.mp4")
        );
        assert_eq!(redgifs_direct_url("https://thumbs2.redgifs.com/cat.jpg"), None);
        assert_eq!(redgifs_direct_url("https://x/cat-poster.jpg?x=1"), None);
    }

    #[test]
    fn test_gif_detection() {
        assert!(is_animated_image_url("https://i.imgur.com/abc.gif"));
        assert!(is_animated_image_url("https://i.imgur.com/abc.GIF?width=640"));
        assert!(!is_animated_image_url("https://i.imgur.com/abc.gifv"));
        assert!(!is_animated_image_url("https://i.imgur.com/abc.png"));
    }

    #[test]
    fn test_native_video_takes_precedence() {
        let mut e = native("n1");
        e.url = Some("https://i.example/n1.gif".into());
        let candidate = classify_entry(&e, 0, "https://reddit.com").unwrap();
        assert!(matches!(candidate.media, MediaKind::SegmentedStream { .. }));
        assert_eq!(candidate.permalink, "https://reddit.com/r/aww/comments/n1/");
    }

    #[test]
    fn test_video_flag_without_manifest_falls_through() {
        let mut e = entry("v1");
        e.is_video = true;
        assert!(classify_entry(&e, 0, "").is_none());
    }

    #[test]
    fn test_embed_classified_as_direct_file() {
        let e = RawEntry {
            media: Some(RawMedia {
                provider: Some("redgifs.com".into()),
                oembed: Some(OEmbed {
                    thumbnail_url: Some("https://thumbs.redgifs.com/BigDog-poster.jpg".into()),
                }),
                ..Default::default()
            }),
            ..entry("r1")
        };
        let candidate = classify_entry(&e, 4, "https://reddit.com").unwrap();
        assert_eq!(
            candidate.media,
            MediaKind::DirectFile {
                url: "https://media.redgifs.com/BigDog.mp4".into()
            }
        );
        assert_eq!(candidate.index, 4);
    }

    #[test]
    fn test_pinned_and_stickied_skipped() {
        let mut pinned = native("p1");
        pinned.pinned = true;
        let mut sticky = native("s1");
        sticky.stickied = true;
        assert!(classify_entry(&pinned, 0, "").is_none());
        assert!(classify_entry(&sticky, 0, "").is_none());
    }

    #[test]
    fn test_plain_link_skipped() {
        let mut e = entry("l1");
        e.url = Some("https://news.example/article".into());
        assert!(classify_entry(&e, 0, "").is_none());
    }
}
