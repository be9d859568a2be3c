//! Discovered feed items.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier of a feed entry, as assigned by the upstream feed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceId(pub String);

impl SourceId {
    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for SourceId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SourceId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Where a candidate's media lives and how it must be fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MediaKind {
    /// A plain video file that can be stream-downloaded as-is.
    DirectFile { url: String },
    /// A segmented stream (HLS manifest) that must be remuxed by the media engine.
    SegmentedStream { manifest_url: String },
    /// An animated image that must be transcoded into a video container.
    AnimatedImage { url: String },
}

impl MediaKind {
    /// The URL the media is fetched from.
    pub fn url(&self) -> &str {
        match self {
            MediaKind::DirectFile { url } => url,
            MediaKind::SegmentedStream { manifest_url } => manifest_url,
            MediaKind::AnimatedImage { url } => url,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::DirectFile { .. } => "direct_file",
            MediaKind::SegmentedStream { .. } => "segmented_stream",
            MediaKind::AnimatedImage { .. } => "animated_image",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A feed entry classified as containing downloadable media, not yet fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Stable upstream identifier
    pub id: SourceId,
    /// Discovery order, starting at 0 and counting only classified entries
    pub index: u32,
    pub title: String,
    pub author: String,
    pub media: MediaKind,
    /// Link back to the entry on the feed's website
    pub permalink: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_kind_url() {
        let kind = MediaKind::SegmentedStream {
            manifest_url: "https://v.example/abc/HLSPlaylist.m3u8".to_string(),
        };
        assert_eq!(kind.url(), "https://v.example/abc/HLSPlaylist.m3u8");
        assert_eq!(kind.as_str(), "segmented_stream");
    }

    #[test]
    fn test_media_kind_is_tagged() {
        let kind = MediaKind::AnimatedImage {
            url: "https://i.example/cat.gif".to_string(),
        };
        let json = serde_json::to_value(&kind).unwrap();
        assert_eq!(json["kind"], "animated_image");
        assert_eq!(json["url"], "https://i.example/cat.gif");
    }

    #[test]
    fn test_source_id_display() {
        let id = SourceId::from("t3_xyz");
        assert_eq!(id.to_string(), "t3_xyz");
        assert_eq!(id.as_str(), "t3_xyz");
    }
}
