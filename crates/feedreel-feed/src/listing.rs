//! Listing wire types.
//!
//! Only the fields used for classification are modeled; everything else in
//! the upstream payload is ignored. Missing fields fall back to defaults so
//! non-post entries (comments in a user overview) still parse.

use serde::Deserialize;

/// Top-level listing envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct Listing {
    pub data: ListingData,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListingData {
    #[serde(default)]
    pub after: Option<String>,
    #[serde(default)]
    pub children: Vec<Thing>,
}

/// One child of a listing. The `kind` tag is not needed for classification.
#[derive(Debug, Clone, Deserialize)]
pub struct Thing {
    pub data: RawEntry,
}

/// A raw feed entry as returned by the API.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RawEntry {
    pub id: String,
    pub title: String,
    pub author: String,
    pub permalink: String,
    pub url: Option<String>,
    pub is_video: bool,
    pub pinned: bool,
    pub stickied: bool,
    pub media: Option<RawMedia>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RawMedia {
    #[serde(rename = "type")]
    pub provider: Option<String>,
    pub reddit_video: Option<NativeVideo>,
    pub oembed: Option<OEmbed>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct NativeVideo {
    pub hls_url: Option<String>,
    pub duration: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct OEmbed {
    pub thumbnail_url: Option<String>,
}

/// One page of entries plus the cursor for the next page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingPage {
    pub entries: Vec<RawEntry>,
    /// `None` when the listing is exhausted
    pub after: Option<String>,
}

impl From<Listing> for ListingPage {
    fn from(listing: Listing) -> Self {
        Self {
            entries: listing
                .data
                .children
                .into_iter()
                .map(|thing| thing.data)
                .collect(),
            after: listing.data.after.filter(|cursor| !cursor.is_empty()),
        }
    }
}
