//! Feed selection: which listing to walk and how many items to compile.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The container a listing is read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "name", rename_all = "snake_case")]
pub enum FeedScope {
    /// A community listing (`r/<name>`)
    Community(String),
    /// A user's overview (`user/<name>/overview`)
    User(String),
}

impl FeedScope {
    pub fn name(&self) -> &str {
        match self {
            FeedScope::Community(name) | FeedScope::User(name) => name,
        }
    }

    /// Short label used for output directories and file names.
    pub fn label(&self) -> String {
        match self {
            FeedScope::Community(name) => name.clone(),
            FeedScope::User(name) => format!("u_{}", name),
        }
    }

    pub fn is_user(&self) -> bool {
        matches!(self, FeedScope::User(_))
    }
}

impl fmt::Display for FeedScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedScope::Community(name) => write!(f, "r/{}", name),
            FeedScope::User(name) => write!(f, "u/{}", name),
        }
    }
}

/// Listing sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Top,
    Hot,
    New,
    Rising,
    Best,
    Controversial,
    Relevance,
    Comments,
}

impl SortOrder {
    pub const ALL: &'static [SortOrder] = &[
        SortOrder::Top,
        SortOrder::Hot,
        SortOrder::New,
        SortOrder::Rising,
        SortOrder::Best,
        SortOrder::Controversial,
        SortOrder::Relevance,
        SortOrder::Comments,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Top => "top",
            SortOrder::Hot => "hot",
            SortOrder::New => "new",
            SortOrder::Rising => "rising",
            SortOrder::Best => "best",
            SortOrder::Controversial => "controversial",
            SortOrder::Relevance => "relevance",
            SortOrder::Comments => "comments",
        }
    }

    /// Sort orders that only exist on search endpoints.
    pub fn is_search_only(&self) -> bool {
        matches!(self, SortOrder::Relevance | SortOrder::Comments)
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = ParseSelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        SortOrder::ALL
            .iter()
            .copied()
            .find(|order| order.as_str() == lower)
            .ok_or_else(|| ParseSelectorError::SortOrder(s.to_string()))
    }
}

/// Time window applied to top/controversial/search listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeWindow {
    Hour,
    Day,
    Week,
    Month,
    Year,
    All,
}

impl TimeWindow {
    pub const ALL: &'static [TimeWindow] = &[
        TimeWindow::Hour,
        TimeWindow::Day,
        TimeWindow::Week,
        TimeWindow::Month,
        TimeWindow::Year,
        TimeWindow::All,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeWindow::Hour => "hour",
            TimeWindow::Day => "day",
            TimeWindow::Week => "week",
            TimeWindow::Month => "month",
            TimeWindow::Year => "year",
            TimeWindow::All => "all",
        }
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TimeWindow {
    type Err = ParseSelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        TimeWindow::ALL
            .iter()
            .copied()
            .find(|window| window.as_str() == lower)
            .ok_or_else(|| ParseSelectorError::TimeWindow(s.to_string()))
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseSelectorError {
    #[error("Unknown sort order: {0}")]
    SortOrder(String),
    #[error("Unknown time window: {0}")]
    TimeWindow(String),
}

/// Everything needed to walk a feed for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedSelector {
    pub scope: FeedScope,
    #[serde(default)]
    pub sort: SortOrder,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_window: Option<TimeWindow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    /// Number of accepted items the run is aiming for
    pub target_count: u32,
}

impl FeedSelector {
    pub fn new(scope: FeedScope, target_count: u32) -> Self {
        Self {
            scope,
            sort: SortOrder::default(),
            time_window: None,
            query: None,
            target_count,
        }
    }

    pub fn with_sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_time_window(mut self, window: TimeWindow) -> Self {
        self.time_window = Some(window);
        self
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Human-readable description for progress messages.
    pub fn describe(&self) -> String {
        let mut out = format!("{} sort={}", self.scope, self.sort);
        if let Some(window) = self.time_window {
            out.push_str(&format!(" t={}", window));
        }
        if let Some(query) = &self.query {
            out.push_str(&format!(" q=\"{}\"", query));
        }
        out
    }
}
