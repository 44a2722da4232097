//! Types for the KAT search connector.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

use super::util::torrent_availability;

/// A normalized search result from KAT.
///
/// Equality and hashing cover every field, so two records only coalesce in a
/// result set when all populated fields match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ResultRecord {
    /// Display name.
    pub title: String,
    /// URL of the .torrent resource.
    pub locator: String,
    seeds: u32,
    leeches: u32,
    /// Availability score derived from seeds and leeches.
    rank: u64,
    /// Size in MiB (integer division of the reported byte count).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_mb: Option<u64>,
    /// Info hash, only reported by the RSS feed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,
}

impl ResultRecord {
    /// Create a record; the rank is computed from `seeds` and `leeches`.
    pub fn new(title: impl Into<String>, locator: impl Into<String>, seeds: u32, leeches: u32) -> Self {
        Self {
            title: title.into(),
            locator: locator.into(),
            seeds,
            leeches,
            rank: torrent_availability(seeds, leeches),
            size_mb: None,
            content_hash: None,
        }
    }

    /// Set the size from a byte count (bytes / 1024 / 1024, truncated).
    pub fn with_size_bytes(mut self, bytes: u64) -> Self {
        self.size_mb = Some(bytes / 1024 / 1024);
        self
    }

    pub fn with_content_hash(mut self, hash: impl Into<String>) -> Self {
        self.content_hash = Some(hash.into());
        self
    }

    pub fn seeds(&self) -> u32 {
        self.seeds
    }

    pub fn leeches(&self) -> u32 {
        self.leeches
    }

    pub fn rank(&self) -> u64 {
        self.rank
    }
}

/// KAT category filter.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SearchCategory {
    #[default]
    All,
    Movies,
    Tv,
    Music,
    Books,
    Xxx,
    Other,
}

impl SearchCategory {
    /// Value sent in the `category` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchCategory::All => "all",
            SearchCategory::Movies => "movies",
            SearchCategory::Tv => "tv",
            SearchCategory::Music => "music",
            SearchCategory::Books => "books",
            SearchCategory::Xxx => "xxx",
            SearchCategory::Other => "other",
        }
    }
}

impl fmt::Display for SearchCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-connector search options.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchOptions {
    #[serde(default)]
    pub category: SearchCategory,
    /// Restrict to verified torrents (`verified:1` query marker).
    #[serde(default)]
    pub verified: bool,
    /// Request the RSS feed instead of the HTML results page.
    #[serde(default)]
    pub rss: bool,
}

impl SearchOptions {
    pub fn parse_mode(&self) -> ParseMode {
        if self.rss {
            ParseMode::Feed
        } else {
            ParseMode::Html
        }
    }
}

/// The task a search is run for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Canonical title, used when no search strings are given.
    pub title: String,
    /// Search string variants.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_strings: Option<Vec<String>>,
}

impl SearchRequest {
    pub fn from_title(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            search_strings: None,
        }
    }

    pub fn with_search_strings<I, S>(title: impl Into<String>, strings: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            title: title.into(),
            search_strings: Some(strings.into_iter().map(Into::into).collect()),
        }
    }

    /// Raw terms to search: the variants if any were given, otherwise the title.
    pub fn terms(&self) -> Vec<&str> {
        match &self.search_strings {
            Some(strings) if !strings.is_empty() => strings.iter().map(String::as_str).collect(),
            _ => vec![self.title.as_str()],
        }
    }
}

/// Sort configuration for a single request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortOrder {
    /// Most recently added first.
    Newest,
    /// Most seeders first.
    MostSeeded,
}

impl SortOrder {
    /// Fixed order in which sort configurations are requested.
    pub const ALL: [SortOrder; 2] = [SortOrder::Newest, SortOrder::MostSeeded];

    pub fn field(&self) -> &'static str {
        match self {
            SortOrder::Newest => "time_add",
            SortOrder::MostSeeded => "seeders",
        }
    }

    pub fn direction(&self) -> &'static str {
        "desc"
    }
}

/// Which response format is requested and parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    Feed,
    Html,
}

impl ParseMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParseMode::Feed => "feed",
            ParseMode::Html => "html",
        }
    }
}

/// Errors raised while mapping a payload to records.
///
/// One of these aborts the whole parse call unless malformed items are
/// configured to be skipped.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Missing {field} in {context}")]
    MissingField {
        field: &'static str,
        context: String,
    },

    #[error("Invalid number for {field}: {value:?}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("Invalid selector: {0}")]
    Selector(String),

    #[error("Parser task failed: {0}")]
    Task(String),
}

/// Capability shared by the feed and HTML parsers.
pub trait ResultParser: Send + Sync {
    fn parse(&self, payload: &[u8]) -> Result<HashSet<ResultRecord>, ParseError>;
}

/// Trait for torrent search backends.
///
/// Searching never fails: backends log and drop what they cannot fetch or
/// parse, and return whatever was found.
#[async_trait]
pub trait Searcher: Send + Sync {
    /// Provider name for logging.
    fn name(&self) -> &str;

    /// Search every term of the request with the given options.
    async fn search(&self, request: &SearchRequest, options: &SearchOptions)
        -> HashSet<ResultRecord>;
}
