//! The remote feed capability consumed by the scanner and the comment flattener.
//! Items stay raw JSON here; the core validates them into typed records.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// One page returned by the feed: the source-reported total and the raw items.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct FeedPage {
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub items: Vec<Value>,
}

/// Parameters of a single comment fetch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CommentsRequest {
    pub community_id: i64,
    pub post_id: i64,
    pub count: usize,
    pub thread_items: usize,
}

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("unexpected HTTP status {0}")]
    Status(u16),
    #[error("API error {code}: {message}")]
    Api { code: i64, message: String },
    #[error("cannot decode response: {0}")]
    Decode(String),
}

/// Two read operations against a community wall.
pub trait WallFeed {
    /// Newest-first posts authored by the community itself, up to `count`.
    fn owner_posts(&self, community_id: i64, count: usize) -> Result<FeedPage, FeedError>;

    /// Top-level comments of a post with like counts and a bounded thread window.
    fn post_comments(&self, req: &CommentsRequest) -> Result<FeedPage, FeedError>;
}

impl<T: WallFeed + ?Sized> WallFeed for &T {
    fn owner_posts(&self, community_id: i64, count: usize) -> Result<FeedPage, FeedError> {
        (**self).owner_posts(community_id, count)
    }
    fn post_comments(&self, req: &CommentsRequest) -> Result<FeedPage, FeedError> {
        (**self).post_comments(req)
    }
}
