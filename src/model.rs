//! Exported row types, the work queue item, and the typed views of raw feed items.

use crate::date::serialize_datetime;
use serde::{Deserialize, Serialize, Serializer};
use time::OffsetDateTime;

/// A record type written as one table. `COLUMNS` is the stable header.
pub trait Row: Serialize {
    const COLUMNS: &'static [&'static str];
}

/// One accepted wall post.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Post {
    pub id: i64,
    pub url: String,
    #[serde(serialize_with = "serialize_datetime")]
    pub datetime: OffsetDateTime,
    pub text: String,
    pub comments_number: u64, // as reported at scan time
}

impl Row for Post {
    const COLUMNS: &'static [&'static str] = &["id", "url", "datetime", "text", "comments_number"];
}

/// One flattened comment: top-level (`parent_comment_id == None`) or a thread reply.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub url: String,
    #[serde(serialize_with = "serialize_datetime")]
    pub datetime: OffsetDateTime,
    pub text: String,
    pub likes_number: u64,
    #[serde(serialize_with = "serialize_parent")]
    pub parent_comment_id: Option<i64>,
}

impl Comment {
    pub fn is_top_level(&self) -> bool {
        self.parent_comment_id.is_none()
    }
}

impl Row for Comment {
    const COLUMNS: &'static [&'static str] =
        &["id", "post_id", "url", "datetime", "text", "likes_number", "parent_comment_id"];
}

/// Top-level comments are written with a `0` parent.
fn serialize_parent<S: Serializer>(parent: &Option<i64>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_i64(parent.unwrap_or(0))
}

/// (post, expected comment count) bridging the scan and comment stages.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorkItem {
    pub post_id: i64,
    pub expected_comments: u64,
}

// ----------------------------- Feed item views ------------------------------------

#[derive(Clone, Copy, Debug, Default, Deserialize)]
pub struct Counter {
    pub count: u64,
}

/// Required fields of a wall item. Anything else in the payload is ignored.
#[derive(Debug, Deserialize)]
pub struct WallItem {
    pub id: i64,
    pub date: i64,
    pub text: String,
    pub comments: Counter,
}

/// Required fields of a comment; `thread` is only present on top-level items.
/// Deleted comments come without `likes`, which then reads as zero.
#[derive(Debug, Deserialize)]
pub struct CommentItem {
    pub id: i64,
    pub date: i64,
    pub text: String,
    #[serde(default)]
    pub likes: Counter,
    #[serde(default)]
    pub thread: Option<Thread>,
}

/// Thread items are kept raw so one malformed reply does not reject its parent.
#[derive(Debug, Default, Deserialize)]
pub struct Thread {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub items: Vec<serde_json::Value>,
}
