#![allow(dead_code)]

use serde_json::{json, Value};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Mutex;
use time::macros::datetime;
use time::OffsetDateTime;
use vetl::{CommentsRequest, FeedError, FeedPage, WallFeed};

/// Fixed "now" for every synthetic wall.
pub const NOW: OffsetDateTime = datetime!(2024-03-10 12:00 UTC);

pub const CLUB: i64 = 42;

pub fn days(n: i64) -> time::Duration {
    time::Duration::days(n)
}

/// In-memory wall: one post page plus per-post comment pages (or failures).
#[derive(Default)]
pub struct FakeFeed {
    pub posts: Vec<Value>,
    pub posts_error: Option<String>,
    pub comments: HashMap<i64, Result<Vec<Value>, String>>,
    pub comment_calls: Mutex<Vec<CommentsRequest>>,
}

impl FakeFeed {
    pub fn new(posts: Vec<Value>) -> Self {
        Self { posts, ..Default::default() }
    }
    pub fn with_comments(mut self, post_id: i64, items: Vec<Value>) -> Self {
        self.comments.insert(post_id, Ok(items));
        self
    }
    pub fn failing_comments(mut self, post_id: i64, msg: &str) -> Self {
        self.comments.insert(post_id, Err(msg.to_string()));
        self
    }
    pub fn requested_posts(&self) -> Vec<i64> {
        self.comment_calls.lock().unwrap().iter().map(|r| r.post_id).collect()
    }
}

impl WallFeed for FakeFeed {
    fn owner_posts(&self, _community_id: i64, count: usize) -> Result<FeedPage, FeedError> {
        if let Some(msg) = &self.posts_error {
            return Err(FeedError::Transport(msg.clone()));
        }
        Ok(FeedPage {
            count: Some(self.posts.len() as u64),
            items: self.posts.iter().take(count).cloned().collect(),
        })
    }

    fn post_comments(&self, req: &CommentsRequest) -> Result<FeedPage, FeedError> {
        self.comment_calls.lock().unwrap().push(*req);
        match self.comments.get(&req.post_id) {
            Some(Ok(items)) => Ok(FeedPage { count: Some(items.len() as u64), items: items.clone() }),
            Some(Err(msg)) => Err(FeedError::Api { code: 6, message: msg.clone() }),
            None => Ok(FeedPage { count: Some(0), items: Vec::new() }),
        }
    }
}

/// Wall item published `hours_ago` before `NOW`.
pub fn post(id: i64, hours_ago: i64, text: &str, comments: u64) -> Value {
    json!({
        "id": id,
        "from_id": -CLUB,
        "owner_id": -CLUB,
        "date": NOW.unix_timestamp() - hours_ago * 3600,
        "text": text,
        "comments": {"count": comments, "can_post": 1},
        "likes": {"count": 3}
    })
}

pub fn comment(id: i64, minutes_ago: i64, text: &str, likes: u64) -> Value {
    json!({
        "id": id,
        "from_id": 1000 + id,
        "date": NOW.unix_timestamp() - minutes_ago * 60,
        "text": text,
        "likes": {"count": likes}
    })
}

pub fn with_thread(mut top: Value, replies: Vec<Value>) -> Value {
    top["thread"] = json!({"count": replies.len(), "items": replies});
    top
}

/// Two posts: #2 without comments, #1 with two top-level comments where the
/// second carries one threaded reply.
pub fn two_post_wall() -> FakeFeed {
    FakeFeed::new(vec![post(2, 1, "no comments here", 0), post(1, 5, "discuss\nthis", 3)]).with_comments(
        1,
        vec![
            comment(10, 200, "first", 2),
            with_thread(comment(11, 150, "second", 0), vec![comment(12, 100, "reply\r\nto second", 5)]),
        ],
    )
}

/// Parse a CSV file into header + records.
pub fn read_csv(path: &Path) -> (Vec<String>, Vec<Vec<String>>) {
    let mut rdr = csv::Reader::from_path(path).unwrap();
    read_csv_from(&mut rdr)
}

pub fn read_csv_from<R: std::io::Read>(rdr: &mut csv::Reader<R>) -> (Vec<String>, Vec<Vec<String>>) {
    let header = rdr.headers().unwrap().iter().map(str::to_string).collect();
    let rows = rdr
        .records()
        .map(|r| r.unwrap().iter().map(str::to_string).collect())
        .collect();
    (header, rows)
}

/// Decompress a `.zst` file and collect lines (strings).
pub fn decompress_zst_lines(path: &Path) -> Vec<String> {
    let f = File::open(path).unwrap();
    let dec = zstd::stream::read::Decoder::new(f).unwrap();
    let r = BufReader::new(dec);
    r.lines().map(|l| l.unwrap()).filter(|s| !s.is_empty()).collect()
}
