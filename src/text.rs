//! Text normalization and canonical URL templates shared by posts and comments.

use regex::Regex;
use std::sync::OnceLock;

static LINE_BREAKS: OnceLock<Regex> = OnceLock::new();

fn line_breaks() -> &'static Regex {
    LINE_BREAKS.get_or_init(|| Regex::new(r"[\n\r]+").expect("static line-break pattern"))
}

/// Collapse every run of `\n`/`\r` into a single space. Idempotent.
#[inline]
pub fn normalize_text(s: &str) -> String {
    line_breaks().replace_all(s, " ").into_owned()
}

/// `https://<host>/club<cid>?w=wall-<cid>_<pid>`
pub fn post_url(host: &str, community_id: i64, post_id: i64) -> String {
    format!("https://{host}/club{community_id}?w=wall-{community_id}_{post_id}")
}

/// `https://<host>/wall-<cid>_<pid>?reply=<anchor>`; the anchor of a thread
/// reply is its top-level comment, not the reply itself.
pub fn comment_url(host: &str, community_id: i64, post_id: i64, anchor: i64) -> String {
    format!("https://{host}/wall-{community_id}_{post_id}?reply={anchor}")
}
