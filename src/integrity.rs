//! Consistency checks over an extraction: reply → parent linkage and
//! comment → post references. Findings are reported, never repaired.

use crate::model::{Comment, Post};
use ahash::{AHashMap, AHashSet};
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LinkageIssue {
    /// A reply whose parent is not a top-level comment of the same post.
    MissingParent { post_id: i64, comment_id: i64, parent_id: i64 },
    /// A reply whose parent id matches more than one top-level comment.
    AmbiguousParent { post_id: i64, comment_id: i64, parent_id: i64, matches: usize },
    /// A comment whose post was not emitted.
    UnknownPost { post_id: i64, comment_id: i64 },
}

impl fmt::Display for LinkageIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingParent { post_id, comment_id, parent_id } => {
                write!(f, "comment {comment_id} of post {post_id} replies to missing parent {parent_id}")
            }
            Self::AmbiguousParent { post_id, comment_id, parent_id, matches } => write!(
                f,
                "comment {comment_id} of post {post_id} replies to parent {parent_id} present {matches} times"
            ),
            Self::UnknownPost { post_id, comment_id } => {
                write!(f, "comment {comment_id} references post {post_id} which was not exported")
            }
        }
    }
}

/// Every reply must have exactly one top-level comment with its parent id in the same post.
pub fn check_parent_linkage(comments: &[Comment]) -> Vec<LinkageIssue> {
    let mut top_level: AHashMap<(i64, i64), usize> = AHashMap::with_capacity(comments.len());
    for c in comments.iter().filter(|c| c.is_top_level()) {
        *top_level.entry((c.post_id, c.id)).or_default() += 1;
    }

    comments
        .iter()
        .filter_map(|c| {
            let parent_id = c.parent_comment_id?;
            match top_level.get(&(c.post_id, parent_id)).copied().unwrap_or(0) {
                1 => None,
                0 => Some(LinkageIssue::MissingParent { post_id: c.post_id, comment_id: c.id, parent_id }),
                matches => Some(LinkageIssue::AmbiguousParent { post_id: c.post_id, comment_id: c.id, parent_id, matches }),
            }
        })
        .collect()
}

/// Every comment must belong to an exported post.
pub fn check_post_references(posts: &[Post], comments: &[Comment]) -> Vec<LinkageIssue> {
    let known: AHashSet<i64> = posts.iter().map(|p| p.id).collect();
    comments
        .iter()
        .filter(|c| !known.contains(&c.post_id))
        .map(|c| LinkageIssue::UnknownPost { post_id: c.post_id, comment_id: c.id })
        .collect()
}
