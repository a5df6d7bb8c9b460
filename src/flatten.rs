//! Comment fetch for one post, flattening top-level comments and their thread
//! replies into rows (depth-first: each thread right after its parent).

use crate::config::ExportOptions;
use crate::date::from_unix;
use crate::feed::{CommentsRequest, WallFeed};
use crate::model::{Comment, CommentItem, WorkItem};
use crate::outcome::{Stage, StageFailure, StageOutcome};
use crate::text::{comment_url, normalize_text};
use serde_json::Value;

pub fn flatten_comments<F: WallFeed + ?Sized>(feed: &F, opts: &ExportOptions, work: WorkItem) -> StageOutcome<Comment> {
    tracing::info!("Looking for {} comments of {} post", work.expected_comments, work.post_id);

    let req = CommentsRequest {
        community_id: opts.community_id,
        post_id: work.post_id,
        count: opts.comment_request_size(work.expected_comments),
        thread_items: opts.thread_window,
    };

    let mut out = StageOutcome::default();
    let page = match feed.post_comments(&req) {
        Ok(page) => page,
        Err(e) => {
            tracing::error!(post = work.post_id, error = %e, "Got an error during comments export");
            out.failure = Some(StageFailure::new(Stage::Comments { post_id: work.post_id }, e));
            return out;
        }
    };

    tracing::info!(
        "Exported {} items for {} comments",
        page.items.len(),
        page.count.map_or_else(|| "?".to_string(), |c| c.to_string())
    );

    let mut flat = Flattener { opts, post_id: work.post_id, out };
    for raw in page.items {
        flat.top_level(raw);
    }
    flat.out
}

struct Flattener<'a> {
    opts: &'a ExportOptions,
    post_id: i64,
    out: StageOutcome<Comment>,
}

impl Flattener<'_> {
    fn top_level(&mut self, raw: Value) {
        let Some(mut item) = self.parse(raw) else { return };
        let parent_id = item.id;
        let thread = item.thread.take().filter(|t| t.count > 0).map(|t| t.items);

        // A top-level comment that cannot be emitted takes its thread with it,
        // otherwise the replies would point at a missing parent.
        let Some(row) = self.row(&item, None) else {
            self.out.skipped += thread.as_ref().map_or(0, Vec::len);
            return;
        };
        self.out.rows.push(row);

        for raw_reply in thread.into_iter().flatten() {
            let Some(reply) = self.parse(raw_reply) else { continue };
            if let Some(row) = self.row(&reply, Some(parent_id)) {
                self.out.rows.push(row);
            }
        }
    }

    fn parse(&mut self, raw: Value) -> Option<CommentItem> {
        match serde_json::from_value::<CommentItem>(raw) {
            Ok(item) => Some(item),
            Err(e) => {
                tracing::warn!(post = self.post_id, error = %e, "Skipping malformed comment item");
                self.out.skipped += 1;
                None
            }
        }
    }

    fn row(&mut self, item: &CommentItem, parent: Option<i64>) -> Option<Comment> {
        let Some(datetime) = from_unix(item.date, self.opts.timezone) else {
            tracing::warn!(post = self.post_id, comment = item.id, date = item.date, "Skipping comment with out-of-range date");
            self.out.skipped += 1;
            return None;
        };
        let anchor = parent.unwrap_or(item.id);
        Some(Comment {
            id: item.id,
            post_id: self.post_id,
            url: comment_url(&self.opts.host, self.opts.community_id, self.post_id, anchor),
            datetime,
            text: normalize_text(&item.text),
            likes_number: item.likes.count,
            parent_comment_id: parent,
        })
    }
}
