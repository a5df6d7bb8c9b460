//! Post scan: one newest-first wall page, a time cutoff and an optional text filter.

use crate::config::ExportOptions;
use crate::date::{from_unix, Cutoff};
use crate::feed::WallFeed;
use crate::model::{Post, WallItem, WorkItem};
use crate::outcome::{Stage, StageFailure};
use crate::text::{normalize_text, post_url};
use time::OffsetDateTime;

/// Accepted posts (feed order) and the matching comment work queue.
#[derive(Clone, Debug, Default)]
pub struct ScanOutcome {
    pub posts: Vec<Post>,
    pub queue: Vec<WorkItem>,
    pub failure: Option<StageFailure>,
    pub filtered: usize,  // skipped by the text filter
    pub malformed: usize, // skipped for missing/invalid fields
}

enum Step {
    Accept(Post),
    Skip,
    Malformed,
    Stop,
}

/// Scan the community wall relative to `now`.
///
/// A filter mismatch skips the post and keeps going; the first post older than
/// the cutoff ends the scan, since everything after it is older still. Feed
/// errors never escape: they are logged and whatever was accepted is returned.
pub fn scan_posts<F: WallFeed + ?Sized>(feed: &F, opts: &ExportOptions, now: OffsetDateTime) -> ScanOutcome {
    let cutoff = Cutoff::new(now, opts.depth_days);
    let (start, end) = cutoff.window(opts.timezone);
    tracing::info!("Exporting time frame is {} – {}.", start, end);

    let mut out = ScanOutcome::default();
    let page = match feed.owner_posts(opts.community_id, opts.post_page_size) {
        Ok(page) => page,
        Err(e) => {
            tracing::error!(community = opts.community_id, error = %e, "Got an error during posts export");
            out.failure = Some(StageFailure::new(Stage::Posts, e));
            tracing::info!("{} posts have been exported", out.posts.len());
            return out;
        }
    };

    if page.items.len() >= opts.post_page_size {
        tracing::debug!(
            page_size = opts.post_page_size,
            total = ?page.count,
            "wall page is full; posts beyond it are not scanned"
        );
    }

    for raw in page.items {
        let item: WallItem = match serde_json::from_value(raw) {
            Ok(item) => item,
            Err(e) => {
                tracing::warn!(error = %e, "Skipping malformed wall item");
                out.malformed += 1;
                continue;
            }
        };
        match classify(item, &cutoff, opts, &end) {
            Step::Accept(post) => {
                out.queue.push(WorkItem { post_id: post.id, expected_comments: post.comments_number });
                out.posts.push(post);
            }
            Step::Skip => out.filtered += 1,
            Step::Malformed => out.malformed += 1,
            Step::Stop => break,
        }
    }

    tracing::info!("{} posts have been exported", out.posts.len());
    out
}

fn classify(item: WallItem, cutoff: &Cutoff, opts: &ExportOptions, window_end: &str) -> Step {
    if !opts.filter.is_empty() && !item.text.contains(opts.filter.as_str()) {
        tracing::info!("post {} doesn't contain '{}'", item.id, opts.filter);
        return Step::Skip;
    }
    if cutoff.is_older(item.date) {
        tracing::info!("All posts up to {} has been exported", window_end);
        return Step::Stop;
    }
    let Some(datetime) = from_unix(item.date, opts.timezone) else {
        tracing::warn!(post = item.id, date = item.date, "Skipping post with out-of-range date");
        return Step::Malformed;
    };
    Step::Accept(Post {
        id: item.id,
        url: post_url(&opts.host, opts.community_id, item.id),
        datetime,
        text: normalize_text(&item.text),
        comments_number: item.comments.count,
    })
}
