use crate::concurrency::map_ordered_limited;
use crate::config::ExportOptions;
use crate::date::Timezone;
use crate::feed::WallFeed;
use crate::flatten::flatten_comments;
use crate::integrity::{check_parent_linkage, check_post_references};
use crate::model::{Comment, Post, WorkItem};
use crate::outcome::{StageFailure, StageOutcome};
use crate::progress::make_count_progress;
use crate::scanner::scan_posts;
use crate::sink::{write_rows, ExportFormat};
use crate::util::init_tracing_once;
use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;

#[derive(Clone, Debug, Default)]
pub struct WallExport {
    pub(crate) opts: ExportOptions,
}

/// Everything one run pulled from the feed, before it is written anywhere.
#[derive(Clone, Debug, Default)]
pub struct Extraction {
    pub posts: Vec<Post>,
    pub comments: Vec<Comment>,
    pub queue: Vec<WorkItem>,
    /// Queue entries whose comments were actually requested.
    pub fetched: usize,
    pub failures: Vec<StageFailure>,
    pub skipped: usize,
}

/// What `run` wrote, plus the failures it tolerated on the way.
#[derive(Clone, Debug)]
pub struct ExportSummary {
    pub posts: usize,
    pub comments: usize,
    pub posts_path: PathBuf,
    pub comments_path: Option<PathBuf>,
    pub failures: Vec<StageFailure>,
}

impl WallExport {
    pub fn new() -> Self {
        Self { opts: ExportOptions::default() }
    }

    pub fn from_options(opts: ExportOptions) -> Self {
        Self { opts }
    }

    pub fn options(&self) -> &ExportOptions {
        &self.opts
    }

    // -------- Builder methods --------
    pub fn community(mut self, id: i64) -> Self { self.opts = self.opts.with_community(id); self }
    pub fn depth_days(mut self, days: u32) -> Self { self.opts = self.opts.with_depth_days(days); self }
    pub fn filter(mut self, filter: impl Into<String>) -> Self { self.opts = self.opts.with_filter(filter); self }
    pub fn timezone(mut self, tz: Timezone) -> Self { self.opts = self.opts.with_timezone(tz); self }
    pub fn host(mut self, host: impl AsRef<str>) -> Self { self.opts = self.opts.with_host(host); self }
    pub fn post_page_size(mut self, n: usize) -> Self { self.opts = self.opts.with_post_page_size(n); self }
    pub fn comment_page_size(mut self, n: usize) -> Self { self.opts = self.opts.with_comment_page_size(n); self }
    pub fn thread_window(mut self, n: usize) -> Self { self.opts = self.opts.with_thread_window(n); self }
    pub fn comment_concurrency(mut self, n: usize) -> Self { self.opts = self.opts.with_comment_concurrency(n); self }
    pub fn out_dir(mut self, dir: impl AsRef<Path>) -> Self { self.opts = self.opts.with_out_dir(dir); self }
    pub fn format(mut self, format: ExportFormat) -> Self { self.opts = self.opts.with_format(format); self }
    pub fn progress(mut self, yes: bool) -> Self { self.opts = self.opts.with_progress(yes); self }
    pub fn progress_label(mut self, label: impl Into<String>) -> Self { self.opts = self.opts.with_progress_label(label); self }
    pub fn io_write_buffer(mut self, bytes: usize) -> Self { self.opts = self.opts.with_io_write_buffer(bytes); self }

    // -------- Operations --------

    /// Scan posts, then flatten comments for every queued post with a nonzero
    /// expected count. Feed failures are recorded, never returned.
    pub fn extract<F: WallFeed + Sync + ?Sized>(&self, feed: &F) -> Extraction {
        self.extract_at(feed, OffsetDateTime::now_utc())
    }

    /// `extract` with an explicit "now" for the cutoff.
    pub fn extract_at<F: WallFeed + Sync + ?Sized>(&self, feed: &F, now: OffsetDateTime) -> Extraction {
        init_tracing_once();
        let opts = &self.opts;
        tracing::info!(
            "Get posts and comments of {} for {} days from now. Filter is {}",
            opts.community_id,
            opts.depth_days,
            if opts.filter.is_empty() { "not given" } else { opts.filter.as_str() }
        );

        let scan = scan_posts(feed, opts, now);
        let mut ex = Extraction {
            posts: scan.posts,
            queue: scan.queue,
            failures: scan.failure.into_iter().collect(),
            skipped: scan.malformed,
            ..Default::default()
        };

        let pending: Vec<WorkItem> = ex.queue.iter().copied().filter(|w| w.expected_comments > 0).collect();
        ex.fetched = pending.len();
        if pending.is_empty() {
            tracing::info!("No comments to export");
            return ex;
        }

        let pb = if opts.progress {
            Some(make_count_progress(pending.len() as u64, opts.progress_label.as_deref().unwrap_or("Comments")))
        } else {
            None
        };

        let outcomes: Vec<StageOutcome<Comment>> = map_ordered_limited(&pending, opts.comment_concurrency, |work| {
            let out = flatten_comments(feed, opts, *work);
            if let Some(pb) = &pb { pb.inc(1); }
            out
        });

        if let Some(pb) = pb { pb.finish_with_message("done"); }

        // Post-major order: outcomes arrive in queue order.
        for out in outcomes {
            ex.comments.extend(out.rows);
            ex.skipped += out.skipped;
            ex.failures.extend(out.failure);
        }

        tracing::info!("Exported {} comments total", ex.comments.len());
        ex
    }

    /// Extract and write `posts` (always) and `comments` (only when there was
    /// comment work) into `out_dir`. Only local I/O errors are returned.
    pub fn run<F: WallFeed + Sync + ?Sized>(&self, feed: &F) -> Result<ExportSummary> {
        self.run_at(feed, OffsetDateTime::now_utc())
    }

    pub fn run_at<F: WallFeed + Sync + ?Sized>(&self, feed: &F, now: OffsetDateTime) -> Result<ExportSummary> {
        if self.opts.community_id <= 0 {
            bail!("community id is required");
        }
        let out_dir = &self.opts.out_dir;
        fs::create_dir_all(out_dir).with_context(|| format!("create {}", out_dir.display()))?;

        let ex = self.extract_at(feed, now);
        report_integrity(&ex);

        let format = self.opts.format;
        let write_buf = self.opts.write_buffer_bytes;

        let posts_path = format.path_for(out_dir, "posts");
        write_rows(&posts_path, &ex.posts, format, write_buf)?;

        let comments_path = if ex.fetched > 0 {
            let path = format.path_for(out_dir, "comments");
            write_rows(&path, &ex.comments, format, write_buf)?;
            Some(path)
        } else {
            None
        };

        for f in &ex.failures {
            tracing::warn!(stage = %f.stage, error = %f.message, "stage finished with partial results");
        }

        Ok(ExportSummary {
            posts: ex.posts.len(),
            comments: ex.comments.len(),
            posts_path,
            comments_path,
            failures: ex.failures,
        })
    }
}

fn report_integrity(ex: &Extraction) {
    let issues = check_parent_linkage(&ex.comments)
        .into_iter()
        .chain(check_post_references(&ex.posts, &ex.comments));
    for issue in issues {
        tracing::warn!("integrity: {}", issue);
    }
}
