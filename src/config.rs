use crate::date::Timezone;
use crate::sink::ExportFormat;
use std::path::{Path, PathBuf};

/// User-facing options with sensible defaults and builder chaining.
#[derive(Clone, Debug)]
pub struct ExportOptions {
    pub community_id: i64,            // positive club id, without the "-" owner prefix
    pub depth_days: u32,              // lookback window, days from now
    pub filter: String,               // case-sensitive substring a post must contain; empty = no filter
    pub timezone: Timezone,           // zone used for rendered datetimes and log lines
    pub host: String,                 // host used in canonical post/comment URLs

    // Feed paging
    pub post_page_size: usize,        // single wall page; older posts beyond it are not seen
    pub comment_page_size: usize,     // baseline, raised to the expected comment count
    pub thread_window: usize,         // thread items per top-level comment (deeper threads truncated)

    pub comment_concurrency: usize,   // posts whose comments are fetched in parallel; 1 = sequential
    pub out_dir: PathBuf,
    pub format: ExportFormat,
    pub progress: bool,               // show progress bar
    pub progress_label: Option<String>,

    // IO tuning
    pub write_buffer_bytes: usize,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            community_id: 0,
            depth_days: 1,
            filter: String::new(),
            timezone: Timezone::default(),
            host: "vk.com".to_string(),

            post_page_size: 100,
            comment_page_size: 100,
            thread_window: 10,

            comment_concurrency: 1,
            out_dir: PathBuf::from("data"),
            format: ExportFormat::Csv,
            progress: true,
            progress_label: None,

            write_buffer_bytes: 256 * 1024,
        }
    }
}

impl ExportOptions {
    pub fn with_community(mut self, community_id: i64) -> Self {
        // Accept the "-<id>" owner form too.
        self.community_id = community_id.abs();
        self
    }
    pub fn with_depth_days(mut self, days: u32) -> Self {
        self.depth_days = days;
        self
    }
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }
    pub fn with_timezone(mut self, tz: Timezone) -> Self {
        self.timezone = tz;
        self
    }
    pub fn with_host(mut self, host: impl AsRef<str>) -> Self {
        self.host = host.as_ref().trim().trim_end_matches('/').to_string();
        self
    }
    pub fn with_post_page_size(mut self, n: usize) -> Self {
        self.post_page_size = n.max(1);
        self
    }
    pub fn with_comment_page_size(mut self, n: usize) -> Self {
        self.comment_page_size = n.max(1);
        self
    }
    pub fn with_thread_window(mut self, n: usize) -> Self {
        self.thread_window = n;
        self
    }
    pub fn with_comment_concurrency(mut self, n: usize) -> Self {
        self.comment_concurrency = n.max(1);
        self
    }
    pub fn with_out_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.out_dir = dir.as_ref().to_path_buf();
        self
    }
    pub fn with_format(mut self, format: ExportFormat) -> Self {
        self.format = format;
        self
    }
    pub fn with_progress(mut self, yes: bool) -> Self {
        self.progress = yes;
        self
    }
    pub fn with_progress_label(mut self, label: impl Into<String>) -> Self {
        self.progress_label = Some(label.into());
        self
    }
    pub fn with_io_write_buffer(mut self, bytes: usize) -> Self {
        self.write_buffer_bytes = bytes.max(8 * 1024);
        self
    }

    /// Comment request size for a post expected to carry `expected` comments.
    pub fn comment_request_size(&self, expected: u64) -> usize {
        let expected = usize::try_from(expected).unwrap_or(usize::MAX);
        self.comment_page_size.max(expected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_size_covers_expected_count() {
        let opts = ExportOptions::default();
        assert_eq!(opts.comment_request_size(0), 100);
        assert_eq!(opts.comment_request_size(42), 100);
        assert_eq!(opts.comment_request_size(250), 250);
    }

    #[test]
    fn builder_normalizes_inputs() {
        let opts = ExportOptions::default()
            .with_community(-12345)
            .with_host(" vk.com/ ")
            .with_comment_concurrency(0)
            .with_post_page_size(0);
        assert_eq!(opts.community_id, 12345);
        assert_eq!(opts.host, "vk.com");
        assert_eq!(opts.comment_concurrency, 1);
        assert_eq!(opts.post_page_size, 1);
    }
}
