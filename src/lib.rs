mod config;
mod date;
mod model;
mod text;

mod feed;
mod vk_api;
mod outcome;
mod scanner;
mod flatten;

mod concurrency;
mod progress;
mod util;
mod integrity;
mod sink;
mod pipeline;

pub use crate::config::ExportOptions;
pub use crate::date::{format_datetime, Cutoff, Timezone};
pub use crate::model::{Comment, Post, Row, WorkItem};
pub use crate::pipeline::{ExportSummary, Extraction, WallExport};

// Feed boundary and the HTTP implementation.
pub use crate::feed::{CommentsRequest, FeedError, FeedPage, WallFeed};
pub use crate::vk_api::VkApiFeed;

// The two core stages, usable on their own.
pub use crate::scanner::{scan_posts, ScanOutcome};
pub use crate::flatten::flatten_comments;
pub use crate::outcome::{Stage, StageFailure, StageOutcome};

pub use crate::text::{comment_url, normalize_text, post_url};
pub use crate::integrity::{check_parent_linkage, check_post_references, LinkageIssue};
pub use crate::sink::{write_rows, ExportFormat};

// Logging setup for binaries.
pub use crate::util::{init_logging, init_tracing_once};
