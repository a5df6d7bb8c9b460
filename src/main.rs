use anyhow::{bail, Result};
use clap::Parser;
use std::path::PathBuf;
use vetl::{init_logging, ExportFormat, Timezone, VkApiFeed, WallExport};

/// Export posts of a VK club given by CLUB_ID and their comments.
#[derive(Parser, Debug)]
#[command(name = "vetl", version, about, long_about = None)]
struct Cli {
    /// Club id (positive, without the "-" owner prefix).
    club_id: i64,

    /// Number of days from now for post export.
    #[arg(short, long, default_value_t = 1)]
    depth: u32,

    /// A string that a post must contain; empty to not filter.
    #[arg(short, long, default_value = "")]
    filter: String,

    #[arg(long, default_value = "data")]
    out_dir: PathBuf,

    /// csv or csv-zst.
    #[arg(long, default_value_t = ExportFormat::Csv)]
    format: ExportFormat,

    /// Posts whose comments are fetched in parallel.
    #[arg(long, default_value_t = 1)]
    concurrency: usize,

    /// Wall page size; older posts beyond one page are not exported.
    #[arg(long, default_value_t = 100)]
    post_page_size: usize,

    /// Thread replies fetched per top-level comment.
    #[arg(long, default_value_t = 10)]
    thread_window: usize,

    #[arg(long)]
    no_progress: bool,

    #[arg(long, default_value = "data/log.txt")]
    log_file: PathBuf,

    #[arg(long, env = "VK_ACCESS_TOKEN", hide_env_values = true)]
    access_token: String,

    /// Zone for rendered datetimes: an IANA name (Europe/Moscow) or an offset (+03:00).
    #[arg(long, env = "TIMEZONE", default_value = "UTC")]
    timezone: Timezone,

    #[arg(long, env = "VK_API_URL")]
    api_url: Option<String>,
}

fn main() -> Result<()> {
    // .env is optional; real env vars win.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_logging(Some(&cli.log_file))?;

    if cli.club_id == 0 {
        bail!("CLUB_ID must be nonzero");
    }

    let mut feed = VkApiFeed::new(cli.access_token);
    if let Some(url) = &cli.api_url {
        feed = feed.with_endpoint(url);
    }

    let summary = WallExport::new()
        .community(cli.club_id)
        .depth_days(cli.depth)
        .filter(cli.filter)
        .timezone(cli.timezone)
        .post_page_size(cli.post_page_size)
        .thread_window(cli.thread_window)
        .comment_concurrency(cli.concurrency)
        .out_dir(&cli.out_dir)
        .format(cli.format)
        .progress(!cli.no_progress)
        .run(&feed)?;

    println!(
        "Exported {} posts and {} comments to {}",
        summary.posts,
        summary.comments,
        cli.out_dir.display()
    );
    if !summary.failures.is_empty() {
        eprintln!("{} feed call(s) failed; see log for details", summary.failures.len());
    }
    Ok(())
}
