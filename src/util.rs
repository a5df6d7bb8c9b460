use anyhow::{Context, Result};
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Mutex;
use std::thread::sleep;
use std::time::Duration;
use tracing_subscriber::fmt::writer::MakeWriterExt;

static INIT_ONCE: std::sync::Once = std::sync::Once::new();

/// Install a stderr subscriber once (`RUST_LOG`, default `info`). No-op if the
/// process already installed one, e.g. through `init_logging`.
pub fn init_tracing_once() {
    INIT_ONCE.call_once(|| {
        let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
        let _ = tracing_subscriber::fmt().with_env_filter(env_filter).try_init();
    });
}

/// Process-wide logging for the binary: stderr, plus an append-only log file when given.
pub fn init_logging(log_file: Option<&Path>) -> Result<()> {
    let mut result = Ok(());
    INIT_ONCE.call_once(|| {
        result = install_subscriber(log_file);
    });
    result
}

fn install_subscriber(log_file: Option<&Path>) -> Result<()> {
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let Some(path) = log_file else {
        let _ = tracing_subscriber::fmt().with_env_filter(env_filter).try_init();
        return Ok(());
    };
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("create log dir {}", dir.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open log file {}", path.display()))?;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_ansi(false)
        .with_writer(io::stderr.and(Mutex::new(file)))
        .try_init();
    Ok(())
}

// -------- table file writes with retry --------

/// Sharing/lock errors seen while a previous export is still open in a spreadsheet.
fn is_retriable_io_error(e: &io::Error) -> bool {
    // raw Windows codes: 5, 32, 33, 1224
    matches!(e.raw_os_error(), Some(5 | 32 | 33 | 1224))
}

const TRIES: usize = 20;
const DELAY_MS: u64 = 50;

/// Run `op` until it succeeds, fails for good, or `tries` runs out.
/// The pause grows linearly with the attempt number.
fn with_retry<T>(tries: usize, delay_ms: u64, mut op: impl FnMut() -> io::Result<T>) -> io::Result<T> {
    let mut attempt = 0;
    loop {
        attempt += 1;
        match op() {
            Err(e) if is_retriable_io_error(&e) && attempt < tries.max(1) => {
                tracing::debug!(attempt, error = %e, "file busy, retrying");
                sleep(Duration::from_millis(delay_ms.saturating_mul(attempt as u64)));
            }
            other => return other,
        }
    }
}

/// Create (truncate) a table file, waiting out a reader that holds it.
pub fn create_with_backoff(path: &Path) -> io::Result<File> {
    with_retry(TRIES, DELAY_MS, || File::create(path))
}

/// A missing file counts as removed.
pub fn remove_with_backoff(path: &Path) -> Result<()> {
    with_retry(TRIES, DELAY_MS, || match fs::remove_file(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    })
    .with_context(|| format!("remove {}", path.display()))
}

/// Move a finished `.part` file over `dest`. When the rename keeps failing,
/// copy the bytes across and drop the temp file instead.
pub fn replace_file_atomic_backoff(tmp: &Path, dest: &Path) -> Result<()> {
    if dest.exists() {
        remove_with_backoff(dest)?;
    }
    if let Err(e) = with_retry(TRIES, DELAY_MS, || fs::rename(tmp, dest)) {
        tracing::warn!(error = %e, "rename {} failed, copying instead", tmp.display());
        fs::copy(tmp, dest).with_context(|| format!("copy {} -> {}", tmp.display(), dest.display()))?;
        remove_with_backoff(tmp)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn retry_stops_on_permanent_error() {
        let calls = Cell::new(0);
        let r: io::Result<()> = with_retry(5, 0, || {
            calls.set(calls.get() + 1);
            Err(io::Error::new(io::ErrorKind::InvalidInput, "nope"))
        });
        assert!(r.is_err());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn retry_gives_up_after_tries() {
        let calls = Cell::new(0);
        let r: io::Result<()> = with_retry(3, 0, || {
            calls.set(calls.get() + 1);
            Err(io::Error::from_raw_os_error(32))
        });
        assert_eq!(r.unwrap_err().raw_os_error(), Some(32));
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn replace_overwrites_destination() {
        let dir = tempfile::tempdir().unwrap();
        let tmp = dir.path().join("posts.csv.part");
        let dest = dir.path().join("posts.csv");
        fs::write(&dest, "old").unwrap();
        fs::write(&tmp, "new").unwrap();
        replace_file_atomic_backoff(&tmp, &dest).unwrap();
        assert_eq!(fs::read_to_string(&dest).unwrap(), "new");
        assert!(!tmp.exists());
        remove_with_backoff(&dest).unwrap();
        remove_with_backoff(&dest).unwrap();
    }
}
