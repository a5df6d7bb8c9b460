//! Table writers: CSV (optionally zstd-compressed) with a fixed header, written
//! to a temp part and promoted once complete.

use crate::model::Row;
use crate::util::{create_with_backoff, remove_with_backoff, replace_file_atomic_backoff};
use anyhow::{anyhow, Context, Result};
use std::fmt;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use zstd::stream::write::Encoder as ZstdEncoder;

/// Output encoding for the exported tables.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExportFormat {
    #[default]
    Csv,
    CsvZst,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::CsvZst => "csv.zst",
        }
    }

    /// `<dir>/<table>.<ext>`
    pub fn path_for(self, dir: &Path, table: &str) -> PathBuf {
        dir.join(format!("{table}.{}", self.extension()))
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExportFormat::Csv => "csv",
            ExportFormat::CsvZst => "csv-zst",
        })
    }
}

impl FromStr for ExportFormat {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "csv-zst" | "csv.zst" | "zst" => Ok(Self::CsvZst),
            other => Err(format!("unknown format {other:?} (expected csv or csv-zst)")),
        }
    }
}

/// Write `rows` as one table at `out_path`. The header always comes from
/// `T::COLUMNS`, so an empty table still has one.
pub fn write_rows<T: Row>(out_path: &Path, rows: &[T], format: ExportFormat, write_buf: usize) -> Result<()> {
    let tmp = part_path(out_path);
    let file = create_with_backoff(&tmp).with_context(|| format!("create {}", tmp.display()))?;
    let w = BufWriter::with_capacity(write_buf.max(8 * 1024), file);

    let written = match format {
        ExportFormat::Csv => write_csv(w, rows).and_then(|mut w| w.flush().map_err(Into::into)),
        ExportFormat::CsvZst => ZstdEncoder::new(w, 19)
            .map_err(anyhow::Error::from)
            .and_then(|enc| write_csv(enc, rows))
            .and_then(|enc| enc.finish().map_err(Into::into))
            .and_then(|mut w| w.flush().map_err(Into::into)),
    };
    if let Err(e) = written {
        let _ = remove_with_backoff(&tmp);
        return Err(e).with_context(|| format!("write {}", out_path.display()));
    }

    replace_file_atomic_backoff(&tmp, out_path)?;
    tracing::info!(path = %out_path.display(), rows = rows.len(), "table written");
    Ok(())
}

fn write_csv<W: Write, T: Row>(w: W, rows: &[T]) -> Result<W> {
    let mut csv = csv::WriterBuilder::new().has_headers(false).from_writer(w);
    csv.write_record(T::COLUMNS)?;
    for row in rows {
        csv.serialize(row)?;
    }
    csv.into_inner().map_err(|e| anyhow!("flush csv: {}", e.error()))
}

fn part_path(out_path: &Path) -> PathBuf {
    let mut name = out_path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".part");
    out_path.with_file_name(name)
}
