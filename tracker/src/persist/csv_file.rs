//! Timestamped CSV file sink.
//!
//! File names have minute precision, so two runs within the same minute
//! write to the same `job_updates_<YYYYMMDD_HHMM>.csv` and the later one
//! wins.

use chrono::NaiveDateTime;
use common::{JobMatch, HEADER};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::SinkError;

const SEP: char = ',';
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Deterministic output name for a run started at `run_at`.
pub fn file_name(run_at: NaiveDateTime) -> String {
    format!("job_updates_{}.csv", run_at.format("%Y%m%d_%H%M"))
}

/// What ended up on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenFile {
    pub path: PathBuf,
    pub rows: usize,
    pub bytes: u64,
}

#[derive(Debug, Clone)]
pub struct CsvSink {
    dir: PathBuf,
    bom: bool,
}

impl CsvSink {
    /// `bom` prefixes the file with a UTF-8 byte order mark so spreadsheet
    /// apps pick the right encoding.
    pub fn new(dir: impl Into<PathBuf>, bom: bool) -> Self {
        Self {
            dir: dir.into(),
            bom,
        }
    }

    /// Writes header plus one row per match. An empty slice still produces
    /// a header-only file.
    pub fn write(&self, jobs: &[JobMatch], run_at: NaiveDateTime) -> Result<WrittenFile, SinkError> {
        let path = self.dir.join(file_name(run_at));
        let io_err = |source| SinkError::Io {
            path: path.clone(),
            source,
        };

        if !self.dir.as_os_str().is_empty() {
            fs::create_dir_all(&self.dir).map_err(io_err)?;
        }

        write_file(&path, jobs, self.bom).map_err(io_err)?;
        let bytes = fs::metadata(&path).map_err(io_err)?.len();

        info!("✅ Saved {} job(s) to: {}", jobs.len(), path.display());
        info!(
            "📁 File exists: {} | Size: {} bytes | Path: {}",
            path.exists(),
            bytes,
            absolute_dir(&self.dir).display()
        );

        Ok(WrittenFile {
            path,
            rows: jobs.len(),
            bytes,
        })
    }
}

fn write_file(path: &Path, jobs: &[JobMatch], bom: bool) -> io::Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    if bom {
        out.write_all(UTF8_BOM)?;
    }
    write_row(&mut out, &HEADER)?;
    for job in jobs {
        write_row(&mut out, &job.to_row())?;
    }
    out.flush()
}

fn absolute_dir(dir: &Path) -> PathBuf {
    std::env::current_dir()
        .map(|cwd| cwd.join(dir))
        .unwrap_or_else(|_| dir.to_path_buf())
}

fn needs_quotes(field: &str) -> bool {
    field.contains(SEP) || field.contains('"') || field.contains('\n') || field.contains('\r')
}

/// Write a single row, quoting only the cells that need it.
fn write_row<W: Write, S: AsRef<str>>(mut w: W, row: &[S]) -> io::Result<()> {
    let mut first = true;
    for cell in row {
        let cell = cell.as_ref();
        if !first {
            write!(w, "{SEP}")?;
        } else {
            first = false;
        }
        if needs_quotes(cell) {
            write!(w, "\"{}\"", cell.replace('"', "\"\""))?;
        } else {
            write!(w, "{cell}")?;
        }
    }
    writeln!(w)
}
