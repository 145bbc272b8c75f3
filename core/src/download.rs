use crate::error::{ClientError, ClientResult};
use crate::gateway::SPREADSHEET_MIME;
use chrono::{Local, NaiveDate};
use parking_lot::Mutex;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;
use tracing::info;

/// Spreadsheet payload held in memory until it is saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpreadsheetBlob {
    pub bytes: Vec<u8>,
    pub mime: &'static str,
}

impl SpreadsheetBlob {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            mime: SPREADSHEET_MIME,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// `<prefix>_<YYYY>-<MM>-<DD>.xlsx`
pub fn artifact_filename(prefix: &str, date: NaiveDate) -> String {
    format!("{prefix}_{}.xlsx", date.format("%Y-%m-%d"))
}

pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Local calendar date of the machine.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// Save-as-download target. Saving is synchronous.
pub trait DownloadSink: Send + Sync {
    fn save(&self, blob: &SpreadsheetBlob, filename: &str) -> ClientResult<PathBuf>;
}

/// Writes downloads into a directory.
///
/// Bytes are staged in a temporary file next to the destination and only
/// renamed into place once fully written. The staging file is deleted when it
/// goes out of scope, whether or not the save succeeded.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

}

impl DownloadSink for DirectorySink {
    fn save(&self, blob: &SpreadsheetBlob, filename: &str) -> ClientResult<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let mut staged = NamedTempFile::with_prefix_in(".download-", &self.dir)?;
        staged.write_all(&blob.bytes)?;
        staged.flush()?;

        let destination = available_path(&self.dir, filename);
        staged
            .persist_noclobber(&destination)
            .map_err(|err| ClientError::Storage(format!(
                "failed to save {}: {}",
                destination.display(),
                err.error
            )))?;
        info!(path = %destination.display(), size = blob.len(), "download saved");
        Ok(destination)
    }
}

/// First free name among `name`, `name (1)`, `name (2)`, ...
fn available_path(dir: &Path, filename: &str) -> PathBuf {
    let candidate = dir.join(filename);
    if !candidate.exists() {
        return candidate;
    }
    let (stem, extension) = match filename.rsplit_once('.') {
        Some((stem, ext)) => (stem, format!(".{ext}")),
        None => (filename, String::new()),
    };
    (1..)
        .map(|n| dir.join(format!("{stem} ({n}){extension}")))
        .find(|path| !path.exists())
        .unwrap_or(candidate)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedDownload {
    pub filename: String,
    pub blob: SpreadsheetBlob,
}

/// Keeps saves in memory. Clones share the same record.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    saved: Arc<Mutex<Vec<RecordedDownload>>>,
    fail_with: Option<String>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink whose every save fails with `reason`.
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            saved: Arc::default(),
            fail_with: Some(reason.into()),
        }
    }

    pub fn downloads(&self) -> Vec<RecordedDownload> {
        self.saved.lock().clone()
    }
}

impl DownloadSink for RecordingSink {
    fn save(&self, blob: &SpreadsheetBlob, filename: &str) -> ClientResult<PathBuf> {
        if let Some(reason) = &self.fail_with {
            return Err(ClientError::Storage(reason.clone()));
        }
        self.saved.lock().push(RecordedDownload {
            filename: filename.to_string(),
            blob: blob.clone(),
        });
        Ok(PathBuf::from(filename))
    }
}
