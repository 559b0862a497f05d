//! CSV export of the current view
//!
//! The artifact is built here; delivering it (a file, a download, a test
//! buffer) is the job of an `ExportSink`.

use crate::error::ExportError;
use parking_lot::Mutex;
use salesdash_series::{DateRange, Series, DATE_FORMAT};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Named CSV document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvExport {
    /// `sales_data_<start>_to_<end>.csv`
    pub file_name: String,
    /// Header plus one line per point
    pub content: String,
}

impl CsvExport {
    /// Build export for `series` under `range`
    ///
    /// Columns follow `columns`; a value missing from a point is written as
    /// `0`.
    ///
    /// # Errors
    /// `ExportError::NothingToExport` for an empty series
    pub fn build(range: &DateRange, columns: &[String], series: &Series) -> Result<Self, ExportError> {
        if series.is_empty() {
            return Err(ExportError::NothingToExport);
        }

        let mut content = String::from("date");
        for column in columns {
            content.push(',');
            content.push_str(column);
        }
        content.push('\n');

        for point in series {
            content.push_str(&point.date_string());
            for column in columns {
                // writing to a String cannot fail
                let _ = write!(content, ",{}", point.value(column));
            }
            content.push('\n');
        }

        Ok(Self {
            file_name: export_file_name(range),
            content,
        })
    }

    /// Number of data rows
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.content.lines().count().saturating_sub(1)
    }
}

/// Deterministic export file name for a range
#[must_use]
pub fn export_file_name(range: &DateRange) -> String {
    format!(
        "sales_data_{}_to_{}.csv",
        range.start.format(DATE_FORMAT),
        range.end.format(DATE_FORMAT)
    )
}

/// Receiver of export artifacts
pub trait ExportSink: Send + Sync {
    /// Deliver the artifact
    ///
    /// # Errors
    /// Sink-specific delivery failure
    fn deliver(&self, export: &CsvExport) -> Result<(), ExportError>;
}

/// Writes exports into a directory
#[derive(Debug, Clone)]
pub struct FileExportSink {
    dir: PathBuf,
}

impl FileExportSink {
    /// Create sink writing into `dir`
    #[inline]
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Target path for an export
    #[must_use]
    pub fn path_for(&self, export: &CsvExport) -> PathBuf {
        self.dir.join(&export.file_name)
    }

    /// Target directory
    #[inline]
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ExportSink for FileExportSink {
    fn deliver(&self, export: &CsvExport) -> Result<(), ExportError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| ExportError::io_error(&self.dir, e))?;

        let path = self.path_for(export);
        std::fs::write(&path, &export.content).map_err(|e| ExportError::io_error(&path, e))?;

        tracing::info!(path = %path.display(), rows = export.row_count(), "exported csv");
        Ok(())
    }
}

/// Collects exports in memory
#[derive(Debug, Default)]
pub struct MemoryExportSink {
    delivered: Mutex<Vec<CsvExport>>,
}

impl MemoryExportSink {
    /// Create empty sink
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything delivered so far
    #[must_use]
    pub fn delivered(&self) -> Vec<CsvExport> {
        self.delivered.lock().clone()
    }
}

impl ExportSink for MemoryExportSink {
    fn deliver(&self, export: &CsvExport) -> Result<(), ExportError> {
        self.delivered.lock().push(export.clone());
        Ok(())
    }
}
