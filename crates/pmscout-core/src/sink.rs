//! CSV file sink with atomic tmp→rename

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use serde::Serialize;

/// Buffered CSV writer that only appears at its final path once finalized.
///
/// Rows go to `<path>.tmp`; [`CsvSink::finalize`] flushes and renames it into
/// place. A sink dropped without finalizing removes its tmp file and leaves
/// the destination untouched.
pub struct CsvSink {
    // Dropped before `tmp` so the file is closed when it is removed
    writer: csv::Writer<File>,
    tmp: TmpFile,
    final_path: PathBuf,
    row_count: usize,
}

/// Removes the tmp file on drop unless it was renamed into place
struct TmpFile {
    path: PathBuf,
    keep: bool,
}

impl Drop for TmpFile {
    fn drop(&mut self) {
        if self.keep {
            return;
        }
        if let Err(e) = fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                log::warn!("failed to remove {}: {e}", self.path.display());
            }
        }
    }
}

impl std::fmt::Debug for CsvSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CsvSink")
            .field("final_path", &self.final_path)
            .field("row_count", &self.row_count)
            .finish_non_exhaustive()
    }
}

impl CsvSink {
    /// Create the temporary file and write the header row.
    ///
    /// Missing parent directories are created. The header is written even if
    /// no rows follow.
    pub fn create(path: &Path, header: &[&str]) -> Result<Self, std::io::Error> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let tmp_path = tmp_path_for(path);
        // Clean up stale tmp file
        if tmp_path.exists() {
            fs::remove_file(&tmp_path)?;
        }

        let file = File::create(&tmp_path)?;
        let tmp = TmpFile {
            path: tmp_path,
            keep: false,
        };
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        writer.write_record(header)?;

        Ok(Self {
            writer,
            tmp,
            final_path: path.to_path_buf(),
            row_count: 0,
        })
    }

    /// Serialize one row; field order follows the struct's field order.
    pub fn write_row<T: Serialize>(&mut self, row: &T) -> Result<(), std::io::Error> {
        self.writer.serialize(row)?;
        self.row_count += 1;
        Ok(())
    }

    /// Flush and atomically rename tmp → final. Returns the data row count.
    ///
    /// On error the tmp file is removed.
    pub fn finalize(self) -> Result<usize, std::io::Error> {
        let Self {
            writer,
            mut tmp,
            final_path,
            row_count,
        } = self;
        let file = writer
            .into_inner()
            .map_err(|e| std::io::Error::new(e.error().kind(), e.error().to_string()))?;
        file.sync_all()?;
        drop(file);
        fs::rename(&tmp.path, &final_path)?;
        tmp.keep = true;
        Ok(row_count)
    }
}

/// `out.csv` → `out.csv.tmp` in the same directory, so the rename stays on one filesystem
fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
