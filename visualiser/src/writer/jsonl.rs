use std::{
    fs::{self, File, OpenOptions},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use log::debug;

use super::{Record, SummaryWriter};
use crate::error::Result;

/// Appends every record as one JSON object per line to `<log_dir>/records.jsonl`.
pub struct JsonlWriter {
    path: PathBuf,
    out: BufWriter<File>,
    pending: usize,
}

impl JsonlWriter {
    pub const FILE_NAME: &'static str = "records.jsonl";

    /// Opens the log for appending, creating `log_dir` if needed.
    ///
    /// # Errors
    /// `VisErr::Io` if the directory or the file can't be created.
    pub fn create(log_dir: impl AsRef<Path>) -> Result<Self> {
        let log_dir = log_dir.as_ref();
        fs::create_dir_all(log_dir)?;

        let path = log_dir.join(Self::FILE_NAME);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok(Self {
            path,
            out: BufWriter::new(file),
            pending: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SummaryWriter for JsonlWriter {
    fn append(&mut self, record: Record) -> Result<()> {
        serde_json::to_writer(&mut self.out, &record)?;
        self.out.write_all(b"\n")?;
        self.pending += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        debug!(records = self.pending; "flushed dashboard log");
        self.pending = 0;
        Ok(())
    }
}
