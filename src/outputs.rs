//! Discovery of the per-process `<id>.output` files of a run.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use fs_err as fs;
use regex::Regex;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::event::{EventLog, ProcessId};

const OUTPUT_SUFFIX: &str = ".output";

#[derive(Clone, Debug)]
pub struct OutputDir {
    files: BTreeMap<ProcessId, PathBuf>,
}

impl OutputDir {
    /// Collects every `*.output` file directly inside `dir`, keyed by the process id in its name.
    pub fn scan(dir: &Path) -> Result<Self> {
        let re_output = Regex::new(r"^([0-9]+)\.output$").unwrap();
        let mut files = BTreeMap::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            let path = entry.path();
            // Follows symlinks, so a linked output file counts like a regular one.
            if !name.ends_with(OUTPUT_SUFFIX) || !fs::metadata(&path)?.is_file() {
                continue;
            }
            let id = re_output
                .captures(&name)
                .and_then(|c| c[1].parse::<usize>().ok())
                .and_then(ProcessId::new)
                .ok_or_else(|| Error::InvalidOutputName(path.clone()))?;
            if files.insert(id, path.clone()).is_some() {
                return Err(Error::InvalidOutputName(path));
            }
            debug!(process = %id, path = %path.display(), "Found output file");
        }
        info!(dir = %dir.display(), count = files.len(), "Scanned output directory");
        Ok(Self { files })
    }

    pub fn expect_count(&self, expected: usize) -> Result<()> {
        if self.files.len() != expected {
            return Err(Error::OutputCountMismatch {
                found: self.files.len(),
                expected,
            });
        }
        Ok(())
    }

    pub fn path(&self, process: ProcessId) -> Result<&Path> {
        self.files
            .get(&process)
            .map(PathBuf::as_path)
            .ok_or(Error::MissingOutput(process))
    }

    pub fn read(&self, process: ProcessId) -> Result<EventLog> {
        EventLog::read(self.path(process)?)
    }

    /// Output files in ascending process id order.
    pub fn iter(&self) -> impl Iterator<Item = (ProcessId, &Path)> {
        self.files.iter().map(|(id, path)| (*id, path.as_path()))
    }
}
