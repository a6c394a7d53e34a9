use crate::batch_job::BatchJob;
use crate::error::BotError;
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Append-only file of prepared jobs, one JSON object per line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobStore {
    path: PathBuf,
}

impl JobStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    pub fn append(&self, job: &BatchJob) -> Result<(), BotError> {
        let mut line = serde_json::to_string(job)?;
        line += "\n";
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        debug!("Appended job for {} to {}", job.suggestion().item.id, self.path.display());
        Ok(())
    }

    /// All stored jobs in the order they were added. A missing file means no jobs.
    pub fn load_all(&self) -> Result<Vec<BatchJob>, BotError> {
        if !self.exists() {
            return Ok(vec![]);
        }
        let file = fs::File::open(&self.path)?;
        let mut ret = vec![];
        for (number, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let job: BatchJob = serde_json::from_str(&line).map_err(|e| {
                BotError::JobStore(format!("{} line {}: {e}", self.path.display(), number + 1))
            })?;
            ret.push(job);
        }
        Ok(ret)
    }

    /// Replaces the stored jobs with `jobs`; no jobs removes the file.
    /// The new content goes to a sibling file first, then replaces the old one.
    pub fn replace_all(&self, jobs: &[BatchJob]) -> Result<(), BotError> {
        if jobs.is_empty() {
            return self.remove();
        }
        let mut content = String::new();
        for job in jobs {
            content += &serde_json::to_string(job)?;
            content += "\n";
        }
        let mut tmp_path = self.path.clone().into_os_string();
        tmp_path.push(".tmp");
        fs::write(&tmp_path, content)?;
        fs::rename(&tmp_path, &self.path)?;
        info!("Kept {} job(s) in {}", jobs.len(), self.path.display());
        Ok(())
    }

    pub fn remove(&self) -> Result<(), BotError> {
        if self.exists() {
            fs::remove_file(&self.path)?;
            info!("Removed {}", self.path.display());
        }
        Ok(())
    }
}
