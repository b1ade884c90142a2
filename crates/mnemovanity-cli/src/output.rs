//! Plain-text result files, rotated every `per_file` matches

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use mnemovanity_core::MatchResult;

pub const DEFAULT_PER_FILE: usize = 1000;

pub struct ResultLog {
    dir: PathBuf,
    per_file: usize,
    current: Option<(PathBuf, usize)>,
}

impl ResultLog {
    pub fn create(dir: &Path, per_file: usize) -> Result<Self> {
        fs::create_dir_all(dir).with_context(|| format!("Creating output directory {}", dir.display()))?;
        Ok(Self {
            dir: dir.to_path_buf(),
            per_file: per_file.max(1),
            current: None,
        })
    }

    /// Append one result, opening a new file when the current one is full
    pub fn append(&mut self, result: &MatchResult) -> Result<()> {
        let path = match &mut self.current {
            Some((path, count)) if *count < self.per_file => {
                *count += 1;
                path.clone()
            }
            _ => {
                let path = self.next_path();
                info!(path = %path.display(), "Opening new output file");
                self.current = Some((path.clone(), 1));
                path
            }
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Opening {}", path.display()))?;
        write_entry(&mut file, result).with_context(|| format!("Writing {}", path.display()))
    }

    pub fn current_file(&self) -> Option<&Path> {
        self.current.as_ref().map(|(path, _)| path.as_path())
    }

    fn next_path(&self) -> PathBuf {
        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let mut path = self.dir.join(format!("addresses_{}.txt", stamp));
        // rotation within the same second
        let mut n = 1;
        while path.exists() {
            path = self.dir.join(format!("addresses_{}_{}.txt", stamp, n));
            n += 1;
        }
        path
    }
}

fn write_entry(file: &mut File, result: &MatchResult) -> std::io::Result<()> {
    writeln!(file, "FOUND: {}", result.address)?;
    writeln!(file, "Mnemonic: {}", result.mnemonic)?;
    writeln!(file, "Index: {}", result.index)?;
    writeln!(file, "Score: {}/10 ({})", result.score, result.label)?;
    writeln!(file, "Found at: {}", result.found_at.to_rfc3339())?;
    writeln!(file, "{:-<50}", "")
}
