use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const NOTES_DIR: &str = "notes";
pub const ATTACHMENTS_DIR: &str = "attachments";

/// Configuration required to run the conversion.
/// This decouples the logic from how the arguments were parsed (CLI/Config file).
#[derive(Clone, Debug)]
pub struct ExportConfig {
    pub output_dir: PathBuf,
    pub commit: bool,
    pub verbose: bool,
    pub quiet: bool,
}

impl ExportConfig {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            commit: false,
            verbose: false,
            quiet: true,
        }
    }

    pub fn notes_dir(&self) -> PathBuf {
        self.output_dir.join(NOTES_DIR)
    }

    pub fn attachments_dir(&self) -> PathBuf {
        self.output_dir.join(ATTACHMENTS_DIR)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProcessResult {
    Created,
    /// A note with the same name existed; its content was kept below the new one.
    Appended,
}

/// The fields we read back from a previously written note.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct FileFrontmatter {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub modified: Option<String>,
}

/// Parse the YAML frontmatter at the top of an existing note.
pub fn parse_existing_frontmatter(content: &str) -> Option<FileFrontmatter> {
    let mut lines = content.lines();
    if lines.next()?.trim() != "---" {
        return None;
    }
    let mut yaml = String::new();
    for line in lines {
        if line.trim() == "---" {
            return serde_yaml::from_str(&yaml).ok();
        }
        yaml.push_str(line);
        yaml.push('\n');
    }
    None
}

/// Convert fractional epoch seconds to a UTC timestamp, rounded to the microsecond.
pub fn epoch_to_utc(secs: f64) -> Option<DateTime<Utc>> {
    let micros = (secs * 1_000_000.0).round();
    if !micros.is_finite() || micros.abs() > i64::MAX as f64 {
        return None;
    }
    DateTime::from_timestamp_micros(micros as i64)
}

/// Resolve `path` against `root` unless it is already absolute.
pub fn resolve_against(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}
