use eyre::{Context, Result, eyre};
use serde_json::Value;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use zip::ZipArchive;

pub const RECORDS_FILE: &str = "conversations.json";

/// Parsed export plus whatever has to stay alive while it is converted.
///
/// When the input was an archive, the extracted copy lives in a temporary
/// directory owned by this value and is removed when it is dropped.
#[derive(Debug)]
pub struct ResolvedInput {
    pub records: Vec<Value>,
    root: PathBuf,
    staging: Option<TempDir>,
}

impl ResolvedInput {
    /// Directory that relative attachment paths are resolved against.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The temporary extraction directory, if the input was an archive.
    pub fn staging_dir(&self) -> Option<&Path> {
        self.staging.as_ref().map(TempDir::path)
    }
}

/// Locate and parse `conversations.json` from an archive, a directory, or a JSON file.
pub fn resolve_input(path: &Path) -> Result<ResolvedInput> {
    resolve_input_in(path, &std::env::temp_dir())
}

/// Like [`resolve_input`], staging archives under `temp_root`.
///
/// The staging directory is removed on every error path as well.
pub fn resolve_input_in(path: &Path, temp_root: &Path) -> Result<ResolvedInput> {
    if let Some(mut archive) = open_archive(path) {
        let staging = TempDir::new_in(temp_root).wrap_err_with(|| {
            format!("Failed to create temporary directory in {}", temp_root.display())
        })?;
        tracing::debug!(
            archive = %path.display(),
            staging = %staging.path().display(),
            "extracting archive"
        );
        archive
            .extract(staging.path())
            .wrap_err_with(|| format!("Failed to extract archive: {}", path.display()))?;
        let records = load_records(&staging.path().join(RECORDS_FILE))?;
        return Ok(ResolvedInput {
            records,
            root: staging.path().to_path_buf(),
            staging: Some(staging),
        });
    }

    if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
        let records = load_records(path)?;
        let root = path.parent().map(Path::to_path_buf).unwrap_or_default();
        return Ok(ResolvedInput {
            records,
            root,
            staging: None,
        });
    }

    let records = load_records(&path.join(RECORDS_FILE))?;
    Ok(ResolvedInput {
        records,
        root: path.to_path_buf(),
        staging: None,
    })
}

/// `Some` only for a regular file that reads as a zip archive.
fn open_archive(path: &Path) -> Option<ZipArchive<File>> {
    if !path.is_file() {
        return None;
    }
    let file = File::open(path).ok()?;
    ZipArchive::new(file).ok()
}

fn load_records(path: &Path) -> Result<Vec<Value>> {
    let file = File::open(path)
        .wrap_err_with(|| format!("Failed to open records file: {}", path.display()))?;
    let value: Value = serde_json::from_reader(BufReader::new(file))
        .wrap_err_with(|| format!("Failed to parse JSON: {}", path.display()))?;
    match value {
        Value::Array(records) => {
            tracing::debug!(count = records.len(), file = %path.display(), "loaded records");
            Ok(records)
        }
        _ => Err(eyre!(
            "Expected a JSON array of conversations in {}",
            path.display()
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    const RECORDS: &str = r#"[{"id":"a","title":"T","create_time":1.0,"mapping":{}}]"#;

    fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
        let mut zip = zip::ZipWriter::new(File::create(path).unwrap());
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
        for (name, data) in entries {
            zip.start_file(*name, options).unwrap();
            zip.write_all(data).unwrap();
        }
        zip.finish().unwrap();
    }

    #[test]
    fn reads_directory() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(RECORDS_FILE), RECORDS).unwrap();

        let input = resolve_input(dir.path()).unwrap();
        assert_eq!(input.records.len(), 1);
        assert_eq!(input.root(), dir.path());
        assert!(input.staging_dir().is_none());
    }

    #[test]
    fn reads_json_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("export.json");
        fs::write(&file, RECORDS).unwrap();

        let input = resolve_input(&file).unwrap();
        assert_eq!(input.records[0]["id"], "a");
        assert_eq!(input.root(), dir.path());
    }

    #[test]
    fn extracts_archive_and_cleans_up() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("export.zip");
        write_zip(
            &archive,
            &[(RECORDS_FILE, RECORDS.as_bytes()), ("files/a.txt", b"attached".as_slice())],
        );

        let input = resolve_input(&archive).unwrap();
        let staging = input.staging_dir().unwrap().to_path_buf();
        assert_eq!(input.records.len(), 1);
        assert_eq!(fs::read(staging.join("files/a.txt")).unwrap(), b"attached");

        drop(input);
        assert!(!staging.exists());
    }

    #[test]
    fn archive_without_records_fails() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("export.zip");
        write_zip(&archive, &[("other.json", b"[]".as_slice())]);

        let err = resolve_input(&archive).unwrap_err();
        assert!(format!("{err:#}").contains(RECORDS_FILE));
    }

    #[test]
    fn staging_is_removed_when_loading_fails() {
        let dir = TempDir::new().unwrap();
        let temp_root = TempDir::new().unwrap();
        let archive = dir.path().join("export.zip");
        write_zip(&archive, &[(RECORDS_FILE, b"{ not json".as_slice())]);

        assert!(resolve_input_in(&archive, temp_root.path()).is_err());
        assert_eq!(fs::read_dir(temp_root.path()).unwrap().count(), 0);
    }

    #[test]
    fn staging_lives_under_the_given_root() {
        let dir = TempDir::new().unwrap();
        let temp_root = TempDir::new().unwrap();
        let archive = dir.path().join("export.zip");
        write_zip(&archive, &[(RECORDS_FILE, RECORDS.as_bytes())]);

        let input = resolve_input_in(&archive, temp_root.path()).unwrap();
        assert!(input.staging_dir().unwrap().starts_with(temp_root.path()));
        drop(input);
        assert_eq!(fs::read_dir(temp_root.path()).unwrap().count(), 0);
    }

    #[test]
    fn missing_or_malformed_records_fail() {
        let dir = TempDir::new().unwrap();
        assert!(resolve_input(dir.path()).is_err());

        fs::write(dir.path().join(RECORDS_FILE), "{\"not\": \"a list\"}").unwrap();
        assert!(resolve_input(dir.path()).is_err());

        fs::write(dir.path().join(RECORDS_FILE), "[{").unwrap();
        assert!(resolve_input(dir.path()).is_err());
    }
}
