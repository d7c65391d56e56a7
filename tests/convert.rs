use chatgpt_md_export::input::{RECORDS_FILE, resolve_input};
use chatgpt_md_export::process::convert_all;
use chatgpt_md_export::utils::{ExportConfig, parse_existing_frontmatter};
use serde_json::json;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

fn export() -> serde_json::Value {
    json!([
        {
            "id": "11111111-aaaa",
            "title": "Trip Planning",
            "create_time": 1_683_000_000.25,
            "mapping": {
                "root": { "message": null, "parent": null, "children": ["sys"] },
                "asst": { "message": {
                    "author": { "role": "assistant" },
                    "create_time": 1_683_000_120.0,
                    "content": { "content_type": "text", "parts": ["Try Lisbon."] },
                    "metadata": { "_cite_metadata": { "metadata_list": [
                        { "title": "Example", "url": "http://x" }
                    ]}}
                }},
                "sys": { "message": {
                    "author": { "role": "system" },
                    "create_time": 1_683_000_000.5,
                    "content": { "content_type": "text", "parts": ["You are helpful."] }
                }},
                "user": {
                    "message": {
                        "author": { "role": "user" },
                        "create_time": 1_683_000_060.0,
                        "content": { "content_type": "text", "parts": ["Where should I go?"] }
                    },
                    "attachments": [{ "path": "files/map.png", "filename": "map.png" }]
                },
                "tool": { "message": {
                    "author": { "role": "tool" },
                    "create_time": 1_683_000_090.0,
                    "content": { "content_type": "tether_browsing_display", "result": "raw page" }
                }}
            }
        },
        {
            "id": "22222222-bbbb",
            "create_time": 1_690_000_000.0,
            "mapping": {
                "c": { "message": {
                    "author": { "role": "assistant" },
                    "create_time": 1_690_000_001.0,
                    "content": { "content_type": "code", "text": "fn main() {}" }
                }}
            }
        }
    ])
}

fn write_archive(path: &Path) {
    let mut zip = zip::ZipWriter::new(File::create(path).unwrap());
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
    zip.start_file(RECORDS_FILE, options).unwrap();
    zip.write_all(export().to_string().as_bytes()).unwrap();
    zip.start_file("files/map.png", options).unwrap();
    zip.write_all(b"\x89PNG").unwrap();
    zip.finish().unwrap();
}

#[test]
fn converts_archive_end_to_end() {
    let work = TempDir::new().unwrap();
    let archive = work.path().join("chatgpt-export.zip");
    write_archive(&archive);
    let config = ExportConfig::new(work.path().join("output_dir"));

    let mut input = resolve_input(&archive).unwrap();
    let staging = input.staging_dir().unwrap().to_path_buf();
    let records = std::mem::take(&mut input.records);
    let summary = convert_all(records, input.root(), &config).unwrap();
    drop(input);

    assert!(!staging.exists());
    assert_eq!(summary.created, 2);
    assert_eq!(summary.attachments, 1);
    assert_eq!(
        fs::read(config.attachments_dir().join("map.png")).unwrap(),
        b"\x89PNG"
    );

    let note =
        fs::read_to_string(config.notes_dir().join("20230502-0400-trip_planning.md")).unwrap();
    let fm = parse_existing_frontmatter(&note).unwrap();
    assert_eq!(fm.title.as_deref(), Some("Trip Planning"));
    assert_eq!(fm.created.as_deref(), Some("2023-05-02T04:00:00.250000Z"));
    assert!(note.starts_with("---\ntags: [Notebooks/ChatGPT/2023-05]\n"));

    let system = note.find("## System (2023-05-02 04:00:00):\n\nYou are helpful.").unwrap();
    let user = note
        .find("2023-05-02 04:01:00 - User:\n```\nWhere should I go?\n```\n")
        .unwrap();
    let assistant = note
        .find("2023-05-02 04:02:00 - Assistant:\n```\nTry Lisbon.\n```\n")
        .unwrap();
    assert!(system < user && user < assistant);
    assert!(note.ends_with("Links Visited:\n- [Example](http://x)\n"));
    assert!(!note.contains("raw page"));

    let untitled =
        fs::read_to_string(config.notes_dir().join("20230722-0426-conversation_1.md")).unwrap();
    assert!(untitled.contains("# conversation_1\n"));
    assert!(untitled.contains("```\nfn main() {}\n```"));
}

#[test]
fn converting_twice_keeps_first_run_below() {
    let work = TempDir::new().unwrap();
    let src = work.path().join("export");
    fs::create_dir_all(src.join("files")).unwrap();
    fs::write(src.join(RECORDS_FILE), export().to_string()).unwrap();
    fs::write(src.join("files/map.png"), b"img").unwrap();
    let config = ExportConfig::new(work.path().join("out"));
    let note_path = config.notes_dir().join("20230502-0400-trip_planning.md");

    let input = resolve_input(&src).unwrap();
    convert_all(input.records.clone(), input.root(), &config).unwrap();
    let first = fs::read_to_string(&note_path).unwrap();

    let summary = convert_all(input.records.clone(), input.root(), &config).unwrap();
    assert_eq!(summary.appended, 2);
    let second = fs::read_to_string(&note_path).unwrap();
    let (_, tail) = second.split_at(second.len() - first.len());
    assert_eq!(tail, first);
    assert!(second[..second.len() - first.len()].ends_with("\n\n"));
}

#[test]
fn missing_attachment_aborts() {
    let work = TempDir::new().unwrap();
    let src = work.path().join("export");
    fs::create_dir_all(&src).unwrap();
    fs::write(src.join(RECORDS_FILE), export().to_string()).unwrap();
    let config = ExportConfig::new(work.path().join("out"));

    let input = resolve_input(&src).unwrap();
    let err = convert_all(input.records.clone(), input.root(), &config).unwrap_err();
    assert!(format!("{err:#}").contains("attachment source not found"));
    assert!(!config.notes_dir().join("20230502-0400-trip_planning.md").exists());
}
