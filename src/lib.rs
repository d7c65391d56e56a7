//! # chatgpt-md-export
//!
//! A CLI tool that turns a ChatGPT data export into a folder of Markdown notes.
//!
//! ## What it does
//!
//! ChatGPT's "Export data" produces a zip archive whose `conversations.json`
//! holds every conversation as a graph of message nodes. This tool reads that
//! file (from the archive, from an extracted directory, or directly) and writes
//! one note per conversation under `output_dir/notes/`:
//!
//! ```text
//! ---
//! tags: [Notebooks/ChatGPT/2023-05]
//! title: 'Borrow checker questions'
//! created: '2023-05-02T04:00:00.000000Z'
//! modified: '2024-01-02T03:04:05.000000Z'
//! ---
//!
//! # Borrow checker questions
//!
//! 2023-05-02 04:00:01 - User:
//! ...
//! ```
//!
//! Files attached to messages are copied into `output_dir/attachments/`.
//!
//! ## Re-running
//!
//! Note names depend only on the creation time and title. If a note with the
//! same name already exists, the new note is written first and the old content
//! is kept below it, separated by a blank line.
//!
//! ## Usage
//!
//! ```sh
//! # Convert an export archive into ./output_dir
//! chatgpt-md-export ~/Downloads/chatgpt-export.zip
//!
//! # Convert an extracted export and commit the result to git
//! chatgpt-md-export ~/exports/chatgpt --commit
//! ```
//!
//! Defaults can be persisted in `~/.config/chatgpt-md-export/config.toml`.
pub mod attachments;
pub mod error;
pub mod importer;
pub mod input;
pub mod process;
pub mod renderer;
pub mod utils;
pub mod vcs;
