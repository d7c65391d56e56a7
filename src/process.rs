use crate::attachments::copy_attachments;
use crate::importer::Conversation;
use crate::renderer;
use crate::utils::{ExportConfig, ProcessResult, parse_existing_frontmatter};
use chrono::Utc;
use eyre::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;
use std::fs;
use std::io::Write;
use std::path::Path;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ConversionSummary {
    pub created: usize,
    pub appended: usize,
    pub attachments: usize,
}

impl ConversionSummary {
    /// Number of conversations written.
    pub fn total(&self) -> usize {
        self.created + self.appended
    }
}

/// Convert every record, in input order, into a note under `<output>/notes`.
///
/// `source_root` is where relative attachment paths are looked up. The first
/// failure aborts the run.
pub fn convert_all(
    records: Vec<Value>,
    source_root: &Path,
    config: &ExportConfig,
) -> Result<ConversionSummary> {
    let notes_dir = config.notes_dir();
    let attachments_dir = config.attachments_dir();
    fs::create_dir_all(&notes_dir)
        .wrap_err_with(|| format!("Failed to create notes directory: {}", notes_dir.display()))?;
    fs::create_dir_all(&attachments_dir).wrap_err_with(|| {
        format!(
            "Failed to create attachments directory: {}",
            attachments_dir.display()
        )
    })?;

    let pb = make_bar(records.len() as u64, config.quiet)?;
    let mut summary = ConversionSummary::default();

    for (index, record) in records.into_iter().enumerate() {
        let conversation = Conversation::from_value(index, record)?;
        let (result, copied) = export_conversation(&conversation, source_root, config, &pb)
            .wrap_err_with(|| format!("Failed to convert conversation {}", conversation.id))?;
        match result {
            ProcessResult::Created => summary.created += 1,
            ProcessResult::Appended => summary.appended += 1,
        }
        summary.attachments += copied;
        pb.inc(1);
    }

    pb.finish_and_clear();
    tracing::info!(
        created = summary.created,
        appended = summary.appended,
        attachments = summary.attachments,
        "conversion finished"
    );
    Ok(summary)
}

fn make_bar(total: u64, quiet: bool) -> Result<ProgressBar> {
    if quiet {
        return Ok(ProgressBar::hidden());
    }
    let bar = ProgressBar::new(total);
    bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} ({percent}%)",
        )
        .wrap_err("Invalid progress bar template")?
        .progress_chars("=>-"),
    );
    bar.println(format!("Found {} conversations.", total));
    Ok(bar)
}

fn export_conversation(
    conversation: &Conversation,
    source_root: &Path,
    config: &ExportConfig,
    pb: &ProgressBar,
) -> Result<(ProcessResult, usize)> {
    let title = conversation.title();
    let filename = renderer::note_filename(conversation.created()?, &title);
    let path = config.notes_dir().join(&filename);

    // Keep whatever a previous run left here; it goes below the new content.
    let existing = if path.exists() {
        let old = fs::read_to_string(&path)
            .wrap_err_with(|| format!("Failed to read existing note: {}", path.display()))?;
        let previous = parse_existing_frontmatter(&old).and_then(|fm| fm.modified);
        tracing::debug!(
            note = %filename,
            previous_modified = previous.as_deref().unwrap_or("unknown"),
            "note exists, appending previous content"
        );
        Some(old)
    } else {
        None
    };

    // Render fully in memory so a failure leaves the existing note untouched.
    let mut buffer = Vec::new();
    renderer::render_conversation(&mut buffer, conversation, Utc::now())
        .wrap_err("Failed to render conversation markdown")?;

    let result = match existing.as_deref() {
        Some(old) if !old.is_empty() => {
            writeln!(buffer)?;
            buffer.extend_from_slice(old.as_bytes());
            ProcessResult::Appended
        }
        _ => ProcessResult::Created,
    };

    let copied = copy_attachments(conversation, source_root, &config.attachments_dir())?;

    fs::write(&path, &buffer)
        .wrap_err_with(|| format!("Failed to write: {}", path.display()))?;

    if config.verbose {
        match result {
            ProcessResult::Created => pb.println(format!("Created:  {}", filename)),
            ProcessResult::Appended => pb.println(format!("Appended: {}", filename)),
        }
    }

    Ok((result, copied))
}
