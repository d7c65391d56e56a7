use crate::error::ConvertError;
use crate::importer::Conversation;
use crate::utils::resolve_against;
use eyre::{Context, Result};
use std::fs;
use std::path::{Component, Path};

/// Copy every attachment of `conversation` into `attachments_dir`.
///
/// Relative source paths resolve against `source_root`, the directory the
/// export was read from. A missing source aborts with
/// [`ConvertError::MissingAttachment`]. Returns the number of files copied.
pub fn copy_attachments(
    conversation: &Conversation,
    source_root: &Path,
    attachments_dir: &Path,
) -> Result<usize> {
    let mut copied = 0;
    for (_, _, node) in conversation.transcript() {
        for attachment in node.attachments() {
            let source = resolve_against(source_root, &attachment.path);
            if !source.is_file() {
                return Err(ConvertError::MissingAttachment { path: source }.into());
            }
            if !is_plain_file_name(&attachment.filename) {
                return Err(ConvertError::UnsafeAttachmentName {
                    filename: attachment.filename.clone(),
                }
                .into());
            }
            let target = attachments_dir.join(&attachment.filename);
            fs::copy(&source, &target).wrap_err_with(|| {
                format!(
                    "Failed to copy attachment {} -> {}",
                    source.display(),
                    target.display()
                )
            })?;
            tracing::debug!(
                source = %source.display(),
                target = %target.display(),
                "copied attachment"
            );
            copied += 1;
        }
    }
    Ok(copied)
}

/// Exactly one normal path component: no separators, `..`, or roots.
fn is_plain_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}
