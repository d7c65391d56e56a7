use crate::error::ConvertError;
use crate::importer::{Content, Conversation, Message, Role};
use crate::utils::epoch_to_utc;
use chrono::{DateTime, Utc};
use eyre::Result;
use serde_json::Value;
use std::io::Write;

pub const TAG_PREFIX: &str = "Notebooks/ChatGPT";

const FRONTMATTER_TIME: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";
const MESSAGE_TIME: &str = "%Y-%m-%d %H:%M:%S";

/// Displayable text of a message, chosen by its content type.
pub fn extract_content(message: &Message) -> String {
    match &message.content {
        Content::Text { parts } => match parts.first() {
            Some(Value::String(text)) => text.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        },
        Content::Code { text } => text.clone(),
        Content::TetherBrowsingDisplay { result } => result.clone(),
        Content::Other => String::new(),
    }
}

/// `It's a Title` → `its_a_title`
pub fn slugify_title(title: &str) -> String {
    title.replace('\'', "").replace(' ', "_").to_lowercase()
}

/// `YYYYMMDD-HHMM-<slug>.md`
pub fn note_filename(created: DateTime<Utc>, title: &str) -> String {
    format!("{}-{}.md", created.format("%Y%m%d-%H%M"), slugify_title(title))
}

/// Body of a YAML single-quoted scalar.
fn yaml_quoted(value: &str) -> String {
    value.replace('\'', "''")
}

/// Write the full note for one conversation: frontmatter, heading and transcript.
///
/// `now` becomes the `modified` stamp. Attachments are handled by the caller.
pub fn render_conversation<W: Write>(
    writer: &mut W,
    conversation: &Conversation,
    now: DateTime<Utc>,
) -> Result<()> {
    let title = conversation.title();
    let created = conversation.created()?;

    writeln!(writer, "---")?;
    writeln!(writer, "tags: [{}/{}]", TAG_PREFIX, created.format("%Y-%m"))?;
    writeln!(writer, "title: '{}'", yaml_quoted(&title))?;
    writeln!(writer, "created: '{}'", created.format(FRONTMATTER_TIME))?;
    writeln!(writer, "modified: '{}'", now.format(FRONTMATTER_TIME))?;
    writeln!(writer, "---")?;
    writeln!(writer)?;

    writeln!(writer, "# {}", title)?;
    writeln!(writer)?;

    for (node_id, message, _) in conversation.transcript() {
        let label = match message.author.role {
            Role::System => "System",
            Role::User => "User",
            Role::Assistant => "Assistant",
            Role::Other => continue,
        };
        let time = message
            .create_time
            .and_then(epoch_to_utc)
            .ok_or_else(|| ConvertError::MissingMessageTime {
                conversation: conversation.id.clone(),
                node: node_id.to_string(),
            })?
            .format(MESSAGE_TIME);
        let content = extract_content(message);

        if message.author.role == Role::System {
            write!(writer, "## System ({}):\n\n{}\n\n", time, content)?;
            continue;
        }

        write!(writer, "{} - {}:\n```\n{}\n```\n\n", time, label, content)?;

        if message.author.role == Role::Assistant {
            let links = message.citations();
            if !links.is_empty() {
                writeln!(writer, "Links Visited:")?;
                for link in links {
                    writeln!(
                        writer,
                        "- [{}]({})",
                        link.title.as_deref().unwrap_or_default(),
                        link.url.as_deref().unwrap_or_default()
                    )?;
                }
            }
        }
    }

    Ok(())
}
