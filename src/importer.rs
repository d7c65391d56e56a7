/// Type definitions for the ChatGPT data export (`conversations.json`).
///
/// The file is a JSON array of conversation records:
///
/// ```json
/// [{
///   "id": "…",
///   "title": "…",
///   "create_time": 1700000000.123,
///   "mapping": {
///     "<node id>": {
///       "message": {
///         "author": { "role": "user" },
///         "create_time": 1700000001.5,
///         "content": { "content_type": "text", "parts": ["hello"] },
///         "metadata": { "_cite_metadata": { "metadata_list": [] } }
///       },
///       "attachments": [{ "path": "files/a.png", "filename": "a.png" }]
///     }
///   }
/// }]
/// ```
///
/// Only the fields the renderer needs are modelled; everything else is ignored.
use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use serde_json::Value;

use crate::error::ConvertError;
use crate::utils::epoch_to_utc;

// ---------------------------------------------------------------------------
// Conversation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct Conversation {
    /// Zero-based position in the export, assigned by [`Conversation::from_value`].
    #[serde(skip)]
    pub index: usize,
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    pub create_time: f64,
    /// Message nodes in the order they appear in the file.
    #[serde(deserialize_with = "ordered_nodes")]
    pub mapping: Vec<(String, MessageNode)>,
}

impl Conversation {
    /// Decode one raw record. `index` is its position in the export.
    pub fn from_value(index: usize, value: Value) -> Result<Self, ConvertError> {
        let id = value.get("id").and_then(Value::as_str).map(str::to_owned);
        let mut conversation: Conversation = serde_json::from_value(value)
            .map_err(|source| ConvertError::InvalidRecord { index, id, source })?;
        conversation.index = index;
        Ok(conversation)
    }

    /// The record's title, or `conversation_<index>` when the export has none.
    pub fn title(&self) -> Cow<'_, str> {
        match self.title.as_deref() {
            Some(title) => Cow::Borrowed(title),
            None => Cow::Owned(format!("conversation_{}", self.index)),
        }
    }

    pub fn created(&self) -> Result<DateTime<Utc>, ConvertError> {
        epoch_to_utc(self.create_time).ok_or(ConvertError::InvalidTimestamp {
            index: self.index,
            value: self.create_time,
        })
    }

    /// Nodes carrying a message, sorted by message time.
    ///
    /// The sort is stable: untimed messages come first, equal times keep file order.
    pub fn transcript(&self) -> Vec<(&str, &Message, &MessageNode)> {
        let mut nodes: Vec<_> = self
            .mapping
            .iter()
            .filter_map(|(id, node)| {
                node.message
                    .as_ref()
                    .map(|message| (id.as_str(), message, node))
            })
            .collect();
        nodes.sort_by(|a, b| compare_times(a.1.create_time, b.1.create_time));
        nodes
    }
}

fn compare_times(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Collect a JSON object into `(key, node)` pairs without losing key order.
fn ordered_nodes<'de, D>(deserializer: D) -> Result<Vec<(String, MessageNode)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct NodesVisitor;

    impl<'de> Visitor<'de> for NodesVisitor {
        type Value = Vec<(String, MessageNode)>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map of message nodes")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
            let mut nodes = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some(entry) = map.next_entry::<String, MessageNode>()? {
                nodes.push(entry);
            }
            Ok(nodes)
        }
    }

    deserializer.deserialize_map(NodesVisitor)
}

// ---------------------------------------------------------------------------
// Nodes and messages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageNode {
    #[serde(default)]
    pub message: Option<Message>,
    /// Node-level attachments, as produced by older exports.
    #[serde(default)]
    pub attachments: Option<Vec<Attachment>>,
}

impl MessageNode {
    /// Attachments on the node and on its message, node first.
    pub fn attachments(&self) -> impl Iterator<Item = &Attachment> {
        let on_message = self
            .message
            .as_ref()
            .and_then(|m| m.attachments.as_deref())
            .unwrap_or_default();
        self.attachments
            .as_deref()
            .unwrap_or_default()
            .iter()
            .chain(on_message)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub author: Author,
    #[serde(default)]
    pub create_time: Option<f64>,
    pub content: Content,
    #[serde(default)]
    pub metadata: Option<MessageMetadata>,
    #[serde(default)]
    pub attachments: Option<Vec<Attachment>>,
}

impl Message {
    /// Citation links recorded for the message, empty when there are none.
    pub fn citations(&self) -> &[CitationLink] {
        self.metadata
            .as_ref()
            .and_then(|m| m.cite_metadata.as_ref())
            .and_then(|c| c.metadata_list.as_deref())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Author {
    #[serde(default)]
    pub role: Role,
}

/// Author role. Anything outside the three rendered roles (e.g. `tool`) is `Other`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    #[default]
    #[serde(other)]
    Other,
}

// ---------------------------------------------------------------------------
// Content
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "content_type", rename_all = "snake_case")]
pub enum Content {
    Text {
        #[serde(deserialize_with = "non_empty_parts")]
        parts: Vec<Value>,
    },
    Code {
        text: String,
    },
    TetherBrowsingDisplay {
        result: String,
    },
    #[serde(other)]
    Other,
}

fn non_empty_parts<'de, D>(deserializer: D) -> Result<Vec<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    let parts = Vec::<Value>::deserialize(deserializer)?;
    if parts.is_empty() {
        return Err(de::Error::invalid_length(0, &"at least one text part"));
    }
    Ok(parts)
}

// ---------------------------------------------------------------------------
// Metadata and attachments
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageMetadata {
    #[serde(rename = "_cite_metadata", default)]
    pub cite_metadata: Option<CiteMetadata>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CiteMetadata {
    #[serde(default)]
    pub metadata_list: Option<Vec<CitationLink>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CitationLink {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// A file referenced by a message: copied from `path` to `attachments/<filename>`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Attachment {
    pub path: PathBuf,
    pub filename: String,
}
