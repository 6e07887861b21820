use serde::{Deserialize, Deserializer, Serialize};

/// A message surfaced by the mailbox history diff. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRef {
    pub id: String,
    #[serde(default)]
    pub thread_id: String,
}

/// Full message detail as returned by `users.messages.get?format=full`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub thread_id: String,
    #[serde(default)]
    pub payload: Option<MessagePart>,
}

/// One node of a message's MIME tree. The root payload is also a part.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePart {
    #[serde(default)]
    pub part_id: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub headers: Vec<Header>,
    #[serde(default)]
    pub body: Option<PartBody>,
    #[serde(default)]
    pub parts: Vec<MessagePart>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartBody {
    #[serde(default)]
    pub attachment_id: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub data: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Header {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub value: String,
}

/// Where the bytes of an attachment candidate live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentSource<'a> {
    /// Base64 body data carried in the part itself.
    Inline(&'a str),
    /// Attachment id that must be fetched separately.
    Remote(&'a str),
}

impl MessagePart {
    /// Inline data wins over an attachment id when a part carries both.
    pub fn attachment_source(&self) -> Option<AttachmentSource<'_>> {
        let body = self.body.as_ref()?;
        if let Some(data) = body.data.as_deref().filter(|d| !d.is_empty()) {
            return Some(AttachmentSource::Inline(data));
        }
        body.attachment_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .map(AttachmentSource::Remote)
    }

    pub fn is_attachment_candidate(&self) -> bool {
        !self.filename.is_empty() && self.attachment_source().is_some()
    }

    /// Case-insensitive header lookup on this part.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }
}

/// Gmail sends history ids as strings from the REST API and as numbers in
/// push notifications. Both land as a string.
pub fn deserialize_history_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(u64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    })
}

/// [`deserialize_history_id`] for optional fields; `null` reads as `None`.
pub fn deserialize_optional_history_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Wrapped(#[serde(deserialize_with = "deserialize_history_id")] String);

    Ok(Option::<Wrapped>::deserialize(deserializer)?.map(|Wrapped(id)| id))
}
