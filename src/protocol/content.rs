//! Content items carried by `message` events.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The consumer a tool-result item is intended for.
///
/// Tool results can tag individual items for the end user, for the model,
/// or (by omitting the annotation) for both.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Audience {
    /// Content intended for the end user.
    #[default]
    User,
    /// Content intended for the model.
    Assistant,
}

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Model output: text and tool requests.
    Assistant,
    /// Turn input: typically tool responses.
    User,
}

/// One unit of message content.
///
/// Content items are text, a tool invocation request, or a tool invocation
/// result. Unknown item shapes fail the decode of the whole line, which the
/// decoder then skips and logs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ContentItem {
    /// Plain text content.
    Text(TextItem),
    /// A tool invocation requested by the assistant.
    ToolRequest(ToolRequestItem),
    /// A tool invocation result returned to the assistant.
    ToolResponse(ToolResponseItem),
}

/// Plain text content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextItem {
    /// The text content.
    pub text: String,
}

/// A tool invocation requested by the assistant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolRequestItem {
    /// Call-site identifier, echoed back by the matching response.
    pub id: String,
    /// Name of the tool being invoked.
    pub tool_name: String,
    /// Input parameters as a JSON object.
    #[serde(default)]
    pub arguments: Value,
}

/// A tool invocation result.
///
/// The agent does not echo the tool name back; only the call-site id links
/// a response to its request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResponseItem {
    /// The call-site id of the request this result answers.
    pub id: String,
    /// The result content items.
    #[serde(default)]
    pub result: Vec<ToolResultItem>,
    /// Whether the tool execution failed.
    #[serde(default)]
    pub is_error: bool,
}

/// One item inside a tool result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ToolResultItem {
    /// Text content, optionally audience-annotated.
    Text {
        /// The text.
        text: String,
        /// Visibility annotations, absent means visible to everyone.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        annotations: Option<Annotations>,
    },
    /// Image content. Only the annotations matter to the bridge; the payload
    /// is not forwarded.
    Image {
        /// Visibility annotations.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        annotations: Option<Annotations>,
    },
}

/// Visibility annotations on a tool-result item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Annotations {
    /// The audiences this item is intended for. `None` means unrestricted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audience: Option<Vec<Audience>>,
}

impl ToolResultItem {
    /// The annotations on this item, regardless of its shape.
    pub fn annotations(&self) -> Option<&Annotations> {
        match self {
            ToolResultItem::Text { annotations, .. } | ToolResultItem::Image { annotations } => {
                annotations.as_ref()
            }
        }
    }

    /// Check whether this item is visible to the given audience.
    ///
    /// Items with no audience annotation are visible to everyone; annotated
    /// items are visible only when the annotation set contains the target.
    pub fn visible_to(&self, audience: Audience) -> bool {
        match self.annotations().and_then(|a| a.audience.as_ref()) {
            None => true,
            Some(list) => list.contains(&audience),
        }
    }

    /// The text payload, if this is a text item.
    pub fn text(&self) -> Option<&str> {
        match self {
            ToolResultItem::Text { text, .. } => Some(text),
            ToolResultItem::Image { .. } => None,
        }
    }
}

/// Concatenate the text of all result items visible to `audience`.
///
/// This is the single filtering rule shared by the stream translator and the
/// session-export replay: an item survives when its annotation set includes
/// the target audience, or when it carries no audience annotation at all.
pub fn visible_text(items: &[ToolResultItem], audience: Audience) -> String {
    items
        .iter()
        .filter(|item| item.visible_to(audience))
        .filter_map(ToolResultItem::text)
        .collect::<Vec<_>>()
        .join("\n")
}

impl ContentItem {
    /// Check if this is a text item.
    pub fn is_text(&self) -> bool {
        matches!(self, ContentItem::Text(_))
    }

    /// Get as a tool request if applicable.
    pub fn as_tool_request(&self) -> Option<&ToolRequestItem> {
        match self {
            ContentItem::ToolRequest(t) => Some(t),
            _ => None,
        }
    }

    /// Get as a tool response if applicable.
    pub fn as_tool_response(&self) -> Option<&ToolResponseItem> {
        match self {
            ContentItem::ToolResponse(t) => Some(t),
            _ => None,
        }
    }

    /// Extract the text content if this is a text item.
    pub fn text(&self) -> Option<&str> {
        match self {
            ContentItem::Text(t) => Some(&t.text),
            _ => None,
        }
    }
}
