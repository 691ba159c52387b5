use serde_json::{Value, json};
use topica_chat::{Citation, Message, ModelReply, dedup_citations};

use crate::error::GeminiError;
use crate::types::{Content, ContentRole, GenerateRequest};

/// Text used when the model returns a reply without any text.
pub const EMPTY_REPLY_TEXT: &str = "The assistant returned no text.";

/// Maps the history to content turns, oldest first, and appends `message`
/// as the final user turn.
pub fn build_contents(message: &str, history: &[Message]) -> Vec<Content> {
    history
        .iter()
        .map(|msg| Content {
            role: msg.role.into(),
            text: msg.content.clone(),
        })
        .chain(std::iter::once(Content {
            role: ContentRole::User,
            text: message.to_string(),
        }))
        .collect()
}

fn content_to_json(content: &Content) -> Value {
    json!({
        "role": content.role.as_str(),
        "parts": [{ "text": content.text }]
    })
}

/// Builds the `generateContent` request body.
pub fn build_request_body(request: &GenerateRequest) -> Value {
    let contents: Vec<Value> = request.contents.iter().map(content_to_json).collect();

    let mut body = json!({ "contents": contents });

    if let Some(instruction) = &request.system_instruction {
        body["systemInstruction"] = json!({
            "parts": [{ "text": instruction }]
        });
    }

    if request.web_search {
        body["tools"] = json!([{ "google_search": {} }]);
    }

    body
}

/// Concatenates the non-thought text parts of a candidate.
fn candidate_text(candidate: &Value) -> String {
    let Some(parts) = candidate
        .get("content")
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.as_array())
    else {
        return String::new();
    };

    parts
        .iter()
        .filter(|part| !part.get("thought").and_then(|t| t.as_bool()).unwrap_or(false))
        .filter_map(|part| part.get("text").and_then(|t| t.as_str()))
        .collect()
}

/// Web citations from a candidate's grounding metadata, in response order.
/// Chunks missing a title or uri are skipped. Not de-duplicated.
pub fn extract_citations(candidate: &Value) -> Vec<Citation> {
    let Some(chunks) = candidate
        .get("groundingMetadata")
        .and_then(|g| g.get("groundingChunks"))
        .and_then(|c| c.as_array())
    else {
        return Vec::new();
    };

    chunks
        .iter()
        .filter_map(|chunk| {
            let web = chunk.get("web")?;
            let title = web.get("title").and_then(|t| t.as_str())?;
            let uri = web.get("uri").and_then(|u| u.as_str())?;
            if title.is_empty() || uri.is_empty() {
                return None;
            }
            Some(Citation::new(title, uri))
        })
        .collect()
}

/// Parses a successful `generateContent` response.
pub fn parse_response(response: &Value) -> ModelReply {
    let candidate = response.get("candidates").and_then(|c| c.get(0));

    let text = candidate.map(candidate_text).unwrap_or_default();
    let text = if text.is_empty() {
        EMPTY_REPLY_TEXT.to_string()
    } else {
        text
    };

    let sources = candidate
        .map(|c| dedup_citations(extract_citations(c)))
        .unwrap_or_default();

    ModelReply { text, sources }
}

/// Builds an API error from a non-success response body.
pub fn parse_error(status: u16, body: &Value) -> GeminiError {
    let error = body.get("error");

    let message = error
        .and_then(|e| e.get("message"))
        .and_then(|m| m.as_str())
        .unwrap_or("Unknown error")
        .to_string();

    let reason = error
        .and_then(|e| e.get("details"))
        .and_then(|d| d.as_array())
        .and_then(|details| {
            details
                .iter()
                .find_map(|d| d.get("reason").and_then(|r| r.as_str()))
        })
        .map(String::from);

    GeminiError::Api {
        status,
        message,
        reason,
    }
}
