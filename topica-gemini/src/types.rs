use topica_chat::Role;

/// Role tag of a content entry in the Gemini wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentRole {
    User,
    Model,
}

impl ContentRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentRole::User => "user",
            ContentRole::Model => "model",
        }
    }
}

impl From<Role> for ContentRole {
    fn from(role: Role) -> Self {
        match role {
            Role::User => ContentRole::User,
            Role::Assistant => ContentRole::Model,
        }
    }
}

/// One turn of the conversation sent to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Content {
    pub role: ContentRole,
    pub text: String,
}

/// A `generateContent` request.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub model: String,
    /// Conversation turns, oldest first, ending with the new user turn.
    pub contents: Vec<Content>,
    pub system_instruction: Option<String>,
    /// Enables the Google Search grounding tool.
    pub web_search: bool,
}
