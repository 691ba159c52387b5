/// A conversation persona: display metadata plus the system instruction sent
/// with every request while the topic is selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topic {
    pub id: String,
    pub name: String,
    pub description: String,
    pub system_instruction: String,
    pub icon: String,
}

impl Topic {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        system_instruction: impl Into<String>,
        icon: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            system_instruction: system_instruction.into(),
            icon: icon.into(),
        }
    }
}

// (id, name, description, system instruction, icon)
const BUILTIN: &[(&str, &str, &str, &str, &str)] = &[
    (
        "general",
        "General Assistant",
        "A generalist ready to help with any request.",
        "You are a friendly, professional personal assistant. Answer concisely but thoroughly.",
        "🤖",
    ),
    (
        "coding",
        "Coding Expert",
        "Specialised in programming and bug fixing.",
        "You are a senior software engineer. Give clear technical explanations, clean code examples and best practices.",
        "💻",
    ),
    (
        "travel",
        "Travel Guide",
        "Plan your trips and discover new places.",
        "You are a global travel expert. Suggest itineraries, restaurants and hidden gems, always with an enthusiastic tone.",
        "🌍",
    ),
    (
        "health",
        "Wellness & Nutrition",
        "Advice for a healthy lifestyle.",
        "You are a wellness and nutrition expert. Give science-based advice for a healthy lifestyle, always reminding the user to consult a doctor.",
        "🥗",
    ),
];

/// Prompts offered on an empty conversation.
pub const STARTER_PROMPTS: &[&str] = &[
    "What are today's top news stories?",
    "Suggest an idea for a creative project.",
];

/// Fixed, ordered list of topics. The first entry is the default selection.
#[derive(Debug, Clone)]
pub struct TopicRegistry {
    topics: Vec<Topic>,
}

impl TopicRegistry {
    pub fn builtin() -> Self {
        let topics = BUILTIN
            .iter()
            .map(|&(id, name, description, instruction, icon)| {
                Topic::new(id, name, description, instruction, icon)
            })
            .collect();
        Self { topics }
    }

    pub fn default_topic(&self) -> &Topic {
        &self.topics[0]
    }

    pub fn find(&self, id: &str) -> Option<&Topic> {
        self.topics.iter().find(|t| t.id == id)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.topics.iter().position(|t| t.id == id)
    }

    pub fn get(&self, index: usize) -> Option<&Topic> {
        self.topics.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Topic> {
        self.topics.iter()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.topics.iter().map(|t| t.id.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }
}

impl Default for TopicRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
