use topica_chat::{ConversationState, ModelAdapter, STARTER_PROMPTS, Session, TopicRegistry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    Chat,
    SelectTopic,
}

pub struct ChatApp<A: ModelAdapter> {
    pub mode: AppMode,
    pub should_quit: bool,
    pub session: Session<A>,
    pub registry: TopicRegistry,
    pub model: String,
    /// Byte offset into the input buffer.
    pub cursor_pos: usize,
    pub messages_scroll: u16,

    // Popup state
    pub popup_selected: usize,
}

impl<A: ModelAdapter> ChatApp<A> {
    pub fn new(session: Session<A>, registry: TopicRegistry, model: String) -> Self {
        Self {
            mode: AppMode::Chat,
            should_quit: false,
            session,
            registry,
            model,
            cursor_pos: 0,
            messages_scroll: 0,
            popup_selected: 0,
        }
    }

    pub fn state(&self) -> &ConversationState {
        self.session.state()
    }

    pub fn input(&self) -> &str {
        self.session.state().input()
    }

    pub fn is_loading(&self) -> bool {
        self.session.state().is_loading()
    }

    pub fn send_message(&mut self) {
        if self.session.submit() {
            self.cursor_pos = 0;
            self.messages_scroll = 0; // Scroll to bottom
        }
    }

    pub fn poll_response(&mut self) {
        if self.session.poll() {
            self.messages_scroll = 0;
        }
    }

    pub fn cancel_request(&mut self) {
        self.session.cancel();
    }

    /// Fills the input with a starter prompt; only on an empty conversation.
    pub fn use_starter(&mut self, index: usize) {
        if !self.state().messages().is_empty() {
            return;
        }
        if let Some(prompt) = STARTER_PROMPTS.get(index) {
            self.cursor_pos = prompt.len();
            self.session.update_input(*prompt);
        }
    }

    pub fn open_topic_picker(&mut self) {
        self.popup_selected = self
            .registry
            .position(&self.state().current_topic().id)
            .unwrap_or(0);
        self.mode = AppMode::SelectTopic;
    }

    pub fn close_popup(&mut self) {
        self.mode = AppMode::Chat;
    }

    pub fn popup_up(&mut self) {
        if self.popup_selected > 0 {
            self.popup_selected -= 1;
        }
    }

    pub fn popup_down(&mut self) {
        if self.popup_selected + 1 < self.registry.len() {
            self.popup_selected += 1;
        }
    }

    pub fn popup_select(&mut self) {
        if let Some(topic) = self.registry.get(self.popup_selected) {
            self.session.select_topic(topic.clone());
        }
        self.close_popup();
    }

    pub fn scroll_up(&mut self) {
        self.messages_scroll = self.messages_scroll.saturating_add(1);
    }

    pub fn scroll_down(&mut self) {
        self.messages_scroll = self.messages_scroll.saturating_sub(1);
    }

    /// Applies an edit to a copy of the input and hands it to the session.
    fn edit_input(&mut self, edit: impl FnOnce(&mut String, &mut usize)) {
        let mut text = self.input().to_string();
        let mut cursor = self.cursor_pos.min(text.len());
        edit(&mut text, &mut cursor);
        self.cursor_pos = cursor;
        self.session.update_input(text);
    }

    pub fn input_char(&mut self, c: char) {
        self.edit_input(|text, cursor| {
            text.insert(*cursor, c);
            *cursor += c.len_utf8();
        });
    }

    pub fn input_newline(&mut self) {
        self.input_char('\n');
    }

    pub fn input_backspace(&mut self) {
        self.edit_input(|text, cursor| {
            if let Some((prev, _)) = text[..*cursor].char_indices().next_back() {
                text.remove(prev);
                *cursor = prev;
            }
        });
    }

    pub fn input_delete(&mut self) {
        self.edit_input(|text, cursor| {
            if *cursor < text.len() {
                text.remove(*cursor);
            }
        });
    }

    pub fn input_left(&mut self) {
        let input = self.input();
        let cursor = self.cursor_pos.min(input.len());
        self.cursor_pos = input[..cursor]
            .char_indices()
            .next_back()
            .map(|(i, _)| i)
            .unwrap_or(0);
    }

    pub fn input_right(&mut self) {
        let input = self.input();
        let cursor = self.cursor_pos.min(input.len());
        self.cursor_pos = input[cursor..]
            .chars()
            .next()
            .map(|c| cursor + c.len_utf8())
            .unwrap_or(input.len());
    }

    pub fn input_home(&mut self) {
        self.cursor_pos = 0;
    }

    pub fn input_end(&mut self) {
        self.cursor_pos = self.input().len();
    }
}
