use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use topica_chat::ModelAdapter;

use super::app::{AppMode, ChatApp};

pub fn handle_event<A: ModelAdapter>(app: &mut ChatApp<A>, event: Event) {
    if let Event::Key(key) = event {
        if key.kind == KeyEventKind::Press {
            handle_key(app, key);
        }
    }
}

fn handle_key<A: ModelAdapter>(app: &mut ChatApp<A>, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    match app.mode {
        AppMode::Chat => handle_chat_key(app, key),
        AppMode::SelectTopic => handle_popup_key(app, key),
    }
}

fn handle_chat_key<A: ModelAdapter>(app: &mut ChatApp<A>, key: KeyEvent) {
    match (key.code, key.modifiers) {
        (KeyCode::Esc, _) => {
            if app.is_loading() {
                app.cancel_request();
            } else {
                app.should_quit = true;
            }
        }
        (KeyCode::F(2), _) => {
            app.open_topic_picker();
        }
        (KeyCode::Enter, KeyModifiers::NONE) => {
            app.send_message();
        }
        (KeyCode::Enter, m) if m.intersects(KeyModifiers::SHIFT | KeyModifiers::ALT) => {
            app.input_newline();
        }
        (KeyCode::Char(c @ '1'..='9'), KeyModifiers::ALT) => {
            app.use_starter(c as usize - '1' as usize);
        }
        (KeyCode::Up, KeyModifiers::CONTROL) => {
            app.scroll_up();
        }
        (KeyCode::Down, KeyModifiers::CONTROL) => {
            app.scroll_down();
        }
        (KeyCode::Backspace, _) => {
            app.input_backspace();
        }
        (KeyCode::Delete, _) => {
            app.input_delete();
        }
        (KeyCode::Left, _) => {
            app.input_left();
        }
        (KeyCode::Right, _) => {
            app.input_right();
        }
        (KeyCode::Home, _) => {
            app.input_home();
        }
        (KeyCode::End, _) => {
            app.input_end();
        }
        (KeyCode::Char(c), KeyModifiers::NONE | KeyModifiers::SHIFT) => {
            app.input_char(c);
        }
        _ => {}
    }
}

fn handle_popup_key<A: ModelAdapter>(app: &mut ChatApp<A>, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.close_popup(),
        KeyCode::Enter => app.popup_select(),
        KeyCode::Up => app.popup_up(),
        KeyCode::Down => app.popup_down(),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use std::fmt;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use crossterm::event::KeyEventState;
    use topica_chat::{
        AdapterFailure, FailureKind, Message, ModelReply, Role, Session, Topic, TopicRegistry,
    };

    use super::*;

    #[derive(Debug)]
    struct Never;

    impl fmt::Display for Never {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("never")
        }
    }

    impl std::error::Error for Never {}

    impl AdapterFailure for Never {
        fn kind(&self) -> FailureKind {
            FailureKind::Transport
        }
    }

    #[derive(Default)]
    struct Echo {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ModelAdapter for Echo {
        type Error = Never;

        async fn send(
            &self,
            message: &str,
            _history: &[Message],
            _topic: &Topic,
        ) -> Result<ModelReply, Never> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(ModelReply::new(format!("echo: {message}"), vec![]))
        }
    }

    fn app() -> (ChatApp<Echo>, Arc<Echo>) {
        let registry = TopicRegistry::builtin();
        let adapter = Arc::new(Echo::default());
        let session = Session::new(Arc::clone(&adapter), registry.default_topic().clone());
        (ChatApp::new(session, registry, "test-model".to_string()), adapter)
    }

    fn press(app: &mut ChatApp<Echo>, code: KeyCode, modifiers: KeyModifiers) {
        handle_event(
            app,
            Event::Key(KeyEvent {
                code,
                modifiers,
                kind: KeyEventKind::Press,
                state: KeyEventState::NONE,
            }),
        );
    }

    fn type_text(app: &mut ChatApp<Echo>, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c), KeyModifiers::NONE);
        }
    }

    #[tokio::test]
    async fn enter_submits_typed_text() {
        let (mut app, adapter) = app();
        type_text(&mut app, "Hi");
        press(&mut app, KeyCode::Enter, KeyModifiers::NONE);

        assert!(app.is_loading());
        assert_eq!(app.input(), "");
        assert_eq!(app.cursor_pos, 0);

        app.session.settle().await;
        let messages = app.state().messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[1].content, "echo: Hi");
        assert_eq!(adapter.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn shift_enter_inserts_newline() {
        let (mut app, adapter) = app();
        type_text(&mut app, "a");
        press(&mut app, KeyCode::Enter, KeyModifiers::SHIFT);
        type_text(&mut app, "b");

        assert_eq!(app.input(), "a\nb");
        assert!(!app.is_loading());
        assert_eq!(adapter.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn utf8_editing() {
        let (mut app, _) = app();
        type_text(&mut app, "héllo");
        press(&mut app, KeyCode::Left, KeyModifiers::NONE);
        press(&mut app, KeyCode::Left, KeyModifiers::NONE);
        press(&mut app, KeyCode::Left, KeyModifiers::NONE);
        press(&mut app, KeyCode::Backspace, KeyModifiers::NONE);
        assert_eq!(app.input(), "hllo");

        press(&mut app, KeyCode::Char('é'), KeyModifiers::NONE);
        press(&mut app, KeyCode::End, KeyModifiers::NONE);
        press(&mut app, KeyCode::Char('!'), KeyModifiers::SHIFT);
        assert_eq!(app.input(), "héllo!");

        press(&mut app, KeyCode::Home, KeyModifiers::NONE);
        press(&mut app, KeyCode::Delete, KeyModifiers::NONE);
        assert_eq!(app.input(), "éllo!");
    }

    #[tokio::test]
    async fn esc_cancels_then_quits() {
        let (mut app, _) = app();
        type_text(&mut app, "slow");
        press(&mut app, KeyCode::Enter, KeyModifiers::NONE);
        assert!(app.is_loading());

        press(&mut app, KeyCode::Esc, KeyModifiers::NONE);
        assert!(!app.is_loading());
        assert!(!app.should_quit);

        press(&mut app, KeyCode::Esc, KeyModifiers::NONE);
        assert!(app.should_quit);
    }

    #[tokio::test]
    async fn topic_picker_selects_topic() {
        let (mut app, _) = app();
        press(&mut app, KeyCode::F(2), KeyModifiers::NONE);
        assert_eq!(app.mode, AppMode::SelectTopic);
        assert_eq!(app.popup_selected, 0);

        press(&mut app, KeyCode::Down, KeyModifiers::NONE);
        press(&mut app, KeyCode::Enter, KeyModifiers::NONE);

        assert_eq!(app.mode, AppMode::Chat);
        assert_eq!(app.state().current_topic().id, "coding");
    }

    #[tokio::test]
    async fn popup_navigation_is_clamped() {
        let (mut app, _) = app();
        press(&mut app, KeyCode::F(2), KeyModifiers::NONE);
        press(&mut app, KeyCode::Up, KeyModifiers::NONE);
        assert_eq!(app.popup_selected, 0);
        for _ in 0..10 {
            press(&mut app, KeyCode::Down, KeyModifiers::NONE);
        }
        assert_eq!(app.popup_selected, app.registry.len() - 1);

        press(&mut app, KeyCode::Esc, KeyModifiers::NONE);
        assert_eq!(app.mode, AppMode::Chat);
        assert_eq!(app.state().current_topic().id, "general");
    }

    #[tokio::test]
    async fn starter_prompt_fills_empty_conversation_only() {
        let (mut app, _) = app();
        press(&mut app, KeyCode::Char('2'), KeyModifiers::ALT);
        assert_eq!(app.input(), topica_chat::STARTER_PROMPTS[1]);
        assert_eq!(app.cursor_pos, app.input().len());

        press(&mut app, KeyCode::Enter, KeyModifiers::NONE);
        app.session.settle().await;

        press(&mut app, KeyCode::Char('1'), KeyModifiers::ALT);
        assert_eq!(app.input(), "");
    }

    #[tokio::test]
    async fn ctrl_c_quits() {
        let (mut app, _) = app();
        press(&mut app, KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert!(app.should_quit);
        assert_eq!(app.input(), "");
    }
}
