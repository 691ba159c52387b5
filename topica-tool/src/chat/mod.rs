mod app;
mod input;
mod ui;

use std::io;
use std::sync::Arc;
use std::time::Duration;

use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;
use topica_chat::{ModelAdapter, Session, Topic, TopicRegistry};
use tracing::info;

pub use app::ChatApp;

use crate::error::ToolError;

pub async fn run<A: ModelAdapter>(
    adapter: Arc<A>,
    registry: TopicRegistry,
    topic: Topic,
    model: String,
) -> Result<(), ToolError> {
    info!(topic = %topic.id, model = %model, "starting chat");

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let session = Session::new(adapter, topic);
    let mut app = ChatApp::new(session, registry, model);

    let result = run_loop(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    info!(messages = app.state().messages().len(), "chat finished");

    result
}

async fn run_loop<A: ModelAdapter>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut ChatApp<A>,
) -> Result<(), ToolError> {
    loop {
        terminal.draw(|f| ui::render(f, app))?;

        // Poll with a timeout so finished requests are picked up between keys
        if event::poll(Duration::from_millis(50))? {
            let event = event::read()?;
            input::handle_event(app, event);
        }

        app.poll_response();

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
