mod config;
mod error;
mod logging;

#[cfg(feature = "chat")]
mod chat;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use topica_chat::{FailureKind, Message, Session, TopicRegistry};
use topica_gemini::GeminiClient;
use tracing::debug;

use crate::config::{ChatSettings, Overrides, load_config, resolve_api_key, resolve_settings};

#[derive(Parser)]
#[command(name = "topica")]
#[command(about = "Topic-steered chat with Gemini", long_about = None)]
struct Cli {
    /// Path to the config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log filter, e.g. "debug" or "topica_gemini=trace,info"
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug, Default)]
struct SessionArgs {
    /// Model to use
    #[arg(short, long)]
    model: Option<String>,

    /// Topic id to start with
    #[arg(short, long)]
    topic: Option<String>,

    /// Request timeout in seconds, 0 disables it
    #[arg(long)]
    timeout: Option<u64>,
}

impl From<SessionArgs> for Overrides {
    fn from(args: SessionArgs) -> Self {
        Overrides {
            model: args.model,
            topic: args.topic,
            timeout_secs: args.timeout,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    #[cfg(feature = "chat")]
    /// Start an interactive chat session
    Chat {
        #[command(flatten)]
        session: SessionArgs,
    },

    /// Send a single message and print the reply
    Ask {
        /// The message to send
        message: String,

        #[command(flatten)]
        session: SessionArgs,

        /// Print the assistant message as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the available topics
    Topics,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    let level = cli.log_level.as_deref().or(config.log.level.as_deref());
    let registry = TopicRegistry::builtin();

    match cli.command {
        #[cfg(feature = "chat")]
        Command::Chat { session } => {
            let log_file = config
                .log
                .file
                .clone()
                .unwrap_or_else(logging::default_log_file);
            logging::init(level, Some(&log_file))?;

            let settings = resolve_settings(
                &config,
                resolve_api_key(&config),
                &session.into(),
                &registry,
            )?;
            let client = Arc::new(GeminiClient::new(settings.gemini_config())?);
            chat::run(client, registry, settings.topic, settings.model).await?;
        }
        Command::Ask {
            message,
            session,
            json,
        } => {
            logging::init(level, None)?;

            let settings = resolve_settings(
                &config,
                resolve_api_key(&config),
                &session.into(),
                &registry,
            )?;
            let (reply, failure) = ask(&settings, message).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&reply)?);
            } else {
                print_reply(&reply);
            }
            if let Some(kind) = failure {
                anyhow::bail!("request failed ({kind:?})");
            }
        }
        Command::Topics => {
            logging::init(level, None)?;

            for topic in registry.iter() {
                println!("{} {:<8} {} - {}", topic.icon, topic.id, topic.name, topic.description);
            }
        }
    }

    Ok(())
}

/// Runs one submission through a fresh session and returns the assistant
/// message it produced, with the failure kind when the request failed.
async fn ask(
    settings: &ChatSettings,
    message: String,
) -> anyhow::Result<(Message, Option<FailureKind>)> {
    let client = Arc::new(GeminiClient::new(settings.gemini_config())?);
    let mut session = Session::new(client, settings.topic.clone());

    session.update_input(message);
    if !session.submit() {
        anyhow::bail!("message is empty");
    }
    session.settle().await;

    debug!(messages = session.state().messages().len(), "ask finished");

    let reply = session
        .state()
        .messages()
        .last()
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("no reply was recorded"))?;
    Ok((reply, session.state().last_failure()))
}

fn print_reply(reply: &Message) {
    println!("{}", reply.content);
    if !reply.sources.is_empty() {
        println!();
        println!("Sources:");
        for source in &reply.sources {
            println!("🔗 {} <{}>", source.title, source.uri);
        }
    }
}
