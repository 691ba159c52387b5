//! Gemini API adapter for topica.
//!
//! [`GeminiClient`] implements [`topica_chat::ModelAdapter`] on top of the
//! `generateContent` endpoint with Google Search grounding enabled, returning
//! the reply text and the de-duplicated web citations the model used.
//!
//! # Example
//!
//! ```ignore
//! use topica_chat::{ModelAdapter, TopicRegistry};
//! use topica_gemini::{GeminiClient, GeminiConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = GeminiConfig::new(std::env::var("GEMINI_API_KEY").ok());
//!     let client = GeminiClient::new(config).unwrap();
//!     let topic = TopicRegistry::builtin().default_topic().clone();
//!
//!     let reply = client.send("Hello!", &[], &topic).await.unwrap();
//!     println!("{}", reply.text);
//!     for source in reply.sources {
//!         println!("{} <{}>", source.title, source.uri);
//!     }
//! }
//! ```

mod client;
mod convert;
mod error;
mod types;

pub use client::{DEFAULT_BASE_URL, DEFAULT_MODEL, GeminiClient, GeminiConfig};
pub use convert::{
    EMPTY_REPLY_TEXT, build_contents, build_request_body, extract_citations, parse_error,
    parse_response,
};
pub use error::GeminiError;
pub use types::{Content, ContentRole, GenerateRequest};
