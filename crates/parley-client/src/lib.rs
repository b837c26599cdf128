pub mod auth;
pub mod client;
pub mod config;
pub mod hooks;
pub mod request;
mod turn;

pub use auth::{NoAuth, StaticToken, TokenProvider};
pub use client::{ChatClient, TurnOutcome, STOPPED_NOTICE};
pub use config::ClientConfig;
pub use hooks::{ClientHooks, NoopHooks, TranscriptStore};
pub use request::Transport;
