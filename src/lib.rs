//! Async client for Twitch chat over IRC.
//!
//! A [`Client`] owns one session: [`Client::connect`] authenticates, requests
//! the membership, commands and tags capabilities, joins the configured
//! channels and then runs registered listeners until the connection ends.
//! Outbound lines go through a token bucket (19 lines per 30 seconds by
//! default) on a background task.
//!
//! ```no_run
//! use twirc::{Client, Options};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let options = Options::builder().host("irc.chat.twitch.tv").channel("somechannel").build()?;
//! let client = Client::new(options);
//!
//! let replies = client.clone();
//! client.on_chat(move |channel, _tags, message| {
//!     if message == "!ping" {
//!         replies.say(channel, "pong");
//!     }
//! });
//!
//! client.connect("somebot", "oauth:token").await?;
//! # Ok(())
//! # }
//! ```

mod client;
pub mod command;
pub mod config;
mod context;
mod dispatch;
pub mod error;
pub mod event;
pub mod event_handler;
pub mod logging;
pub mod message;
mod receiver;
mod registry;
pub mod sender;

pub use client::Client;
pub use config::{Options, OptionsBuilder, RateLimit};
pub use context::SEND_BUFFER_SIZE;
pub use dispatch::classify;
pub use error::{ConfigError, Error};
pub use event::{Event, EventKind};
pub use event_handler::EventHandler;
pub use message::{Message, Tags};
pub use sender::TokenBucket;
