//! Core of the multi-bot reaction dispatcher.
//!
//! This crate is framework-agnostic: the Telegram Bot API lives behind the
//! `BotApi` port and is implemented in the `mbr-telegram` adapter crate.

pub mod command;
pub mod config;
pub mod dispatch;
pub mod domain;
pub mod errors;
pub mod identity;
pub mod logging;
pub mod messaging;
pub mod poller;
pub mod state;
pub mod status;
pub mod supervisor;

#[cfg(test)]
pub(crate) mod test_support;

pub use errors::{Error, Result};
