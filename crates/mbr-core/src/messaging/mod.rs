//! Backend-facing abstractions: the bot API port, inbound update model and
//! the reaction failure table.

pub mod failure;
pub mod port;
pub mod types;
