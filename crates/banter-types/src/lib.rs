//! Shared domain types for the banter chat bot.
//!
//! This crate holds the tagged chat-event enum, bot configuration, and the
//! error taxonomy shared between banter-core and banter-infra. It has no
//! async or I/O dependencies so every other crate can depend on it freely.

pub mod config;
pub mod error;
pub mod event;
