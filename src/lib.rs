#![deny(missing_docs)]
//! Channel Poster
//!
//! A Telegram bot that lets an operator holding a shared key publish posts
//! to a channel. Photos, including albums, are watermarked before they are
//! republished.

/// Media group debouncing
pub mod album;
/// Telegram bot implementation
pub mod bot;
/// Configuration management
pub mod config;
/// Inbound message model
pub mod content;
/// Publish cycle and channel transport interface
pub mod publisher;
/// Dispatcher wiring
pub mod runner;
/// Retry and string helpers
pub mod utils;
/// Image watermarking
pub mod watermark;
