//! Mediaseek - Seekable segment indexes for fragmented MP4 and Matroska
//!
//! This library crate exposes the CLI's configuration and streaming helpers
//! for integration testing.

pub mod config;
pub mod streaming;
