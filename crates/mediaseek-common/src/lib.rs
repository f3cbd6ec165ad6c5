//! Mediaseek-Common: Shared types and utilities.
//!
//! This crate provides functionality shared between the segment indexer and
//! the `mediaseek` binary:
//!
//! - **Container Types**: The [`ContainerFormat`] enum naming the two supported
//!   container families
//! - **Path Utilities**: Functions to infer a container format from a file
//!   extension
//! - **Error Handling**: Common error type and result alias
//!
//! # Examples
//!
//! ```
//! use mediaseek_common::{ContainerFormat, Result};
//! use mediaseek_common::paths::detect_format;
//! use std::path::Path;
//!
//! fn example() -> Result<ContainerFormat> {
//!     detect_format(Path::new("episode.webm"))
//! }
//!
//! assert_eq!(example().unwrap(), ContainerFormat::Matroska);
//! ```

pub mod error;
pub mod paths;
pub mod types;

pub use error::{Error, Result};
pub use types::*;
