//! Core domain types, errors, and constants for `flutterkit`.
//!
//! This crate establishes the foundational data structures and error handling
//! mechanisms used by the command-construction and SDK-handle crates.
//!
//! ## Key Components
//!
//! - **`errors`**: Defines the primary `Error` enum and `Result` type alias,
//!   centralizing all possible failure modes for predictable error handling.
//! - **`types`**: Domain types shared across the workspace, such as
//!   [`types::RunMode`], [`types::FlutterLaunchMode`], and [`types::PubRoot`].
//! - **`constants`**: Shared static constants such as well-known paths inside
//!   a Flutter SDK root and the config-query timeout.

pub mod constants;
pub mod errors;
pub mod types;

pub use self::{
    constants::*,
    errors::{Error, Result},
    types::*,
};
