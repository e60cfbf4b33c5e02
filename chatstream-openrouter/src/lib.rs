#![doc = include_str!("../README.md")]

pub mod client;
pub mod config;
pub(crate) mod error;
pub(crate) mod mapping;

pub use client::OpenRouter;
pub use config::{ClientConfig, validate_api_key};

// Re-export chatstream-types for convenience
pub use chatstream_types::{ByteStream, ChatError, HttpErrorClass, Provider};
