#![doc = include_str!("../README.md")]

pub mod conversation;
pub mod error;
pub mod stream;
pub mod traits;
pub mod types;
pub mod wasm;

#[cfg(feature = "test-utils")]
pub mod test_utils;

pub use conversation::*;
pub use error::*;
pub use stream::*;
pub use traits::*;
pub use types::*;
pub use wasm::*;
