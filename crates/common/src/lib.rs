//! Common types shared by the web-container workspace

pub mod basic;
mod error;
mod secret;

pub use error::{Error, Result};
pub use secret::Secret;
