//! Small value types and helpers shared by the XS2A crates.
pub mod helpers;
mod secret;

pub use helpers::{parse_boolean_flag, parse_list, ListParseError};
pub use secret::Secret;
