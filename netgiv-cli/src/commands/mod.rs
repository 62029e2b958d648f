//! CLI command implementations.

pub mod burn;
pub mod copy;
pub mod list;
pub mod paste;
pub mod serve;
