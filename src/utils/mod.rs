//! Shared utility modules

pub mod url;
