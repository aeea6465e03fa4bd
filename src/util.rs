//! Shared utility modules used across Lexiclass components.

pub mod varint;
