//! Storage abstraction layer for Lexiclass.
//!
//! Dictionaries are written through the [`Storage`] trait, backed either by a
//! directory on disk ([`FileStorage`]) or by memory ([`MemoryStorage`]).
//! Binary files share the layout produced by [`StructWriter`]; persisted
//! dictionaries read their term tables back through [`MappedFile`].

pub mod file;
pub mod memory;
pub mod mmap;
pub mod structured;
pub mod traits;

// Re-export commonly used types
pub use file::*;
pub use memory::*;
pub use mmap::*;
pub use structured::*;
pub use traits::*;
