//! Text serialization of components and levels

pub mod archive;

pub use archive::{ArchiveError, ArchiveResult, ArchiveWriter, FromValue, Scope, Value};
