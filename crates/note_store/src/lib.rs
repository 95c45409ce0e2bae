//! Durable note collection plus the read-side view derived from it.
//! This crate is the only writer of the collection key.

pub mod query;
pub mod repository;

pub use query::{NoteView, filter_by_tag, search, sort};
pub use repository::{NoteRepository, RepoError, RepoResult};
