//! Trait definitions for the BabelBooks story worker.
//!
//! The coordinator depends only on these traits. Generator backends live in
//! `babel_models`, stores in `babel_database`, and blob storage in `babel_storage`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod traits;
mod types;

pub use traits::{Illustrator, JobQueue, Narrator, StoryStore, StoryWriter};
pub use types::{ImageRequest, NarrationRequest, StoryContext};
