//! Blob storage for story images and narration.
//!
//! Large page assets can be offloaded from the story document into a blob store,
//! leaving only a [`BlobReference`] (key, public URL, content type, size) on the page.
//!
//! # Backends
//!
//! - [`FileSystemBlobStore`]: objects written under a root directory and served from a
//!   configurable public URL base
//! - [`MemoryBlobStore`]: process-local map, for tests and mock runs
//!
//! # Keys
//!
//! Objects are keyed `stories/{storyId}/page-{pageNumber}-{image|audio}-{timestampMs}.{format}`;
//! see [`asset_key`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod filesystem;
mod key;
mod memory;
mod reference;
mod store;

pub use filesystem::FileSystemBlobStore;
pub use key::{AssetKind, asset_key, validate_key};
pub use memory::MemoryBlobStore;
pub use reference::{BlobMetadata, BlobReference};
pub use store::BlobStore;
