//! Illustration backends.

mod batching;
mod imagen;
mod placeholder;
pub mod png;

pub use batching::BatchingIllustrator;
pub use imagen::ImagenIllustrator;
pub use placeholder::{PlaceholderIllustrator, placeholder_image};
