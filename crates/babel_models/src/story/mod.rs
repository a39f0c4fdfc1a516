//! Story text generation.

mod gemini;
mod parse;
mod prompt;
mod template;

pub use gemini::GeminiStoryWriter;
pub use parse::parse_story;
pub use prompt::build_story_prompt;
pub use template::TemplateStoryWriter;
