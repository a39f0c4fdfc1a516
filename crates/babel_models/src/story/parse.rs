//! Strict validation of generated story JSON.

use babel_core::{GeneratedPage, GeneratedStory, JobRequest, StoryMetadata};
use babel_error::{GenerationError, GenerationErrorKind};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawStory {
    title: Option<String>,
    #[serde(default)]
    pages: Vec<GeneratedPage>,
}

fn malformed(reason: impl Into<String>) -> GenerationError {
    GenerationError::new(GenerationErrorKind::MalformedStory(reason.into()))
}

/// Parse and validate model output for a request.
///
/// The output must carry a non-empty title and exactly the age band's page count,
/// numbered 1..=N in order, each page with non-empty text. Nothing is repaired.
pub fn parse_story(raw: &str, request: &JobRequest) -> Result<GeneratedStory, GenerationError> {
    let parsed: RawStory = serde_json::from_str(strip_code_fence(raw))
        .map_err(|e| malformed(format!("invalid story JSON: {e}")))?;

    let title = parsed
        .title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| malformed("missing title"))?;

    if parsed.pages.is_empty() {
        return Err(malformed("missing pages"));
    }

    let expected = request.age_group().profile().pages;
    if parsed.pages.len() as u32 != expected {
        return Err(malformed(format!(
            "expected {expected} pages for {}, got {}",
            request.age_group(),
            parsed.pages.len()
        )));
    }

    for (index, page) in parsed.pages.iter().enumerate() {
        let expected_number = index as u32 + 1;
        if page.page_number != expected_number {
            return Err(malformed(format!(
                "page at position {expected_number} is numbered {}",
                page.page_number
            )));
        }
        if page.text.trim().is_empty() {
            return Err(malformed(format!("page {expected_number} has no text")));
        }
    }

    let metadata = StoryMetadata {
        age_group: request.age_group().label().to_string(),
        tone: request.tone.clone(),
        language: request.text_language.clone(),
        page_count: expected,
    };

    Ok(GeneratedStory {
        title,
        pages: parsed.pages,
        metadata,
    })
}

/// Models occasionally wrap JSON in a markdown fence even in JSON mode.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(trimmed)
}
