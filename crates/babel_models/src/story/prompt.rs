//! Prompt construction for the text model.

use babel_core::JobRequest;

/// Build the authoring prompt for a request.
///
/// The prompt pins the exact page count and words per page of the request's age
/// band and asks for the JSON shape that [`crate::parse_story`] accepts.
pub fn build_story_prompt(request: &JobRequest) -> String {
    let age_group = request.age_group();
    let profile = age_group.profile();

    let mut personalization = String::new();
    if let Some(name) = request.child_name.as_deref().filter(|n| !n.trim().is_empty()) {
        personalization.push_str(&format!("- The main character is named {name}\n"));
    }
    if let Some(interests) = request
        .child_interests
        .as_deref()
        .filter(|i| !i.trim().is_empty())
    {
        personalization.push_str(&format!("- Weave in these interests: {interests}\n"));
    }

    format!(
        r#"You are a creative children's book author specializing in stories for {age} year olds.

Create a {tone} story in {language} based on this prompt: "{prompt}"

Requirements:
- Exactly {pages} pages
- About {words} words per page
- Style: {style}
- Complexity: {complexity}
- Include interactive elements appropriate for the age
- Safe, educational, and engaging content
{personalization}
Format your response as JSON:
{{
    "title": "Story Title",
    "pages": [
        {{
            "pageNumber": 1,
            "text": "Page text here",
            "imagePrompt": "Detailed description for illustration",
            "interactiveElement": "Optional: tap the sun to make it shine!",
            "narratorNote": "Optional: read with excitement"
        }}
    ]
}}"#,
        age = age_group.label(),
        tone = request.tone.to_lowercase(),
        language = request.text_language,
        prompt = request.prompt,
        pages = profile.pages,
        words = profile.words_per_page,
        style = profile.style,
        complexity = profile.complexity,
        personalization = personalization,
    )
}
