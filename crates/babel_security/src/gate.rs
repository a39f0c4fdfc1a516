//! The safety gate.

use crate::{SafetyCategory, SafetyPolicy};
use babel_core::AgeGroup;
use babel_error::{SafetyError, SafetyErrorKind};
use regex::{Regex, RegexBuilder};
use tracing::{debug, instrument, warn};

/// A banned term found in a prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Category of the term
    pub category: SafetyCategory,
    /// The term as matched (lowercase)
    pub term: String,
}

/// Pattern-based prompt filter.
#[derive(Debug, Clone)]
pub struct SafetyGate {
    categories: Vec<(SafetyCategory, Regex)>,
    replacements: Vec<(Regex, String)>,
}

impl SafetyGate {
    /// Compile a gate from a policy.
    pub fn new(policy: &SafetyPolicy) -> Result<Self, SafetyError> {
        let mut categories = Vec::with_capacity(policy.banned.len());
        for (category, words) in &policy.banned {
            if words.is_empty() {
                continue;
            }
            let alternation = words
                .iter()
                .map(|word| regex::escape(&word.to_lowercase()))
                .collect::<Vec<_>>()
                .join("|");
            let regex = Regex::new(&format!(r"\b({alternation})\b")).map_err(|e| {
                SafetyError::new(SafetyErrorKind::InvalidPolicy(format!(
                    "{category} terms: {e}"
                )))
            })?;
            categories.push((*category, regex));
        }

        let mut replacements = Vec::with_capacity(policy.replacements.len());
        for (from, to) in &policy.replacements {
            let regex = RegexBuilder::new(&format!(r"\b{}\b", regex::escape(from)))
                .case_insensitive(true)
                .build()
                .map_err(|e| {
                    SafetyError::new(SafetyErrorKind::InvalidPolicy(format!(
                        "replacement for '{from}': {e}"
                    )))
                })?;
            replacements.push((regex, to.clone()));
        }

        Ok(Self {
            categories,
            replacements,
        })
    }

    /// Gate with the built-in banned-term list.
    pub fn standard() -> Result<Self, SafetyError> {
        Self::new(&SafetyPolicy::default())
    }

    /// All banned terms found in the text, at most one per category.
    pub fn violations(&self, text: &str) -> Vec<Violation> {
        let lowered = text.to_lowercase();
        self.categories
            .iter()
            .filter_map(|(category, regex)| {
                regex.find(&lowered).map(|found| Violation {
                    category: *category,
                    term: found.as_str().to_string(),
                })
            })
            .collect()
    }

    /// True if no banned term occurs.
    #[instrument(skip(self, prompt), fields(prompt_len = prompt.len()))]
    pub fn is_safe(&self, prompt: &str) -> bool {
        let violations = self.violations(prompt);
        if let Some(first) = violations.first() {
            warn!(category = %first.category, term = %first.term, "Inappropriate content detected in prompt");
            return false;
        }
        debug!("Prompt passed safety check");
        true
    }

    /// Reject unsafe prompts with an error naming the first matched term.
    pub fn check_prompt(&self, prompt: &str) -> Result<(), SafetyError> {
        match self.violations(prompt).into_iter().next() {
            Some(violation) => {
                warn!(category = %violation.category, term = %violation.term, "Rejecting prompt");
                Err(SafetyError::new(SafetyErrorKind::UnsafePrompt {
                    matched: violation.term,
                }))
            }
            None => Ok(()),
        }
    }

    /// Replace terms that have a gentler alternative, case-insensitively.
    pub fn sanitize_text(&self, text: &str) -> String {
        self.replacements
            .iter()
            .fold(text.to_string(), |acc, (regex, replacement)| {
                regex.replace_all(&acc, replacement.as_str()).into_owned()
            })
    }

    /// True if an image prompt is free of banned terms.
    pub fn is_image_prompt_safe(&self, image_prompt: &str) -> bool {
        self.is_safe(image_prompt)
    }

    /// Append the age band's style qualifier and the standard safety modifiers.
    pub fn make_image_prompt_safe(&self, image_prompt: &str, age_group: AgeGroup) -> String {
        format!(
            "{}. Style: {}. Cartoon illustration, no scary elements, bright and cheerful.",
            image_prompt,
            age_group.profile().image_modifier
        )
    }
}
