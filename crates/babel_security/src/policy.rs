//! Banned-term policy.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Category of banned content.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, derive_more::Display,
)]
#[serde(rename_all = "snake_case")]
pub enum SafetyCategory {
    /// Violence and weapons
    #[display("violence")]
    Violence,
    /// Adult themes
    #[display("adult")]
    Adult,
    /// Frightening themes
    #[display("scary")]
    Scary,
    /// Harsh language
    #[display("language")]
    Language,
}

/// Banned terms per category plus safe replacements used by text sanitizing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyPolicy {
    /// Banned terms grouped by category
    pub banned: BTreeMap<SafetyCategory, Vec<String>>,
    /// Replacement for a term when sanitizing text
    #[serde(default)]
    pub replacements: BTreeMap<String, String>,
}

fn terms(words: &[&str]) -> Vec<String> {
    words.iter().map(|word| word.to_string()).collect()
}

impl Default for SafetyPolicy {
    fn default() -> Self {
        let mut banned = BTreeMap::new();
        banned.insert(
            SafetyCategory::Violence,
            terms(&[
                "kill", "killing", "murder", "death", "die", "blood", "gore", "weapon",
                "weapons", "gun", "guns", "knife", "knives", "fight", "fights", "fighting",
                "punch", "hit",
            ]),
        );
        banned.insert(
            SafetyCategory::Adult,
            terms(&["sex", "nude", "kiss", "romance", "dating", "marry", "pregnant"]),
        );
        banned.insert(
            SafetyCategory::Scary,
            terms(&[
                "monster", "monsters", "demon", "devil", "hell", "nightmare", "scary", "horror",
                "ghost", "ghosts",
            ]),
        );
        banned.insert(
            SafetyCategory::Language,
            terms(&["damn", "hell", "crap", "stupid", "hate", "ugly"]),
        );

        let replacements = [
            ("fight", "play"),
            ("fighting", "playing"),
            ("hit", "hug"),
            ("scary", "silly"),
            ("monster", "friendly creature"),
            ("hate", "don't like"),
            ("stupid", "silly"),
        ]
        .into_iter()
        .map(|(from, to)| (from.to_string(), to.to_string()))
        .collect();

        Self {
            banned,
            replacements,
        }
    }
}
