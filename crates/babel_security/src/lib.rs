//! Content safety gate for children's story prompts.
//!
//! The gate is deterministic and pattern-based: prompts are lowercased and matched
//! against word-boundary patterns for banned terms. It never calls out to a service.
//!
//! ```
//! use babel_security::SafetyGate;
//!
//! let gate = SafetyGate::standard().unwrap();
//! assert!(gate.is_safe("a curious fox"));
//! assert!(!gate.is_safe("kids fighting with knives and a monster"));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod gate;
mod policy;

pub use gate::{SafetyGate, Violation};
pub use policy::{SafetyCategory, SafetyPolicy};
