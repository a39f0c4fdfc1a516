//! Core data types for the BabelBooks story worker.
//!
//! This crate holds the records that flow between the queue, the generators
//! and the story store:
//!
//! - [`Job`] and [`JobRequest`]: queued work and its input payload
//! - [`Story`], [`StoryPage`], [`StoryProgress`]: the progressively written story document
//! - [`GeneratedStory`]: output of the text stage
//! - [`ImageAsset`], [`AudioClip`]: generated media before persistence
//! - [`AgeGroup`], [`Tone`]: request parameters and the profiles derived from them

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod age;
mod asset;
mod generated;
mod ids;
mod job;
mod story;
mod tone;

pub use age::{AgeGroup, AgeProfile, SpeechRate, VoiceProfile, speech_language_code};
pub use asset::{AssetLocation, AudioClip, ImageAsset, PageAudio, PageImage};
pub use generated::{GeneratedPage, GeneratedStory};
pub use ids::{JobId, StoryId};
pub use job::{Job, JobCounts, JobRequest, JobRequestBuilder, JobRequestBuilderError, JobStatus};
pub use story::{Story, StoryBody, StoryMetadata, StoryPage, StoryProgress, StoryStatus};
pub use tone::{Soundscape, Tone};
