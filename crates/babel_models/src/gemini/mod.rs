//! Google Generative Language REST API.
//!
//! Text and speech use `models/{model}:generateContent`; Imagen uses
//! `models/{model}:predict`. Responses are parsed into strict DTOs so any shape
//! mismatch surfaces as a single `UnexpectedResponse` error.

mod client;
mod dto;

pub use client::{DEFAULT_BASE_URL, GeminiRestClient};
pub(crate) use dto::{
    GenerateContentRequest, GenerateContentResponse, GenerationConfig, ImagenInstance,
    ImagenParameters, PredictRequest, PredictResponse, PrebuiltVoiceConfig, SpeechConfig,
    VoiceConfig,
};
