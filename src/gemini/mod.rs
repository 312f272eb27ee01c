//! Gemini integration module
//!
//! Talks to the `generateContent` endpoint of the Generative Language API and
//! turns its JSON answers into food and recipe records.

pub mod analyzer;
pub mod client;
pub mod prompts;

pub use analyzer::{FoodAnalyzer, ImageSource};
pub use client::{GeminiClient, Part};

use crate::food::FoodParseError;

/// Error types for Gemini operations
#[derive(Debug, thiserror::Error)]
pub enum GeminiError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Gemini API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("failed to fetch image: {0}")]
    Download(String),
    #[error("model returned no candidates")]
    EmptyResponse,
    #[error(transparent)]
    Parse(#[from] FoodParseError),
}
