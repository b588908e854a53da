//! Access to the generative text service.
//!
//! The service is an opaque `prompt -> text` function that may fail. It is
//! modelled as the [`Generator`] trait so pipelines never depend on a
//! concrete backend.
//!
//! # Environment Variables
//!
//! - `GEMINI_API_KEY`: Required for the Gemini backend (default)
//! - `OPENAI_API_KEY`: Required for the OpenAI backend
//! - `OLLAMA_MODEL`: Optional model override for a local Ollama

mod client;

pub use client::{AiClient, AiConfig, LlmBackend};

use thiserror::Error;

/// Errors that can occur while calling the generation service
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Missing API key: {env_var} not set. Get your key at {signup_url}")]
    MissingApiKey { env_var: String, signup_url: String },

    #[error("API request failed: {0}")]
    RequestFailed(String),

    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Failed to parse API response: {0}")]
    ParseError(String),
}

pub type GenerationResult<T> = Result<T, GenerationError>;

/// A single-attempt text generation call.
pub trait Generator {
    fn generate(&self, prompt: &str) -> GenerationResult<String>;

    /// Model identifier reported in exported documents.
    fn model_name(&self) -> Option<&str> {
        None
    }
}

impl<G: Generator + ?Sized> Generator for &G {
    fn generate(&self, prompt: &str) -> GenerationResult<String> {
        (**self).generate(prompt)
    }

    fn model_name(&self) -> Option<&str> {
        (**self).model_name()
    }
}
