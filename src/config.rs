//! Configuration management

use anyhow::{Context, Result};

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// NATS server URL
    pub nats_url: String,

    /// OpenAI-compatible API base URL, up to the version segment
    pub openai_base_url: String,

    /// API key for the completion service
    pub openai_api_key: String,

    /// Completion model name
    pub openai_model: String,

    /// Google Distance Matrix API key (optional, falls back to mock travel times)
    pub google_maps_api_key: Option<String>,

    /// Google Distance Matrix API URL
    pub google_maps_url: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let nats_url = std::env::var("NATS_URL")
            .unwrap_or_else(|_| "nats://localhost:4222".to_string());

        let openai_base_url = std::env::var("OPENAI_BASE_URL")
            .unwrap_or_else(|_| "https://api.openai.com/v1".to_string());

        let openai_api_key = std::env::var("OPENAI_API_KEY")
            .context("OPENAI_API_KEY must be set")?;

        let openai_model = std::env::var("OPENAI_MODEL")
            .unwrap_or_else(|_| "gpt-4o-mini".to_string());

        let google_maps_api_key = std::env::var("GOOGLE_MAPS_API_KEY")
            .ok()
            .filter(|key| !key.is_empty());

        let google_maps_url = std::env::var("GOOGLE_MAPS_URL").unwrap_or_else(|_| {
            "https://maps.googleapis.com/maps/api/distancematrix/json".to_string()
        });

        Ok(Self {
            nats_url,
            openai_base_url,
            openai_api_key,
            openai_model,
            google_maps_api_key,
            google_maps_url,
        })
    }
}
