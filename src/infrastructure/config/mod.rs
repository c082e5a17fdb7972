use chrono::{FixedOffset, Offset, Utc};
use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub environment: Environment,
    pub log_format: LogFormat,
    // Quota
    pub free_daily_limit: i32,
    pub reset_offset_minutes: i32,
    // OpenAI
    pub openai_api_key: String,
    pub openai_model: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();

        // The calendar day used for quota resets is pinned to UTC unless an
        // explicit offset is configured (e.g. -300 for US Eastern standard time).
        let reset_offset_minutes: i32 = env::var("RESET_UTC_OFFSET_MINUTES")
            .unwrap_or_else(|_| "0".to_string())
            .parse()?;
        if FixedOffset::east_opt(reset_offset_minutes * 60).is_none() {
            return Err("RESET_UTC_OFFSET_MINUTES out of range".into());
        }

        let config = Config {
            database_url: env::var("DATABASE_URL")?,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "5000".to_string())
                .parse()?,
            jwt_secret: env::var("JWT_SECRET")?,
            environment: env::var("ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string())
                .parse::<String>()
                .map(|s| match s.as_str() {
                    "production" => Environment::Production,
                    _ => Environment::Development,
                })?,
            log_format: env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "pretty".to_string())
                .parse::<String>()
                .map(|s| match s.as_str() {
                    "json" => LogFormat::Json,
                    _ => LogFormat::Pretty,
                })?,
            free_daily_limit: env::var("FREE_DAILY_LIMIT")
                .unwrap_or_else(|_| "3".to_string())
                .parse()?,
            reset_offset_minutes,
            openai_api_key: env::var("OPENAI_API_KEY")?,
            openai_model: env::var("OPENAI_MODEL")
                .unwrap_or_else(|_| "gpt-3.5-turbo".to_string()),
        };

        Ok(config)
    }

    /// Reference timezone for the daily reset boundary (validated in `from_env`)
    pub fn reset_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.reset_offset_minutes * 60).unwrap_or_else(|| Utc.fix())
    }
}
