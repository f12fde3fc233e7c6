//! Run config: API base, key, model, sampling, DB path, interrupt TTL. Filled from env / .env.
//!
//! Interacts with [`RunOptions`](super::RunOptions) and the run entry points in
//! [`crate::run`].

use std::time::Duration;

use super::RunOptions;

/// Error type used across the CLI.
pub type Error = Box<dyn std::error::Error + Send + Sync>;

const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_DB_PATH: &str = "flowgraph.db";

/// Run config for every subcommand.
#[derive(Clone, Debug, PartialEq)]
pub struct RunConfig {
    /// OpenAI API base URL, e.g. `https://api.openai.com/v1`.
    pub api_base: String,
    /// OpenAI API key. Needed by commands that call the model.
    pub api_key: Option<String>,
    /// Model name, e.g. `gpt-4o-mini`.
    pub model: String,
    /// Sampling temperature 0 to 2. Default: unset (use API default).
    pub temperature: Option<f32>,
    /// Completion token limit. Default: unset.
    pub max_tokens: Option<u32>,
    /// SQLite database for chat/support threads.
    pub db_path: String,
    /// Outstanding interrupts older than this cannot be resumed. Default: no expiry.
    pub interrupt_ttl: Option<Duration>,
    /// Debug logs for graph and node execution.
    pub verbose: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            temperature: None,
            max_tokens: None,
            db_path: DEFAULT_DB_PATH.to_string(),
            interrupt_ttl: None,
            verbose: false,
        }
    }
}

impl RunConfig {
    /// Fill config from env vars. Call `dotenv::dotenv().ok()` first to pick up `.env`.
    ///
    /// `OPENAI_API_KEY`, `OPENAI_API_BASE`, `OPENAI_MODEL`, `OPENAI_TEMPERATURE`,
    /// `OPENAI_MAX_TOKENS`, `DB_PATH`, `INTERRUPT_TTL_SECS`; all optional here.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let defaults = Self::default();
        Ok(Self {
            api_base: lookup("OPENAI_API_BASE").unwrap_or(defaults.api_base),
            api_key: lookup("OPENAI_API_KEY").filter(|k| !k.trim().is_empty()),
            model: lookup("OPENAI_MODEL").unwrap_or(defaults.model),
            temperature: parse_var(&lookup, "OPENAI_TEMPERATURE")?,
            max_tokens: parse_var(&lookup, "OPENAI_MAX_TOKENS")?,
            db_path: lookup("DB_PATH").unwrap_or(defaults.db_path),
            interrupt_ttl: parse_var::<u64>(&lookup, "INTERRUPT_TTL_SECS")?
                .map(Duration::from_secs),
            verbose: false,
        })
    }

    /// Apply optional overrides from `RunOptions`. Only set fields override.
    pub fn apply_options(&mut self, options: &RunOptions) {
        if let Some(m) = &options.model {
            self.model = m.clone();
        }
        if let Some(t) = options.temperature {
            self.temperature = Some(t);
        }
        if let Some(n) = options.max_tokens {
            self.max_tokens = Some(n);
        }
        if let Some(p) = &options.db_path {
            self.db_path = p.clone();
        }
        self.verbose = options.verbose;
    }

    /// The API key, or an error naming the variable to set.
    pub fn require_api_key(&self) -> Result<&str, Error> {
        self.api_key.as_deref().ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "OPENAI_API_KEY is not set; please configure it in .env",
            )
            .into()
        })
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>, Error>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| format!("invalid {}={:?}: {}", key, raw, e).into()),
    }
}
