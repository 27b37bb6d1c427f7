use std::time::Duration;

use anyhow::{Context, Result, bail};

/// Session secrets that ship in sample `.env` files and MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me",
    "change-me-to-a-random-string",
    "dev-secret-change-me",
];

#[derive(Debug, Clone)]
pub struct Config {
    pub store_url: String,
    pub store_key: String,
    pub session_secret: String,
    pub host: String,
    pub port: u16,
    pub store_timeout: Option<Duration>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key lookup; `from_env` passes the process
    /// environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| -> Result<String> {
            match lookup(key) {
                Some(value) if !value.trim().is_empty() => Ok(value),
                _ => bail!("{key} is not set; add it to the environment or .env"),
            }
        };

        let store_url = required("SUPABASE_URL")?;
        let store_key = required("SUPABASE_KEY")?;
        let session_secret = required("SESSION_SECRET")?;
        if PLACEHOLDER_SECRETS.contains(&session_secret.as_str()) {
            bail!("SESSION_SECRET is still a placeholder; set a random value");
        }

        let host = lookup("PARLOR_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = lookup("PARLOR_PORT")
            .unwrap_or_else(|| "5000".into())
            .parse()
            .context("PARLOR_PORT must be a port number")?;
        let store_timeout = lookup("PARLOR_STORE_TIMEOUT_SECS")
            .map(|v| v.parse::<u64>().context("PARLOR_STORE_TIMEOUT_SECS must be whole seconds"))
            .transpose()?
            .map(Duration::from_secs);

        Ok(Self {
            store_url,
            store_key,
            session_secret,
            host,
            port,
            store_timeout,
        })
    }
}
