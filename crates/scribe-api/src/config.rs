use std::path::PathBuf;

use anyhow::{Context, Result, bail};

/// Placeholder JWT secrets that MUST NOT be used outside development.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "dev-secret-change-me"];

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    /// Page size for every paginated post listing.
    pub posts_per_page: u64,
    /// Where unauthenticated requests to protected pages are sent.
    pub login_url: String,
    /// Reject edits of someone else's post with 403 instead of re-rendering
    /// the untouched form.
    pub forbid_foreign_edits: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 3000,
            db_path: "scribe.db".into(),
            jwt_secret: "dev-secret-change-me".into(),
            posts_per_page: 10,
            login_url: "/auth/login/".into(),
            forbid_foreign_edits: false,
        }
    }
}

impl Config {
    /// Reads `SCRIBE_*` variables from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let jwt_secret = lookup("SCRIBE_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("SCRIBE_JWT_SECRET is unset or still a placeholder");
        }

        let port = match lookup("SCRIBE_PORT") {
            Some(raw) => raw.parse().with_context(|| format!("invalid SCRIBE_PORT: {raw}"))?,
            None => defaults.port,
        };

        let posts_per_page = match lookup("SCRIBE_POSTS_PER_PAGE") {
            Some(raw) => raw
                .parse()
                .ok()
                .filter(|n: &u64| *n > 0)
                .with_context(|| format!("invalid SCRIBE_POSTS_PER_PAGE: {raw}"))?,
            None => defaults.posts_per_page,
        };

        let forbid_foreign_edits = match lookup("SCRIBE_FORBID_FOREIGN_EDITS") {
            Some(raw) => parse_flag(&raw).with_context(|| format!("invalid SCRIBE_FORBID_FOREIGN_EDITS: {raw}"))?,
            None => defaults.forbid_foreign_edits,
        };

        Ok(Self {
            host: lookup("SCRIBE_HOST").unwrap_or(defaults.host),
            port,
            db_path: lookup("SCRIBE_DB_PATH").map(PathBuf::from).unwrap_or(defaults.db_path),
            jwt_secret,
            posts_per_page,
            login_url: lookup("SCRIBE_LOGIN_URL").unwrap_or(defaults.login_url),
            forbid_foreign_edits,
        })
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
