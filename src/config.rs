use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::env;

use crate::game::SelectionPolicy;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub game: GameConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Without a URL the service runs on the in-memory store
    pub url: Option<String>,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GameConfig {
    pub selection_policy: SelectionPolicy,
    /// Cap on user search suggestions
    pub search_limit: usize,
    /// JSON seed for the in-memory store
    pub seed_path: Option<String>,
    /// Games untouched for this long are dropped
    pub idle_timeout_secs: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            selection_policy: SelectionPolicy::default(),
            search_limit: 10,
            seed_path: None,
            idle_timeout_secs: 3600,
        }
    }
}

fn optional_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let database = DatabaseConfig {
            url: optional_var("DATABASE_URL"),
            max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .context("DATABASE_MAX_CONNECTIONS must be a number")?,
        };

        let server = ServerConfig {
            host: env::var("HOST")
                .unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .context("PORT must be a number")?,
        };

        let defaults = GameConfig::default();
        let game = GameConfig {
            selection_policy: match optional_var("CATEGORY_SELECTION") {
                Some(value) => value.parse().map_err(|e: String| anyhow!(e))?,
                None => defaults.selection_policy,
            },
            search_limit: env::var("USER_SEARCH_LIMIT")
                .unwrap_or_else(|_| defaults.search_limit.to_string())
                .parse()
                .context("USER_SEARCH_LIMIT must be a number")?,
            seed_path: optional_var("SEED_PATH"),
            idle_timeout_secs: env::var("GAME_IDLE_TIMEOUT")
                .unwrap_or_else(|_| defaults.idle_timeout_secs.to_string())
                .parse()
                .context("GAME_IDLE_TIMEOUT must be a number")?,
        };

        Ok(Config {
            database,
            server,
            game,
        })
    }

    /// Idle timeout as a chrono duration, saturating at the largest representable span
    pub fn idle_timeout(&self) -> chrono::Duration {
        let secs = i64::try_from(self.game.idle_timeout_secs).unwrap_or(i64::MAX);
        chrono::Duration::try_seconds(secs).unwrap_or(chrono::Duration::MAX)
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    #[cfg(test)]
    pub fn for_tests(selection_policy: SelectionPolicy) -> Self {
        Config {
            database: DatabaseConfig {
                url: None,
                max_connections: 1,
            },
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
            },
            game: GameConfig {
                selection_policy,
                ..GameConfig::default()
            },
        }
    }
}
