// src/config.rs

use std::env;
use chrono::TimeDelta;
use dotenvy::dotenv;

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub rust_log: String,
    pub log_dir: String,
    /// Upper bound on concurrently open editor sessions.
    pub max_sessions: usize,
    /// Seconds an editor session may sit unchanged before it is dropped.
    pub session_ttl_secs: u64,
    pub cors_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let rust_log = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string());

        let log_dir = env::var("LOG_DIR")
            .unwrap_or_else(|_| "logs".to_string());

        let max_sessions = env::var("MAX_EDITOR_SESSIONS")
            .ok()
            .map(|v| v.parse().expect("MAX_EDITOR_SESSIONS must be a positive integer"))
            .unwrap_or(256);

        let session_ttl_secs = env::var("EDITOR_SESSION_TTL_SECS")
            .ok()
            .map(|v| v.parse().expect("EDITOR_SESSION_TTL_SECS must be a positive integer"))
            .unwrap_or(1800);

        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000,http://127.0.0.1:3000".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        Self {
            bind_addr,
            rust_log,
            log_dir,
            max_sessions,
            session_ttl_secs,
            cors_origins,
        }
    }

    pub fn session_ttl(&self) -> TimeDelta {
        i64::try_from(self.session_ttl_secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .unwrap_or(TimeDelta::MAX)
    }
}
