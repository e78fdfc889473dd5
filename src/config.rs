use std::env;

pub struct Config {
    pub database_url: String,
    pub hash_iterations: u32,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:scheduler.db".to_string()),
            hash_iterations: env::var("HASH_ITERATIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(100_000),
        }
    }
}
