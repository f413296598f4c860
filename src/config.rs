use std::env;

/// Where documents live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Mongo,
    Memory,
}

impl StorageBackend {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "mongo" | "mongodb" => Some(StorageBackend::Mongo),
            "memory" => Some(StorageBackend::Memory),
            _ => None,
        }
    }
}

pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub mongo_uri: String,
    pub mongo_db_name: String,
    pub storage: StorageBackend,
    /// `None` when SECRET_KEY is unset.
    pub secret_key: Option<String>,
    pub access_token_expire_minutes: i64,
    pub bcrypt_cost: u32,
}

pub const DEV_SECRET_KEY: &str = "tutor-match-development-secret";

impl Config {
    pub fn from_env() -> Self {
        Self {
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(8080),
            mongo_uri: env::var("MONGO_URI").unwrap_or_else(|_| "mongodb://localhost:27017".to_string()),
            mongo_db_name: env::var("MONGO_DB_NAME").unwrap_or_else(|_| "tutor_match".to_string()),
            storage: env::var("STORAGE")
                .ok()
                .and_then(|s| StorageBackend::parse(&s))
                .unwrap_or(StorageBackend::Mongo),
            secret_key: env::var("SECRET_KEY").ok().filter(|s| !s.is_empty()),
            access_token_expire_minutes: env::var("ACCESS_TOKEN_EXPIRE_MINUTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|m: &i64| *m > 0)
                .unwrap_or(1440),
            bcrypt_cost: env::var("BCRYPT_COST")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|c: &u32| (4..=31).contains(c))
                .unwrap_or(bcrypt::DEFAULT_COST),
        }
    }
}
