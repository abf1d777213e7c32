use std::env;
use std::str::FromStr;

use dotenvy::dotenv;
use tracing::Level;

use crate::auth::password::hash_password;
use crate::service::period_filter::ReportingZone;

#[derive(Clone)]
pub struct Config {
    /// Unset runs on the in-memory store.
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub server_addr: String,
    pub access_token_ttl: usize,

    // Single admin account; the password is stored as an argon2 PHC string
    pub admin_username: String,
    pub admin_password_hash: String,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_protected_per_min: u32,

    pub api_prefix: String,
    pub reporting_zone: ReportingZone,
    pub export_dir: String,
    pub log_dir: String,
    pub log_level: Level,
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

// Prefer a stored hash; a plain ADMIN_PASSWORD is hashed once at startup.
fn admin_password_hash() -> String {
    if let Ok(hash) = env::var("ADMIN_PASSWORD_HASH") {
        return hash;
    }
    let password = env::var("ADMIN_PASSWORD")
        .expect("ADMIN_PASSWORD_HASH or ADMIN_PASSWORD must be set");
    hash_password(&password).unwrap_or_else(|e| panic!("failed to hash ADMIN_PASSWORD: {e}"))
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let time_zone = env::var("TIME_ZONE").ok();
        let reporting_zone = ReportingZone::from_name(time_zone.as_deref())
            .unwrap_or_else(|e| panic!("TIME_ZONE is invalid: {e}"));

        Self {
            server_addr: env::var("SERVER_ADDR").expect("SERVER_ADDR must be set"),
            database_url: env::var("DATABASE_URL").ok().filter(|v| !v.trim().is_empty()),
            jwt_secret: env::var("JWT_SECRET").expect("JWT_SECRET must be set"),
            access_token_ttl: env_or("ACCESS_TOKEN_TTL", 900), // default 15 min

            admin_username: env_or("ADMIN_USERNAME", "admin".to_string()),
            admin_password_hash: admin_password_hash(),

            rate_login_per_min: env_or("RATE_LOGIN_PER_MIN", 60),
            rate_protected_per_min: env_or("RATE_PROTECTED_PER_MIN", 1000),

            api_prefix: env_or("API_PREFIX", "/api".to_string()),
            reporting_zone,
            export_dir: env_or("EXPORT_DIR", "exports".to_string()),
            log_dir: env_or("LOG_DIR", "logs".to_string()),
            log_level: env_or("LOG_LEVEL", Level::DEBUG),
        }
    }
}
