use std::env;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_jwt_secret: String,
    pub classifier_base_url: String,
    pub classifier_connect_timeout_secs: u64,
    pub classifier_request_timeout_secs: u64,
    pub storage_root: PathBuf,
    pub api_port: u16,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_anon_key: env::var("SUPABASE_ANON_PUBLIC_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_ANON_PUBLIC_KEY not set, using empty value");
                    String::new()
                }),
            supabase_jwt_secret: env::var("SUPABASE_JWT_SECRET")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_JWT_SECRET not set, using empty value");
                    String::new()
                }),
            classifier_base_url: env::var("CLASSIFIER_BASE_URL")
                .unwrap_or_else(|_| {
                    warn!("CLASSIFIER_BASE_URL not set, using default");
                    "http://127.0.0.1:8000".to_string()
                }),
            classifier_connect_timeout_secs: parse_env_or("CLASSIFIER_CONNECT_TIMEOUT_SECS", 10),
            classifier_request_timeout_secs: parse_env_or("CLASSIFIER_REQUEST_TIMEOUT_SECS", 60),
            storage_root: env::var("STORAGE_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|_| {
                    warn!("STORAGE_ROOT not set, using ./data");
                    PathBuf::from("./data")
                }),
            api_port: parse_env_or("API_PORT", 3000),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty()
            && !self.supabase_anon_key.is_empty()
            && !self.supabase_jwt_secret.is_empty()
    }

    pub fn is_classifier_configured(&self) -> bool {
        !self.classifier_base_url.is_empty()
            && self.classifier_connect_timeout_secs > 0
            && self.classifier_request_timeout_secs > 0
    }

    pub fn classifier_connect_timeout(&self) -> Duration {
        Duration::from_secs(self.classifier_connect_timeout_secs)
    }

    pub fn classifier_request_timeout(&self) -> Duration {
        Duration::from_secs(self.classifier_request_timeout_secs)
    }
}

fn parse_env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("{} has an invalid value '{}', using default", key, raw);
            default
        }),
        Err(_) => default,
    }
}
