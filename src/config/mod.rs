use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub progress: ProgressConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub max_connections: u32,
    pub connection_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub max_page_size: i64,
    pub enable_request_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    pub enable_cors: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressConfig {
    /// Fraction of a video that must be watched before the module counts
    /// as completed, expressed as a percentage.
    pub video_completion_threshold: i32,
    /// Minimum quiz score (percentage) that counts as a pass.
    pub quiz_pass_mark: i32,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| env::var(key).ok())
    }

    // The lookup is injected so tests can override without mutating the
    // process environment
    fn with_overrides(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(v) = var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Some(v) = var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout_secs =
                v.parse().unwrap_or(self.database.connection_timeout_secs);
        }

        if let Some(v) = var("API_MAX_PAGE_SIZE") {
            self.api.max_page_size = v.parse().unwrap_or(self.api.max_page_size);
        }
        if let Some(v) = var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }

        if let Some(v) = var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Some(v) = var("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Some(v) = var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }

        if let Some(v) = var("PROGRESS_VIDEO_COMPLETION_THRESHOLD") {
            self.progress.video_completion_threshold =
                v.parse().unwrap_or(self.progress.video_completion_threshold);
        }
        if let Some(v) = var("PROGRESS_QUIZ_PASS_MARK") {
            self.progress.quiz_pass_mark = v.parse().unwrap_or(self.progress.quiz_pass_mark);
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                max_connections: 10,
                connection_timeout_secs: 30,
            },
            api: ApiConfig {
                max_page_size: 1000,
                enable_request_logging: true,
            },
            security: SecurityConfig {
                // Development-only fallback; deployments must set JWT_SECRET
                jwt_secret: "cohort-dev-secret".to_string(),
                jwt_expiry_hours: 24 * 7, // 1 week
                enable_cors: true,
            },
            progress: ProgressConfig {
                video_completion_threshold: 95,
                quiz_pass_mark: 70,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            database: DatabaseConfig {
                max_connections: 20,
                connection_timeout_secs: 10,
            },
            api: ApiConfig {
                max_page_size: 500,
                enable_request_logging: true,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
                enable_cors: true,
            },
            progress: ProgressConfig {
                video_completion_threshold: 95,
                quiz_pass_mark: 70,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig {
                max_connections: 50,
                connection_timeout_secs: 5,
            },
            api: ApiConfig {
                max_page_size: 100,
                enable_request_logging: false,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 4,
                enable_cors: true,
            },
            progress: ProgressConfig {
                video_completion_threshold: 95,
                quiz_pass_mark: 70,
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn development_defaults() {
        let config = AppConfig::development();
        assert_eq!(config.api.max_page_size, 1000);
        assert!(!config.security.jwt_secret.is_empty());
        assert_eq!(config.progress.video_completion_threshold, 95);
    }

    #[test]
    fn production_defaults() {
        let config = AppConfig::production();
        assert_eq!(config.api.max_page_size, 100);
        // No baked-in secret outside development
        assert!(config.security.jwt_secret.is_empty());
        assert_eq!(config.security.jwt_expiry_hours, 4);
    }

    #[test]
    fn overrides_replace_defaults() {
        let vars = |key: &str| match key {
            "API_MAX_PAGE_SIZE" => Some("250".to_string()),
            "PROGRESS_QUIZ_PASS_MARK" => Some("80".to_string()),
            "JWT_SECRET" => Some("override-secret".to_string()),
            _ => None,
        };

        let config = AppConfig::development().with_overrides(vars);
        assert_eq!(config.api.max_page_size, 250);
        assert_eq!(config.progress.quiz_pass_mark, 80);
        assert_eq!(config.security.jwt_secret, "override-secret");
        // Untouched sections keep their per-environment defaults
        assert_eq!(config.database.max_connections, 10);
    }

    #[test]
    fn unparseable_overrides_are_ignored() {
        let config = AppConfig::development()
            .with_overrides(|key| (key == "API_MAX_PAGE_SIZE").then(|| "lots".to_string()));
        assert_eq!(config.api.max_page_size, 1000);
    }
}
