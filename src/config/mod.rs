use std::env;

/// Runtime settings for the certificate service
#[derive(Debug, Clone)]
pub struct Settings {
    /// JWT signing secret (Required in production)
    pub jwt_secret: String,

    /// Token lifetime in hours (default: 720)
    pub jwt_expiration_hours: i64,

    /// Mark the auth cookie as Secure (default: false)
    pub cookie_secure: bool,

    /// Root folder for stored files (default: "./storage")
    pub file_server_root_path: String,

    /// Public host used to build file URLs (default: "localhost:3000")
    pub server_domain: String,

    /// Serve public URLs over https (default: false)
    pub is_tls: bool,

    /// Lifetime of a password recovery token in minutes (default: 60)
    pub recovery_token_ttl_minutes: i64,

    /// Optional HTTP relay used to deliver mail
    pub mail_relay_url: Option<String>,

    /// Sender address for system messages
    pub mail_from: String,

    /// Allowed CORS Origins (comma separated)
    pub allowed_origins: Vec<String>,

    /// Maximum request body size in bytes (default: 32 MB)
    pub max_body_size: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            jwt_secret: "secret".to_string(),
            jwt_expiration_hours: 720,
            cookie_secure: false,
            file_server_root_path: "./storage".to_string(),
            server_domain: "localhost:3000".to_string(),
            is_tls: false,
            recovery_token_ttl_minutes: 60,
            mail_relay_url: None,
            mail_from: "no-reply@localhost".to_string(),
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:5173".to_string(), // Vite default
                "http://127.0.0.1:3000".to_string(),
            ],
            max_body_size: 32 * 1024 * 1024,
        }
    }
}

impl Settings {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            jwt_secret: env::var("JWT_SECRET").unwrap_or(default.jwt_secret),

            jwt_expiration_hours: env::var("JWT_EXPIRATION_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.jwt_expiration_hours),

            cookie_secure: env::var("COOKIE_SECURE")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(default.cookie_secure),

            file_server_root_path: env::var("FILE_SERVER_ROOT_PATH")
                .unwrap_or(default.file_server_root_path),

            server_domain: env::var("SERVER_DOMAIN").unwrap_or(default.server_domain),

            is_tls: env::var("IS_TLS")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(default.is_tls),

            recovery_token_ttl_minutes: env::var("RECOVERY_TOKEN_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.recovery_token_ttl_minutes),

            mail_relay_url: env::var("MAIL_RELAY_URL").ok().filter(|v| !v.is_empty()),

            mail_from: env::var("MAIL_FROM").unwrap_or(default.mail_from),

            allowed_origins: env::var("ALLOWED_ORIGINS")
                .ok()
                .map(|v| v.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(default.allowed_origins),

            max_body_size: env::var("MAX_BODY_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_body_size),
        }
    }

    /// Settings for local development and tests
    pub fn development() -> Self {
        Self {
            file_server_root_path: "./storage-dev".to_string(),
            ..Self::default()
        }
    }

    /// Settings for production (secret must come from the environment)
    pub fn production() -> anyhow::Result<Self> {
        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("CRITICAL: JWT_SECRET must be set"))?;

        Ok(Self {
            jwt_secret,
            cookie_secure: true,
            is_tls: true,
            ..Self::from_env()
        })
    }

    /// Scheme + domain used as the prefix of every public file URL
    pub fn full_domain(&self) -> String {
        if self.is_tls {
            format!("https://{}", self.server_domain)
        } else {
            format!("http://{}", self.server_domain)
        }
    }
}
