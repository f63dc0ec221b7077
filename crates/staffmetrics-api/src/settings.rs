use serde::{Deserialize, Serialize};

/// HTTP-facing knobs. Loaded from the `[server]` section of the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    /// Page size used when a list request does not name one.
    pub page_size: u32,
    /// Upper bound for a requested page size.
    pub max_page_size: u32,
    /// Requests per subject per minute; 0 disables the limit.
    pub rate_limit_per_minute: u32,
    /// Employees read per store call while streaming the CSV export.
    pub export_chunk_size: u32,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            page_size: 50,
            max_page_size: 1000,
            rate_limit_per_minute: 10,
            export_chunk_size: 500,
        }
    }
}

/// Token signing settings. Loaded from the `[auth]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JwtConfig {
    /// HS256 secret.
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub token_ttl_minutes: i64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            issuer: "staffmetrics".to_string(),
            audience: "staffmetrics-api".to_string(),
            token_ttl_minutes: 60,
        }
    }
}
