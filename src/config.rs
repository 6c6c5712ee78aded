use crate::{env_optional, env_u16, env_u64};

pub(crate) const DEFAULT_AGE_URL: &str = "https://api.agify.io";
pub(crate) const DEFAULT_GENDER_URL: &str = "https://api.genderize.io";
pub(crate) const DEFAULT_NATIONALITY_URL: &str = "https://api.nationalize.io";

/// Process configuration, read once at startup and passed explicitly into
/// each component. Every knob has a default so a bare `serve` works.
#[derive(Debug, Clone)]
pub(crate) struct ServiceConfig {
    pub(crate) bind: String,
    pub(crate) port: u16,
    pub(crate) age_url: String,
    pub(crate) gender_url: String,
    pub(crate) nationality_url: String,
    /// Connect/read/write timeout for the outbound classifier calls.
    pub(crate) http_timeout_secs: u64,
    /// Upper bound applied to the retrieval `limit`; `None` means unbounded.
    pub(crate) max_limit: Option<u64>,
}

impl ServiceConfig {
    pub(crate) fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        // NAMESAKE_MAX_LIMIT=0 switches the cap off entirely.
        let max_limit = match env_u64("NAMESAKE_MAX_LIMIT", 100)? {
            0 => None,
            cap => Some(cap),
        };
        Ok(ServiceConfig {
            bind: env_optional("NAMESAKE_BIND").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: env_u16("NAMESAKE_PORT", 3000)?,
            age_url: env_optional("NAMESAKE_AGE_URL")
                .unwrap_or_else(|| DEFAULT_AGE_URL.to_string()),
            gender_url: env_optional("NAMESAKE_GENDER_URL")
                .unwrap_or_else(|| DEFAULT_GENDER_URL.to_string()),
            nationality_url: env_optional("NAMESAKE_NATIONALITY_URL")
                .unwrap_or_else(|| DEFAULT_NATIONALITY_URL.to_string()),
            http_timeout_secs: env_u64("NAMESAKE_HTTP_TIMEOUT", 30)?,
            max_limit,
        })
    }
}
