use std::collections::HashMap;
use std::env;
use std::io;

use url::form_urlencoded;

pub(crate) fn env_optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

pub(crate) fn env_u64(name: &str, default: u64) -> Result<u64, Box<dyn std::error::Error>> {
    match env_optional(name) {
        Some(value) => Ok(value
            .parse::<u64>()
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, format!("Invalid {name}")))?),
        None => Ok(default),
    }
}

pub(crate) fn env_u16(name: &str, default: u16) -> Result<u16, Box<dyn std::error::Error>> {
    match env_optional(name) {
        Some(value) => Ok(value
            .parse::<u16>()
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, format!("Invalid {name}")))?),
        None => Ok(default),
    }
}

/// Decode an urlencoded payload into a flat key-value map. Blank values are
/// kept as-is; handlers treat an empty value the same as an absent key.
pub(crate) fn parse_form_params(raw: &str) -> HashMap<String, String> {
    form_urlencoded::parse(raw.as_bytes())
        .into_owned()
        .collect()
}

/// Merge query-string and body parameters into the single map the handlers
/// consume. Body values win on key collision.
pub(crate) fn merge_params(query: &str, body: &str) -> HashMap<String, String> {
    let mut params = parse_form_params(query);
    for (key, value) in form_urlencoded::parse(body.as_bytes()).into_owned() {
        params.insert(key, value);
    }
    params
}

// ── Tests ────────────────────────────────────────────────────────────────
