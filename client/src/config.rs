use std::time::Duration;

pub const DEFAULT_API_ROOT: &str = "http://localhost:5000";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Client settings, read from `PARASOL_*` environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub api_root: String,
    pub request_timeout: Duration,
    /// Whether the shade overlay starts visible.
    pub shade_visible: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_root: DEFAULT_API_ROOT.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            shade_visible: false,
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup; unparsable values fall
    /// back to the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let api_root = lookup("PARASOL_API_ROOT")
            .map(|root| normalize_root(&root))
            .unwrap_or(defaults.api_root);
        let request_timeout = lookup("PARASOL_REQUEST_TIMEOUT_MS")
            .and_then(|ms| ms.trim().parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.request_timeout);
        let shade_visible = lookup("PARASOL_SHADE_VISIBLE")
            .and_then(|flag| parse_flag(&flag))
            .unwrap_or(defaults.shade_visible);
        Self {
            api_root,
            request_timeout,
            shade_visible,
        }
    }
}

pub fn normalize_root(root: &str) -> String {
    root.trim().trim_end_matches('/').to_string()
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
