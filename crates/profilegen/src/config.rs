use std::time::Duration;

/// Default request timeout for generation calls.
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Profile service connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileGenConfig {
    /// Base URL, e.g. `https://profiles.example.com`.
    pub base_url: String,
    /// Bearer key sent with every request.
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl ProfileGenConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var                    | Default    |
    /// |----------------------------|------------|
    /// | `PROFILE_API_URL`          | (required) |
    /// | `PROFILE_API_KEY`          | unset      |
    /// | `PROFILE_API_TIMEOUT_SECS` | `60`       |
    ///
    /// Returns `None` when no service URL is configured.
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let base_url = lookup("PROFILE_API_URL")
            .map(|u| u.trim().trim_end_matches('/').to_string())
            .filter(|u| !u.is_empty())?;

        let api_key = lookup("PROFILE_API_KEY").filter(|k| !k.trim().is_empty());

        let timeout_secs = match lookup("PROFILE_API_TIMEOUT_SECS") {
            None => DEFAULT_TIMEOUT_SECS,
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                tracing::warn!(value = %raw, "Invalid PROFILE_API_TIMEOUT_SECS, using default");
                DEFAULT_TIMEOUT_SECS
            }),
        };

        Some(Self {
            base_url,
            api_key,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_url_disables_service() {
        assert!(ProfileGenConfig::from_lookup(|_| None).is_none());
        assert!(ProfileGenConfig::from_lookup(|k| (k == "PROFILE_API_URL").then(|| " ".into())).is_none());
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let config = ProfileGenConfig::from_lookup(|k| match k {
            "PROFILE_API_URL" => Some("https://profiles.example.com/".into()),
            "PROFILE_API_KEY" => Some("secret".into()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.base_url, "https://profiles.example.com");
        assert_eq!(config.api_key.as_deref(), Some("secret"));
        assert_eq!(config.timeout, Duration::from_secs(60));
    }

    #[test]
    fn invalid_timeout_falls_back() {
        let config = ProfileGenConfig::from_lookup(|k| match k {
            "PROFILE_API_URL" => Some("http://localhost:8080".into()),
            "PROFILE_API_TIMEOUT_SECS" => Some("soon".into()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert!(config.api_key.is_none());
    }
}
