//! Application configuration loaded from environment variables.
//!
//! Built once at start-up and passed by reference into the API client and
//! the services; nothing reads the environment while handling a request.

use std::ops::RangeInclusive;
use std::str::FromStr;
use std::time::Duration;

use crate::errors::{Result, SubmissionError};
use crate::retry::RetryPolicy;
use crate::validation::AgeBounds;

/// Basic-auth credentials for the backend.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Settings for the simulated backend.
#[derive(Debug, Clone, PartialEq)]
pub struct MockSettings {
    /// Probability in `0.0..=1.0` that a simulated submission fails.
    pub failure_rate: f64,
    pub latency_ms: RangeInclusive<u64>,
}

impl Default for MockSettings {
    fn default() -> Self {
        Self {
            failure_rate: 0.1,
            latency_ms: 500..=1500,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Backend base URL, endpoints are appended verbatim (e.g. http://localhost:3000)
    pub api_base_url: String,
    /// Sent as `Authorization: Basic` when present
    pub credentials: Option<Credentials>,
    /// Per-request timeout
    pub timeout: Duration,
    pub retry: RetryPolicy,
    pub registration_endpoint: String,
    pub contact_endpoint: String,
    /// Age bounds for registration team members
    pub member_age: AgeBounds,
    /// Use the simulated backend instead of HTTP
    pub use_mock: bool,
    pub mock: MockSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:3000".to_string(),
            credentials: None,
            timeout: Duration::from_millis(30_000),
            retry: RetryPolicy::default(),
            registration_endpoint: "/api/registration".to_string(),
            contact_endpoint: "/api/contact".to_string(),
            member_age: AgeBounds::registration(),
            use_mock: false,
            mock: MockSettings::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key → value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let credentials = match (var("API_USERNAME"), var("API_PASSWORD")) {
            (Some(username), Some(password)) => Some(Credentials { username, password }),
            _ => None,
        };

        let retry = RetryPolicy {
            max_retries: parse_or(&var, "MAX_RETRIES", defaults.retry.max_retries)?,
            base_delay: Duration::from_millis(parse_or(
                &var,
                "RETRY_BASE_DELAY_MS",
                defaults.retry.base_delay.as_millis() as u64,
            )?),
            multiplier: parse_or(&var, "RETRY_MULTIPLIER", defaults.retry.multiplier)?,
        };

        let failure_rate = parse_or(&var, "MOCK_FAILURE_RATE", defaults.mock.failure_rate)?;
        if !(0.0..=1.0).contains(&failure_rate) {
            return Err(SubmissionError::Config(
                "MOCK_FAILURE_RATE must be between 0 and 1".to_string(),
            ));
        }
        let min_latency = parse_or(&var, "MOCK_MIN_LATENCY_MS", *defaults.mock.latency_ms.start())?;
        let max_latency = parse_or(&var, "MOCK_MAX_LATENCY_MS", *defaults.mock.latency_ms.end())?;
        if min_latency > max_latency {
            return Err(SubmissionError::Config(
                "MOCK_MIN_LATENCY_MS must not exceed MOCK_MAX_LATENCY_MS".to_string(),
            ));
        }

        let min_age = parse_or(&var, "MIN_MEMBER_AGE", defaults.member_age.min)?;
        let max_age = parse_or(&var, "MAX_MEMBER_AGE", defaults.member_age.max)?;
        if min_age > max_age {
            return Err(SubmissionError::Config(
                "MIN_MEMBER_AGE must not exceed MAX_MEMBER_AGE".to_string(),
            ));
        }
        let member_age = AgeBounds::new(min_age, max_age);

        Ok(Config {
            api_base_url: var("API_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_base_url),
            credentials,
            timeout: Duration::from_millis(parse_or(&var, "API_TIMEOUT_MS", 30_000u64)?),
            retry,
            registration_endpoint: var("REGISTRATION_ENDPOINT")
                .unwrap_or(defaults.registration_endpoint),
            contact_endpoint: var("CONTACT_ENDPOINT").unwrap_or(defaults.contact_endpoint),
            member_age,
            use_mock: var("USE_MOCK_API").map(|v| parse_flag(&v)).unwrap_or(false),
            mock: MockSettings {
                failure_rate,
                latency_ms: min_latency..=max_latency,
            },
        })
    }
}

fn parse_or<T, F>(var: &F, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| SubmissionError::Config(format!("Invalid {key}"))),
        None => Ok(default),
    }
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.api_base_url, "http://localhost:3000");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.retry, RetryPolicy::default());
        assert_eq!(config.registration_endpoint, "/api/registration");
        assert_eq!(config.member_age, AgeBounds::registration());
        assert!(config.credentials.is_none());
        assert!(!config.use_mock);
    }

    #[test]
    fn reads_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("API_BASE_URL", "https://api.example.com/"),
            ("API_USERNAME", "hack"),
            ("API_PASSWORD", "secret"),
            ("API_TIMEOUT_MS", "5000"),
            ("USE_MOCK_API", "TRUE"),
            ("MOCK_FAILURE_RATE", "0.5"),
            ("MAX_RETRIES", "1"),
        ]))
        .unwrap();
        assert_eq!(config.api_base_url, "https://api.example.com");
        assert_eq!(config.credentials.unwrap().username, "hack");
        assert_eq!(config.timeout, Duration::from_millis(5000));
        assert!(config.use_mock);
        assert_eq!(config.mock.failure_rate, 0.5);
        assert_eq!(config.retry.max_retries, 1);
    }

    #[test]
    fn credentials_need_both_parts() {
        let config = Config::from_lookup(lookup(&[("API_USERNAME", "hack")])).unwrap();
        assert!(config.credentials.is_none());
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(Config::from_lookup(lookup(&[("API_TIMEOUT_MS", "soon")])).is_err());
        assert!(Config::from_lookup(lookup(&[("MOCK_FAILURE_RATE", "1.5")])).is_err());
        assert!(Config::from_lookup(lookup(&[
            ("MOCK_MIN_LATENCY_MS", "2000"),
            ("MOCK_MAX_LATENCY_MS", "100"),
        ]))
        .is_err());
    }

    #[test]
    fn member_age_bounds_must_be_ordered() {
        let err = Config::from_lookup(lookup(&[
            ("MIN_MEMBER_AGE", "30"),
            ("MAX_MEMBER_AGE", "20"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("MIN_MEMBER_AGE"));

        let config = Config::from_lookup(lookup(&[
            ("MIN_MEMBER_AGE", "21"),
            ("MAX_MEMBER_AGE", "21"),
        ]))
        .unwrap();
        assert_eq!(config.member_age, AgeBounds::new(21, 21));
    }

    #[test]
    fn credentials_debug_is_redacted() {
        let creds = Credentials {
            username: "hack".into(),
            password: "secret".into(),
        };
        assert!(!format!("{creds:?}").contains("secret"));
    }
}
