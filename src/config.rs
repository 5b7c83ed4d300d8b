use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{AppError, AppResult};

/// What the auth gate does when the token check cannot reach the backend.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AuthFailurePolicy {
    /// Deny and send the user to login, keeping cached credentials.
    #[default]
    FailClosed,
    /// Allow with the cached user.
    FailOpen,
}

impl FromStr for AuthFailurePolicy {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "closed" | "fail-closed" => Ok(Self::FailClosed),
            "open" | "fail-open" => Ok(Self::FailOpen),
            other => Err(AppError::Config(format!(
                "YARD_AUTH_FAILURE_POLICY must be 'closed' or 'open', got '{}'",
                other
            ))),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub api_base_url: String,
    pub session_file: PathBuf,
    pub download_dir: PathBuf,
    pub request_timeout_secs: u64,
    pub page_size: u32,
    pub auth_failure_policy: AuthFailurePolicy,
}

impl Config {
    pub fn from_env() -> AppResult<Self> {
        dotenvy::dotenv().ok();

        let api_base_url = env::var("YARD_API_BASE_URL")
            .map_err(|_| AppError::Config("YARD_API_BASE_URL is not set".to_string()))?;

        let auth_failure_policy = match env::var("YARD_AUTH_FAILURE_POLICY") {
            Ok(v) => v.parse()?,
            Err(_) => AuthFailurePolicy::default(),
        };

        Ok(Config {
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            session_file: env::var("YARD_SESSION_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| default_session_file()),
            download_dir: env::var("YARD_DOWNLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".")),
            request_timeout_secs: env::var("YARD_REQUEST_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .unwrap_or(30),
            page_size: env::var("YARD_PAGE_SIZE")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .unwrap_or(10),
            auth_failure_policy,
        })
    }
}

fn default_session_file() -> PathBuf {
    match env::var("HOME") {
        Ok(home) => PathBuf::from(home).join(".yard-office").join("session.json"),
        Err(_) => PathBuf::from(".yard-office-session.json"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_failure_policy_parse() {
        assert_eq!(
            "closed".parse::<AuthFailurePolicy>().unwrap(),
            AuthFailurePolicy::FailClosed
        );
        assert_eq!(
            "Fail-Open".parse::<AuthFailurePolicy>().unwrap(),
            AuthFailurePolicy::FailOpen
        );
        assert!("maybe".parse::<AuthFailurePolicy>().is_err());
    }

    #[test]
    fn test_default_policy_is_fail_closed() {
        assert_eq!(AuthFailurePolicy::default(), AuthFailurePolicy::FailClosed);
    }
}
