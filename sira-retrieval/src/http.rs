//! Shared HTTP client for search scraping and page downloads.

use std::time::Duration;

use rand::seq::SliceRandom;

use crate::config::RetrievalConfig;
use crate::error::RetrievalError;

/// Browser User-Agent strings, rotated per client.
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:133.0) Gecko/20100101 Firefox/133.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:133.0) Gecko/20100101 Firefox/133.0",
];

/// Build a [`reqwest::Client`] with the configured timeout, a bounded
/// redirect policy, cookies and a browser User-Agent.
///
/// # Errors
///
/// Returns [`RetrievalError::Http`] if the client cannot be constructed.
pub fn build_client(config: &RetrievalConfig) -> Result<reqwest::Client, RetrievalError> {
    let ua = match config.user_agent {
        Some(ref custom) => custom.clone(),
        None => random_user_agent().to_owned(),
    };

    reqwest::Client::builder()
        .cookie_store(true)
        .timeout(Duration::from_secs(config.timeout_seconds))
        .user_agent(ua)
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .map_err(|e| RetrievalError::Http(format!("failed to build HTTP client: {e}")))
}

/// Map a reqwest failure onto the retrieval taxonomy.
pub fn classify(context: &str, err: reqwest::Error) -> RetrievalError {
    if err.is_timeout() {
        RetrievalError::Timeout(format!("{context}: {err}"))
    } else {
        RetrievalError::Http(format!("{context}: {err}"))
    }
}

/// GET `url` and return the body of a successful response.
///
/// # Errors
///
/// Returns [`RetrievalError::Timeout`] when the request times out and
/// [`RetrievalError::Http`] for any other request failure or a non-2xx
/// status.
pub async fn download_text(client: &reqwest::Client, url: &str) -> Result<String, RetrievalError> {
    client
        .get(url)
        .send()
        .await
        .map_err(|e| classify("page request failed", e))?
        .error_for_status()
        .map_err(|e| RetrievalError::Http(format!("page HTTP error: {e}")))?
        .text()
        .await
        .map_err(|e| classify("page read failed", e))
}

/// Pick a random User-Agent from the rotation list.
pub fn random_user_agent() -> &'static str {
    let mut rng = rand::thread_rng();
    USER_AGENTS
        .choose(&mut rng)
        .copied()
        // USER_AGENTS is a non-empty const slice
        .unwrap_or(USER_AGENTS[0])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_user_agent_is_from_list() {
        let ua = random_user_agent();
        assert!(USER_AGENTS.contains(&ua));
    }

    #[test]
    fn build_client_with_default_config() {
        assert!(build_client(&RetrievalConfig::default()).is_ok());
    }

    #[test]
    fn build_client_with_custom_ua() {
        let config = RetrievalConfig {
            user_agent: Some("SiraBot/1.0".into()),
            ..Default::default()
        };
        assert!(build_client(&config).is_ok());
    }
}
