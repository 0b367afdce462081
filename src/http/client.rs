use reqwest::Client;

use crate::config::Config;
use crate::error::Result;

/// Shared client for direct executions. No timeout unless the config sets one.
pub fn build_client(config: &Config) -> Result<Client> {
    let mut builder = Client::builder().use_rustls_tls();
    if let Some(timeout) = config.request_timeout() {
        builder = builder.timeout(timeout);
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builds_with_and_without_timeout() {
        assert!(build_client(&Config::default()).is_ok());
        let config = Config {
            request_timeout_secs: Some(2),
            ..Config::default()
        };
        assert!(build_client(&config).is_ok());
    }
}
