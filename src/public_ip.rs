use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::{Client, IntoUrl, Url};
use thiserror::Error;
use tracing::debug;

/// Cloudflare's diagnostic endpoint, which echoes the caller's address as `ip=...`.
pub const TRACE_URL: &str = "https://www.cloudflare.com/cdn-cgi/trace";

// Longer octet alternatives come first so "250" is not cut short to "25".
static IPV4_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)(\.(25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)){3}")
        .unwrap()
});

#[derive(Debug)]
pub struct PublicIpResolver {
    url: Url,
    client: Client,
}

impl PublicIpResolver {
    pub fn new<U: IntoUrl>(url: U) -> Result<Self, PublicIpError> {
        Ok(Self {
            url: url.into_url()?,
            client: Client::new(),
        })
    }

    #[tracing::instrument(skip(self), fields(url = %self.url))]
    pub async fn public_ip(&self) -> Result<String, PublicIpError> {
        let body = self.client.get(self.url.clone())
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        debug!(%body, "got trace payload");

        extract_ipv4(&body)
            .map(ToOwned::to_owned)
            .ok_or(PublicIpError::NoAddress)
    }
}

/// Returns the first IPv4-shaped token in `text`, verbatim.
pub fn extract_ipv4(text: &str) -> Option<&str> {
    IPV4_REGEX.find(text).map(|m| m.as_str())
}

#[derive(Debug, Error)]
pub enum PublicIpError {
    #[error("unable to get public ip: {0}")]
    ReqwestError(#[from] reqwest::Error),
    #[error("could not find a public ip in the trace payload")]
    NoAddress,
}

#[cfg(test)]
mod tests {
    use super::*;
    use httptest::{matchers::*, responders::*, Expectation, Server};

    const TRACE: &str = "fl=123abc\nh=www.cloudflare.com\nip=203.0.113.5\nts=1700000000.123\nvisit_scheme=https\nloc=NL\n";

    #[test]
    fn extracts_address_from_trace_line() {
        assert_eq!(extract_ipv4("... trace ip=203.0.113.5 loc=..."), Some("203.0.113.5"));
        assert_eq!(extract_ipv4(TRACE), Some("203.0.113.5"));
    }

    #[test]
    fn octets_above_255_do_not_match_whole() {
        assert_ne!(extract_ipv4("ip=999.1.1.1"), Some("999.1.1.1"));
        assert_eq!(extract_ipv4("ip=256.1.1"), None);
    }

    #[test]
    fn high_octets_match_in_full() {
        assert_eq!(extract_ipv4("ip=250.250.250.250\n"), Some("250.250.250.250"));
        assert_eq!(extract_ipv4("255.249.199.0"), Some("255.249.199.0"));
    }

    #[test]
    fn first_match_wins_and_is_verbatim() {
        assert_eq!(extract_ipv4("a 010.0.0.1 b 192.168.1.1"), Some("010.0.0.1"));
        assert_eq!(extract_ipv4("no address here"), None);
    }

    #[tokio::test]
    async fn fetches_address_from_endpoint() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/cdn-cgi/trace"))
                .respond_with(status_code(200).body(TRACE)),
        );

        let resolver = PublicIpResolver::new(server.url_str("/cdn-cgi/trace")).unwrap();
        assert_eq!(resolver.public_ip().await.unwrap(), "203.0.113.5");
    }

    #[tokio::test]
    async fn payload_without_address_is_an_error() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/cdn-cgi/trace"))
                .respond_with(status_code(200).body("h=www.cloudflare.com\nloc=NL\n")),
        );

        let resolver = PublicIpResolver::new(server.url_str("/cdn-cgi/trace")).unwrap();
        assert!(matches!(resolver.public_ip().await, Err(PublicIpError::NoAddress)));
    }

    #[tokio::test]
    async fn server_errors_are_reported() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/cdn-cgi/trace"))
                .respond_with(status_code(503)),
        );

        let resolver = PublicIpResolver::new(server.url_str("/cdn-cgi/trace")).unwrap();
        assert!(matches!(resolver.public_ip().await, Err(PublicIpError::ReqwestError(_))));
    }
}
