use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_ENCODING};
use reqwest::Client;

pub const USER_AGENT: &str = concat!("bundle-server-launcher/", env!("CARGO_PKG_VERSION"));

/// Applies to connecting and to each read of the response body.
pub const TIMEOUT: Duration = Duration::from_secs(120);

pub fn build_http_client() -> Result<Client, reqwest::Error> {
    let mut default_headers = HeaderMap::new();
    default_headers.insert(ACCEPT, HeaderValue::from_static("application/octet-stream"));
    // Digests are over the raw bytes, so no transfer compression.
    default_headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("identity"));

    Client::builder()
        .user_agent(USER_AGENT)
        .default_headers(default_headers)
        .connect_timeout(TIMEOUT)
        .read_timeout(TIMEOUT)
        .build()
}
