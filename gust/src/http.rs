//! Measured HTTP requests.
use gust_macros::transaction;
use reqwest::{Client, StatusCode};
use std::sync::OnceLock;
use std::time::Duration;

/// Per-request timeout of the shared client.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

const USER_AGENT: &str = concat!("gust/", env!("CARGO_PKG_VERSION"));

static CLIENT: OnceLock<Client> = OnceLock::new();

/// The client shared by every VU in the process.
pub fn client() -> &'static Client {
    CLIENT.get_or_init(|| {
        Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|err| {
                tracing::warn!("Falling back to a default HTTP client: {err}");
                Client::new()
            })
    })
}

/// Issue a single `GET` and read the response body.
///
/// Runs as a transaction: responses with a status of 400 or above count as errors, as do
/// transport failures such as refused connections, TLS errors and timeouts. Nothing is retried.
#[transaction]
pub async fn get(url: &str) -> Result<StatusCode, reqwest::Error> {
    let res = client().get(url).send().await?.error_for_status()?;
    let status = res.status();
    res.bytes().await?;
    Ok(status)
}
