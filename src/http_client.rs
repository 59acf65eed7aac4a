use anyhow::{Context, Result, anyhow};
use reqwest::blocking::Client;
use reqwest::header::USER_AGENT;

use crate::config::IngestConfig;

pub fn http_client(config: &IngestConfig) -> Result<Client> {
    Client::builder()
        .timeout(config.request_timeout)
        .build()
        .context("failed to build http client")
}

/// GET a page and return its body. Non-2xx responses are errors.
pub fn fetch_page(client: &Client, url: &str, user_agent: &str) -> Result<String> {
    let resp = client
        .get(url)
        .header(USER_AGENT, user_agent)
        .send()
        .context("request failed")?;
    let status = resp.status();
    if !status.is_success() {
        return Err(anyhow!("http {status} for {url}"));
    }
    resp.text().context("failed reading body")
}
