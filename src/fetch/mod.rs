mod basic;
mod client;
pub mod auth;

pub use basic::BasicClient;
pub use client::HttpClient;

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;

/// Sends a GET with the given query parameters and decodes the JSON body.
///
/// Non-2xx statuses are errors.
pub async fn fetch_json<C: HttpClient + ?Sized>(
    client: &C,
    url: &str,
    query: &[(&str, String)],
) -> Result<Value> {
    let mut url: reqwest::Url = url.parse().with_context(|| format!("invalid url '{url}'"))?;
    if !query.is_empty() {
        url.query_pairs_mut()
            .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
    }

    let req = reqwest::Request::new(reqwest::Method::GET, url);
    let resp = client.execute(req).await?.error_for_status()?;
    Ok(resp.json().await?)
}

/// POSTs `body` as JSON and decodes the JSON response.
pub async fn post_json<C: HttpClient + ?Sized>(
    client: &C,
    url: &str,
    body: &impl Serialize,
) -> Result<Value> {
    let url: reqwest::Url = url.parse().with_context(|| format!("invalid url '{url}'"))?;

    let mut req = reqwest::Request::new(reqwest::Method::POST, url);
    req.headers_mut().insert(
        reqwest::header::CONTENT_TYPE,
        reqwest::header::HeaderValue::from_static("application/json"),
    );
    *req.body_mut() = Some(serde_json::to_vec(body)?.into());

    let resp = client.execute(req).await?;
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(anyhow::anyhow!("request returned status {}: {}", status, body));
    }
    Ok(resp.json().await?)
}
