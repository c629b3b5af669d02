use anyhow::Result;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use std::time::Duration;

/// 行情接口专用 HTTP client，超时10秒
pub fn build_quote_client() -> Result<reqwest::Client> {
    let mut headers = HeaderMap::new();
    headers.insert(
        USER_AGENT,
        HeaderValue::from_static("stock-watch/0.1 (+https://www.alphavantage.co)"),
    );
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    let client = reqwest::Client::builder()
        .default_headers(headers)
        .timeout(Duration::from_secs(10))
        .gzip(true)
        .build()?;
    Ok(client)
}
