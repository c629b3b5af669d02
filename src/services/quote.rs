use async_trait::async_trait;

use crate::models::error::WatchlistError;
use crate::utils::http::build_quote_client;

const ALPHA_VANTAGE_URL: &str = "https://www.alphavantage.co/query";

/// 月线收盘价单点
#[derive(Debug, Clone, PartialEq)]
pub struct ClosePoint {
    pub date: String, // "YYYY-MM-DD"
    pub close: f64,
}

/// 行情源抽象：给定代码，返回完整月线收盘序列
///
/// 引擎只依赖这个 trait，测试时可以换成脚本化的假实现。
#[async_trait]
pub trait QuoteFetcher: Send + Sync {
    async fn fetch_monthly(&self, symbol: &str) -> Result<Vec<ClosePoint>, WatchlistError>;
}

/// Alpha Vantage TIME_SERIES_MONTHLY 客户端
pub struct AlphaVantageClient {
    api_key: String,
    client: reqwest::Client,
}

impl AlphaVantageClient {
    pub fn new(api_key: String) -> anyhow::Result<Self> {
        let client = build_quote_client()?;
        Ok(Self { api_key, client })
    }
}

#[async_trait]
impl QuoteFetcher for AlphaVantageClient {
    async fn fetch_monthly(&self, symbol: &str) -> Result<Vec<ClosePoint>, WatchlistError> {
        let url = format!(
            "{}?function=TIME_SERIES_MONTHLY&symbol={}&apikey={}",
            ALPHA_VANTAGE_URL,
            urlencoding::encode(symbol),
            self.api_key
        );

        log::info!("请求月线行情: {}", symbol);

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| WatchlistError::TransportFailure(e.to_string()))?;

        let json: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| WatchlistError::TransportFailure(e.to_string()))?;

        parse_monthly_response(&json, symbol)
    }
}

/// 解析 TIME_SERIES_MONTHLY 响应
///
/// 三种失败形态要区分开：
/// - 带 "Error Message" 字段 -> 代码不存在
/// - 结构完好但没有 "Monthly Time Series" 字段 -> 无数据（含额度用尽的 Note 响应）
/// - 单条价格缺失或非法 -> 跳过该条，不让整次请求失败
pub(crate) fn parse_monthly_response(
    json: &serde_json::Value,
    symbol: &str,
) -> Result<Vec<ClosePoint>, WatchlistError> {
    if json.get("Error Message").is_some() {
        return Err(WatchlistError::SymbolNotFound(symbol.to_string()));
    }

    let series = json
        .get("Monthly Time Series")
        .and_then(|v| v.as_object())
        .ok_or(WatchlistError::NoTimeSeriesData)?;

    let mut points = Vec::new();
    for (date, values) in series {
        if let Some(close_str) = values.get("4. close").and_then(|v| v.as_str()) {
            if let Ok(close) = close_str.parse::<f64>() {
                points.push(ClosePoint {
                    date: date.clone(),
                    close,
                });
            }
        }
    }

    // 最新日期在前
    points.sort_by(|a, b| b.date.cmp(&a.date));

    Ok(points)
}
