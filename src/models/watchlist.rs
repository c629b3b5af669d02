use serde::{Deserialize, Serialize};

/// 自选股条目：一只股票加入时的快照
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockEntry {
    pub ticker: String,          // 大写英文代码，如 "AAPL"
    pub year_start_price: f64,   // 今年一月收盘价
    pub current_price: f64,      // 最近一个月收盘价
    pub price_diff: f64,         // 涨跌额
    pub return_rate: f64,        // 年初至今收益率 %
    #[serde(default)]
    pub created_at: String,      // 加入时刻（RFC 3339）
}

/// 自选列表：按加入顺序排列，代码唯一
///
/// 持久化形态就是条目的 JSON 数组，整存整取。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Watchlist {
    pub entries: Vec<StockEntry>,
}

impl Watchlist {
    pub fn new() -> Self {
        Self::default()
    }

    /// 代码是否已在列表中（忽略大小写）
    pub fn contains(&self, symbol: &str) -> bool {
        self.entries
            .iter()
            .any(|e| e.ticker.eq_ignore_ascii_case(symbol))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(ticker: &str) -> StockEntry {
        StockEntry {
            ticker: ticker.to_string(),
            year_start_price: 150.0,
            current_price: 180.0,
            price_diff: 30.0,
            return_rate: 20.0,
            created_at: "2025-06-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_contains_ignores_case() {
        let list = Watchlist {
            entries: vec![entry("AAPL")],
        };
        assert!(list.contains("AAPL"));
        assert!(list.contains("aapl"), "小写应命中同一代码");
        assert!(!list.contains("MSFT"));
    }

    #[test]
    fn test_snapshot_is_plain_json_array() {
        let list = Watchlist {
            entries: vec![entry("AAPL")],
        };
        let json = serde_json::to_string(&list).unwrap();
        assert!(json.starts_with('['), "快照应为 JSON 数组: {}", json);

        let restored: Watchlist = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.len(), 1);
        assert_eq!(restored.entries[0].ticker, "AAPL");
    }

    #[test]
    fn test_restore_tolerates_missing_created_at() {
        // 旧快照可能没有 created_at 字段
        let json = r#"[{"ticker":"AAPL","year_start_price":150.0,"current_price":180.0,"price_diff":30.0,"return_rate":20.0}]"#;
        let restored: Watchlist = serde_json::from_str(json).unwrap();
        assert_eq!(restored.entries[0].created_at, "");
    }
}
