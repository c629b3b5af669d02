use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Datelike;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::db::store::ListStore;
use crate::models::error::WatchlistError;
use crate::models::watchlist::{StockEntry, Watchlist};
use crate::services::quote::{ClosePoint, QuoteFetcher};

/// 持久化快照使用的固定键
pub const LIST_KEY: &str = "watchlist";

static TICKER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z]*$").expect("内置正则必定合法"));

/// 代码格式校验：只允许英文字母，出现其他字符整体拒绝
///
/// 每次输入变化都会调用，不只是提交时。
pub fn validate_ticker(input: &str) -> bool {
    TICKER_RE.is_match(input)
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// 从月线序列推导一条自选股快照
///
/// current = 最新日期收盘价；year_start = 当年一月（"YYYY-01" 前缀）收盘价。
/// 序列为空或找不到当年一月数据（如年中上市）都按无数据处理。
pub fn derive_entry(
    symbol: &str,
    series: &[ClosePoint],
    year: i32,
) -> Result<StockEntry, WatchlistError> {
    let mut points = series.to_vec();
    points.sort_by(|a, b| b.date.cmp(&a.date));

    let latest = points.first().ok_or(WatchlistError::NoTimeSeriesData)?;
    let current_price = latest.close;

    let jan_prefix = format!("{}-01", year);
    let year_start = points
        .iter()
        .find(|p| p.date.starts_with(&jan_prefix))
        .ok_or(WatchlistError::NoTimeSeriesData)?;
    let year_start_price = year_start.close;

    let price_diff = current_price - year_start_price;
    let return_rate = price_diff / year_start_price * 100.0;

    Ok(StockEntry {
        ticker: symbol.to_string(),
        year_start_price: round2(year_start_price),
        current_price: round2(current_price),
        price_diff: round2(price_diff),
        return_rate: round2(return_rate),
        created_at: chrono::Utc::now().to_rfc3339(),
    })
}

/// 自选列表引擎
///
/// 行情源和存储都在构造时显式传入，核心逻辑不碰任何全局状态。
/// 列表本身是值：每个操作接收当前列表，返回新列表，
/// 成功的变更会同步把完整快照写回存储。
pub struct WatchlistEngine<Q: QuoteFetcher, S: ListStore> {
    fetcher: Q,
    store: S,
    in_flight: AtomicBool,
}

impl<Q: QuoteFetcher, S: ListStore> WatchlistEngine<Q, S> {
    pub fn new(fetcher: Q, store: S) -> Self {
        Self {
            fetcher,
            store,
            in_flight: AtomicBool::new(false),
        }
    }

    /// 启动时从存储恢复列表；键不存在或内容损坏都回到空列表
    pub fn load(&self) -> Watchlist {
        match self.store.read(LIST_KEY) {
            Ok(Some(snapshot)) => serde_json::from_str(&snapshot).unwrap_or_else(|e| {
                log::warn!("自选列表快照损坏，按空列表处理: {}", e);
                Watchlist::new()
            }),
            Ok(None) => Watchlist::new(),
            Err(e) => {
                log::warn!("读取自选列表失败，按空列表处理: {}", e);
                Watchlist::new()
            }
        }
    }

    /// 查询并加入一只股票
    ///
    /// 失败都是终态，列表保持不变。同一时刻只允许一次查询在途，
    /// 第二次并发提交直接拒绝。
    pub async fn add_ticker(
        &self,
        list: &Watchlist,
        input: &str,
    ) -> Result<Watchlist, WatchlistError> {
        let symbol = input.trim();
        if symbol.is_empty() {
            return Err(WatchlistError::EmptySubmission);
        }
        if !validate_ticker(symbol) {
            return Err(WatchlistError::InvalidInput(symbol.to_string()));
        }

        let symbol = symbol.to_uppercase();
        if list.contains(&symbol) {
            return Err(WatchlistError::DuplicateTicker(symbol));
        }

        if self.in_flight.swap(true, Ordering::SeqCst) {
            return Err(WatchlistError::SearchInFlight);
        }
        let fetched = self.fetcher.fetch_monthly(&symbol).await;
        self.in_flight.store(false, Ordering::SeqCst);

        let series = fetched?;
        let year = chrono::Local::now().year();
        let entry = derive_entry(&symbol, &series, year)?;

        let mut updated = list.clone();
        updated.entries.push(entry);
        self.persist(&updated);
        Ok(updated)
    }

    /// 删除一只股票；不在列表中则原样返回，不算错误
    pub fn delete_ticker(&self, list: &Watchlist, symbol: &str) -> Watchlist {
        let symbol = symbol.trim().to_uppercase();
        let mut updated = list.clone();
        let before = updated.len();
        updated.entries.retain(|e| e.ticker != symbol);
        if updated.len() != before {
            self.persist(&updated);
        }
        updated
    }

    /// 清空列表，并把持久化的键整个删掉（而不是写入空数组）
    pub fn clear_all(&self) -> Watchlist {
        if let Err(e) = self.store.remove(LIST_KEY) {
            log::warn!("删除自选列表存储键失败: {}", e);
        }
        Watchlist::new()
    }

    /// 整存快照。写入失败只记日志，不打断用户操作，
    /// 本次会话的内存列表仍然是最新的。
    fn persist(&self, list: &Watchlist) {
        match serde_json::to_string(list) {
            Ok(snapshot) => {
                if let Err(e) = self.store.write(LIST_KEY, &snapshot) {
                    log::warn!("自选列表写入失败: {}", e);
                }
            }
            Err(e) => log::warn!("自选列表序列化失败: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_ticker() {
        assert!(validate_ticker("AAPL"));
        assert!(validate_ticker("aapl"));
        assert!(validate_ticker(""), "空串本身合法，提交时才拦截");
        assert!(!validate_ticker("AAPL1"));
        assert!(!validate_ticker("AAP L"));
        assert!(!validate_ticker("아아"));
        assert!(!validate_ticker("A-B"));
    }

    fn point(date: &str, close: f64) -> ClosePoint {
        ClosePoint {
            date: date.to_string(),
            close,
        }
    }

    #[test]
    fn test_derive_entry_basic() {
        let series = vec![
            point("2025-01-31", 150.0),
            point("2025-03-31", 162.5),
            point("2025-06-30", 180.0),
        ];
        let entry = derive_entry("AAPL", &series, 2025).unwrap();
        assert_eq!(entry.ticker, "AAPL");
        assert_eq!(entry.year_start_price, 150.0);
        assert_eq!(entry.current_price, 180.0);
        assert_eq!(entry.price_diff, 30.0);
        assert_eq!(entry.return_rate, 20.0);
    }

    #[test]
    fn test_derive_entry_rounds_to_two_decimals() {
        let series = vec![point("2025-01-31", 3.0), point("2025-06-30", 4.0)];
        let entry = derive_entry("F", &series, 2025).unwrap();
        // 1/3 = 33.333...% -> 33.33
        assert_eq!(entry.return_rate, 33.33);
        assert_eq!(entry.price_diff, 1.0);
    }

    #[test]
    fn test_derive_entry_missing_january_is_no_data() {
        // 年中上市，序列里没有当年一月
        let series = vec![point("2025-05-30", 25.0), point("2025-06-30", 30.0)];
        let err = derive_entry("IPO", &series, 2025).unwrap_err();
        assert!(matches!(err, WatchlistError::NoTimeSeriesData));
    }

    #[test]
    fn test_derive_entry_empty_series_is_no_data() {
        let err = derive_entry("AAPL", &[], 2025).unwrap_err();
        assert!(matches!(err, WatchlistError::NoTimeSeriesData));
    }

    #[test]
    fn test_derive_entry_negative_return() {
        let series = vec![point("2025-01-31", 200.0), point("2025-06-30", 150.0)];
        let entry = derive_entry("DROP", &series, 2025).unwrap();
        assert_eq!(entry.price_diff, -50.0);
        assert_eq!(entry.return_rate, -25.0);
    }
}
