use thiserror::Error;

/// 查询/维护自选列表时可能出现的全部错误
///
/// 所有错误对当次操作都是终态：不重试、不排队，由调用方直接提示用户。
#[derive(Error, Debug)]
pub enum WatchlistError {
    #[error("股票代码只能包含英文字母: {0}")]
    InvalidInput(String),

    #[error("请输入股票代码")]
    EmptySubmission,

    #[error("{0} 已在自选列表中")]
    DuplicateTicker(String),

    #[error("股票代码 {0} 不存在")]
    SymbolNotFound(String),

    #[error("无法获取股价数据（可能已超出 API 调用额度）")]
    NoTimeSeriesData,

    #[error("行情请求失败: {0}")]
    TransportFailure(String),

    #[error("已有一次查询正在进行，请等它结束后再试")]
    SearchInFlight,
}
