use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use crate::models::watchlist::{StockEntry, Watchlist};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Alpha Vantage API key（也可通过 ALPHAVANTAGE_API_KEY 环境变量提供）
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    /// 数据目录，默认在系统数据目录下
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// 查询一只股票并加入自选列表
    Add {
        /// 股票代码，如 AAPL（仅限英文字母）
        ticker: String,
    },

    /// 从自选列表删除一只股票
    Rm {
        /// 要删除的股票代码
        ticker: String,
    },

    /// 清空自选列表
    Clear,

    /// 展示自选列表
    List,
}

/// 带符号金额，涨绿跌红
fn signed_cell(value: f64, suffix: &str, width: usize) -> String {
    let plain = format!("{:>width$}", format!("{:+.2}{}", value, suffix), width = width);
    if value >= 0.0 {
        plain.green().to_string()
    } else {
        plain.red().to_string()
    }
}

/// 打印整张自选列表表格（对应原始界面的行情表）
pub fn print_table(list: &Watchlist) {
    if list.is_empty() {
        println!("自选列表为空");
        return;
    }

    println!(
        "{:<8} {:>12} {:>12} {:>12} {:>10}",
        "代码", "年初价", "现价", "涨跌额", "收益率"
    );
    for entry in &list.entries {
        print_row(entry);
    }
}

fn print_row(entry: &StockEntry) {
    println!(
        "{:<8} {:>12} {:>12} {} {}",
        entry.ticker,
        format!("${:.2}", entry.year_start_price),
        format!("${:.2}", entry.current_price),
        signed_cell(entry.price_diff, "", 12),
        signed_cell(entry.return_rate, "%", 10),
    );
}
