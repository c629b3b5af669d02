use anyhow::{bail, Context, Result};
use clap::Parser;
use std::env;
use std::path::PathBuf;

use stock_watch::cli::{print_table, Cli, Commands};
use stock_watch::db::store::SqliteStore;
use stock_watch::services::engine::WatchlistEngine;
use stock_watch::services::quote::AlphaVantageClient;

fn preprocess() {
    dotenv::dotenv().ok();
    env_logger::init();
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("stock-watch")
}

#[tokio::main]
async fn main() -> Result<()> {
    preprocess();
    let cli = Cli::parse();

    let data_dir = cli.data_dir.clone().unwrap_or_else(default_data_dir);
    let store = SqliteStore::new(data_dir).context("初始化本地存储失败")?;

    let api_key = cli
        .api_key
        .clone()
        .or_else(|| env::var("ALPHAVANTAGE_API_KEY").ok())
        .unwrap_or_default();

    let fetcher = AlphaVantageClient::new(api_key.clone())?;
    let engine = WatchlistEngine::new(fetcher, store);

    match cli.command {
        Commands::Add { ticker } => {
            if api_key.is_empty() {
                bail!("未提供 API key，请使用 --api-key 或设置 ALPHAVANTAGE_API_KEY");
            }
            let list = engine.load();
            println!("正在查询 {} ...", ticker.trim().to_uppercase());
            match engine.add_ticker(&list, &ticker).await {
                Ok(updated) => {
                    print_table(&updated);
                }
                Err(e) => {
                    eprintln!("{}", e);
                    std::process::exit(1);
                }
            }
        }
        Commands::Rm { ticker } => {
            let list = engine.load();
            let updated = engine.delete_ticker(&list, &ticker);
            if updated.len() == list.len() {
                println!("{} 不在自选列表中", ticker.trim().to_uppercase());
            } else {
                println!("已删除 {}", ticker.trim().to_uppercase());
            }
            print_table(&updated);
        }
        Commands::Clear => {
            let list = engine.load();
            if list.is_empty() {
                println!("自选列表本来就是空的");
            } else {
                engine.clear_all();
                println!("已清空自选列表（{} 只）", list.len());
            }
        }
        Commands::List => {
            print_table(&engine.load());
        }
    }

    Ok(())
}
