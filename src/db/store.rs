use anyhow::Result;
use rusqlite::Connection;
use std::path::PathBuf;
use std::sync::Mutex;

/// 持久化键值存储抽象
///
/// 自选列表整存整取：一个键对应一份序列化快照。
/// 测试时可以换成内存实现。
pub trait ListStore: Send + Sync {
    fn read(&self, key: &str) -> Result<Option<String>>;
    fn write(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

impl<T: ListStore + ?Sized> ListStore for std::sync::Arc<T> {
    fn read(&self, key: &str) -> Result<Option<String>> {
        (**self).read(key)
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        (**self).write(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}

/// SQLite 实现：单表 kv_store，跨会话持久
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new(data_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&data_dir)?;
        let db_path = data_dir.join("stock_watch.db");
        let conn = Connection::open(db_path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.migrate()?;
        Ok(store)
    }

    /// 内存库，仅供测试
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS kv_store (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
            ",
        )?;
        Ok(())
    }
}

impl ListStore for SqliteStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn.lock().unwrap();
        let result = conn.query_row(
            "SELECT value FROM kv_store WHERE key = ?1",
            rusqlite::params![key],
            |row| row.get::<_, String>(0),
        );
        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR REPLACE INTO kv_store (key, value, updated_at) VALUES (?1, ?2, datetime('now'))",
            rusqlite::params![key, value],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "DELETE FROM kv_store WHERE key = ?1",
            rusqlite::params![key],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_absent_key_is_none() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert!(store.read("watchlist").unwrap().is_none());
    }

    #[test]
    fn test_write_then_read_back() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.write("watchlist", "[]").unwrap();
        assert_eq!(store.read("watchlist").unwrap().as_deref(), Some("[]"));

        // 整存覆盖
        store.write("watchlist", r#"[{"ticker":"AAPL"}]"#).unwrap();
        let value = store.read("watchlist").unwrap().unwrap();
        assert!(value.contains("AAPL"));
    }

    #[test]
    fn test_remove_deletes_key_entirely() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.write("watchlist", "[]").unwrap();
        store.remove("watchlist").unwrap();
        assert!(
            store.read("watchlist").unwrap().is_none(),
            "remove 后应读不到键，而不是读到空数组"
        );
    }

    #[test]
    fn test_remove_absent_key_is_ok() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert!(store.remove("watchlist").is_ok());
    }
}
