// ==========================================
// 工位OEE指标计算系统 - 事件日志仓储
// ==========================================
// 职责: 按逻辑表名 + 时间范围查询原始属性变更行
// 红线: Repository 不含业务逻辑
// 约定: 日志表不存在是"尚无数据"的可区分状态, 不是故障
// 行形态: {recvtimets: 字符串形态的毫秒时间戳, attrname, attrvalue}
// ==========================================

use crate::db::open_sqlite_connection;
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};

/// 事件日志原始行（时间戳保持字符串形态, 解析归引擎层）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRow {
    pub recvtimets: String,
    pub attrname: String,
    pub attrvalue: String,
}

// ==========================================
// EventLogStore Trait - 事件日志访问接口
// ==========================================
#[async_trait]
pub trait EventLogStore: Send + Sync {
    /// 查询 [from_ms, to_ms] 范围内的日志行
    ///
    /// # 返回
    /// - Ok(Some(rows)): 表存在（可能为空集）
    /// - Ok(None): 日志表尚不存在（该实体从未写过日志）
    async fn query_window(
        &self,
        table: &str,
        from_ms: i64,
        to_ms: i64,
    ) -> RepositoryResult<Option<Vec<LogRow>>>;
}

// ==========================================
// SqliteEventLog - SQLite 适配实现
// ==========================================

pub struct SqliteEventLog {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteEventLog {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 探测日志表是否存在
    fn table_exists(conn: &Connection, table: &str) -> RepositoryResult<bool> {
        let exists: bool = conn
            .query_row(
                "SELECT 1 FROM sqlite_master WHERE type='table' AND name=?1 LIMIT 1",
                params![table],
                |_row| Ok(true),
            )
            .optional()?
            .unwrap_or(false);
        Ok(exists)
    }

    /// 建表并追加日志行（测试数据与演示数据装载用）
    pub fn append(&self, table: &str, rows: &[LogRow]) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        // 逻辑表名由 log_table_name 导出, 仅含 [a-z0-9_], 可安全内插
        conn.execute(
            &format!(
                r#"
                CREATE TABLE IF NOT EXISTS {table} (
                    recvtimets TEXT NOT NULL,
                    attrname   TEXT NOT NULL,
                    attrvalue  TEXT NOT NULL
                )
                "#
            ),
            [],
        )?;
        for row in rows {
            conn.execute(
                &format!("INSERT INTO {table} (recvtimets, attrname, attrvalue) VALUES (?1, ?2, ?3)"),
                params![row.recvtimets, row.attrname, row.attrvalue],
            )?;
        }
        Ok(())
    }
}

#[async_trait]
impl EventLogStore for SqliteEventLog {
    async fn query_window(
        &self,
        table: &str,
        from_ms: i64,
        to_ms: i64,
    ) -> RepositoryResult<Option<Vec<LogRow>>> {
        let conn = self.get_conn()?;
        if !Self::table_exists(&conn, table)? {
            return Ok(None);
        }

        // recvtimets 以字符串存储, 过滤用 CAST 保证数值比较
        let mut stmt = conn.prepare(&format!(
            r#"
            SELECT recvtimets, attrname, attrvalue
            FROM {table}
            WHERE CAST(recvtimets AS INTEGER) >= ?1
              AND CAST(recvtimets AS INTEGER) <= ?2
            "#
        ))?;

        let rows = stmt
            .query_map(params![from_ms, to_ms], |row| {
                Ok(LogRow {
                    recvtimets: row.get(0)?,
                    attrname: row.get(1)?,
                    attrvalue: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(rows))
    }
}
