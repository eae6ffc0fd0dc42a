// ==========================================
// 工位OEE指标计算系统 - 上下文实体仓储
// ==========================================
// 职责: 按 id 取实体快照 / 按 id 推送部分属性更新
// 红线: Repository 不含业务逻辑
// 存储形态: entities 表, 每行一个 JSON 实体文档
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::entity::{Attribute, ReferenceEntity};
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

// ==========================================
// EntityStore Trait - 上下文库访问接口
// ==========================================
// 实现者: SqliteEntityStore（本地 SQLite 适配）
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// 按 id 取实体快照
    ///
    /// # 返回
    /// - Ok(ReferenceEntity): 实体存在
    /// - Err(EntityNotFound): 实体不存在或取数失败
    async fn fetch(&self, id: &str) -> RepositoryResult<ReferenceEntity>;

    /// 按 id 推送部分属性更新（仅覆盖给定属性, 其余保持不变）
    async fn update_attributes(
        &self,
        id: &str,
        attributes: BTreeMap<String, Attribute>,
    ) -> RepositoryResult<()>;
}

// ==========================================
// SqliteEntityStore - SQLite 适配实现
// ==========================================

pub struct SqliteEntityStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteEntityStore {
    /// 创建仓储实例并保证 schema 就绪
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn init_schema(&self) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS entities (
                id  TEXT PRIMARY KEY,
                doc TEXT NOT NULL
            )
            "#,
            [],
        )?;
        Ok(())
    }

    /// 写入完整实体文档（测试数据与演示数据装载用）
    pub fn put(&self, entity: &ReferenceEntity) -> RepositoryResult<()> {
        let doc = serde_json::to_string(entity).map_err(|e| RepositoryError::MalformedDocument {
            id: entity.id.clone(),
            reason: e.to_string(),
        })?;
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT OR REPLACE INTO entities (id, doc) VALUES (?1, ?2)",
            params![entity.id, doc],
        )?;
        Ok(())
    }

    fn load(&self, conn: &Connection, id: &str) -> RepositoryResult<ReferenceEntity> {
        let doc: Option<String> = conn
            .query_row("SELECT doc FROM entities WHERE id = ?1", params![id], |row| {
                row.get(0)
            })
            .optional()?;

        let doc = doc.ok_or_else(|| RepositoryError::EntityNotFound { id: id.to_string() })?;
        serde_json::from_str(&doc).map_err(|e| RepositoryError::MalformedDocument {
            id: id.to_string(),
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl EntityStore for SqliteEntityStore {
    async fn fetch(&self, id: &str) -> RepositoryResult<ReferenceEntity> {
        let conn = self.get_conn()?;
        self.load(&conn, id)
    }

    async fn update_attributes(
        &self,
        id: &str,
        attributes: BTreeMap<String, Attribute>,
    ) -> RepositoryResult<()> {
        // 读-改-写在同一把锁内完成, 避免交叉覆盖
        let conn = self.get_conn()?;
        let mut entity = self.load(&conn, id)?;
        for (name, attribute) in attributes {
            entity.attributes.insert(name, attribute);
        }
        let doc = serde_json::to_string(&entity).map_err(|e| RepositoryError::MalformedDocument {
            id: id.to_string(),
            reason: e.to_string(),
        })?;
        conn.execute(
            "UPDATE entities SET doc = ?1 WHERE id = ?2",
            params![doc, id],
        )?;
        Ok(())
    }
}
