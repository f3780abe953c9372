//! 用户存储
//!
//! `UserStore` 约定：插入时分配 id；违反邮箱唯一约束的插入/更新被拒绝并返回
//! `StoreError::DuplicateEmail`；写操作在事务内完成，失败时整体回滚。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePool;

use super::model::{NewUser, User};

const USER_COLUMNS: &str = "id, first_name, last_name, email, age, city, created_at";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("email already exists")]
    DuplicateEmail,
    #[error("user {0} not found")]
    NotFound(i64),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// 全部用户，按 id 排序
    async fn list(&self) -> Result<Vec<User>, StoreError>;

    async fn get(&self, id: i64) -> Result<Option<User>, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// first_name / last_name / city 的不区分大小写子串匹配，按 id 排序
    async fn search(&self, query: &str) -> Result<Vec<User>, StoreError>;

    async fn insert(&self, user: &NewUser, created_at: DateTime<Utc>) -> Result<User, StoreError>;

    /// 覆盖可变字段，`id` 和 `created_at` 不变
    async fn update(&self, id: i64, user: &NewUser) -> Result<User, StoreError>;

    /// 删除并返回被删除的用户
    async fn delete(&self, id: i64) -> Result<User, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}

/// 基于 SQLite 连接池的实现
#[derive(Clone)]
pub struct SqliteUserStore {
    pool: SqlitePool,
}

impl SqliteUserStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn map_write_error(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::DuplicateEmail,
        _ => StoreError::Database(err),
    }
}

/// LIKE 模式转义，查询词按字面匹配
fn like_pattern(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len() + 2);
    escaped.push('%');
    for ch in query.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

#[async_trait]
impl UserStore for SqliteUserStore {
    async fn list(&self) -> Result<Vec<User>, StoreError> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn get(&self, id: i64) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = ?"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn search(&self, query: &str) -> Result<Vec<User>, StoreError> {
        // SQLite 的 LIKE 对 ASCII 不区分大小写
        let users = sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {USER_COLUMNS} FROM users
            WHERE first_name LIKE ?1 ESCAPE '\'
               OR last_name LIKE ?1 ESCAPE '\'
               OR city LIKE ?1 ESCAPE '\'
            ORDER BY id
            "#
        ))
        .bind(like_pattern(query))
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn insert(&self, user: &NewUser, created_at: DateTime<Utc>) -> Result<User, StoreError> {
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (first_name, last_name, email, age, city, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(user.age)
        .bind(&user.city)
        .bind(created_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_write_error)?;

        tx.commit().await?;
        Ok(created)
    }

    async fn update(&self, id: i64, user: &NewUser) -> Result<User, StoreError> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET first_name = ?, last_name = ?, email = ?, age = ?, city = ?
            WHERE id = ?
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(user.age)
        .bind(&user.city)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_write_error)?
        .ok_or(StoreError::NotFound(id))?;

        tx.commit().await?;
        Ok(updated)
    }

    async fn delete(&self, id: i64) -> Result<User, StoreError> {
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query_as::<_, User>(&format!(
            "DELETE FROM users WHERE id = ? RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(StoreError::NotFound(id))?;

        tx.commit().await?;
        Ok(deleted)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("lah"), "%lah%");
        assert_eq!(like_pattern("50%"), "%50\\%%");
        assert_eq!(like_pattern("a_b\\c"), "%a\\_b\\\\c%");
    }
}
