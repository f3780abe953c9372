//! 用户业务错误

use super::store::StoreError;
use super::validation::ValidationError;

/// 新增、更新、删除的失败原因
#[derive(Debug, thiserror::Error)]
pub enum UserError {
    /// 输入错误，重新展示表单
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("user {0} not found")]
    NotFound(i64),
    /// 意外的持久化错误，事务已回滚
    #[error("{0}")]
    StoreWriteFailure(String),
}

impl From<StoreError> for UserError {
    fn from(err: StoreError) -> Self {
        match err {
            // 唯一约束兜底，与预检查给出相同的提示
            StoreError::DuplicateEmail => UserError::Invalid(ValidationError::DuplicateEmail),
            StoreError::NotFound(id) => UserError::NotFound(id),
            StoreError::Database(e) => UserError::StoreWriteFailure(e.to_string()),
        }
    }
}
