//! 用户业务服务

use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

use super::error::UserError;
use super::model::{User, UserForm};
use super::store::{StoreError, UserStore};
use super::validation::{check_email_available, validate_form};

#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn UserStore>,
}

impl UserService {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    pub async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        self.store.list().await
    }

    pub async fn get_user(&self, id: i64) -> Result<User, StoreError> {
        self.store.get(id).await?.ok_or(StoreError::NotFound(id))
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        self.store.find_by_email(email).await
    }

    /// 空查询不返回任何用户
    pub async fn search_users(&self, query: &str) -> Result<Vec<User>, StoreError> {
        if query.is_empty() {
            return Ok(Vec::new());
        }
        self.store.search(query).await
    }

    /// 校验表单并创建用户
    pub async fn create_user(&self, form: &UserForm) -> Result<User, UserError> {
        let new_user = validate_form(form)?;
        self.ensure_email_available(&new_user.email, None).await?;

        let user = self
            .store
            .insert(&new_user, Utc::now())
            .await
            .inspect_err(|e| warn!(email = %new_user.email, error = %e, "创建用户失败"))?;

        info!(id = user.id, email = %user.email, "Created user");
        Ok(user)
    }

    /// 校验表单并覆盖用户的可变字段
    pub async fn update_user(&self, id: i64, form: &UserForm) -> Result<User, UserError> {
        let new_user = validate_form(form)?;
        self.ensure_email_available(&new_user.email, Some(id)).await?;

        let user = self
            .store
            .update(id, &new_user)
            .await
            .inspect_err(|e| warn!(id, error = %e, "更新用户失败"))?;

        info!(id = user.id, email = %user.email, "Updated user");
        Ok(user)
    }

    pub async fn delete_user(&self, id: i64) -> Result<User, UserError> {
        let user = self
            .store
            .delete(id)
            .await
            .inspect_err(|e| warn!(id, error = %e, "删除用户失败"))?;

        info!(id = user.id, email = %user.email, "Deleted user");
        Ok(user)
    }

    pub async fn ping(&self) -> Result<(), StoreError> {
        self.store.ping().await
    }

    async fn ensure_email_available(
        &self,
        email: &str,
        exempt_id: Option<i64>,
    ) -> Result<(), UserError> {
        let existing = self.store.find_by_email(email).await?;
        check_email_available(existing.as_ref(), exempt_id)?;
        Ok(())
    }
}
