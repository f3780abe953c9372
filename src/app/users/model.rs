//! 用户数据模型

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// 已持久化的用户
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub age: i64,
    pub city: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// 提交的原始表单，校验失败时原样回显
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserForm {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub age: Option<String>,
    pub city: Option<String>,
}

impl From<&User> for UserForm {
    fn from(user: &User) -> Self {
        Self {
            first_name: Some(user.first_name.clone()),
            last_name: Some(user.last_name.clone()),
            email: Some(user.email.clone()),
            age: Some(user.age.to_string()),
            city: Some(user.city.clone()),
        }
    }
}

/// 校验通过后的用户字段，新增和更新共用
#[derive(Debug, Clone, PartialEq, Eq, Validate)]
pub struct NewUser {
    #[validate(length(min = 1))]
    pub first_name: String,
    #[validate(length(min = 1))]
    pub last_name: String,
    #[validate(length(min = 1))]
    pub email: String,
    #[validate(range(min = 1, max = 150))]
    pub age: i64,
    #[validate(length(min = 1))]
    pub city: String,
}

impl NewUser {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
        age: i64,
        city: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
            age,
            city: city.into(),
        }
    }
}

impl From<&NewUser> for UserForm {
    fn from(user: &NewUser) -> Self {
        Self {
            first_name: Some(user.first_name.clone()),
            last_name: Some(user.last_name.clone()),
            email: Some(user.email.clone()),
            age: Some(user.age.to_string()),
            city: Some(user.city.clone()),
        }
    }
}
