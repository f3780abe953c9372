//! 用户处理器

use axum::{
    extract::{FromRef, Path, Query, State},
    response::{IntoResponse, Json, Response},
    Form,
};
use axum_extra::extract::{cookie::Key, PrivateCookieJar};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::error::UserError;
use super::model::{User, UserForm};
use super::service::UserService;
use super::store::SqliteUserStore;
use crate::core::{
    error::CoreError,
    flash::{take_flash, FlashRedirect},
    response::{ApiResponse, Notice},
};
use crate::infrastructure::database::DatabaseManager;

#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService,
    /// 提示 cookie 的加密密钥
    pub cookie_key: Key,
}

impl AppState {
    /// 使用临时随机密钥，重启后旧的提示 cookie 全部失效
    pub fn new(user_service: UserService) -> Self {
        Self {
            user_service,
            cookie_key: Key::generate(),
        }
    }

    pub fn with_cookie_key(mut self, key: Key) -> Self {
        self.cookie_key = key;
        self
    }

    pub fn from_database(db: &DatabaseManager) -> Self {
        let store = SqliteUserStore::new(db.get_pool().clone());
        Self::new(UserService::new(Arc::new(store)))
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

#[derive(Debug, Serialize)]
pub struct UserListPage {
    pub users: Vec<User>,
}

#[derive(Debug, Serialize)]
pub struct UserFormPage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    pub form: UserForm,
}

#[derive(Debug, Serialize)]
pub struct SearchPage {
    pub query: String,
    pub users: Vec<User>,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub query: String,
}

/// 路径中的 id 不是整数时按 404 处理
fn parse_user_id(raw: &str) -> Result<i64, CoreError> {
    raw.parse()
        .map_err(|_| CoreError::NotFound(format!("User {raw} not found")))
}

fn user_not_found(id: i64) -> CoreError {
    CoreError::NotFound(format!("User {id} not found"))
}

/// 无法解析的请求体（缺少或错误的 Content-Type 等）按空表单处理
fn submitted(form: Option<Form<UserForm>>) -> UserForm {
    form.map(|Form(form)| form).unwrap_or_default()
}

fn form_rejected(user_id: Option<i64>, form: UserForm, notice: Notice) -> Response {
    Json(ApiResponse::rejected(UserFormPage { user_id, form }, notice)).into_response()
}

/// GET / ：全部用户，并展示待显示的提示
pub async fn list_users(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
) -> Result<(PrivateCookieJar, Json<ApiResponse<UserListPage>>), CoreError> {
    let users = state.user_service.list_users().await?;
    let (jar, flash) = take_flash(jar);
    let body = ApiResponse::success(UserListPage { users }).with_notices(flash);
    Ok((jar, Json(body)))
}

/// GET /add
pub async fn add_form() -> Json<ApiResponse<UserFormPage>> {
    Json(ApiResponse::success(UserFormPage {
        user_id: None,
        form: UserForm::default(),
    }))
}

/// POST /add
pub async fn add_user(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    form: Option<Form<UserForm>>,
) -> Result<Response, CoreError> {
    let form = submitted(form);
    match state.user_service.create_user(&form).await {
        Ok(_) => {
            let notice = Notice::success("User added successfully!");
            Ok(FlashRedirect::to(jar, "/", notice).into_response())
        }
        Err(UserError::Invalid(err)) => {
            Ok(form_rejected(None, form, Notice::error(err.to_string())))
        }
        Err(UserError::StoreWriteFailure(reason)) => Ok(form_rejected(
            None,
            form,
            Notice::error(format!("Error adding user: {reason}")),
        )),
        Err(UserError::NotFound(id)) => Err(user_not_found(id)),
    }
}

/// GET /view/:id
pub async fn view_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<User>>, CoreError> {
    let id = parse_user_id(&id)?;
    let user = state.user_service.get_user(id).await?;
    Ok(Json(ApiResponse::success(user)))
}

/// GET /update/:id ：用当前值预填表单
pub async fn edit_form(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<UserFormPage>>, CoreError> {
    let id = parse_user_id(&id)?;
    let user = state.user_service.get_user(id).await?;
    Ok(Json(ApiResponse::success(UserFormPage {
        user_id: Some(user.id),
        form: UserForm::from(&user),
    })))
}

/// POST /update/:id ：失败时回显提交的值，而不是库里的值
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    jar: PrivateCookieJar,
    form: Option<Form<UserForm>>,
) -> Result<Response, CoreError> {
    let id = parse_user_id(&id)?;
    state.user_service.get_user(id).await?;
    let form = submitted(form);

    match state.user_service.update_user(id, &form).await {
        Ok(_) => {
            let notice = Notice::success("User updated successfully!");
            Ok(FlashRedirect::to(jar, "/", notice).into_response())
        }
        Err(UserError::Invalid(err)) => {
            Ok(form_rejected(Some(id), form, Notice::error(err.to_string())))
        }
        Err(UserError::StoreWriteFailure(reason)) => Ok(form_rejected(
            Some(id),
            form,
            Notice::error(format!("Error updating user: {reason}")),
        )),
        Err(UserError::NotFound(id)) => Err(user_not_found(id)),
    }
}

/// GET /delete/:id
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    jar: PrivateCookieJar,
) -> Result<FlashRedirect, CoreError> {
    let id = parse_user_id(&id)?;

    match state.user_service.delete_user(id).await {
        Ok(user) => Ok(FlashRedirect::to(
            jar,
            "/",
            Notice::success(format!("User {} deleted successfully!", user.full_name())),
        )),
        Err(UserError::NotFound(id)) => Err(user_not_found(id)),
        Err(err) => Ok(FlashRedirect::to(
            jar,
            "/",
            Notice::error(format!("Error deleting user: {err}")),
        )),
    }
}

/// GET /search?query=
pub async fn search_users(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<ApiResponse<SearchPage>>, CoreError> {
    let users = state.user_service.search_users(&params.query).await?;
    Ok(Json(ApiResponse::success(SearchPage {
        query: params.query,
        users,
    })))
}

/// GET /health
pub async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, CoreError> {
    state.user_service.ping().await?;

    Ok(Json(serde_json::json!({
        "status": "healthy",
        "database": "connected",
        "timestamp": chrono::Utc::now().to_rfc3339()
    })))
}
