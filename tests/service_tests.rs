use async_trait::async_trait;
use axum::{
    body::Body,
    http::{
        header::{COOKIE, SET_COOKIE},
        Request, StatusCode,
    },
};
use chrono::{DateTime, TimeZone, Utc};
use std::sync::Arc;
use tower::ServiceExt;

use user_crud::{
    app::users::{
        error::UserError,
        model::{NewUser, User, UserForm},
        service::UserService,
        store::{StoreError, UserStore},
        validation::ValidationError,
    },
    core::response::{Notice, NoticeLevel},
    create_routes,
    infrastructure::database::DatabaseManager,
    seed::{run_seed, seed_users, SeedReport},
    AppState,
};

async fn create_test_service() -> UserService {
    let db = DatabaseManager::in_memory()
        .await
        .expect("Failed to create in-memory database");
    AppState::from_database(&db).user_service
}

fn form(first: &str, last: &str, email: &str, age: &str, city: &str) -> UserForm {
    UserForm {
        first_name: Some(first.to_string()),
        last_name: Some(last.to_string()),
        email: Some(email.to_string()),
        age: Some(age.to_string()),
        city: Some(city.to_string()),
    }
}

#[tokio::test]
async fn test_create_then_get_round_trip() {
    let service = create_test_service().await;

    let created = service
        .create_user(&form("test", "user", "test@user.com", "18", "Islamabad"))
        .await
        .unwrap();
    let fetched = service.get_user(created.id).await.unwrap();

    assert_eq!(fetched, created);
    assert_eq!(fetched.first_name, "test");
    assert_eq!(fetched.last_name, "user");
    assert_eq!(fetched.email, "test@user.com");
    assert_eq!(fetched.age, 18);
    assert_eq!(fetched.city, "Islamabad");
}

#[tokio::test]
async fn test_ids_are_assigned_by_store() {
    let service = create_test_service().await;

    let a = service
        .create_user(&form("A", "One", "a@example.com", "30", "Lahore"))
        .await
        .unwrap();
    let b = service
        .create_user(&form("B", "Two", "b@example.com", "31", "Karachi"))
        .await
        .unwrap();
    assert!(b.id > a.id);
}

#[tokio::test]
async fn test_invalid_input_never_persists() {
    let service = create_test_service().await;

    for (age, expected) in [
        ("0", ValidationError::AgeOutOfRange),
        ("151", ValidationError::AgeOutOfRange),
        ("twenty", ValidationError::InvalidAgeFormat),
        ("", ValidationError::MissingFields),
    ] {
        let err = service
            .create_user(&form("test", "user", "test@user.com", age, "Islamabad"))
            .await
            .unwrap_err();
        assert!(matches!(err, UserError::Invalid(e) if e == expected), "age {age:?}");
    }

    assert!(service.list_users().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_emails_stay_unique_across_creates_and_updates() {
    let service = create_test_service().await;

    let first = service
        .create_user(&form("Fassih", "ul Hassny", "i221730@nu.edu.pk", "21", "Lahore"))
        .await
        .unwrap();
    let second = service
        .create_user(&form("Hunain", "Raza", "i221614@nu.edu.pk", "22", "Karachi"))
        .await
        .unwrap();

    let dup_create = service
        .create_user(&form("Other", "Person", "i221730@nu.edu.pk", "40", "Multan"))
        .await
        .unwrap_err();
    assert!(matches!(
        dup_create,
        UserError::Invalid(ValidationError::DuplicateEmail)
    ));

    let dup_update = service
        .update_user(
            second.id,
            &form("Hunain", "Raza", "i221730@nu.edu.pk", "22", "Karachi"),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        dup_update,
        UserError::Invalid(ValidationError::DuplicateEmail)
    ));

    assert_eq!(service.get_user(first.id).await.unwrap(), first);
    assert_eq!(service.get_user(second.id).await.unwrap(), second);

    let users = service.list_users().await.unwrap();
    let mut emails: Vec<_> = users.iter().map(|u| u.email.clone()).collect();
    emails.sort();
    emails.dedup();
    assert_eq!(emails.len(), users.len());
}

#[tokio::test]
async fn test_concurrent_creates_with_same_email() {
    let service = create_test_service().await;
    let a = form("Ahmed", "Umar", "i221580@nu.edu.pk", "22", "Rawalpindi");
    let b = form("Ahmed", "Clone", "i221580@nu.edu.pk", "23", "Quetta");

    let (left, right) = tokio::join!(service.create_user(&a), service.create_user(&b));

    let successes = [left.is_ok(), right.is_ok()].iter().filter(|ok| **ok).count();
    assert_eq!(successes, 1);
    for result in [left, right] {
        if let Err(err) = result {
            assert!(matches!(err, UserError::Invalid(ValidationError::DuplicateEmail)));
        }
    }
    assert_eq!(service.list_users().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_update_and_delete_missing_user() {
    let service = create_test_service().await;

    let err = service
        .update_user(7, &form("a", "b", "c@d.e", "20", "f"))
        .await
        .unwrap_err();
    assert!(matches!(err, UserError::NotFound(7)));

    let err = service.delete_user(7).await.unwrap_err();
    assert!(matches!(err, UserError::NotFound(7)));

    assert!(matches!(
        service.get_user(7).await,
        Err(StoreError::NotFound(7))
    ));
}

#[tokio::test]
async fn test_empty_search_returns_nothing() {
    let service = create_test_service().await;
    service
        .create_user(&form("Abdul", "Munim", "i227425@nu.edu.pk", "22", "Islamabad"))
        .await
        .unwrap();

    assert!(service.search_users("").await.unwrap().is_empty());
    assert_eq!(service.search_users("ISLAM").await.unwrap().len(), 1);
    assert_eq!(service.search_users("mun").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_seed_is_idempotent() {
    let service = create_test_service().await;
    let users = seed_users();

    let first = run_seed(&service, &users).await;
    assert_eq!(
        first,
        SeedReport {
            added: 4,
            skipped: 0,
            failed: 0
        }
    );

    let second = run_seed(&service, &users).await;
    assert_eq!(
        second,
        SeedReport {
            added: 0,
            skipped: 4,
            failed: 0
        }
    );
    assert!(second.is_success());
    assert_eq!(service.list_users().await.unwrap().len(), 4);
}

#[tokio::test]
async fn test_seed_skips_existing_email() {
    let service = create_test_service().await;
    service
        .create_user(&form("Hunain", "R.", "i221614@nu.edu.pk", "22", "Karachi"))
        .await
        .unwrap();

    let report = run_seed(&service, &seed_users()).await;
    assert_eq!(report.added, 3);
    assert_eq!(report.skipped, 1);

    let existing = service.find_by_email("i221614@nu.edu.pk").await.unwrap().unwrap();
    assert_eq!(existing.last_name, "R.");
}

/// 读操作正常、写操作一律失败的存储
struct BrokenWriteStore {
    user: User,
}

impl BrokenWriteStore {
    fn new() -> Self {
        let created_at: DateTime<Utc> = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        Self {
            user: User {
                id: 1,
                first_name: "Fassih".to_string(),
                last_name: "ul Hassny".to_string(),
                email: "i221730@nu.edu.pk".to_string(),
                age: 21,
                city: "Lahore".to_string(),
                created_at,
            },
        }
    }
}

#[async_trait]
impl UserStore for BrokenWriteStore {
    async fn list(&self) -> Result<Vec<User>, StoreError> {
        Ok(vec![self.user.clone()])
    }

    async fn get(&self, id: i64) -> Result<Option<User>, StoreError> {
        Ok((id == self.user.id).then(|| self.user.clone()))
    }

    async fn find_by_email(&self, _email: &str) -> Result<Option<User>, StoreError> {
        Ok(None)
    }

    async fn search(&self, _query: &str) -> Result<Vec<User>, StoreError> {
        Ok(Vec::new())
    }

    async fn insert(&self, _user: &NewUser, _at: DateTime<Utc>) -> Result<User, StoreError> {
        Err(StoreError::Database(sqlx::Error::PoolTimedOut))
    }

    async fn update(&self, _id: i64, _user: &NewUser) -> Result<User, StoreError> {
        Err(StoreError::Database(sqlx::Error::PoolTimedOut))
    }

    async fn delete(&self, _id: i64) -> Result<User, StoreError> {
        Err(StoreError::Database(sqlx::Error::PoolTimedOut))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Err(StoreError::Database(sqlx::Error::PoolClosed))
    }
}

fn broken_app() -> axum::Router {
    let service = UserService::new(Arc::new(BrokenWriteStore::new()));
    create_routes(AppState::new(service))
}

fn post_form(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(
            "first_name=test&last_name=user&email=test%40user.com&age=18&city=Islamabad",
        ))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_store_write_failure_redisplays_add_form() {
    let response = broken_app().oneshot(post_form("/add")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["success"], false);
    let message = body["notices"][0]["message"].as_str().unwrap();
    assert!(message.starts_with("Error adding user: "), "{message}");
    assert_eq!(body["data"]["form"]["email"], "test@user.com");
}

#[tokio::test]
async fn test_store_write_failure_redisplays_update_form() {
    let response = broken_app().oneshot(post_form("/update/1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    let message = body["notices"][0]["message"].as_str().unwrap();
    assert!(message.starts_with("Error updating user: "), "{message}");
    assert_eq!(body["data"]["form"]["first_name"], "test");
}

#[tokio::test]
async fn test_store_write_failure_on_delete_redirects_with_error() {
    let app = broken_app();
    let request = Request::builder()
        .uri("/delete/1")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let cookie = response.headers()[SET_COOKIE].to_str().unwrap();
    let pair = cookie.split(';').next().unwrap();
    let request = Request::builder()
        .uri("/")
        .header(COOKIE, pair)
        .body(Body::empty())
        .unwrap();
    let body = json_body(app.oneshot(request).await.unwrap()).await;

    let notice: Notice = serde_json::from_value(body["notices"][0].clone()).unwrap();
    assert_eq!(notice.level, NoticeLevel::Error);
    assert!(notice.message.starts_with("Error deleting user: "));
}

#[tokio::test]
async fn test_health_check_reports_store_failure() {
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = broken_app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = json_body(response).await;
    assert_eq!(body["code"], 500);
}
