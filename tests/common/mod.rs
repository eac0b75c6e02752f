#![allow(dead_code)]

use axum::body::Body;
use http_body_util::BodyExt;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

pub const PASSWORD: &str = "correct-horse";

pub struct TestApp {
    pub router: Router,
    pub db: SqlitePool,
}

impl TestApp {
    pub async fn new() -> Self {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .unwrap()
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .expect("Failed to create in-memory SQLite pool");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Failed to run migrations");

        let router = skinlog::build_app(pool.clone(), false)
            .await
            .expect("Failed to build app");

        Self { router, db: pool }
    }

    /// Send a request through the app and return the response.
    pub async fn request(&self, req: Request<Body>) -> Response {
        tower::ServiceExt::oneshot(self.router.clone(), req)
            .await
            .unwrap()
    }

    /// Create a user with [`PASSWORD`] and return its id.
    pub async fn create_user(&self, username: &str) -> String {
        let user = skinlog::cli::create_user(&self.db, username, PASSWORD)
            .await
            .expect("Failed to create test user");
        user.id
    }

    /// Log in as the given user and return the session cookie string.
    pub async fn login(&self, username: &str) -> String {
        let resp = self
            .post_form("/login", &format!("username={}&password={}", username, PASSWORD), None)
            .await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);

        resp.headers()
            .get("set-cookie")
            .expect("Login should set a session cookie")
            .to_str()
            .unwrap()
            .split(';')
            .next()
            .unwrap()
            .to_string()
    }

    /// Create a user, log in, and return (user_id, cookie).
    pub async fn signed_in(&self, username: &str) -> (String, String) {
        let id = self.create_user(username).await;
        let cookie = self.login(username).await;
        (id, cookie)
    }

    /// Insert a tip directly and return its id.
    pub async fn insert_tip(&self, user_id: &str, title: &str, created_at: &str) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        sqlx::query(
            "INSERT INTO tips (id, user_id, title, content, concern, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(user_id)
        .bind(title)
        .bind("Some content")
        .bind("acne")
        .bind(created_at)
        .bind(created_at)
        .execute(&self.db)
        .await
        .expect("Failed to insert tip");
        id
    }

    /// Insert a plan created now and return its id.
    pub async fn insert_plan(&self, user_id: &str, title: &str) -> String {
        let now = chrono::Utc::now().to_rfc3339();
        self.insert_plan_at(user_id, title, &now).await
    }

    /// Insert a plan with the given creation time and return its id.
    pub async fn insert_plan_at(&self, user_id: &str, title: &str, created_at: &str) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        sqlx::query(
            "INSERT INTO plans (id, user_id, title, description, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(user_id)
        .bind(title)
        .bind("Cleanse, tone, moisturise")
        .bind(created_at)
        .bind(created_at)
        .execute(&self.db)
        .await
        .expect("Failed to insert plan");
        id
    }

    pub async fn count(&self, sql: &str, id: &str) -> i64 {
        let row: (i64,) = sqlx::query_as(sql).bind(id).fetch_one(&self.db).await.unwrap();
        row.0
    }

    /// Send a GET request with an optional session cookie.
    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response {
        get(&self.router, uri, cookie).await
    }

    /// Send a POST form request with an optional session cookie.
    pub async fn post_form(&self, uri: &str, body: &str, cookie: Option<&str>) -> Response {
        post_form(&self.router, uri, body, cookie).await
    }

    /// Send a DELETE request with an optional session cookie.
    pub async fn delete(&self, uri: &str, cookie: Option<&str>) -> Response {
        let mut builder = Request::builder().uri(uri).method("DELETE");
        if let Some(cookie) = cookie {
            builder = builder.header("cookie", cookie);
        }
        let req = builder.body(Body::empty()).unwrap();
        self.request(req).await
    }
}

pub async fn get(router: &Router, uri: &str, cookie: Option<&str>) -> Response {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header("cookie", cookie);
    }
    let req = builder.body(Body::empty()).unwrap();
    tower::ServiceExt::oneshot(router.clone(), req).await.unwrap()
}

pub async fn post_form(router: &Router, uri: &str, body: &str, cookie: Option<&str>) -> Response {
    let mut builder = Request::builder()
        .uri(uri)
        .method("POST")
        .header("content-type", "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header("cookie", cookie);
    }
    let req = builder.body(Body::from(body.to_string())).unwrap();
    tower::ServiceExt::oneshot(router.clone(), req).await.unwrap()
}

/// Read the full response body as a String.
pub async fn body_string(resp: Response) -> String {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Assert that a response is a redirect to the given location.
pub fn assert_redirect(resp: &Response, expected_location: &str) {
    assert!(
        resp.status().is_redirection(),
        "Expected redirect, got {}",
        resp.status()
    );
    let location = resp
        .headers()
        .get("location")
        .expect("Redirect should have location header")
        .to_str()
        .unwrap();
    assert_eq!(location, expected_location);
}

/// Assert that an HX-Redirect header points to the expected location.
pub fn assert_hx_redirect(resp: &Response, expected_location: &str) {
    let hx = resp
        .headers()
        .get("hx-redirect")
        .expect("Expected HX-Redirect header")
        .to_str()
        .unwrap();
    assert_eq!(hx, expected_location);
}
