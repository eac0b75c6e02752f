use askama::Template;
use axum::{
    extract::State,
    response::{Html, IntoResponse, Redirect},
    routing::get,
    Form, Router,
};
use serde::Deserialize;
use std::collections::HashMap;
use tower_sessions::Session;

use crate::auth::{
    hash_password, login_user, logout_user, verify_missing_user, verify_password, AuthUser, MaybeUser,
};
use crate::error::{is_unique_violation, AppError};
use crate::models::{SessionUser, User};
use crate::validation::{validate_profile, validate_registration};
use crate::AppState;

#[derive(Template)]
#[template(path = "welcome.html")]
struct WelcomeTemplate {
    static_hash: &'static str,
    user: Option<SessionUser>,
}

#[derive(Template)]
#[template(path = "login.html")]
struct LoginTemplate {
    error: Option<String>,
    username: String,
    static_hash: &'static str,
    user: Option<SessionUser>,
}

#[derive(Template)]
#[template(path = "register.html")]
struct RegisterTemplate {
    errors: HashMap<String, String>,
    username: String,
    static_hash: &'static str,
    user: Option<SessionUser>,
}

#[derive(Template)]
#[template(path = "profile.html")]
struct ProfileTemplate {
    profile: String,
    member_since: String,
    tip_count: i64,
    plan_count: i64,
    errors: HashMap<String, String>,
    static_hash: &'static str,
    user: Option<SessionUser>,
}

#[derive(Deserialize)]
pub struct CredentialsForm {
    username: String,
    password: String,
}

#[derive(Deserialize)]
pub struct ProfileForm {
    profile: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(welcome))
        .route("/register", get(register_page).post(register_submit))
        .route("/login", get(login_page).post(login_submit))
        .route("/logout", get(logout).post(logout))
        .route("/profile", get(profile_page).post(update_profile))
}

async fn welcome(MaybeUser(user): MaybeUser) -> Result<impl IntoResponse, AppError> {
    let template = WelcomeTemplate {
        static_hash: crate::STATIC_HASH,
        user,
    };
    Ok(Html(template.render()?))
}

async fn register_page() -> Result<impl IntoResponse, AppError> {
    let template = RegisterTemplate {
        errors: HashMap::new(),
        username: String::new(),
        static_hash: crate::STATIC_HASH,
        user: None,
    };
    Ok(Html(template.render()?))
}

async fn register_submit(
    State(state): State<AppState>,
    Form(form): Form<CredentialsForm>,
) -> Result<impl IntoResponse, AppError> {
    let mut errors = validate_registration(&form.username, &form.password);
    let username = form.username.trim().to_string();

    if errors.is_empty() {
        let user = User::new(username.clone(), hash_password(&form.password)?);

        let inserted = sqlx::query(
            "INSERT INTO users (id, username, password_hash, profile, created_at) VALUES (?, ?, ?, ?, ?)"
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.profile)
        .bind(&user.created_at)
        .execute(&state.db)
        .await;

        match inserted {
            Ok(_) => {
                tracing::info!(username = %user.username, "registered new user");
                return Ok(Redirect::to("/login").into_response());
            }
            Err(e) if is_unique_violation(&e) => {
                errors.insert("username".to_string(), "Username already taken".to_string());
            }
            Err(e) => return Err(e.into()),
        }
    }

    let template = RegisterTemplate {
        errors,
        username,
        static_hash: crate::STATIC_HASH,
        user: None,
    };
    Ok(Html(template.render()?).into_response())
}

async fn login_page() -> Result<impl IntoResponse, AppError> {
    let template = LoginTemplate {
        error: None,
        username: String::new(),
        static_hash: crate::STATIC_HASH,
        user: None,
    };
    Ok(Html(template.render()?))
}

async fn login_submit(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CredentialsForm>,
) -> Result<impl IntoResponse, AppError> {
    let username = form.username.trim();

    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE username = ?")
        .bind(username)
        .fetch_optional(&state.db)
        .await?;

    let verified = match &user {
        Some(user) => verify_password(&form.password, &user.password_hash)?,
        None => verify_missing_user(&form.password),
    };

    match user {
        Some(user) if verified => {
            login_user(&session, SessionUser::from(&user)).await?;
            Ok(Redirect::to("/home").into_response())
        }
        _ => {
            tracing::warn!(username, "failed login attempt");
            let template = LoginTemplate {
                error: Some("Invalid username or password".to_string()),
                username: username.to_string(),
                static_hash: crate::STATIC_HASH,
                user: None,
            };
            Ok(Html(template.render()?).into_response())
        }
    }
}

async fn logout(session: Session) -> Result<impl IntoResponse, AppError> {
    logout_user(&session).await?;
    Ok(Redirect::to("/"))
}

async fn render_profile(
    state: &AppState,
    user: SessionUser,
    profile: Option<String>,
    errors: HashMap<String, String>,
) -> Result<Html<String>, AppError> {
    let stored: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = ?")
        .bind(&user.id)
        .fetch_optional(&state.db)
        .await?;
    let stored = stored.ok_or(AppError::NotFound)?;

    let (tip_count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tips WHERE user_id = ?")
        .bind(&user.id)
        .fetch_one(&state.db)
        .await?;

    let (plan_count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM plans WHERE user_id = ?")
        .bind(&user.id)
        .fetch_one(&state.db)
        .await?;

    let template = ProfileTemplate {
        profile: profile.unwrap_or(stored.profile),
        member_since: crate::routes::format_date(&stored.created_at),
        tip_count,
        plan_count,
        errors,
        static_hash: crate::STATIC_HASH,
        user: Some(user),
    };
    Ok(Html(template.render()?))
}

async fn profile_page(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    render_profile(&state, user, None, HashMap::new()).await
}

async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Form(form): Form<ProfileForm>,
) -> Result<impl IntoResponse, AppError> {
    let errors = validate_profile(&form.profile);
    if !errors.is_empty() {
        let page = render_profile(&state, user, Some(form.profile), errors).await?;
        return Ok(page.into_response());
    }

    sqlx::query("UPDATE users SET profile = ? WHERE id = ?")
        .bind(form.profile.trim())
        .bind(&user.id)
        .execute(&state.db)
        .await?;

    Ok(Redirect::to("/profile").into_response())
}
