use askama::Template;
use axum::{
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect},
    routing::{get, post},
    Form, Router,
};
use serde::Deserialize;
use sqlx::{FromRow, SqlitePool};
use std::collections::HashMap;

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::models::{concern_options, custom_concern, resolve_concern, ConcernOption, SessionUser, Tip};
use crate::routes::format_date;
use crate::validation::validate_tip;
use crate::AppState;

#[derive(Template)]
#[template(path = "home.html")]
struct HomeTemplate {
    feed: Vec<TipView>,
    concerns: Vec<ConcernOption>,
    static_hash: &'static str,
    user: Option<SessionUser>,
}

#[derive(Template)]
#[template(path = "tips/list.html")]
struct TipListTemplate {
    tips: Vec<TipView>,
    static_hash: &'static str,
    user: Option<SessionUser>,
}

#[derive(Template)]
#[template(path = "tips/form.html")]
struct TipFormTemplate {
    tip_id: Option<String>,
    title: String,
    content: String,
    concerns: Vec<ConcernOption>,
    concern_text: String,
    errors: HashMap<String, String>,
    static_hash: &'static str,
    user: Option<SessionUser>,
}

pub struct TipView {
    pub id: String,
    pub title: String,
    pub content: String,
    pub concern: String,
    pub author: String,
    pub posted: String,
}

/// Tip joined with its author's username, for the global feed
#[derive(FromRow)]
struct TipWithAuthor {
    id: String,
    title: String,
    content: String,
    concern: String,
    created_at: String,
    username: String,
}

impl From<TipWithAuthor> for TipView {
    fn from(row: TipWithAuthor) -> Self {
        Self {
            id: row.id,
            title: row.title,
            content: row.content,
            concern: row.concern,
            posted: format_date(&row.created_at),
            author: row.username,
        }
    }
}

#[derive(Deserialize)]
pub struct TipForm {
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: String,
    concern: Option<String>,
    concern_text: Option<String>,
}

impl TipForm {
    fn concern(&self) -> String {
        resolve_concern(self.concern.as_deref(), self.concern_text.as_deref())
    }
}

fn validate_tip_form(form: &TipForm) -> HashMap<String, String> {
    validate_tip(&form.title, &form.content)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/home", get(home))
        .route("/tips/quick", post(quick_post))
        .route("/tips", get(list_tips).post(create_tip))
        .route("/tips/new", get(new_tip_form))
        .route("/tips/{id}/edit", get(edit_tip_form))
        .route("/tips/{id}", post(update_tip).delete(delete_tip))
}

async fn fetch_own_tip(db: &SqlitePool, id: &str, user_id: &str) -> Result<Option<Tip>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM tips WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(user_id)
        .fetch_optional(db)
        .await
}

async fn insert_tip(db: &SqlitePool, tip: &Tip) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO tips (id, user_id, title, content, concern, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#
    )
    .bind(&tip.id)
    .bind(&tip.user_id)
    .bind(&tip.title)
    .bind(&tip.content)
    .bind(&tip.concern)
    .bind(&tip.created_at)
    .bind(&tip.updated_at)
    .execute(db)
    .await?;
    Ok(())
}

async fn home(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let feed: Vec<TipWithAuthor> = sqlx::query_as(
        r#"
        SELECT t.id, t.title, t.content, t.concern, t.created_at, u.username
        FROM tips t
        JOIN users u ON u.id = t.user_id
        ORDER BY t.created_at DESC, t.rowid DESC
        "#
    )
    .fetch_all(&state.db)
    .await?;

    let template = HomeTemplate {
        feed: feed.into_iter().map(TipView::from).collect(),
        concerns: concern_options(""),
        static_hash: crate::STATIC_HASH,
        user: Some(user),
    };
    Ok(Html(template.render()?))
}

async fn quick_post(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Form(form): Form<TipForm>,
) -> Result<impl IntoResponse, AppError> {
    let title = form.title.trim();
    let content = form.content.trim();

    if title.is_empty() && content.is_empty() {
        return Ok(Redirect::to("/home"));
    }

    let tip = Tip::new(user.id, title.to_string(), content.to_string(), form.concern());
    insert_tip(&state.db, &tip).await?;

    Ok(Redirect::to("/home"))
}

async fn list_tips(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let tips: Vec<Tip> = sqlx::query_as(
        "SELECT * FROM tips WHERE user_id = ? ORDER BY created_at DESC, rowid DESC"
    )
    .bind(&user.id)
    .fetch_all(&state.db)
    .await?;

    let views = tips
        .into_iter()
        .map(|tip| TipView {
            posted: format_date(&tip.created_at),
            id: tip.id,
            title: tip.title,
            content: tip.content,
            concern: tip.concern,
            author: user.username.clone(),
        })
        .collect();

    let template = TipListTemplate {
        tips: views,
        static_hash: crate::STATIC_HASH,
        user: Some(user),
    };
    Ok(Html(template.render()?))
}

async fn new_tip_form(AuthUser(user): AuthUser) -> Result<impl IntoResponse, AppError> {
    let template = TipFormTemplate {
        tip_id: None,
        title: String::new(),
        content: String::new(),
        concerns: concern_options(""),
        concern_text: String::new(),
        errors: HashMap::new(),
        static_hash: crate::STATIC_HASH,
        user: Some(user),
    };
    Ok(Html(template.render()?))
}

fn form_with_errors(
    tip_id: Option<String>,
    form: TipForm,
    errors: HashMap<String, String>,
    user: SessionUser,
) -> TipFormTemplate {
    let concern = form.concern();
    TipFormTemplate {
        tip_id,
        concerns: concern_options(&concern),
        concern_text: custom_concern(&concern),
        title: form.title,
        content: form.content,
        errors,
        static_hash: crate::STATIC_HASH,
        user: Some(user),
    }
}

async fn create_tip(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Form(form): Form<TipForm>,
) -> Result<impl IntoResponse, AppError> {
    let errors = validate_tip_form(&form);
    if !errors.is_empty() {
        let template = form_with_errors(None, form, errors, user);
        return Ok(Html(template.render()?).into_response());
    }

    let concern = form.concern();
    let tip = Tip::new(
        user.id,
        form.title.trim().to_string(),
        form.content.trim().to_string(),
        concern,
    );
    insert_tip(&state.db, &tip).await?;

    Ok(Redirect::to("/tips").into_response())
}

async fn edit_tip_form(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let Some(tip) = fetch_own_tip(&state.db, &id, &user.id).await? else {
        return Ok(Redirect::to("/tips").into_response());
    };

    let template = TipFormTemplate {
        tip_id: Some(tip.id),
        concerns: concern_options(&tip.concern),
        concern_text: custom_concern(&tip.concern),
        title: tip.title,
        content: tip.content,
        errors: HashMap::new(),
        static_hash: crate::STATIC_HASH,
        user: Some(user),
    };
    Ok(Html(template.render()?).into_response())
}

async fn update_tip(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Form(form): Form<TipForm>,
) -> Result<impl IntoResponse, AppError> {
    if fetch_own_tip(&state.db, &id, &user.id).await?.is_none() {
        return Ok(Redirect::to("/tips").into_response());
    }

    let errors = validate_tip_form(&form);
    if !errors.is_empty() {
        let template = form_with_errors(Some(id), form, errors, user);
        return Ok(Html(template.render()?).into_response());
    }

    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        UPDATE tips
        SET title = ?, content = ?, concern = ?, updated_at = ?
        WHERE id = ? AND user_id = ?
        "#
    )
    .bind(form.title.trim())
    .bind(form.content.trim())
    .bind(form.concern())
    .bind(&now)
    .bind(&id)
    .bind(&user.id)
    .execute(&state.db)
    .await?;

    Ok(Redirect::to("/tips").into_response())
}

async fn delete_tip(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    sqlx::query("DELETE FROM tips WHERE id = ? AND user_id = ?")
        .bind(&id)
        .bind(&user.id)
        .execute(&state.db)
        .await?;

    // htmx follows the header instead of swapping the body
    Ok(([("HX-Redirect", "/tips")], ""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_concern_prefers_select() {
        let form = TipForm {
            title: "SPF".to_string(),
            content: "Daily".to_string(),
            concern: Some("wrinkles".to_string()),
            concern_text: Some("sun spots".to_string()),
        };
        assert_eq!(form.concern(), "wrinkles");
        assert!(validate_tip_form(&form).is_empty());
    }
}
