use askama::Template;
use axum::{
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect},
    routing::get,
    Form, Router,
};
use serde::Deserialize;
use sqlx::SqlitePool;
use std::collections::HashMap;

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::models::{Plan, SessionUser};
use crate::routes::format_date;
use crate::validation::validate_plan;
use crate::AppState;

#[derive(Template)]
#[template(path = "plans/list.html")]
struct PlanListTemplate {
    plans: Vec<PlanView>,
    static_hash: &'static str,
    user: Option<SessionUser>,
}

#[derive(Template)]
#[template(path = "plans/show.html")]
struct PlanShowTemplate {
    plan: PlanView,
    static_hash: &'static str,
    user: Option<SessionUser>,
}

#[derive(Template)]
#[template(path = "plans/form.html")]
struct PlanFormTemplate {
    plan_id: Option<String>,
    title: String,
    description: String,
    errors: HashMap<String, String>,
    static_hash: &'static str,
    user: Option<SessionUser>,
}

struct PlanView {
    id: String,
    title: String,
    description: String,
    created: String,
    updated: Option<String>,
}

impl From<Plan> for PlanView {
    fn from(plan: Plan) -> Self {
        let updated = (plan.updated_at != plan.created_at).then(|| format_date(&plan.updated_at));
        Self {
            id: plan.id,
            title: plan.title,
            description: plan.description,
            created: format_date(&plan.created_at),
            updated,
        }
    }
}

#[derive(Deserialize)]
pub struct PlanForm {
    title: String,
    #[serde(default)]
    description: String,
}

fn validate_plan_form(form: &PlanForm) -> HashMap<String, String> {
    validate_plan(&form.title)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/plans", get(list_plans).post(create_plan))
        .route("/plans/new", get(new_plan_form))
        .route("/plans/{id}", get(show_plan).post(update_plan).delete(delete_plan))
        .route("/plans/{id}/edit", get(edit_plan_form))
}

async fn fetch_own_plan(db: &SqlitePool, id: &str, user_id: &str) -> Result<Option<Plan>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM plans WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(user_id)
        .fetch_optional(db)
        .await
}

async fn list_plans(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let plans: Vec<Plan> = sqlx::query_as(
        "SELECT * FROM plans WHERE user_id = ? ORDER BY created_at DESC, rowid DESC"
    )
    .bind(&user.id)
    .fetch_all(&state.db)
    .await?;

    let template = PlanListTemplate {
        plans: plans.into_iter().map(PlanView::from).collect(),
        static_hash: crate::STATIC_HASH,
        user: Some(user),
    };
    Ok(Html(template.render()?))
}

async fn show_plan(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let Some(plan) = fetch_own_plan(&state.db, &id, &user.id).await? else {
        return Ok(Redirect::to("/plans").into_response());
    };

    let template = PlanShowTemplate {
        plan: plan.into(),
        static_hash: crate::STATIC_HASH,
        user: Some(user),
    };
    Ok(Html(template.render()?).into_response())
}

async fn new_plan_form(AuthUser(user): AuthUser) -> Result<impl IntoResponse, AppError> {
    let template = PlanFormTemplate {
        plan_id: None,
        title: String::new(),
        description: String::new(),
        errors: HashMap::new(),
        static_hash: crate::STATIC_HASH,
        user: Some(user),
    };
    Ok(Html(template.render()?))
}

async fn create_plan(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Form(form): Form<PlanForm>,
) -> Result<impl IntoResponse, AppError> {
    let errors = validate_plan_form(&form);
    if !errors.is_empty() {
        let template = PlanFormTemplate {
            plan_id: None,
            title: form.title,
            description: form.description,
            errors,
            static_hash: crate::STATIC_HASH,
            user: Some(user),
        };
        return Ok(Html(template.render()?).into_response());
    }

    let plan = Plan::new(
        user.id,
        form.title.trim().to_string(),
        form.description.trim().to_string(),
    );

    sqlx::query(
        "INSERT INTO plans (id, user_id, title, description, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)"
    )
    .bind(&plan.id)
    .bind(&plan.user_id)
    .bind(&plan.title)
    .bind(&plan.description)
    .bind(&plan.created_at)
    .bind(&plan.updated_at)
    .execute(&state.db)
    .await?;

    Ok(Redirect::to("/plans").into_response())
}

async fn edit_plan_form(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let Some(plan) = fetch_own_plan(&state.db, &id, &user.id).await? else {
        return Ok(Redirect::to("/plans").into_response());
    };

    let template = PlanFormTemplate {
        plan_id: Some(plan.id),
        title: plan.title,
        description: plan.description,
        errors: HashMap::new(),
        static_hash: crate::STATIC_HASH,
        user: Some(user),
    };
    Ok(Html(template.render()?).into_response())
}

async fn update_plan(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Form(form): Form<PlanForm>,
) -> Result<impl IntoResponse, AppError> {
    if fetch_own_plan(&state.db, &id, &user.id).await?.is_none() {
        return Ok(Redirect::to("/plans").into_response());
    }

    let errors = validate_plan_form(&form);
    if !errors.is_empty() {
        let template = PlanFormTemplate {
            plan_id: Some(id),
            title: form.title,
            description: form.description,
            errors,
            static_hash: crate::STATIC_HASH,
            user: Some(user),
        };
        return Ok(Html(template.render()?).into_response());
    }

    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        "UPDATE plans SET title = ?, description = ?, updated_at = ? WHERE id = ? AND user_id = ?"
    )
    .bind(form.title.trim())
    .bind(form.description.trim())
    .bind(&now)
    .bind(&id)
    .bind(&user.id)
    .execute(&state.db)
    .await?;

    Ok(Redirect::to("/plans").into_response())
}

async fn delete_plan(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    sqlx::query("DELETE FROM plans WHERE id = ? AND user_id = ?")
        .bind(&id)
        .bind(&user.id)
        .execute(&state.db)
        .await?;

    Ok(([("HX-Redirect", "/plans")], ""))
}
