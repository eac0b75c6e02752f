use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::models::{Plan, Tip};
use crate::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct ExportTip {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub concern: String,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExportPlan {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// The shape of `/export` downloads, also accepted by the `import` command.
#[derive(Debug, Serialize, Deserialize)]
pub struct ExportData {
    pub exported_at: String,
    #[serde(default)]
    pub tips: Vec<ExportTip>,
    #[serde(default)]
    pub plans: Vec<ExportPlan>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/export", get(export_data))
}

async fn export_data(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let tips: Vec<Tip> = sqlx::query_as(
        "SELECT * FROM tips WHERE user_id = ? ORDER BY created_at"
    )
    .bind(&user.id)
    .fetch_all(&state.db)
    .await?;

    let plans: Vec<Plan> = sqlx::query_as(
        "SELECT * FROM plans WHERE user_id = ? ORDER BY created_at"
    )
    .bind(&user.id)
    .fetch_all(&state.db)
    .await?;

    let export = ExportData {
        exported_at: chrono::Utc::now().to_rfc3339(),
        tips: tips
            .into_iter()
            .map(|t| ExportTip {
                title: t.title,
                content: t.content,
                concern: t.concern,
                created_at: Some(t.created_at),
                updated_at: Some(t.updated_at),
            })
            .collect(),
        plans: plans
            .into_iter()
            .map(|p| ExportPlan {
                title: p.title,
                description: p.description,
                created_at: Some(p.created_at),
                updated_at: Some(p.updated_at),
            })
            .collect(),
    };

    let filename = format!("skinlog-export-{}.json", chrono::Local::now().format("%Y-%m-%d"));
    let content_disposition = format!("attachment; filename=\"{}\"", filename);

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Ok(value) = HeaderValue::from_str(&content_disposition) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }

    Ok((headers, Json(export)))
}
