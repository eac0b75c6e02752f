//! In-memory, single-user tips list.
//!
//! Everything lives in a shared `Vec` behind a lock and disappears on restart.
//! There are no accounts and no sessions.

use askama::Template;
use axum::{
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect},
    routing::{get, post},
    Form, Router,
};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{concern_options, custom_concern, resolve_concern, ConcernOption};
use crate::routes::format_date;

#[derive(Debug, Clone)]
pub struct MemoryTip {
    pub id: String,
    pub title: String,
    pub content: String,
    pub concern: String,
    pub created_at: String,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    tips: Arc<RwLock<Vec<MemoryTip>>>,
}

impl MemoryStore {
    /// Newest first.
    pub async fn list(&self) -> Vec<MemoryTip> {
        self.tips.read().await.iter().rev().cloned().collect()
    }

    pub async fn get(&self, id: &str) -> Option<MemoryTip> {
        self.tips.read().await.iter().find(|t| t.id == id).cloned()
    }

    /// Adds a tip unless both title and content are blank. Returns the new id.
    pub async fn add(&self, title: &str, content: &str, concern: String) -> Option<String> {
        let (title, content) = (title.trim(), content.trim());
        if title.is_empty() && content.is_empty() {
            return None;
        }

        let tip = MemoryTip {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            content: content.to_string(),
            concern,
            created_at: Utc::now().to_rfc3339(),
        };
        let id = tip.id.clone();
        self.tips.write().await.push(tip);
        Some(id)
    }

    /// Returns false when no tip has `id`.
    pub async fn update(&self, id: &str, title: &str, content: &str, concern: String) -> bool {
        let mut tips = self.tips.write().await;
        let Some(tip) = tips.iter_mut().find(|t| t.id == id) else {
            return false;
        };
        tip.title = title.trim().to_string();
        tip.content = content.trim().to_string();
        tip.concern = concern;
        true
    }

    pub async fn remove(&self, id: &str) -> bool {
        let mut tips = self.tips.write().await;
        let before = tips.len();
        tips.retain(|t| t.id != id);
        tips.len() != before
    }
}

#[derive(Template)]
#[template(path = "memory/list.html")]
struct MemoryListTemplate {
    tips: Vec<MemoryTipView>,
    concerns: Vec<ConcernOption>,
    static_hash: &'static str,
}

#[derive(Template)]
#[template(path = "memory/form.html")]
struct MemoryFormTemplate {
    tip: MemoryTip,
    concerns: Vec<ConcernOption>,
    concern_text: String,
    static_hash: &'static str,
}

struct MemoryTipView {
    id: String,
    title: String,
    content: String,
    concern: String,
    posted: String,
}

#[derive(Deserialize)]
pub struct MemoryTipForm {
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: String,
    concern: Option<String>,
    concern_text: Option<String>,
}

impl MemoryTipForm {
    fn concern(&self) -> String {
        resolve_concern(self.concern.as_deref(), self.concern_text.as_deref())
    }
}

pub fn router() -> Router<MemoryStore> {
    Router::new()
        .route("/", get(list_tips))
        .route("/tips", post(add_tip))
        .route("/tips/{id}/edit", get(edit_tip_form))
        .route("/tips/{id}", post(update_tip))
        .route("/tips/{id}/delete", post(delete_tip))
}

async fn list_tips(State(store): State<MemoryStore>) -> Result<impl IntoResponse, AppError> {
    let tips = store
        .list()
        .await
        .into_iter()
        .map(|t| MemoryTipView {
            posted: format_date(&t.created_at),
            id: t.id,
            title: t.title,
            content: t.content,
            concern: t.concern,
        })
        .collect();

    let template = MemoryListTemplate {
        tips,
        concerns: concern_options(""),
        static_hash: crate::STATIC_HASH,
    };
    Ok(Html(template.render()?))
}

async fn add_tip(
    State(store): State<MemoryStore>,
    Form(form): Form<MemoryTipForm>,
) -> impl IntoResponse {
    store.add(&form.title, &form.content, form.concern()).await;
    Redirect::to("/")
}

async fn edit_tip_form(
    State(store): State<MemoryStore>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let Some(tip) = store.get(&id).await else {
        return Ok(Redirect::to("/").into_response());
    };

    let template = MemoryFormTemplate {
        concerns: concern_options(&tip.concern),
        concern_text: custom_concern(&tip.concern),
        tip,
        static_hash: crate::STATIC_HASH,
    };
    Ok(Html(template.render()?).into_response())
}

async fn update_tip(
    State(store): State<MemoryStore>,
    Path(id): Path<String>,
    Form(form): Form<MemoryTipForm>,
) -> impl IntoResponse {
    store.update(&id, &form.title, &form.content, form.concern()).await;
    Redirect::to("/")
}

async fn delete_tip(
    State(store): State<MemoryStore>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    store.remove(&id).await;
    Redirect::to("/")
}
