use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Concerns offered in the tip forms. Any other freeform value is accepted too.
pub const CONCERNS: [&str; 5] = ["acne", "dry skin", "oily skin", "pores", "wrinkles"];

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Tip {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub content: String,
    pub concern: String,
    pub created_at: String,
    pub updated_at: String,
}

impl Tip {
    pub fn new(user_id: String, title: String, content: String, concern: String) -> Self {
        let now = Utc::now().to_rfc3339();
        Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            title,
            content,
            concern,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

/// Pick the concern for a submitted tip: the select value wins, then the
/// freeform text, else empty.
pub fn resolve_concern(selected: Option<&str>, text: Option<&str>) -> String {
    [selected, text]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|s| !s.is_empty())
        .unwrap_or_default()
        .to_string()
}

pub struct ConcernOption {
    pub name: &'static str,
    pub selected: bool,
}

/// Options for the concern select, marking `current` when it is one of the
/// fixed concerns.
pub fn concern_options(current: &str) -> Vec<ConcernOption> {
    CONCERNS
        .iter()
        .map(|&name| ConcernOption {
            name,
            selected: name == current,
        })
        .collect()
}

/// The freeform part of a concern, i.e. empty when it is one of the fixed ones.
pub fn custom_concern(current: &str) -> String {
    if CONCERNS.contains(&current) {
        String::new()
    } else {
        current.to_string()
    }
}
