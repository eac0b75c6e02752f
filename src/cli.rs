use clap::{Parser, Subcommand};
use sqlx::SqlitePool;
use std::fs;
use std::net::SocketAddr;

use crate::auth::hash_password;
use crate::models::{Plan, Tip, User};
use crate::routes::export::ExportData;
use crate::validation::{normalize_timestamp, validate_plan, validate_registration, validate_tip};

#[derive(Parser, Debug)]
#[command(name = "skinlog", version, about = "Skincare tips and plans")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the multi-user web application (default)
    Serve,
    /// Run the in-memory single-user tips list
    Memory {
        /// Address to listen on, overrides BIND_ADDR
        #[arg(long)]
        bind: Option<SocketAddr>,
    },
    /// Create an account
    CreateUser { username: String, password: String },
    /// Import tips and plans from an export file into an existing account
    Import { file: String, username: String },
}

pub async fn create_user(pool: &SqlitePool, username: &str, password: &str) -> Result<User, Box<dyn std::error::Error>> {
    let errors = validate_registration(username, password);
    if !errors.is_empty() {
        let mut messages: Vec<_> = errors.into_values().collect();
        messages.sort();
        return Err(messages.join("; ").into());
    }
    let username = username.trim();

    let user = User::new(username.to_string(), hash_password(password)?);

    sqlx::query(
        "INSERT INTO users (id, username, password_hash, profile, created_at) VALUES (?, ?, ?, ?, ?)"
    )
    .bind(&user.id)
    .bind(&user.username)
    .bind(&user.password_hash)
    .bind(&user.profile)
    .bind(&user.created_at)
    .execute(pool)
    .await?;

    tracing::info!(id = %user.id, username = %user.username, "created user");
    Ok(user)
}

/// Number of tips and plans written by [`import_data`], and of entries
/// skipped for failing the same rules as the web forms.
#[derive(Debug, PartialEq, Eq)]
pub struct ImportSummary {
    pub tips: usize,
    pub plans: usize,
    pub skipped: usize,
}

pub async fn import_data(pool: &SqlitePool, file_path: &str, username: &str) -> Result<ImportSummary, Box<dyn std::error::Error>> {
    let content = fs::read_to_string(file_path)?;
    let data: ExportData = serde_json::from_str(&content)?;
    import_export(pool, data, username).await
}

/// Insert everything in `data` for `username` in a single transaction.
pub async fn import_export(pool: &SqlitePool, data: ExportData, username: &str) -> Result<ImportSummary, Box<dyn std::error::Error>> {
    let user_id: Option<(String,)> = sqlx::query_as("SELECT id FROM users WHERE username = ?")
        .bind(username)
        .fetch_optional(pool)
        .await?;

    let Some((user_id,)) = user_id else {
        return Err(format!("User '{}' not found", username).into());
    };

    let mut tx = pool.begin().await?;
    let mut summary = ImportSummary { tips: 0, plans: 0, skipped: 0 };

    for entry in data.tips {
        if !validate_tip(&entry.title, &entry.content).is_empty() {
            tracing::warn!(title = %entry.title, "skipping invalid tip");
            summary.skipped += 1;
            continue;
        }

        let mut tip = Tip::new(
            user_id.clone(),
            entry.title.trim().to_string(),
            entry.content.trim().to_string(),
            entry.concern.trim().to_string(),
        );
        if let Some(created_at) = normalize_timestamp(entry.created_at.as_deref()) {
            tip.created_at = created_at;
        }
        tip.updated_at = normalize_timestamp(entry.updated_at.as_deref())
            .unwrap_or_else(|| tip.created_at.clone());

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
        .execute(&mut *tx)
        .await?;

        summary.tips += 1;
    }

    for entry in data.plans {
        if !validate_plan(&entry.title).is_empty() {
            tracing::warn!(title = %entry.title, "skipping invalid plan");
            summary.skipped += 1;
            continue;
        }

        let mut plan = Plan::new(
            user_id.clone(),
            entry.title.trim().to_string(),
            entry.description.trim().to_string(),
        );
        if let Some(created_at) = normalize_timestamp(entry.created_at.as_deref()) {
            plan.created_at = created_at;
        }
        plan.updated_at = normalize_timestamp(entry.updated_at.as_deref())
            .unwrap_or_else(|| plan.created_at.clone());

        sqlx::query(
            "INSERT INTO plans (id, user_id, title, description, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)"
        )
        .bind(&plan.id)
        .bind(&plan.user_id)
        .bind(&plan.title)
        .bind(&plan.description)
        .bind(&plan.created_at)
        .bind(&plan.updated_at)
        .execute(&mut *tx)
        .await?;

        summary.plans += 1;
    }

    tx.commit().await?;
    tracing::info!(
        username,
        tips = summary.tips,
        plans = summary.plans,
        skipped = summary.skipped,
        "import finished"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["skinlog"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn parses_create_user() {
        let cli = Cli::try_parse_from(["skinlog", "create-user", "ana", "secret1"]).unwrap();
        match cli.command {
            Some(Command::CreateUser { username, password }) => {
                assert_eq!(username, "ana");
                assert_eq!(password, "secret1");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_memory_bind() {
        let cli = Cli::try_parse_from(["skinlog", "memory", "--bind", "127.0.0.1:4000"]).unwrap();
        match cli.command {
            Some(Command::Memory { bind }) => {
                assert_eq!(bind, Some("127.0.0.1:4000".parse().unwrap()));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
