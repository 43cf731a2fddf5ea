use crate::entities::{prelude::*, users};
use crate::models::{EntityStatus, UserType};
use crate::utils::auth::hash_password;
use crate::utils::text::capitalize_words;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use std::env;
use tracing::info;

/// Creates the master account from `MASTER_EMAIL` / `MASTER_PASSWORD` when both are set.
pub async fn seed_master_user(db: &DatabaseConnection) -> anyhow::Result<()> {
    let (Ok(email), Ok(password)) = (env::var("MASTER_EMAIL"), env::var("MASTER_PASSWORD")) else {
        return Ok(());
    };
    let email = email.trim().to_lowercase();

    let exists = Users::find()
        .filter(users::Column::Email.eq(email.as_str()))
        .one(db)
        .await?;
    if exists.is_some() {
        return Ok(());
    }

    info!("🌱 Seeding master user {}", email);

    let name = env::var("MASTER_NAME").unwrap_or_else(|_| "administrator".to_string());
    let now = chrono::Utc::now();

    users::ActiveModel {
        name: Set(capitalize_words(&name)),
        email: Set(email),
        password_hash: Set(hash_password(&password)?),
        user_type: Set(UserType::Master.code()),
        is_active: Set(true),
        is_foreigner: Set(true),
        status_code: Set(EntityStatus::Exists.code()),
        created_at: Set(Some(now)),
        modified_at: Set(Some(now)),
        ..Default::default()
    }
    .insert(db)
    .await?;

    Ok(())
}
